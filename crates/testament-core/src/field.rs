//! Base field elements of the custody protocol
//!
//! Values are kept reduced modulo [`FIELD_MODULUS`]. The textual form is the
//! ledger's literal syntax, a decimal followed by the `field` suffix.

use num_bigint::BigUint;
use once_cell::sync::Lazy;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use crate::{Result, TestamentError};

/// Decimal form of the base field modulus
pub const FIELD_MODULUS: &str =
    "8444461749428370424248824938781546531375899335154063827935233455917409239041";

/// Literal suffix of field inputs
pub const FIELD_SUFFIX: &str = "field";

/// Width of the canonical little-endian encoding
pub const FIELD_BYTES: usize = 32;

static MODULUS: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(FIELD_MODULUS.as_bytes(), 10).unwrap_or_default()
});

/// An element of the protocol's base field
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// The zero element, also the value of every unset tree slot
    pub fn zero() -> Self {
        Self(BigUint::default())
    }

    /// Whether this is the zero element
    pub fn is_zero(&self) -> bool {
        self.0 == BigUint::default()
    }

    /// Reduce arbitrary little-endian bytes into the field
    pub fn from_bytes_le_mod_order(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_le(bytes) % &*MODULUS)
    }

    /// Canonical 32-byte little-endian encoding
    pub fn to_bytes_le(&self) -> [u8; FIELD_BYTES] {
        let mut out = [0u8; FIELD_BYTES];
        let bytes = self.0.to_bytes_le();
        out[..bytes.len()].copy_from_slice(&bytes);
        out
    }

    /// Hex of the canonical encoding, for logs
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes_le())
    }

    /// Sample a uniformly distributed element.
    ///
    /// Rejection sampling over 253-bit candidates keeps the distribution
    /// uniform over the field.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; FIELD_BYTES];
            rng.fill_bytes(&mut bytes);
            bytes[FIELD_BYTES - 1] &= 0x1f;
            let candidate = BigUint::from_bytes_le(&bytes);
            if candidate < *MODULUS {
                return Self(candidate);
            }
        }
    }

    /// Parse the decimal part of a literal, rejecting non-canonical values
    fn parse_decimal(digits: &str) -> Result<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TestamentError::invalid_input(format!(
                "field literal must be decimal digits, got {digits:?}"
            )));
        }
        let value = BigUint::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| TestamentError::invalid_input(format!("unparsable field {digits}")))?;
        if value >= *MODULUS {
            return Err(TestamentError::invalid_input(format!(
                "field literal {digits} is not below the modulus"
            )));
        }
        Ok(Self(value))
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u32> for FieldElement {
    fn from(value: u32) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u16> for FieldElement {
    fn from(value: u16) -> Self {
        Self(BigUint::from(value))
    }
}

impl Add for &FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: Self) -> FieldElement {
        FieldElement((&self.0 + &rhs.0) % &*MODULUS)
    }
}

impl Add for FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: Self) -> FieldElement {
        &self + &rhs
    }
}

impl FromStr for FieldElement {
    type Err = TestamentError;

    /// Parse `<decimal>field`
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().strip_suffix(FIELD_SUFFIX).ok_or_else(|| {
            TestamentError::invalid_input(format!("field literal {s:?} lacks the `field` suffix"))
        })?;
        Self::parse_decimal(digits)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{FIELD_SUFFIX}", self.0.to_str_radix(10))
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({self})")
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let literal = String::deserialize(deserializer)?;
        literal.parse().map_err(serde::de::Error::custom)
    }
}
