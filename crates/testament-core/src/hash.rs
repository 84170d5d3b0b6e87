//! Pluggable field hashing
//!
//! Every hash the client computes for the commitment tree and for leaf
//! derivation goes through [`FieldHasher`]. The remote verifier dictates the
//! real primitive, so tree logic only ever sees this trait and a conformant
//! implementation can be dropped in without touching it.
//!
//! # Placeholder primitive
//!
//! [`Sha256FieldHasher`] is the development implementation: SHA-256 over the
//! canonical 32-byte encodings, reduced into the field. It satisfies the
//! structural contract (determinism, order sensitivity of `combine`) but does
//! NOT match the deployed verifier. Proofs built with it must not be used for
//! real value transfer until it is replaced and cross-checked against the
//! verifier's reference vectors.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::field::FieldElement;

/// Hash primitive shared with the remote verifier
pub trait FieldHasher: Send + Sync + fmt::Debug {
    /// Combine a left and right child into their parent node.
    ///
    /// Operand order is significant: `combine(a, b) != combine(b, a)` for
    /// distinct `a`, `b`.
    fn combine(&self, left: &FieldElement, right: &FieldElement) -> FieldElement;

    /// Hash arbitrary bytes (an address string, for instance) into the field
    fn hash_bytes(&self, data: &[u8]) -> FieldElement;

    /// Hash a single field element
    fn hash_field(&self, value: &FieldElement) -> FieldElement {
        self.hash_bytes(&value.to_bytes_le())
    }
}

impl<H: FieldHasher + ?Sized> FieldHasher for std::sync::Arc<H> {
    fn combine(&self, left: &FieldElement, right: &FieldElement) -> FieldElement {
        (**self).combine(left, right)
    }

    fn hash_bytes(&self, data: &[u8]) -> FieldElement {
        (**self).hash_bytes(data)
    }

    fn hash_field(&self, value: &FieldElement) -> FieldElement {
        (**self).hash_field(value)
    }
}

impl<H: FieldHasher + ?Sized> FieldHasher for &H {
    fn combine(&self, left: &FieldElement, right: &FieldElement) -> FieldElement {
        (**self).combine(left, right)
    }

    fn hash_bytes(&self, data: &[u8]) -> FieldElement {
        (**self).hash_bytes(data)
    }

    fn hash_field(&self, value: &FieldElement) -> FieldElement {
        (**self).hash_field(value)
    }
}

/// Development placeholder built on SHA-256
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256FieldHasher;

impl Sha256FieldHasher {
    fn digest_parts(parts: &[&[u8]]) -> FieldElement {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        FieldElement::from_bytes_le_mod_order(&hasher.finalize())
    }
}

impl FieldHasher for Sha256FieldHasher {
    fn combine(&self, left: &FieldElement, right: &FieldElement) -> FieldElement {
        Self::digest_parts(&[&left.to_bytes_le(), &right.to_bytes_le()])
    }

    fn hash_bytes(&self, data: &[u8]) -> FieldElement {
        Self::digest_parts(&[data])
    }
}
