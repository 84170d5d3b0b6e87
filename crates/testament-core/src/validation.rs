//! Domain validation shared by tree construction and payload assembly.

use crate::{Result, TestamentError, MAX_SHARE_BPS};

/// Validate a share in basis points, returning its `u16` protocol form.
///
/// Shares must lie in (0, 10000].
pub fn validate_share_bps(bps: u32) -> Result<u16> {
    if bps == 0 || bps > MAX_SHARE_BPS {
        return Err(TestamentError::InvalidShare { bps });
    }
    u16::try_from(bps).map_err(|_| TestamentError::InvalidShare { bps })
}

/// Check that `value` fits an unsigned protocol field of `width` bits
pub fn check_width(field: &'static str, value: u128, width: u32) -> Result<u128> {
    let fits = width >= 128 || value >> width == 0;
    if fits {
        Ok(value)
    } else {
        Err(TestamentError::FieldOverflow {
            field,
            value,
            width,
        })
    }
}

/// Narrow to a `u32` protocol field
pub fn to_u32_field(field: &'static str, value: u64) -> Result<u32> {
    check_width(field, u128::from(value), 32)?;
    u32::try_from(value).map_err(|_| TestamentError::FieldOverflow {
        field,
        value: u128::from(value),
        width: 32,
    })
}

/// Narrow to a `u64` protocol field
pub fn to_u64_field(field: &'static str, value: u128) -> Result<u64> {
    check_width(field, value, 64)?;
    u64::try_from(value).map_err(|_| TestamentError::FieldOverflow {
        field,
        value,
        width: 64,
    })
}
