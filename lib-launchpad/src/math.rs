//! Checked integer helpers
//!
//! All curve, fee and split arithmetic runs in u128 and narrows back to u64
//! explicitly. Nothing here saturates or wraps silently.

use crate::errors::{LaunchpadError, LaunchpadResult};

/// floor(a * b / denominator)
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> LaunchpadResult<u128> {
    if denominator == 0 {
        return Err(LaunchpadError::Overflow);
    }
    a.checked_mul(b)
        .map(|product| product / denominator)
        .ok_or(LaunchpadError::Overflow)
}

/// ceil(a * b / denominator)
pub fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> LaunchpadResult<u128> {
    if denominator == 0 {
        return Err(LaunchpadError::Overflow);
    }
    let product = a.checked_mul(b).ok_or(LaunchpadError::Overflow)?;
    let quotient = product / denominator;
    if product % denominator == 0 {
        Ok(quotient)
    } else {
        quotient.checked_add(1).ok_or(LaunchpadError::Overflow)
    }
}

/// Narrow a u128 intermediate to u64
pub fn to_u64(value: u128) -> LaunchpadResult<u64> {
    u64::try_from(value).map_err(|_| LaunchpadError::Overflow)
}

/// Integer square root using Newton's method
///
/// Returns floor(sqrt(n)).
pub fn integer_sqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }

    // Bit-length based initial guess, always at or above the root
    let shift = (127 - n.leading_zeros()) / 2 + 1;
    let mut x = 1u128 << shift;

    loop {
        let next_x = (x + n / x) / 2;
        if next_x >= x {
            return x;
        }
        x = next_x;
    }
}
