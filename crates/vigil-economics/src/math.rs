// crates/vigil-economics/src/math.rs
//
// Checked fixed-point helpers.
//
// Share conversions and reward accrual multiply two u128 quantities before
// dividing. `mul_div` forms the product as a U512 so intermediate overflow
// never truncates a result that itself fits in u128.

use primitive_types::{U256, U512};

use vigil_core::error::VigilError;

/// `floor(a * b / d)` without intermediate overflow.
///
/// # Errors
/// `ArithmeticOverflow` if `d == 0` or the quotient does not fit in u128.
pub fn mul_div(a: u128, b: u128, d: u128) -> Result<u128, VigilError> {
    if d == 0 {
        return Err(VigilError::ArithmeticOverflow("mul_div (division by zero)"));
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / d);
    }
    let quotient = U256::from(a).full_mul(U256::from(b)) / U512::from(d);
    narrow(quotient, "mul_div (quotient exceeds u128)")
}

/// Narrow a wide intermediate back to u128.
pub fn narrow(value: U512, context: &'static str) -> Result<u128, VigilError> {
    if value > U512::from(u128::MAX) {
        return Err(VigilError::ArithmeticOverflow(context));
    }
    Ok(value.as_u128())
}

/// `floor(amount * percent / 100)`.
pub fn percent_of(amount: u128, percent: u8) -> Result<u128, VigilError> {
    mul_div(amount, percent as u128, 100)
}

/// Checked addition with a named context for the error.
pub fn add(a: u128, b: u128, context: &'static str) -> Result<u128, VigilError> {
    a.checked_add(b).ok_or(VigilError::ArithmeticOverflow(context))
}

/// Checked subtraction; underflow means an accounting invariant broke.
pub fn sub(a: u128, b: u128, context: &'static str) -> Result<u128, VigilError> {
    a.checked_sub(b).ok_or_else(|| {
        VigilError::InvariantViolation(format!("{}: {} - {} underflows", context, a, b))
    })
}
