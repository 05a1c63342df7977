//! Range validation helpers shared by parameter and config checks.

use crate::error::ParameterError;
use std::fmt::Display;
use std::ops::RangeInclusive;

/// Validate that an integer lies in an inclusive range.
///
/// # Example
/// ```
/// use redstone_spec::validation::validate_int_range;
///
/// assert!(validate_int_range("pitch_shift", 3, -24..=24, "[-24, 24]").is_ok());
/// assert!(validate_int_range("pitch_shift", 30, -24..=24, "[-24, 24]").is_err());
/// ```
pub fn validate_int_range<T>(
    name: &'static str,
    value: T,
    range: RangeInclusive<T>,
    expected: &'static str,
) -> Result<(), ParameterError>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name,
            value: value.to_string(),
            expected,
        })
    }
}

/// Validate that a real value is finite and in the half-open range `(min, max]`.
///
/// # Example
/// ```
/// use redstone_spec::validation::validate_positive_up_to;
///
/// assert!(validate_positive_up_to("speed_factor", 1.5, 16.0, "(0, 16]").is_ok());
/// assert!(validate_positive_up_to("speed_factor", 0.0, 16.0, "(0, 16]").is_err());
/// assert!(validate_positive_up_to("speed_factor", f64::NAN, 16.0, "(0, 16]").is_err());
/// ```
pub fn validate_positive_up_to(
    name: &'static str,
    value: f64,
    max: f64,
    expected: &'static str,
) -> Result<(), ParameterError> {
    if value.is_finite() && value > 0.0 && value <= max {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name,
            value: value.to_string(),
            expected,
        })
    }
}

/// Validate that a real value is finite and in `[0, 1]`.
pub fn validate_unit_interval(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name,
            value: value.to_string(),
            expected: "[0, 1]",
        })
    }
}
