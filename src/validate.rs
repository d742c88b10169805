//! Request parameter policies.
//!
//! Range bounds degrade to their defaults; the live-stream interval is
//! rejected outright when it is not a positive integer.

use log::warn;

use crate::error::ValidationError;

/// Lenient policy for historical range bounds.
///
/// An absent value yields `default` silently. A value that does not parse as
/// an integer, or parses to zero or less, yields `default` and a warning.
pub fn validate_bounded_int(raw: Option<&str>, default: i64) -> i64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => value,
        _ => {
            warn!(
                "Invalid value {:?} for parameter, using default: {}",
                raw, default
            );
            default
        }
    }
}

/// Strict policy for the live-stream polling interval, in seconds.
pub fn parse_interval(raw: Option<&str>) -> Result<u64, ValidationError> {
    let raw = raw.ok_or(ValidationError::InvalidInterval)?;
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidInterval);
    }
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ValidationError::InvalidInterval),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_int_accepts_positive_values() {
        assert_eq!(validate_bounded_int(Some("5"), 10), 5);
        assert_eq!(validate_bounded_int(Some("3"), 1), 3);
    }

    #[test]
    fn bounded_int_falls_back_on_invalid_input() {
        assert_eq!(validate_bounded_int(Some("0"), 10), 10);
        assert_eq!(validate_bounded_int(Some("-1"), 10), 10);
        assert_eq!(validate_bounded_int(Some("invalid"), 10), 10);
        assert_eq!(validate_bounded_int(Some(""), -1), -1);
        assert_eq!(validate_bounded_int(None, -1), -1);
    }

    #[test]
    fn bounded_int_is_repeatable() {
        for _ in 0..3 {
            assert_eq!(validate_bounded_int(Some("7"), 0), 7);
            assert_eq!(validate_bounded_int(Some("x"), 0), 0);
        }
    }

    #[test]
    fn interval_accepts_positive_integers() {
        assert_eq!(parse_interval(Some("1")), Ok(1));
        assert_eq!(parse_interval(Some("30")), Ok(30));
    }

    #[test]
    fn interval_rejects_everything_else() {
        for raw in ["", "0", "-1", "+2", "1.5", "abc", " 3", "99999999999999999999999"] {
            assert_eq!(
                parse_interval(Some(raw)),
                Err(ValidationError::InvalidInterval),
                "accepted {raw:?}"
            );
        }
        assert_eq!(parse_interval(None), Err(ValidationError::InvalidInterval));
    }
}
