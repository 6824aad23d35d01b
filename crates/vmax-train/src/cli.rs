//! Command-line helpers.

use crate::error::TrainError;

/// Parse a boolean flag value.
///
/// Accepts `yes/true/t/y/1` and `no/false/f/n/0`, case-insensitively.
pub fn parse_bool(value: &str) -> Result<bool, TrainError> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Ok(true),
        "no" | "false" | "f" | "n" | "0" => Ok(false),
        _ => Err(TrainError::InvalidBool {
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_literals() {
        for s in ["yes", "TRUE", "t", "Y", "1"] {
            assert!(parse_bool(s).unwrap(), "{s}");
        }
        for s in ["no", "False", "F", "n", "0"] {
            assert!(!parse_bool(s).unwrap(), "{s}");
        }
    }

    #[test]
    fn rejects_other_values() {
        let err = parse_bool("maybe").unwrap_err();
        assert_eq!(err.to_string(), "boolean value expected, got 'maybe'");
        assert!(parse_bool("").is_err());
    }
}
