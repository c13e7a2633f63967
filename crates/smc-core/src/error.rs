//! # Validation Errors
//!
//! Errors raised when constructing domain primitives from untrusted input
//! (CLI flags, configuration files, persisted state). Each variant carries
//! the rejected input and the expected format so that operators can
//! diagnose misconfiguration without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is not `0x` followed by 40 hex digits.
    #[error("invalid address: \"{0}\" (expected 0x followed by 40 hex digits)")]
    InvalidAddress(String),

    /// Amount string is not a non-negative integer in base units.
    #[error("invalid amount: \"{value}\" ({reason})")]
    InvalidAmount {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Timestamp is outside the representable UTC range.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The value that failed to convert.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_address_display() {
        let err = ValidationError::InvalidAddress("0x12".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("0x12"));
        assert!(msg.contains("40 hex digits"));
    }

    #[test]
    fn invalid_amount_display() {
        let err = ValidationError::InvalidAmount {
            value: "-5".to_string(),
            reason: "not a digit".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("-5"));
        assert!(msg.contains("not a digit"));
    }

    #[test]
    fn invalid_timestamp_display() {
        let err = ValidationError::InvalidTimestamp {
            value: "99999999999999999".to_string(),
            reason: "out of range".to_string(),
        };
        assert!(format!("{err}").contains("out of range"));
    }
}
