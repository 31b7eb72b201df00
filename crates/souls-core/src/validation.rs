//! # Input Validation
//!
//! Boundary checks applied before any storage access or hashing.
//!
//! - Reject missing and empty parameters
//! - Reject oversized input
//! - Never echo a password back in an error

use crate::SoulError;
use crate::primitives::{MAX_ACTION_LENGTH, MAX_NAME_LENGTH, MAX_PASSWORD_LENGTH};

/// The Validator holds the input rules shared by every core operation.
pub struct Validator;

impl Validator {
    /// Validate a soul name (actor or relationship target).
    ///
    /// A name is valid if it is:
    /// - non-empty and within `MAX_NAME_LENGTH`
    /// - free of leading and trailing whitespace
    /// - free of control characters
    pub fn validate_name(name: &str) -> Result<(), SoulError> {
        if name.is_empty() {
            return Err(SoulError::InvalidInput("name must not be empty".to_string()));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(SoulError::InvalidInput(format!(
                "name length {} exceeds maximum {} bytes",
                name.len(),
                MAX_NAME_LENGTH
            )));
        }
        if name.trim() != name {
            return Err(SoulError::InvalidInput(
                "name must not start or end with whitespace".to_string(),
            ));
        }
        if name.chars().any(char::is_control) {
            return Err(SoulError::InvalidInput(
                "name must not contain control characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate a plaintext password.
    pub fn validate_password(password: &str) -> Result<(), SoulError> {
        if password.is_empty() {
            return Err(SoulError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        if password.len() > MAX_PASSWORD_LENGTH {
            return Err(SoulError::InvalidInput(format!(
                "password exceeds maximum {} bytes",
                MAX_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    /// Validate the raw action string before parsing it.
    ///
    /// Empty and oversized strings are both `InvalidAction`. Oversized ones
    /// are rejected without being copied into the error.
    pub fn validate_action(action: &str) -> Result<(), SoulError> {
        if action.is_empty() {
            return Err(SoulError::InvalidAction(
                "action must not be empty".to_string(),
            ));
        }
        if action.len() > MAX_ACTION_LENGTH {
            return Err(SoulError::InvalidAction(format!(
                "action exceeds maximum {} bytes",
                MAX_ACTION_LENGTH
            )));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        for name in ["alice", "Bob Smith", "ünïcødé", "a"] {
            assert!(Validator::validate_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(
            Validator::validate_name(""),
            Err(SoulError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_padded_or_control_names() {
        for name in [" alice", "alice ", "ali\nce", "\talice"] {
            assert!(
                matches!(Validator::validate_name(name), Err(SoulError::InvalidInput(_))),
                "{name:?}"
            );
        }
    }

    #[test]
    fn name_length_boundary() {
        let at_limit = "a".repeat(MAX_NAME_LENGTH);
        let over_limit = "a".repeat(MAX_NAME_LENGTH + 1);

        assert!(Validator::validate_name(&at_limit).is_ok());
        assert!(Validator::validate_name(&over_limit).is_err());
    }

    #[test]
    fn password_bounds() {
        assert!(Validator::validate_password("secret1").is_ok());
        assert!(Validator::validate_password("").is_err());
        assert!(Validator::validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[test]
    fn password_error_does_not_echo_input() {
        let long = "p".repeat(MAX_PASSWORD_LENGTH + 1);
        let err = Validator::validate_password(&long).expect_err("too long");
        assert!(!err.to_string().contains(&long));
    }

    #[test]
    fn action_bounds() {
        assert!(Validator::validate_action("addAlly").is_ok());
        assert!(matches!(
            Validator::validate_action(""),
            Err(SoulError::InvalidAction(_))
        ));
        assert!(matches!(
            Validator::validate_action(&"a".repeat(MAX_ACTION_LENGTH + 1)),
            Err(SoulError::InvalidAction(_))
        ));
    }
}
