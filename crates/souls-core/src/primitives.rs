//! # Primitives
//!
//! Hardcoded limits and sizes for the Souls core.
//!
//! These are compiled into the binary and are immutable at runtime.

// =============================================================================
// CREDENTIAL SIZES
// =============================================================================

/// Length of the random salt drawn for every new credential.
pub const SALT_LENGTH: usize = 16;

/// Length of the derived Argon2id hash.
pub const HASH_LENGTH: usize = 32;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for soul names, in bytes.
///
/// Applies to actor names and relationship targets alike.
pub const MAX_NAME_LENGTH: usize = 64;

/// Maximum length for plaintext passwords, in bytes.
///
/// Bounds the work a single login or create request can force on the hasher.
pub const MAX_PASSWORD_LENGTH: usize = 1024;

/// Maximum length for relationship action strings, in bytes.
pub const MAX_ACTION_LENGTH: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_meets_argon2_minimum() {
        // Argon2 rejects salts shorter than 8 bytes
        assert!(SALT_LENGTH >= 8);
    }

    #[test]
    fn longest_action_fits_limit() {
        assert!("removeHostile".len() <= MAX_ACTION_LENGTH);
    }
}
