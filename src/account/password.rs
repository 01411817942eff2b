/// Password hashing with Argon2id
use crate::error::{GymError, GymResult};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};

pub const MIN_PASSWORD_LENGTH: usize = 8;

lazy_static! {
    static ref DECOY_HASH: String = hash_password("decoy-password").unwrap_or_default();
}

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> GymResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GymError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored hash; malformed hashes never match
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Run one Argon2 verification against a throwaway hash
///
/// Login calls this for unknown usernames so they cost the same as a wrong password.
pub fn verify_decoy(password: &str) -> bool {
    verify_password(password, &DECOY_HASH)
}

/// Check a new password and its confirmation
pub fn validate_new_password(password: &str, confirmation: &str) -> GymResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(GymError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password != confirmation {
        return Err(GymError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

/// 32 random bytes, hex encoded
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoy_hash_is_a_real_argon2_hash() {
        assert!(PasswordHash::new(&DECOY_HASH).is_ok());
        assert!(!verify_decoy("initial-pass"));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn test_new_password_rules() {
        assert!(validate_new_password("short", "short").is_err());
        assert!(validate_new_password("longenough", "longenougH").is_err());
        assert!(validate_new_password("longenough", "longenough").is_ok());
    }

    #[test]
    fn test_tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
