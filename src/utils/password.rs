//! Password hashing with Argon2id.
//!
//! The admin password may be supplied as plaintext in configuration; it is
//! hashed on first use and only ever compared through `verify_password`.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// 密码哈希错误
#[derive(Debug)]
pub enum PasswordError {
    HashError(String),
    VerifyError(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashError(msg) => write!(f, "Password hash error: {}", msg),
            Self::VerifyError(msg) => write!(f, "Password verify error: {}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::VerifyError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Whether a string already looks like an Argon2 PHC hash.
pub fn is_argon2_hash(s: &str) -> bool {
    s.starts_with("$argon2")
}

/// Resolve the admin credential from configuration: already-hashed values
/// pass through, plaintext is hashed once at startup.
pub fn resolve_admin_hash(configured: &str) -> Result<String, PasswordError> {
    if is_argon2_hash(configured) {
        Ok(configured.to_string())
    } else {
        hash_password(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "test_password_123";
        let hash = hash_password(password).expect("hash should succeed");

        assert!(is_argon2_hash(&hash));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
        assert!(!verify_password("wrong_password", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_is_argon2_hash() {
        assert!(is_argon2_hash("$argon2id$v=19$m=19456,t=2,p=1$xxx"));
        assert!(is_argon2_hash("$argon2i$v=19$m=19456,t=2,p=1$xxx"));
        assert!(!is_argon2_hash("plaintext_password"));
        assert!(!is_argon2_hash("$bcrypt$xxx"));
    }

    #[test]
    fn test_resolve_admin_hash() {
        let resolved = resolve_admin_hash("plaintext").expect("hash should succeed");
        assert!(is_argon2_hash(&resolved));
        assert!(verify_password("plaintext", &resolved).unwrap());

        let already = hash_password("secret").unwrap();
        assert_eq!(resolve_admin_hash(&already).unwrap(), already);
    }
}
