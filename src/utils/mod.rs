pub mod ip;
pub mod password;
pub mod url_validator;

pub use url_validator::{UrlValidationError, validate_url};

/// Generate a random alphanumeric token of the given length.
pub fn generate_secure_token(length: usize) -> String {
    use std::iter;

    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secure_token_length() {
        assert_eq!(generate_secure_token(32).len(), 32);
        assert_eq!(generate_secure_token(0).len(), 0);
    }

    #[test]
    fn test_generate_secure_token_charset() {
        let token = generate_secure_token(256);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_secure_token_unique() {
        assert_ne!(generate_secure_token(32), generate_secure_token(32));
    }
}
