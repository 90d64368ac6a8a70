//! Destination URL validation.
//!
//! Every link destination must be a well-formed http/https URL. Anything
//! else is rejected before it reaches storage, including URLs that parse
//! but carry a script-capable or local scheme.

use url::Url;

/// URL 验证错误
#[derive(Debug)]
pub enum UrlValidationError {
    EmptyUrl,
    InvalidProtocol(String),
    DangerousProtocol(String),
    InvalidFormat(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidProtocol(scheme) => write!(
                f,
                "Invalid protocol: {}. Only http:// and https:// are allowed",
                scheme
            ),
            Self::DangerousProtocol(scheme) => {
                write!(f, "Dangerous protocol blocked: {}", scheme)
            }
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 危险协议列表
const DANGEROUS_SCHEMES: &[&str] = &["javascript", "data", "file", "vbscript", "about", "blob"];

/// Validate a destination URL.
///
/// Rejects empty input, script-capable/local schemes, anything that is not
/// http or https, and URLs `url::Url` cannot parse.
pub fn validate_url(url: &str) -> Result<(), UrlValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    let parsed = Url::parse(url).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    let scheme = parsed.scheme();
    if DANGEROUS_SCHEMES.contains(&scheme) {
        return Err(UrlValidationError::DangerousProtocol(format!(
            "{}:",
            scheme
        )));
    }

    if scheme != "http" && scheme != "https" {
        return Err(UrlValidationError::InvalidProtocol(format!("{}:", scheme)));
    }

    // http(s) URL 必须有 host
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::InvalidFormat(
            "missing host".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("https://example.com/path?query=1").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(validate_url("https://line.me/R/ti/p/@example").is_ok());
    }

    #[test]
    fn test_dangerous_schemes() {
        assert!(matches!(
            validate_url("javascript:alert(1)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            validate_url("data:text/html,<script>alert(1)</script>"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            validate_url("vbscript:msgbox(1)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
    }

    #[test]
    fn test_non_http_schemes() {
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(UrlValidationError::InvalidProtocol(_))
        ));
        assert!(matches!(
            validate_url("mailto:test@example.com"),
            Err(UrlValidationError::InvalidProtocol(_))
        ));
        // Messaging deep links must be expressed as https:// web links
        assert!(matches!(
            validate_url("tg://resolve?domain=example"),
            Err(UrlValidationError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn test_empty_url() {
        assert!(matches!(validate_url(""), Err(UrlValidationError::EmptyUrl)));
        assert!(matches!(
            validate_url("   "),
            Err(UrlValidationError::EmptyUrl)
        ));
    }

    #[test]
    fn test_invalid_format() {
        // No scheme at all
        assert!(matches!(
            validate_url("example.com"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_url("http://"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_case_insensitive_scheme() {
        assert!(matches!(
            validate_url("JAVASCRIPT:alert(1)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(validate_url("HTTP://example.com").is_ok());
        assert!(validate_url("HTTPS://example.com").is_ok());
    }
}
