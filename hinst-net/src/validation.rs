// hinst-net/src/validation.rs
use hinst_common::error::{HinstError, Result};
use url::Url;

/// Validates a URL, ensuring it uses the HTTPS scheme. Plain `http` passes only
/// when `allow_insecure` is set; any other scheme is always rejected.
pub fn validate_url(url_str: &str, allow_insecure: bool) -> Result<()> {
    let url = Url::parse(url_str).map_err(|e| {
        HinstError::ValidationError(format!("Failed to parse URL '{url_str}': {e}"))
    })?;
    match url.scheme() {
        "https" => Ok(()),
        "http" if allow_insecure => {
            tracing::debug!("Allowing insecure URL {}", url_str);
            Ok(())
        }
        scheme => Err(HinstError::ValidationError(format!(
            "Invalid URL scheme for '{url_str}': Must be https, but got '{scheme}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_is_accepted() {
        assert!(validate_url("https://github.com/org/tool", false).is_ok());
    }

    #[test]
    fn http_needs_the_insecure_flag() {
        assert!(validate_url("http://127.0.0.1:8080/x", false).is_err());
        assert!(validate_url("http://127.0.0.1:8080/x", true).is_ok());
    }

    #[test]
    fn other_schemes_and_garbage_are_rejected() {
        assert!(validate_url("file:///etc/passwd", true).is_err());
        assert!(validate_url("ftp://example.com/tool", true).is_err());
        assert!(matches!(
            validate_url("not a url", true),
            Err(HinstError::ValidationError(_))
        ));
    }
}
