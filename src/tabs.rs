/// Active tab lookup and target URL validation
use url::Url;

use crate::bridge;
use crate::error::{Error, Field, Result};

pub trait ActiveTabSource {
    /// URL of the focused tab in the current window, if any.
    async fn active_url(&self) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeTabs;

impl ActiveTabSource for ChromeTabs {
    async fn active_url(&self) -> Result<Option<String>> {
        bridge::active_tab_url().await
    }
}

/// Check that the tab URL can be submitted for scraping (absolute, http or
/// https) and return it trimmed but otherwise as the browser reported it.
pub fn validate_target_url(raw: Option<&str>) -> Result<&str> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::validation(Field::Url, "No URL found in the active tab."))?;

    let url = Url::parse(raw)
        .map_err(|_| Error::validation(Field::Url, format!("Invalid URL: {}", raw)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::validation(
            Field::Url,
            format!("This page cannot be saved: {}", raw),
        ));
    }

    Ok(raw)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Tab source that always reports the same URL
    #[derive(Debug, Clone, Default)]
    pub(crate) struct FixedTab(pub Option<String>);

    impl FixedTab {
        pub(crate) fn new(url: &str) -> Self {
            FixedTab(Some(url.to_string()))
        }
    }

    impl ActiveTabSource for FixedTab {
        async fn active_url(&self) -> Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_accepts_http_and_https() {
        assert_eq!(
            validate_target_url(Some("https://example.com/a")),
            Ok("https://example.com/a")
        );
        assert!(validate_target_url(Some("http://localhost:3000/page?q=1")).is_ok());
        assert_eq!(
            validate_target_url(Some("  https://example.com  ")),
            Ok("https://example.com")
        );
    }

    #[test]
    fn test_valid_url_is_returned_unnormalized() {
        for raw in ["https://EXAMPLE.com", "https://example.com/a b", "http://example.com:80/x"] {
            assert_eq!(validate_target_url(Some(raw)), Ok(raw));
        }
    }

    #[test]
    fn test_rejects_missing_and_relative() {
        for raw in [None, Some(""), Some("   "), Some("/relative/path"), Some("example.com")] {
            let err = validate_target_url(raw).unwrap_err();
            assert_eq!(err.code(), "E303", "input {:?}", raw);
        }
    }

    #[test]
    fn test_rejects_browser_pages() {
        for raw in ["chrome://extensions", "about:blank", "file:///etc/hosts", "data:text/plain,hi"] {
            assert!(validate_target_url(Some(raw)).is_err(), "input {}", raw);
        }
    }
}
