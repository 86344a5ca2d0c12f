//! Provider-cursor pagination
//!
//! The server keeps no cursor state. Continuation tokens are the provider's
//! own opaque `nextPageToken` values, forwarded to the caller and accepted
//! back verbatim on the next call.

use crate::errors::{AppError, AppResult};

/// Maximum accepted continuation token length
pub const MAX_PAGE_TOKEN_LEN: usize = 512;

/// One page of a provider listing
///
/// `next_page_token` is present exactly when the provider reported more
/// results; empty provider tokens are treated as absent.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
    /// Provider's approximate total, when reported
    pub result_size_estimate: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(
        items: Vec<T>,
        next_page_token: Option<String>,
        result_size_estimate: Option<u64>,
    ) -> Self {
        Self {
            items,
            next_page_token: next_page_token.filter(|t| !t.is_empty()),
            result_size_estimate,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }

    /// Reported estimate, or the page size when the provider omitted it
    pub fn estimated_total(&self) -> u64 {
        self.result_size_estimate
            .unwrap_or(self.items.len() as u64)
    }
}

/// Validate a caller-supplied continuation token
///
/// Surrounding whitespace is trimmed; an empty token means "first page".
///
/// # Errors
///
/// - `InvalidInput` if the token is too long or contains whitespace or
///   control characters
pub fn validate_page_token(raw: Option<&str>) -> AppResult<Option<String>> {
    let Some(token) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if token.chars().count() > MAX_PAGE_TOKEN_LEN {
        return Err(AppError::invalid(format!(
            "page_token must be at most {MAX_PAGE_TOKEN_LEN} characters"
        )));
    }
    if token.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err(AppError::invalid(
            "page_token must not contain whitespace or control characters",
        ));
    }
    Ok(Some(token.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::{MAX_PAGE_TOKEN_LEN, Page, validate_page_token};

    #[test]
    fn empty_provider_token_means_no_more_results() {
        let page = Page::new(vec![1, 2], Some(String::new()), Some(2));
        assert!(!page.has_more());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn estimate_falls_back_to_page_size() {
        let page = Page::new(vec!["a", "b", "c"], Some("tok".to_owned()), None);
        assert!(page.has_more());
        assert_eq!(page.estimated_total(), 3);
    }

    #[test]
    fn blank_page_token_is_first_page() {
        assert_eq!(validate_page_token(None).expect("ok"), None);
        assert_eq!(validate_page_token(Some("   ")).expect("ok"), None);
        assert_eq!(
            validate_page_token(Some(" tok123 ")).expect("ok").as_deref(),
            Some("tok123")
        );
    }

    #[test]
    fn rejects_oversized_or_spaced_tokens() {
        let long = "a".repeat(MAX_PAGE_TOKEN_LEN + 1);
        assert!(validate_page_token(Some(&long)).is_err());
        let err = validate_page_token(Some("tok en")).expect_err("must fail");
        assert!(err.to_string().contains("page_token"));
    }
}
