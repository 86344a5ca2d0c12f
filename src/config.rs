//! Configuration module for the Gmail bridge
//!
//! All configuration is loaded from environment variables prefixed with
//! `GMAIL_MCP_`. Only the provider endpoint, credential source, transport
//! timeout and bridge listen address are configurable; output limits are
//! fixed.

use std::env;
use std::env::VarError;
use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::errors::{AppError, AppResult};

/// Default Gmail REST root
pub const DEFAULT_API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// Where the bearer credential comes from
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Token supplied once through the environment
    Static(SecretString),
    /// Token file re-read on every call, so an external refresher can rotate it
    File(PathBuf),
    /// Nothing configured; every call reports a credential diagnostic
    Missing,
}

/// Server-wide configuration
///
/// Cloned into the tool surface via `Arc` for shared access from both
/// transport adapters.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Provider REST root without trailing slash
    pub api_base_url: String,
    /// Mailbox owner path segment (`me` for the authenticated user)
    pub user_id: String,
    /// Bearer credential source
    pub credentials: CredentialSource,
    /// Transport timeout in milliseconds
    pub http_timeout_ms: u64,
    /// Listen address for the HTTP bridge adapter
    pub bridge_bind: SocketAddr,
}

impl ServerConfig {
    /// Load all configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a variable is set but malformed. A missing
    /// access token is not an error here.
    ///
    /// # Example Environment
    ///
    /// ```text
    /// GMAIL_MCP_ACCESS_TOKEN=ya29.a0Af...
    /// GMAIL_MCP_HTTP_TIMEOUT_MS=30000
    /// GMAIL_MCP_BRIDGE_BIND=127.0.0.1:3002
    /// ```
    pub fn load_from_env() -> AppResult<Self> {
        let api_base_url = optional_env("GMAIL_MCP_API_BASE_URL")?
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        let user_id = optional_env("GMAIL_MCP_USER_ID")?.unwrap_or_else(|| "me".to_owned());

        let credentials = match (
            optional_env("GMAIL_MCP_ACCESS_TOKEN")?,
            optional_env("GMAIL_MCP_ACCESS_TOKEN_FILE")?,
        ) {
            (Some(_), Some(_)) => {
                return Err(AppError::invalid(
                    "set only one of GMAIL_MCP_ACCESS_TOKEN and GMAIL_MCP_ACCESS_TOKEN_FILE",
                ));
            }
            (Some(token), None) => CredentialSource::Static(SecretString::new(token.into())),
            (None, Some(path)) => CredentialSource::File(PathBuf::from(path)),
            (None, None) => CredentialSource::Missing,
        };

        let bridge_bind = match optional_env("GMAIL_MCP_BRIDGE_BIND")? {
            Some(raw) => parse_socket_addr(&raw)?,
            None => SocketAddr::from(([127, 0, 0, 1], 3002)),
        };

        Ok(Self {
            api_base_url: normalize_base_url(&api_base_url)?,
            user_id: validate_user_id(user_id)?,
            credentials,
            http_timeout_ms: parse_u64_env("GMAIL_MCP_HTTP_TIMEOUT_MS", 30_000)?,
            bridge_bind,
        })
    }
}

/// Parse a bridge listen address such as `127.0.0.1:3002`
pub fn parse_socket_addr(raw: &str) -> AppResult<SocketAddr> {
    raw.trim()
        .parse::<SocketAddr>()
        .map_err(|_| AppError::invalid(format!("invalid listen address '{raw}'")))
}

/// Require an http(s) URL and strip trailing slashes
fn normalize_base_url(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(AppError::invalid(format!(
            "GMAIL_MCP_API_BASE_URL must be an http(s) URL, got '{raw}'"
        )));
    }
    Ok(trimmed.to_owned())
}

fn validate_user_id(user_id: String) -> AppResult<String> {
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '@' | '.' | '_' | '-' | '+'));
    if !valid {
        return Err(AppError::invalid(format!(
            "invalid GMAIL_MCP_USER_ID '{user_id}'"
        )));
    }
    Ok(user_id)
}

/// Read an optional environment variable; blank values count as unset
fn optional_env(key: &str) -> AppResult<Option<String>> {
    match env::var(key) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v.trim().to_owned())),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a `u64` environment variable with default fallback
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `u64`.
fn parse_u64_env(key: &str, default: u64) -> AppResult<u64> {
    match optional_env(key)? {
        Some(v) => v.parse::<u64>().map_err(|_| {
            AppError::InvalidInput(format!("invalid u64 environment variable {key}: '{v}'"))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_base_url, parse_socket_addr, validate_user_id};

    #[test]
    fn base_url_drops_trailing_slashes() {
        assert_eq!(
            normalize_base_url("https://gmail.googleapis.com/gmail/v1//").expect("valid url"),
            "https://gmail.googleapis.com/gmail/v1"
        );
    }

    #[test]
    fn base_url_rejects_other_schemes() {
        let err = normalize_base_url("ftp://example.com").expect_err("must fail");
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn user_id_rejects_path_separators() {
        assert!(validate_user_id("me".to_owned()).is_ok());
        assert!(validate_user_id("user@example.com".to_owned()).is_ok());
        assert!(validate_user_id("../admin".to_owned()).is_err());
        assert!(validate_user_id(String::new()).is_err());
    }

    #[test]
    fn socket_addr_parses_host_and_port() {
        let addr = parse_socket_addr(" 0.0.0.0:8080 ").expect("valid addr");
        assert_eq!(addr.port(), 8080);
        assert!(parse_socket_addr("localhost").is_err());
    }
}
