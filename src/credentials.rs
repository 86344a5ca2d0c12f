//! Bearer credential acquisition
//!
//! The mailbox client never embeds interactive I/O. It asks an injected
//! [`CredentialProvider`] for a secret before every request, so the host
//! decides whether that comes from the environment, a file maintained by an
//! external refresher, or anything else.

use std::path::PathBuf;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::CredentialSource;
use crate::errors::{AppError, AppResult};

/// Capability that yields a bearer token or fails
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Acquire a bearer credential for one request
    async fn acquire(&self) -> AppResult<SecretString>;
}

/// Token fixed at startup
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn acquire(&self) -> AppResult<SecretString> {
        Ok(self.0.clone())
    }
}

/// Token file re-read on every acquisition
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CredentialProvider for TokenFile {
    async fn acquire(&self) -> AppResult<SecretString> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Credential(format!(
                "cannot read token file '{}': {e}",
                self.path.display()
            ))
        })?;
        let token = content.trim();
        if token.is_empty() {
            return Err(AppError::Credential(format!(
                "token file '{}' is empty",
                self.path.display()
            )));
        }
        debug!(path = %self.path.display(), "loaded access token from file");
        Ok(SecretString::new(token.into()))
    }
}

/// No credential configured
pub struct NoCredential;

#[async_trait]
impl CredentialProvider for NoCredential {
    async fn acquire(&self) -> AppResult<SecretString> {
        Err(AppError::Credential(
            "no access token configured; set GMAIL_MCP_ACCESS_TOKEN or GMAIL_MCP_ACCESS_TOKEN_FILE"
                .to_owned(),
        ))
    }
}

/// Build the provider matching the configured source
pub fn from_source(source: &CredentialSource) -> Box<dyn CredentialProvider> {
    match source {
        CredentialSource::Static(token) => Box::new(StaticToken::new(token.clone())),
        CredentialSource::File(path) => Box::new(TokenFile::new(path.clone())),
        CredentialSource::Missing => Box::new(NoCredential),
    }
}

/// Reject tokens that cannot be carried in an `Authorization` header
pub fn header_safe(token: &SecretString) -> AppResult<&str> {
    let raw = token.expose_secret();
    if raw.is_empty() || raw.chars().any(|ch| ch.is_ascii_control() || ch == ' ') {
        return Err(AppError::Credential(
            "access token contains whitespace or control characters".to_owned(),
        ));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::{ExposeSecret, SecretString};

    use super::{CredentialProvider, NoCredential, StaticToken, TokenFile, header_safe};

    #[tokio::test]
    async fn static_token_is_returned_verbatim() {
        let provider = StaticToken::new(SecretString::new("abc123".into()));
        let token = provider.acquire().await.expect("token");
        assert_eq!(token.expose_secret(), "abc123");
    }

    #[tokio::test]
    async fn missing_credential_reports_remediation() {
        let err = NoCredential.acquire().await.expect_err("must fail");
        assert_eq!(err.code(), "credential_error");
        assert!(err.to_string().contains("GMAIL_MCP_ACCESS_TOKEN"));
    }

    #[tokio::test]
    async fn token_file_is_trimmed_and_reread() {
        let path = std::env::temp_dir().join(format!("gmail-mcp-token-{}", uuid::Uuid::new_v4()));
        {
            let mut file = std::fs::File::create(&path).expect("create token file");
            writeln!(file, "  first-token  ").expect("write token");
        }
        let provider = TokenFile::new(path.clone());
        assert_eq!(provider.acquire().await.expect("token").expose_secret(), "first-token");

        std::fs::write(&path, "second-token\n").expect("rewrite token");
        assert_eq!(provider.acquire().await.expect("token").expose_secret(), "second-token");

        std::fs::remove_file(&path).expect("cleanup");
        assert!(provider.acquire().await.is_err());
    }

    #[test]
    fn header_safe_rejects_embedded_newlines() {
        let token = SecretString::new("abc\r\nX-Injected: 1".into());
        assert!(header_safe(&token).is_err());
        let token = SecretString::new("ya29.valid-token".into());
        assert_eq!(header_safe(&token).expect("valid"), "ya29.valid-token");
    }
}
