//! Opaque provider identifier validation
//!
//! Message, thread, draft, label and attachment identifiers are assigned by
//! the provider and never interpreted here. They are, however, interpolated
//! into request paths, so every identifier that arrives from a caller is
//! checked against the provider's URL-safe alphabet first.

use std::fmt;

use crate::errors::{AppError, AppResult};

/// Maximum identifier length; attachment ids are long base64url strings
pub const MAX_ID_LEN: usize = 2_048;

/// Caller-supplied provider identifier
///
/// # Format
///
/// One or more characters of `[A-Za-z0-9_-]`, e.g. `18c2f0a9b3d4e5f6`,
/// `r-4471022831337346537`, `Label_12`, `INBOX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId(String);

impl ResourceId {
    /// Parse and validate an identifier for the named field
    ///
    /// Surrounding whitespace is trimmed before validation.
    pub fn parse(raw: &str, field: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_ID_LEN {
            return Err(AppError::invalid(format!(
                "{field} must be 1..{MAX_ID_LEN} characters"
            )));
        }
        if !trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        {
            return Err(AppError::invalid(format!(
                "{field} must match [A-Za-z0-9_-]+"
            )));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier encoded for use as a single path segment
    pub fn path_segment(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a list of label identifiers, rejecting the first invalid entry
pub fn parse_label_ids(raw: &[String], field: &str) -> AppResult<Vec<ResourceId>> {
    raw.iter()
        .map(|id| {
            ResourceId::parse(id, field).map_err(|_| {
                AppError::invalid(format!(
                    "{field} contains invalid label id '{id}'; ids must match [A-Za-z0-9_-]+"
                ))
            })
        })
        .collect()
}
