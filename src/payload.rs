//! Message payload normalization
//!
//! Turns the provider's recursive part tree into a flat [`CanonicalMessage`]:
//! first-wins header map, best-effort plain text body and attachment
//! descriptors. Missing optional fields never fail normalization; only a part
//! tree deeper than [`MAX_PART_DEPTH`] is rejected as malformed.

use std::collections::BTreeMap;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::DateTime;
use serde::Deserialize;
use tracing::warn;

use crate::errors::{AppError, AppResult};

/// Deepest part nesting accepted before the payload is treated as malformed
pub const MAX_PART_DEPTH: usize = 64;

/// Display default for a missing `Subject` header
pub const NO_SUBJECT: &str = "(No Subject)";
/// Display default for other missing headers
pub const UNKNOWN: &str = "Unknown";
/// Media type assumed for parts that do not declare one
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Base64url decoder that accepts padded and unpadded input
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Message as returned by `users.messages.get` (format `full`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    pub thread_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
    pub snippet: Option<String>,
    pub payload: Option<MessagePart>,
    pub internal_date: Option<EpochMillis>,
}

/// One node of the MIME part tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    pub mime_type: Option<String>,
    pub filename: Option<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// Raw header pair in provider order
#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Inline body data or a reference to separately stored attachment data
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: u64,
    pub data: Option<String>,
}

/// `internalDate` arrives as a decimal string, but tolerate a bare number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EpochMillis {
    Text(String),
    Number(i64),
}

impl EpochMillis {
    fn as_millis(&self) -> Option<i64> {
        match self {
            Self::Text(s) => s.trim().parse().ok(),
            Self::Number(n) => Some(*n),
        }
    }
}

/// Attachment metadata discovered in the part tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Needed to fetch the content; absent when the provider inlined the data
    pub attachment_id: Option<String>,
}

/// Normalized, provider-agnostic view of one message
#[derive(Debug, Clone, Default)]
pub struct CanonicalMessage {
    pub id: String,
    pub thread_id: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub labels: Vec<String>,
    pub snippet: String,
    pub body_text: String,
    pub attachments: Vec<AttachmentDescriptor>,
    pub timestamp_ms: Option<i64>,
}

impl CanonicalMessage {
    /// Exact, case-sensitive header lookup; empty values count as absent
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn subject(&self) -> &str {
        self.header("Subject").unwrap_or(NO_SUBJECT)
    }

    pub fn from(&self) -> &str {
        self.header("From").unwrap_or(UNKNOWN)
    }

    pub fn to(&self) -> &str {
        self.header("To").unwrap_or(UNKNOWN)
    }

    pub fn cc(&self) -> Option<&str> {
        self.header("Cc")
    }

    pub fn date(&self) -> &str {
        self.header("Date").unwrap_or(UNKNOWN)
    }

    /// Provider receive time as `YYYY-MM-DD HH:MM:SS UTC`
    pub fn received(&self) -> String {
        self.timestamp_ms
            .map(format_timestamp)
            .unwrap_or_else(|| UNKNOWN.to_owned())
    }

    pub fn attachment_names(&self) -> Vec<&str> {
        self.attachments.iter().map(|a| a.filename.as_str()).collect()
    }
}

/// Conversation as returned by `users.threads.get`
#[derive(Debug, Clone)]
pub struct Thread {
    pub thread_id: String,
    pub messages: Vec<CanonicalMessage>,
}

/// Normalize a raw provider message
///
/// # Errors
///
/// - `Malformed` if the part tree nests deeper than [`MAX_PART_DEPTH`]
pub fn normalize(raw: RawMessage) -> AppResult<CanonicalMessage> {
    let payload = raw.payload.unwrap_or_default();
    let attachments = discover_attachments(&payload)?;

    let mut headers = BTreeMap::new();
    for header in &payload.headers {
        headers
            .entry(header.name.clone())
            .or_insert_with(|| header.value.clone());
    }

    Ok(CanonicalMessage {
        body_text: extract_body_text(&payload),
        id: raw.id,
        thread_id: raw.thread_id,
        headers,
        labels: raw.label_ids,
        snippet: raw.snippet.unwrap_or_default(),
        attachments,
        timestamp_ms: raw.internal_date.as_ref().and_then(EpochMillis::as_millis),
    })
}

/// Best-effort plain text body
///
/// Looks only at the immediate children for the first `text/plain` part that
/// carries inline data, then falls back to the payload's own inline data.
/// An empty string is a valid result.
pub fn extract_body_text(payload: &MessagePart) -> String {
    let from_child = payload.parts.iter().find_map(|part| {
        (part.mime_type.as_deref() == Some("text/plain"))
            .then(|| inline_data(part))
            .flatten()
    });

    match from_child.or_else(|| inline_data(payload)) {
        Some(data) => match decode_base64url(data) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(error = %e, "undecodable body data; treating body as empty");
                String::new()
            }
        },
        None => String::new(),
    }
}

fn inline_data(part: &MessagePart) -> Option<&str> {
    part.body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .filter(|d| !d.is_empty())
}

/// Collect every part below the payload root with a non-empty filename, in
/// pre-order
///
/// The root's direct children are depth 1. Uses an explicit stack so adversarial nesting cannot exhaust the call
/// stack.
///
/// # Errors
///
/// - `Malformed` if any part sits deeper than [`MAX_PART_DEPTH`]
pub fn discover_attachments(root: &MessagePart) -> AppResult<Vec<AttachmentDescriptor>> {
    let mut found = Vec::new();
    let mut stack: Vec<(&MessagePart, usize)> =
        root.parts.iter().rev().map(|child| (child, 1)).collect();

    while let Some((part, depth)) = stack.pop() {
        if depth > MAX_PART_DEPTH {
            return Err(AppError::Malformed(format!(
                "message part tree exceeds maximum depth of {MAX_PART_DEPTH}"
            )));
        }

        if let Some(filename) = part.filename.as_deref().filter(|f| !f.is_empty()) {
            let body = part.body.as_ref();
            found.push(AttachmentDescriptor {
                filename: filename.to_owned(),
                mime_type: part
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_owned()),
                size_bytes: body.map_or(0, |b| b.size),
                attachment_id: body.and_then(|b| b.attachment_id.clone()),
            });
        }

        // reversed so the first child is popped next
        for child in part.parts.iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    Ok(found)
}

/// Decode base64url data, padded or not
///
/// # Errors
///
/// - `Malformed` if the data is not valid base64url
pub fn decode_base64url(data: &str) -> AppResult<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    URL_SAFE_LENIENT
        .decode(compact.as_bytes())
        .map_err(|e| AppError::Malformed(format!("invalid base64url data: {e}")))
}

/// Render epoch milliseconds as a UTC display string
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::fixtures::{b64, message_json};
    use super::{
        MAX_PART_DEPTH, MessagePart, NO_SUBJECT, RawMessage, decode_base64url,
        discover_attachments, extract_body_text, format_timestamp, normalize,
    };

    fn parse(value: serde_json::Value) -> RawMessage {
        serde_json::from_value(value).expect("valid raw message")
    }

    #[test]
    fn normalizes_full_message() {
        let msg = normalize(parse(message_json("m1", Some("Hello"), "Body text"))).expect("ok");
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.thread_id.as_deref(), Some("t-m1"));
        assert_eq!(msg.subject(), "Hello");
        assert_eq!(msg.from(), "Alice <alice@example.com>");
        assert_eq!(msg.body_text, "Body text");
        assert_eq!(msg.labels, vec!["INBOX", "UNREAD"]);
        assert_eq!(msg.received(), "2024-01-01 10:00:00 UTC");
        assert_eq!(msg.attachment_names(), vec!["report.pdf"]);
        assert_eq!(msg.attachments[0].attachment_id.as_deref(), Some("ANGjdJ8"));
    }

    #[test]
    fn child_plain_text_wins_over_top_level_data() {
        let payload: MessagePart = serde_json::from_value(json!({
            "mimeType": "multipart/alternative",
            "body": {"data": b64("top level")},
            "parts": [
                {"mimeType": "text/html", "body": {"data": b64("<p>html</p>")}},
                {"mimeType": "text/plain", "body": {"data": b64("from child")}}
            ]
        }))
        .expect("valid part");
        assert_eq!(extract_body_text(&payload), "from child");
    }

    #[test]
    fn skips_plain_part_without_data() {
        let payload: MessagePart = serde_json::from_value(json!({
            "parts": [
                {"mimeType": "text/plain", "body": {"size": 0}},
                {"mimeType": "text/plain", "body": {"data": b64("second")}}
            ]
        }))
        .expect("valid part");
        assert_eq!(extract_body_text(&payload), "second");
    }

    #[test]
    fn falls_back_to_top_level_then_empty() {
        let single: MessagePart =
            serde_json::from_value(json!({"mimeType": "text/plain", "body": {"data": b64("solo")}}))
                .expect("valid part");
        assert_eq!(extract_body_text(&single), "solo");

        let nested_only: MessagePart = serde_json::from_value(json!({
            "parts": [{"mimeType": "multipart/alternative", "parts": [
                {"mimeType": "text/plain", "body": {"data": b64("too deep")}}
            ]}]
        }))
        .expect("valid part");
        assert_eq!(extract_body_text(&nested_only), "");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let data = base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            [b'o', b'k', 0xff, b'!'],
        );
        let payload: MessagePart =
            serde_json::from_value(json!({"body": {"data": data}})).expect("valid part");
        assert_eq!(extract_body_text(&payload), "ok\u{fffd}!");
    }

    #[test]
    fn discovers_attachments_at_every_depth_in_pre_order() {
        let root: MessagePart = serde_json::from_value(json!({
            "parts": [
                {"filename": "depth1.txt", "mimeType": "text/plain", "body": {"size": 1, "attachmentId": "a1"}},
                {"mimeType": "multipart/mixed", "parts": [
                    {"filename": "depth2.pdf", "mimeType": "application/pdf", "body": {"size": 2, "attachmentId": "a2"}},
                    {"mimeType": "multipart/related", "parts": [
                        {"filename": "depth3.png", "mimeType": "image/png", "body": {"size": 3, "attachmentId": "a3"}}
                    ]}
                ]},
                {"filename": "", "mimeType": "text/html", "body": {"size": 4}}
            ]
        }))
        .expect("valid part");

        let found = discover_attachments(&root).expect("ok");
        let names: Vec<_> = found.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["depth1.txt", "depth2.pdf", "depth3.png"]);
        assert_eq!(found[2].size_bytes, 3);
        assert_eq!(found[2].mime_type, "image/png");
    }

    #[test]
    fn filenamed_root_payload_is_not_an_attachment() {
        let msg = normalize(parse(json!({
            "id": "m1",
            "payload": {
                "mimeType": "application/pdf",
                "filename": "whole.pdf",
                "body": {"attachmentId": "A1", "size": 10}
            }
        })))
        .expect("ok");
        assert!(msg.attachments.is_empty());
        assert!(msg.attachment_names().is_empty());
    }

    #[test]
    fn rejects_pathologically_deep_trees() {
        let mut part = MessagePart {
            filename: Some("leaf.bin".to_owned()),
            ..MessagePart::default()
        };
        for _ in 0..=MAX_PART_DEPTH {
            part = MessagePart {
                parts: vec![part],
                ..MessagePart::default()
            };
        }
        let err = discover_attachments(&part).expect_err("must fail");
        assert_eq!(err.code(), "malformed_payload");
    }

    #[test]
    fn accepts_tree_at_depth_limit() {
        let mut part = MessagePart::default();
        for _ in 0..MAX_PART_DEPTH {
            part = MessagePart {
                parts: vec![part],
                ..MessagePart::default()
            };
        }
        assert!(discover_attachments(&part).expect("ok").is_empty());
    }

    #[test]
    fn missing_fields_use_display_defaults() {
        let msg = normalize(parse(json!({"id": "bare"}))).expect("ok");
        assert_eq!(msg.subject(), NO_SUBJECT);
        assert_eq!(msg.from(), "Unknown");
        assert_eq!(msg.date(), "Unknown");
        assert_eq!(msg.received(), "Unknown");
        assert_eq!(msg.body_text, "");
        assert!(msg.cc().is_none());
    }

    #[test]
    fn duplicate_headers_keep_first_occurrence() {
        let msg = normalize(parse(json!({
            "id": "dup",
            "payload": {"headers": [
                {"name": "Subject", "value": "first"},
                {"name": "Subject", "value": "second"},
                {"name": "subject", "value": "lowercase"}
            ]}
        })))
        .expect("ok");
        assert_eq!(msg.subject(), "first");
        assert_eq!(msg.header("subject"), Some("lowercase"));
    }

    #[test]
    fn decodes_padded_and_unpadded_base64url() {
        assert_eq!(decode_base64url("aGk_").expect("ok"), b"hi?");
        assert_eq!(decode_base64url("aGk=").expect("ok"), b"hi");
        assert_eq!(decode_base64url("aGk").expect("ok"), b"hi");
        assert!(decode_base64url("***").is_err());
    }

    #[test]
    fn formats_epoch_millis_as_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(i64::MAX), "Unknown");
    }
}
