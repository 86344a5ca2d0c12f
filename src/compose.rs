//! Outbound message construction
//!
//! Builds the minimal header block plus body that the provider's
//! `messages.send` and `drafts.create` endpoints accept in their `raw` field.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;

use crate::errors::{AppError, AppResult};

const MAX_SUBJECT_CHARS: usize = 500;

/// Message composed from caller input
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}

impl OutboundMessage {
    /// Validate header fields and assemble the message
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `to` or `body` is blank, `subject` is outside
    ///   1..500 characters, or any header field contains a line break
    pub fn new(
        to: &str,
        subject: &str,
        body: &str,
        cc: Option<&str>,
        bcc: Option<&str>,
    ) -> AppResult<Self> {
        let to = to.trim();
        if to.is_empty() {
            return Err(AppError::invalid("to must not be empty"));
        }
        let subject = subject.trim();
        let subject_len = subject.chars().count();
        if subject_len == 0 || subject_len > MAX_SUBJECT_CHARS {
            return Err(AppError::invalid(format!(
                "subject must be 1..{MAX_SUBJECT_CHARS} characters"
            )));
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::invalid("body must not be empty"));
        }
        let cc = cc.map(str::trim).filter(|v| !v.is_empty());
        let bcc = bcc.map(str::trim).filter(|v| !v.is_empty());

        validate_header_value(to, "to")?;
        validate_header_value(subject, "subject")?;
        if let Some(cc) = cc {
            validate_header_value(cc, "cc")?;
        }
        if let Some(bcc) = bcc {
            validate_header_value(bcc, "bcc")?;
        }

        Ok(Self {
            to: to.to_owned(),
            subject: subject.to_owned(),
            body: body.to_owned(),
            cc: cc.map(str::to_owned),
            bcc: bcc.map(str::to_owned),
        })
    }

    /// Header lines, blank separator, then the body, joined by `\n`
    pub fn to_message_text(&self) -> String {
        let mut lines = vec![
            format!("To: {}", self.to),
            format!("Subject: {}", self.subject),
        ];
        if let Some(cc) = &self.cc {
            lines.push(format!("Cc: {cc}"));
        }
        if let Some(bcc) = &self.bcc {
            lines.push(format!("Bcc: {bcc}"));
        }
        lines.push(String::new());
        lines.push(self.body.clone());
        lines.join("\n")
    }

    /// URL-safe base64 (padded) of [`Self::to_message_text`]
    pub fn encode_raw(&self) -> String {
        URL_SAFE.encode(self.to_message_text().as_bytes())
    }
}

/// Reject CR/LF so caller text cannot inject extra headers
pub fn validate_header_value(value: &str, field: &str) -> AppResult<()> {
    if value.contains(['\r', '\n']) {
        return Err(AppError::invalid(format!(
            "{field} must not contain line breaks"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE;

    use super::OutboundMessage;

    #[test]
    fn reply_encodes_exact_message_text() {
        let msg = OutboundMessage::new("a@example.com", "Re: X", "ok", None, None).expect("valid");
        assert_eq!(msg.to_message_text(), "To: a@example.com\nSubject: Re: X\n\nok");
        assert_eq!(
            msg.encode_raw(),
            URL_SAFE.encode("To: a@example.com\nSubject: Re: X\n\nok")
        );
    }

    #[test]
    fn optional_headers_follow_subject() {
        let msg = OutboundMessage::new(
            "a@example.com",
            "Hi",
            "body",
            Some("c@example.com"),
            Some("  "),
        )
        .expect("valid");
        assert_eq!(
            msg.to_message_text(),
            "To: a@example.com\nSubject: Hi\nCc: c@example.com\n\nbody"
        );
    }

    #[test]
    fn rejects_header_injection() {
        let err = OutboundMessage::new("a@example.com", "Hi\r\nBcc: evil@example.com", "x", None, None)
            .expect_err("must fail");
        assert!(err.to_string().contains("subject must not contain line breaks"));

        assert!(OutboundMessage::new("a@example.com\nX: y", "Hi", "x", None, None).is_err());
    }

    #[test]
    fn rejects_blank_required_fields() {
        assert!(OutboundMessage::new("  ", "Hi", "x", None, None).is_err());
        assert!(OutboundMessage::new("a@example.com", " ", "x", None, None).is_err());
        assert!(OutboundMessage::new("a@example.com", "Hi", "\n", None, None).is_err());
        assert!(OutboundMessage::new("a@example.com", &"s".repeat(501), "x", None, None).is_err());
    }

    #[test]
    fn encoding_is_url_safe() {
        let msg = OutboundMessage::new("a@example.com", "???>>>", "~~~", None, None).expect("valid");
        let raw = msg.encode_raw();
        assert!(!raw.contains('+') && !raw.contains('/'));
    }
}
