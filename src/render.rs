//! Response rendering
//!
//! One entry point per read operation. Each switches on [`ResponseFormat`]
//! exactly once and produces a [`RenderedDocument`]; the Markdown and JSON
//! forms carry the same fields for the same input. Confirmation messages for
//! write operations are plain Markdown.

use serde::Serialize;
use serde_json::{Value, json};

use crate::errors::{AppError, AppResult};
use crate::gmail::Label;
use crate::governor::truncate_chars;
use crate::models::ResponseFormat;
use crate::pagination::Page;
use crate::payload::{AttachmentDescriptor, CanonicalMessage, Thread};

/// Body preview length in summarization output
pub const SUMMARY_BODY_PREVIEW_CHARS: usize = 1_000;

const NO_BODY: &str = "(No body content)";

/// Rendered tool output before size governance
#[derive(Debug, Clone)]
pub enum RenderedDocument {
    Markdown(String),
    Structured(Value),
}

impl RenderedDocument {
    /// Final text; structured documents are pretty-printed JSON
    pub fn into_text(self) -> AppResult<String> {
        match self {
            Self::Markdown(text) => Ok(text),
            Self::Structured(value) => serde_json::to_string_pretty(&value)
                .map_err(|e| AppError::Internal(format!("failed to serialize response: {e}"))),
        }
    }
}

/// Draft with its normalized message
#[derive(Debug, Clone)]
pub struct DraftEntry {
    pub draft_id: String,
    pub message: CanonicalMessage,
}

#[derive(Serialize)]
struct AttachmentView<'a> {
    filename: &'a str,
    mime_type: &'a str,
    size: u64,
    attachment_id: Option<&'a str>,
}

impl<'a> From<&'a AttachmentDescriptor> for AttachmentView<'a> {
    fn from(a: &'a AttachmentDescriptor) -> Self {
        Self {
            filename: &a.filename,
            mime_type: &a.mime_type,
            size: a.size_bytes,
            attachment_id: a.attachment_id.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct MessageView<'a> {
    id: &'a str,
    thread_id: Option<&'a str>,
    subject: &'a str,
    from: &'a str,
    to: &'a str,
    cc: Option<&'a str>,
    date: &'a str,
    timestamp: Option<i64>,
    received: String,
    labels: &'a [String],
    snippet: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<Vec<AttachmentView<'a>>>,
}

fn message_view(msg: &CanonicalMessage, include_attachments: bool) -> MessageView<'_> {
    MessageView {
        id: &msg.id,
        thread_id: msg.thread_id.as_deref(),
        subject: msg.subject(),
        from: msg.from(),
        to: msg.to(),
        cc: msg.cc(),
        date: msg.date(),
        timestamp: msg.timestamp_ms,
        received: msg.received(),
        labels: &msg.labels,
        snippet: &msg.snippet,
        body: &msg.body_text,
        attachments: include_attachments
            .then(|| msg.attachments.iter().map(AttachmentView::from).collect()),
    }
}

fn structured(value: impl Serialize) -> AppResult<RenderedDocument> {
    serde_json::to_value(value)
        .map(RenderedDocument::Structured)
        .map_err(|e| AppError::Internal(format!("failed to serialize response: {e}")))
}

fn body_or_placeholder(msg: &CanonicalMessage) -> &str {
    if msg.body_text.trim().is_empty() {
        NO_BODY
    } else {
        &msg.body_text
    }
}

fn message_markdown(msg: &CanonicalMessage, include_attachments: bool) -> String {
    let mut out = format!("# Email: {}\n\n", msg.subject());
    out.push_str(&format!("**From:** {}\n", msg.from()));
    out.push_str(&format!("**To:** {}\n", msg.to()));
    if let Some(cc) = msg.cc() {
        out.push_str(&format!("**Cc:** {cc}\n"));
    }
    out.push_str(&format!("**Date:** {}\n", msg.date()));
    out.push_str(&format!("**Received:** {}\n", msg.received()));
    out.push_str(&format!("**Message ID:** {}\n", msg.id));
    if let Some(thread_id) = &msg.thread_id {
        out.push_str(&format!("**Thread ID:** {thread_id}\n"));
    }
    if !msg.labels.is_empty() {
        out.push_str(&format!("**Labels:** {}\n", msg.labels.join(", ")));
    }
    out.push_str("\n## Body\n\n");
    out.push_str(body_or_placeholder(msg));
    out.push('\n');

    if include_attachments && !msg.attachments.is_empty() {
        out.push_str("\n## Attachments\n\n");
        for a in &msg.attachments {
            out.push_str(&format!(
                "- **{}** ({}, {} bytes)\n",
                a.filename, a.mime_type, a.size_bytes
            ));
            out.push_str(&format!(
                "  - Attachment ID: {}\n",
                a.attachment_id.as_deref().unwrap_or("(inline)")
            ));
        }
    }
    out
}

/// Single message
pub fn render_message(
    msg: &CanonicalMessage,
    include_attachments: bool,
    format: ResponseFormat,
) -> AppResult<RenderedDocument> {
    match format {
        ResponseFormat::Markdown => Ok(RenderedDocument::Markdown(message_markdown(
            msg,
            include_attachments,
        ))),
        ResponseFormat::Json => structured(message_view(msg, include_attachments)),
    }
}

/// Search results page
pub fn render_search(
    query: &str,
    page: &Page<CanonicalMessage>,
    format: ResponseFormat,
) -> AppResult<RenderedDocument> {
    match format {
        ResponseFormat::Markdown => {
            let mut out = String::from("# Gmail Search Results\n\n");
            out.push_str(&format!("**Query:** `{query}`\n"));
            out.push_str(&format!(
                "**Results:** {} of approximately {} total\n\n",
                page.items.len(),
                page.estimated_total()
            ));
            for (i, msg) in page.items.iter().enumerate() {
                out.push_str(&format!("## {}. {}\n", i + 1, msg.subject()));
                out.push_str(&format!("- **From:** {}\n", msg.from()));
                out.push_str(&format!("- **To:** {}\n", msg.to()));
                out.push_str(&format!("- **Date:** {}\n", msg.date()));
                out.push_str(&format!("- **Message ID:** {}\n", msg.id));
                out.push_str(&format!("- **Snippet:** {}\n", msg.snippet));
                if !msg.attachments.is_empty() {
                    out.push_str(&format!(
                        "- **Attachments:** {}\n",
                        msg.attachment_names().join(", ")
                    ));
                }
                out.push('\n');
            }
            if let Some(token) = &page.next_page_token {
                out.push_str(&format!(
                    "\n**More results available.** Use page_token='{token}' to get the next page.\n"
                ));
            }
            Ok(RenderedDocument::Markdown(out))
        }
        ResponseFormat::Json => structured(json!({
            "query": query,
            "result_count": page.items.len(),
            "estimated_total": page.estimated_total(),
            "messages": page.items.iter().map(|m| message_view(m, true)).collect::<Vec<_>>(),
            "has_more": page.has_more(),
            "next_page_token": page.next_page_token,
        })),
    }
}

/// Conversation with every message in provider order
pub fn render_thread(thread: &Thread, format: ResponseFormat) -> AppResult<RenderedDocument> {
    match format {
        ResponseFormat::Markdown => {
            let subject = thread
                .messages
                .first()
                .map_or(crate::payload::NO_SUBJECT, CanonicalMessage::subject);
            let total = thread.messages.len();
            let mut out = format!("# Thread: {subject}\n\n");
            out.push_str(&format!("**Thread ID:** {}\n", thread.thread_id));
            out.push_str(&format!("**Messages in thread:** {total}\n\n---\n\n"));
            for (i, msg) in thread.messages.iter().enumerate() {
                out.push_str(&format!("## Message {} of {total}\n\n", i + 1));
                out.push_str(&format!("**From:** {}\n", msg.from()));
                out.push_str(&format!("**To:** {}\n", msg.to()));
                out.push_str(&format!("**Date:** {}\n", msg.date()));
                out.push_str(&format!("**Message ID:** {}\n", msg.id));
                if !msg.attachments.is_empty() {
                    out.push_str(&format!(
                        "**Attachments:** {}\n",
                        msg.attachment_names().join(", ")
                    ));
                }
                out.push_str(&format!("\n{}\n\n---\n\n", body_or_placeholder(msg)));
            }
            Ok(RenderedDocument::Markdown(out))
        }
        ResponseFormat::Json => structured(json!({
            "thread_id": thread.thread_id,
            "message_count": thread.messages.len(),
            "messages": thread.messages.iter().map(|m| message_view(m, true)).collect::<Vec<_>>(),
        })),
    }
}

/// Single draft
pub fn render_draft(draft: &DraftEntry, format: ResponseFormat) -> AppResult<RenderedDocument> {
    match format {
        ResponseFormat::Markdown => Ok(RenderedDocument::Markdown(format!(
            "**Draft ID:** {}\n\n{}",
            draft.draft_id,
            message_markdown(&draft.message, true)
        ))),
        ResponseFormat::Json => structured(json!({
            "draft_id": draft.draft_id,
            "message": message_view(&draft.message, true),
        })),
    }
}

/// Drafts page
pub fn render_drafts(page: &Page<DraftEntry>, format: ResponseFormat) -> AppResult<RenderedDocument> {
    match format {
        ResponseFormat::Markdown => {
            let mut out = String::from("# Gmail Drafts\n\n");
            out.push_str(&format!("**Count:** {}\n\n", page.items.len()));
            for (i, draft) in page.items.iter().enumerate() {
                let msg = &draft.message;
                out.push_str(&format!("## {}. {}\n", i + 1, msg.subject()));
                out.push_str(&format!("- **Draft ID:** {}\n", draft.draft_id));
                out.push_str(&format!("- **Message ID:** {}\n", msg.id));
                out.push_str(&format!("- **To:** {}\n", msg.to()));
                out.push_str(&format!("- **Snippet:** {}\n\n", msg.snippet));
            }
            if let Some(token) = &page.next_page_token {
                out.push_str(&format!(
                    "\n**More drafts available.** Use page_token='{token}' to get more.\n"
                ));
            }
            Ok(RenderedDocument::Markdown(out))
        }
        ResponseFormat::Json => structured(json!({
            "count": page.items.len(),
            "drafts": page.items.iter().map(|d| json!({
                "draft_id": d.draft_id,
                "message": message_view(&d.message, true),
            })).collect::<Vec<_>>(),
            "has_more": page.has_more(),
            "next_page_token": page.next_page_token,
        })),
    }
}

/// Label catalogue, grouped by system and user labels in Markdown
pub fn render_labels(labels: &[Label], format: ResponseFormat) -> AppResult<RenderedDocument> {
    match format {
        ResponseFormat::Markdown => {
            let mut out = String::from("# Gmail Labels\n\n");
            out.push_str(&format!("**Total:** {}\n\n", labels.len()));
            let groups = [
                ("System Labels", Some("system")),
                ("User Labels", Some("user")),
            ];
            for (title, kind) in groups {
                let members: Vec<_> = labels
                    .iter()
                    .filter(|l| l.label_type.as_deref() == kind)
                    .collect();
                if members.is_empty() {
                    continue;
                }
                out.push_str(&format!("## {title}\n\n"));
                for label in members {
                    out.push_str(&format!("- **{}** (ID: {})\n", label.name, label.id));
                }
                out.push('\n');
            }
            let other: Vec<_> = labels
                .iter()
                .filter(|l| !matches!(l.label_type.as_deref(), Some("system" | "user")))
                .collect();
            if !other.is_empty() {
                out.push_str("## Other Labels\n\n");
                for label in other {
                    out.push_str(&format!("- **{}** (ID: {})\n", label.name, label.id));
                }
                out.push('\n');
            }
            Ok(RenderedDocument::Markdown(out))
        }
        ResponseFormat::Json => structured(json!({
            "total": labels.len(),
            "labels": labels,
        })),
    }
}

/// Summarization bundle; always Markdown
pub fn render_summary(
    query: &str,
    page: &Page<CanonicalMessage>,
    include_body: bool,
) -> String {
    let total = page.items.len();
    let mut out = String::from("# Emails for Summarization\n\n");
    out.push_str(&format!("**Search Query:** `{query}`\n"));
    out.push_str(&format!(
        "**Emails Retrieved:** {total} of approximately {} total\n",
        page.estimated_total()
    ));
    out.push_str("**Note:** Please provide a concise summary of these emails.\n\n---\n\n");

    for (i, msg) in page.items.iter().enumerate() {
        out.push_str(&format!("## Email {}/{total}\n\n", i + 1));
        out.push_str(&format!("**Subject:** {}\n", msg.subject()));
        out.push_str(&format!("**From:** {}\n", msg.from()));
        out.push_str(&format!("**To:** {}\n", msg.to()));
        out.push_str(&format!("**Date:** {}\n", msg.date()));
        out.push_str(&format!("**Snippet:** {}\n", msg.snippet));
        if include_body && !msg.body_text.trim().is_empty() {
            let (preview, cut) = truncate_chars(&msg.body_text, SUMMARY_BODY_PREVIEW_CHARS);
            out.push_str(&format!(
                "\n**Content:**\n{preview}{}\n",
                if cut { "..." } else { "" }
            ));
        }
        if !msg.attachments.is_empty() {
            out.push_str(&format!(
                "**Attachments:** {}\n",
                msg.attachment_names().join(", ")
            ));
        }
        out.push_str("\n---\n\n");
    }

    if let Some(token) = &page.next_page_token {
        out.push_str(&format!(
            "**More emails available.** Use page_token='{token}' to continue.\n"
        ));
    }
    out
}

/// Send confirmation; `reply_to` is the thread the caller asked to reply in
pub fn sent_confirmation(
    id: &str,
    thread_id: Option<&str>,
    reply_to: Option<&str>,
    to: &str,
    subject: &str,
) -> String {
    let mut out = format!(
        "✅ Email sent successfully!\n\n**Message ID:** {id}\n**Thread ID:** {}\n**To:** {to}\n**Subject:** {subject}\n",
        thread_id.unwrap_or(crate::payload::UNKNOWN)
    );
    if let Some(reply_to) = reply_to {
        out.push_str(&format!("\n(Sent as reply in thread {reply_to})"));
    }
    out
}

pub fn draft_saved_confirmation(
    verb: &str,
    draft_id: &str,
    message_id: &str,
    to: &str,
    subject: &str,
) -> String {
    format!(
        "📝 Draft {verb} successfully!\n\n**Draft ID:** {draft_id}\n**Message ID:** {message_id}\n**To:** {to}\n**Subject:** {subject}\n\nThe draft has been saved and can be edited or sent from Gmail.\n"
    )
}

pub fn draft_sent_confirmation(draft_id: &str, id: &str, thread_id: Option<&str>) -> String {
    format!(
        "✅ Draft sent successfully!\n\n**Draft ID:** {draft_id}\n**Message ID:** {id}\n**Thread ID:** {}\n",
        thread_id.unwrap_or(crate::payload::UNKNOWN)
    )
}

pub fn label_created_confirmation(label: &Label) -> String {
    format!(
        "✅ Label created successfully!\n\n**Label Name:** {}\n**Label ID:** {}\n",
        label.name, label.id
    )
}

pub fn labels_modified_confirmation(message_id: &str, labels: &[String]) -> String {
    let current = if labels.is_empty() {
        "(none)".to_owned()
    } else {
        labels.join(", ")
    };
    format!("✅ Labels modified successfully!\n\n**Message ID:** {message_id}\n**Current Labels:** {current}\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        DraftEntry, RenderedDocument, render_drafts, render_labels, render_message,
        render_search, render_summary, render_thread, sent_confirmation,
    };
    use crate::gmail::Label;
    use crate::models::ResponseFormat;
    use crate::pagination::Page;
    use crate::payload::{AttachmentDescriptor, CanonicalMessage, Thread};

    fn message(id: &str, subject: Option<&str>, body: &str) -> CanonicalMessage {
        let mut headers = BTreeMap::new();
        headers.insert("From".to_owned(), "alice@example.com".to_owned());
        headers.insert("To".to_owned(), "bob@example.com".to_owned());
        headers.insert("Date".to_owned(), "Mon, 1 Jan 2024 10:00:00 +0000".to_owned());
        if let Some(subject) = subject {
            headers.insert("Subject".to_owned(), subject.to_owned());
        }
        CanonicalMessage {
            id: id.to_owned(),
            thread_id: Some("t1".to_owned()),
            headers,
            labels: vec!["INBOX".to_owned()],
            snippet: "snip".to_owned(),
            body_text: body.to_owned(),
            attachments: vec![AttachmentDescriptor {
                filename: "a.pdf".to_owned(),
                mime_type: "application/pdf".to_owned(),
                size_bytes: 10,
                attachment_id: Some("att1".to_owned()),
            }],
            timestamp_ms: Some(1_704_103_200_000),
        }
    }

    fn text(doc: RenderedDocument) -> String {
        doc.into_text().expect("renders")
    }

    #[test]
    fn missing_subject_renders_default_in_both_formats() {
        let msg = message("m1", None, "hi");
        let md = text(render_message(&msg, true, ResponseFormat::Markdown).expect("ok"));
        assert!(md.starts_with("# Email: (No Subject)\n"));

        let json = render_message(&msg, true, ResponseFormat::Json).expect("ok");
        let RenderedDocument::Structured(value) = json else {
            panic!("expected structured document");
        };
        assert_eq!(value["subject"], "(No Subject)");
    }

    #[test]
    fn markdown_and_json_carry_the_same_fields() {
        let msg = message("m42", Some("Quarterly"), "numbers");
        let md = text(render_message(&msg, true, ResponseFormat::Markdown).expect("ok"));
        let RenderedDocument::Structured(json) =
            render_message(&msg, true, ResponseFormat::Json).expect("ok")
        else {
            panic!("expected structured document");
        };
        for field in ["subject", "from", "to", "date", "id"] {
            let value = json[field].as_str().expect("string field");
            assert!(md.contains(value), "markdown lacks {field}={value}");
        }
        assert_eq!(json["attachments"][0]["attachment_id"], "att1");
        assert!(md.contains("- **a.pdf** (application/pdf, 10 bytes)\n  - Attachment ID: att1"));
    }

    #[test]
    fn attachments_can_be_omitted() {
        let msg = message("m1", Some("S"), "b");
        let md = text(render_message(&msg, false, ResponseFormat::Markdown).expect("ok"));
        assert!(!md.contains("## Attachments"));
        let RenderedDocument::Structured(json) =
            render_message(&msg, false, ResponseFormat::Json).expect("ok")
        else {
            panic!("expected structured document");
        };
        assert!(json.get("attachments").is_none());
    }

    #[test]
    fn empty_body_uses_placeholder() {
        let msg = message("m1", Some("S"), "  ");
        let md = text(render_message(&msg, true, ResponseFormat::Markdown).expect("ok"));
        assert!(md.contains("## Body\n\n(No body content)\n"));
    }

    #[test]
    fn search_markdown_includes_continuation_hint() {
        let page = Page::new(vec![message("m1", Some("Hello"), "b")], Some("tok123".to_owned()), Some(40));
        let md = text(render_search("is:unread", &page, ResponseFormat::Markdown).expect("ok"));
        assert!(md.contains("**Query:** `is:unread`"));
        assert!(md.contains("**Results:** 1 of approximately 40 total"));
        assert!(md.contains("## 1. Hello\n"));
        assert!(md.contains("Use page_token='tok123' to get the next page."));
    }

    #[test]
    fn search_json_reports_pagination_state() {
        let page = Page::new(vec![message("m1", Some("Hello"), "b")], None, None);
        let RenderedDocument::Structured(json) =
            render_search("in:inbox", &page, ResponseFormat::Json).expect("ok")
        else {
            panic!("expected structured document");
        };
        assert_eq!(json["result_count"], 1);
        assert_eq!(json["estimated_total"], 1);
        assert_eq!(json["has_more"], false);
        assert!(json["next_page_token"].is_null());
    }

    #[test]
    fn thread_lists_messages_in_order() {
        let thread = Thread {
            thread_id: "t1".to_owned(),
            messages: vec![message("m1", Some("Plan"), "one"), message("m2", Some("Re: Plan"), "two")],
        };
        let md = text(render_thread(&thread, ResponseFormat::Markdown).expect("ok"));
        assert!(md.starts_with("# Thread: Plan\n"));
        let first = md.find("## Message 1 of 2").expect("first");
        let second = md.find("## Message 2 of 2").expect("second");
        assert!(first < second);
    }

    #[test]
    fn summary_truncates_long_bodies() {
        let long = "x".repeat(1_500);
        let page = Page::new(vec![message("m1", Some("Long"), &long)], None, Some(1));
        let out = render_summary("label:work", &page, true);
        assert!(out.contains(&format!("**Content:**\n{}...\n", "x".repeat(1_000))));
        assert!(!out.contains(&"x".repeat(1_001)));
        assert!(out.contains("## Email 1/1"));

        let without = render_summary("label:work", &page, false);
        assert!(!without.contains("**Content:**"));
    }

    #[test]
    fn drafts_markdown_lists_ids() {
        let page = Page::new(
            vec![DraftEntry { draft_id: "r-1".to_owned(), message: message("m1", Some("Draft"), "") }],
            Some("next".to_owned()),
            None,
        );
        let md = text(render_drafts(&page, ResponseFormat::Markdown).expect("ok"));
        assert!(md.contains("- **Draft ID:** r-1"));
        assert!(md.contains("Use page_token='next' to get more."));
    }

    #[test]
    fn labels_are_grouped_by_type() {
        let labels = vec![
            Label {
                id: "INBOX".to_owned(),
                name: "INBOX".to_owned(),
                label_type: Some("system".to_owned()),
                label_list_visibility: None,
                message_list_visibility: None,
                messages_total: None,
                messages_unread: None,
            },
            Label {
                id: "Label_1".to_owned(),
                name: "Receipts".to_owned(),
                label_type: Some("user".to_owned()),
                label_list_visibility: None,
                message_list_visibility: None,
                messages_total: None,
                messages_unread: None,
            },
        ];
        let md = text(render_labels(&labels, ResponseFormat::Markdown).expect("ok"));
        let system = md.find("## System Labels").expect("system");
        let user = md.find("## User Labels").expect("user");
        assert!(system < user);
        assert!(md.contains("- **Receipts** (ID: Label_1)"));

        let RenderedDocument::Structured(json) =
            render_labels(&labels, ResponseFormat::Json).expect("ok")
        else {
            panic!("expected structured document");
        };
        assert_eq!(json["labels"][0]["type"], "system");
    }

    #[test]
    fn reply_confirmation_names_the_requested_thread() {
        let plain = sent_confirmation("s1", Some("t9"), None, "a@example.com", "Hi");
        assert!(plain.ends_with("**Subject:** Hi\n"));
        assert!(!plain.contains("Sent as reply"));

        let reply = sent_confirmation("s1", Some("T1"), Some("T1"), "a@example.com", "Re: Hi");
        assert!(reply.contains("**Thread ID:** T1\n"));
        assert!(reply.ends_with("\n(Sent as reply in thread T1)"));
    }
}
