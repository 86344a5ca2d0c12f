//! Tool input DTOs
//!
//! Defines the argument structures for every tool. Each type derives
//! `JsonSchema` for the MCP tool listing and `Deserialize` so both transport
//! adapters decode arguments through the same definitions. Unknown fields are
//! rejected.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output format for read tools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Human-readable Markdown document
    #[default]
    Markdown,
    /// Pretty-printed JSON document
    Json,
}

/// Visibility of a label in the label list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum LabelListVisibility {
    #[default]
    LabelShow,
    LabelShowIfUnread,
    LabelHide,
}

/// Visibility of labelled messages in the message list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageListVisibility {
    #[default]
    Show,
    Hide,
}

/// Input: search messages with provider query syntax
///
/// Used by `gmail_search_messages`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchMessagesInput {
    /// Gmail search query (e.g. `from:alice is:unread`, `has:attachment after:2024/01/01`)
    pub query: String,
    /// Maximum messages to return (1..100, default 20)
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Continuation token from a previous page
    pub page_token: Option<String>,
    /// Output format (default `markdown`)
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Input: collect messages for summarization
///
/// Used by `gmail_summarize_emails`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SummarizeEmailsInput {
    /// Gmail search query selecting the messages to summarize
    pub query: String,
    /// Maximum messages to include (1..50, default 10)
    #[serde(default = "default_summary_max_results")]
    pub max_results: u32,
    /// Include a body preview for each message (default true)
    #[serde(default = "default_true")]
    pub include_body: bool,
    /// Continuation token from a previous call
    pub page_token: Option<String>,
}

/// Input: fetch one message
///
/// Used by `gmail_get_message`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetMessageInput {
    /// Provider message identifier
    pub message_id: String,
    /// Output format (default `markdown`)
    #[serde(default)]
    pub response_format: ResponseFormat,
    /// List attachment metadata (default true)
    #[serde(default = "default_true")]
    pub include_attachments_info: bool,
}

/// Input: fetch a conversation
///
/// Used by `gmail_get_thread`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetThreadInput {
    /// Provider thread identifier
    pub thread_id: String,
    /// Output format (default `markdown`)
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Input: extract attachment text
///
/// Used by `gmail_get_attachment_text`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetAttachmentTextInput {
    /// Message containing the attachment
    pub message_id: String,
    /// Attachment identifier from `gmail_get_message`
    pub attachment_id: String,
    /// Declared media type, e.g. `application/pdf` or `text/plain`
    pub mime_type: String,
}

/// Input: compose and send a message
///
/// Used by `gmail_send_message`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SendMessageInput {
    /// Recipient address(es), comma separated
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Carbon copy recipients
    pub cc: Option<String>,
    /// Blind carbon copy recipients
    pub bcc: Option<String>,
    /// Thread to reply into
    pub thread_id: Option<String>,
}

/// Input: create a draft
///
/// Used by `gmail_create_draft`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateDraftInput {
    /// Recipient address(es), comma separated
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Carbon copy recipients
    pub cc: Option<String>,
    /// Blind carbon copy recipients
    pub bcc: Option<String>,
    /// Thread the draft replies into
    pub thread_id: Option<String>,
}

/// Input: replace a draft's content
///
/// Used by `gmail_update_draft`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateDraftInput {
    /// Draft identifier
    pub draft_id: String,
    /// Recipient address(es), comma separated
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Carbon copy recipients
    pub cc: Option<String>,
    /// Blind carbon copy recipients
    pub bcc: Option<String>,
    /// Thread the draft replies into
    pub thread_id: Option<String>,
}

/// Input: fetch one draft
///
/// Used by `gmail_get_draft`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetDraftInput {
    /// Draft identifier
    pub draft_id: String,
    /// Output format (default `markdown`)
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Input: draft identifier only
///
/// Used by `gmail_send_draft` and `gmail_delete_draft`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DraftIdInput {
    /// Draft identifier
    pub draft_id: String,
}

/// Input: list drafts
///
/// Used by `gmail_list_drafts`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListDraftsInput {
    /// Maximum drafts to return (1..100, default 20)
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Continuation token from a previous page
    pub page_token: Option<String>,
    /// Output format (default `markdown`)
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Input: list labels
///
/// Used by `gmail_list_labels`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListLabelsInput {
    /// Output format (default `markdown`)
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Input: create a user label
///
/// Used by `gmail_create_label`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateLabelInput {
    /// Label name (1..100 characters); `/` nests labels
    pub name: String,
    /// Label list visibility (default `labelShow`)
    #[serde(default)]
    pub label_list_visibility: LabelListVisibility,
    /// Message list visibility (default `show`)
    #[serde(default)]
    pub message_list_visibility: MessageListVisibility,
}

/// Input: delete a user label
///
/// Used by `gmail_delete_label`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteLabelInput {
    /// Label identifier
    pub label_id: String,
}

/// Input: add/remove labels on a message
///
/// Used by `gmail_modify_message_labels`. At least one list must be
/// non-empty.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ModifyLabelsInput {
    /// Message identifier
    pub message_id: String,
    /// Label ids to add (e.g. `STARRED`, `Label_12`)
    pub add_label_ids: Option<Vec<String>>,
    /// Label ids to remove (e.g. `INBOX` to archive)
    pub remove_label_ids: Option<Vec<String>>,
}

/// Input: toggle the unread marker
///
/// Used by `gmail_mark_message_read`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MarkReadInput {
    /// Message identifier
    pub message_id: String,
    /// `true` marks read, `false` marks unread
    pub mark_as_read: bool,
}

fn default_true() -> bool {
    true
}

/// Default page size for search and draft listing
fn default_max_results() -> u32 {
    20
}

/// Default message count for summarization
///
/// Smaller than the search default since bodies are included.
fn default_summary_max_results() -> u32 {
    10
}
