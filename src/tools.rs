//! Tool dispatch surface
//!
//! Transport-agnostic implementation of every tool. Each operation validates
//! its input, talks to the provider through [`GmailClient`], renders the
//! result and passes it through the size governor. Failures never escape as
//! errors: they become a one-line diagnostic inside a [`ToolOutcome`].
//!
//! Both the MCP server and the HTTP bridge call into [`MailboxTools`]; the
//! bridge resolves tool names through [`MailboxTools::dispatch`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::compose::OutboundMessage;
use crate::errors::{AppError, AppResult};
use crate::extract;
use crate::gmail::GmailClient;
use crate::governor;
use crate::ids::{self, ResourceId};
use crate::models::{
    CreateDraftInput, CreateLabelInput, DeleteLabelInput, DraftIdInput, GetAttachmentTextInput,
    GetDraftInput, GetMessageInput, GetThreadInput, ListDraftsInput, ListLabelsInput,
    MarkReadInput, ModifyLabelsInput, ResponseFormat, SearchMessagesInput, SendMessageInput,
    SummarizeEmailsInput, UpdateDraftInput,
};
use crate::pagination::{self, Page};
use crate::payload::{self, CanonicalMessage, Thread};
use crate::render::{self, DraftEntry};

/// Every tool name exposed by both adapters
pub const TOOL_NAMES: [&str; 17] = [
    "gmail_search_messages",
    "gmail_summarize_emails",
    "gmail_get_message",
    "gmail_get_thread",
    "gmail_get_attachment_text",
    "gmail_send_message",
    "gmail_create_draft",
    "gmail_get_draft",
    "gmail_update_draft",
    "gmail_send_draft",
    "gmail_list_drafts",
    "gmail_delete_draft",
    "gmail_list_labels",
    "gmail_create_label",
    "gmail_delete_label",
    "gmail_modify_message_labels",
    "gmail_mark_message_read",
];

const MAX_QUERY_CHARS: usize = 500;
const MAX_LABEL_NAME_CHARS: usize = 100;
const MAX_MIME_TYPE_CHARS: usize = 255;

const NO_MESSAGES: &str = "No messages found matching the search query.";
const NO_MESSAGES_TO_SUMMARIZE: &str =
    "No messages found matching the search query. Cannot generate summary.";
const NO_DRAFTS: &str = "No drafts found.";

/// What a tool was doing, used to phrase its failure diagnostic
#[derive(Debug, Clone, Copy)]
struct Action {
    tool: &'static str,
    doing: &'static str,
    hint: Option<&'static str>,
}

const fn action(tool: &'static str, doing: &'static str, hint: Option<&'static str>) -> Action {
    Action { tool, doing, hint }
}

const SEARCH: Action = action(
    "gmail_search_messages",
    "searching Gmail",
    Some("Please check your query syntax and try again."),
);
const SUMMARIZE: Action = action(
    "gmail_summarize_emails",
    "fetching emails for summary",
    Some("Please check your query syntax."),
);
const GET_MESSAGE: Action = action(
    "gmail_get_message",
    "retrieving message",
    Some("Please verify the message ID is correct."),
);
const GET_THREAD: Action = action(
    "gmail_get_thread",
    "retrieving thread",
    Some("Please verify the thread ID is correct."),
);
const GET_ATTACHMENT: Action = action(
    "gmail_get_attachment_text",
    "downloading attachment",
    Some("Please verify the message and attachment IDs are correct."),
);
const SEND_MESSAGE: Action = action(
    "gmail_send_message",
    "sending email",
    Some("Please check recipient addresses and try again."),
);
const CREATE_DRAFT: Action = action(
    "gmail_create_draft",
    "creating draft",
    Some("Please check your input and try again."),
);
const GET_DRAFT: Action = action(
    "gmail_get_draft",
    "retrieving draft",
    Some("Please verify the draft ID is correct."),
);
const UPDATE_DRAFT: Action = action(
    "gmail_update_draft",
    "updating draft",
    Some("Please verify the draft ID and try again."),
);
const SEND_DRAFT: Action = action(
    "gmail_send_draft",
    "sending draft",
    Some("Please verify the draft ID is correct."),
);
const LIST_DRAFTS: Action = action("gmail_list_drafts", "listing drafts", None);
const DELETE_DRAFT: Action = action(
    "gmail_delete_draft",
    "deleting draft",
    Some("Please verify the draft ID is correct."),
);
const LIST_LABELS: Action = action("gmail_list_labels", "listing labels", None);
const CREATE_LABEL: Action = action(
    "gmail_create_label",
    "creating label",
    Some("The label name may already exist."),
);
const DELETE_LABEL: Action = action(
    "gmail_delete_label",
    "deleting label",
    Some("Please verify the label ID is correct."),
);
const MODIFY_LABELS: Action = action(
    "gmail_modify_message_labels",
    "modifying labels",
    Some("Please verify message and label IDs."),
);
const MARK_READ: Action = action(
    "gmail_mark_message_read",
    "marking message",
    Some("Please verify the message ID is correct."),
);
const DISPATCH: Action = action("dispatch", "dispatching tool", None);

/// Failed tool call
#[derive(Debug)]
pub struct ToolFailure {
    action: Action,
    error: AppError,
}

impl ToolFailure {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        self.error.code()
    }

    /// One-line diagnostic text
    pub fn message(&self) -> String {
        let text = match &self.error {
            AppError::InvalidInput(reason) => format!("Invalid input: {reason}"),
            AppError::Internal(e) => format!("Unexpected error: {e}"),
            e => match self.action.hint {
                Some(hint) => format!("Error {}: {e}. {hint}", self.action.doing),
                None => format!("Error {}: {e}", self.action.doing),
            },
        };
        text.replace(['\r', '\n'], " ")
    }
}

/// Result of one tool call
#[derive(Debug)]
pub enum ToolOutcome {
    Success(String),
    Failure(ToolFailure),
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(f.code()),
        }
    }

    /// Text delivered to the caller on either path
    pub fn into_text(self) -> String {
        match self {
            Self::Success(text) => text,
            Self::Failure(f) => f.message(),
        }
    }
}

fn conclude(action: Action, result: AppResult<String>) -> ToolOutcome {
    match result {
        Ok(text) => {
            debug!(tool = action.tool, chars = text.len(), "tool succeeded");
            ToolOutcome::Success(text)
        }
        Err(error) => {
            warn!(tool = action.tool, code = error.code(), error = %error, "tool failed");
            ToolOutcome::Failure(ToolFailure { action, error })
        }
    }
}

fn decode_arguments<T: DeserializeOwned>(arguments: Value) -> AppResult<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| AppError::invalid(e.to_string()))
}

/// Gmail tool implementations shared by every transport
pub struct MailboxTools {
    client: GmailClient,
}

impl MailboxTools {
    pub fn new(client: GmailClient) -> Self {
        Self { client }
    }

    /// Run a tool by name with JSON arguments
    ///
    /// Arguments are decoded through the same input types the MCP adapter
    /// uses. Unknown tool names yield an invalid-input outcome.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolOutcome {
        let tools = self;
        macro_rules! route {
            ($input:ty, $method:ident, $action:expr) => {
                match decode_arguments::<$input>(arguments) {
                    Ok(input) => tools.$method(input).await,
                    Err(e) => conclude($action, Err(e)),
                }
            };
        }

        match name {
            "gmail_search_messages" => route!(SearchMessagesInput, search_messages, SEARCH),
            "gmail_summarize_emails" => route!(SummarizeEmailsInput, summarize_emails, SUMMARIZE),
            "gmail_get_message" => route!(GetMessageInput, get_message, GET_MESSAGE),
            "gmail_get_thread" => route!(GetThreadInput, get_thread, GET_THREAD),
            "gmail_get_attachment_text" => {
                route!(GetAttachmentTextInput, get_attachment_text, GET_ATTACHMENT)
            }
            "gmail_send_message" => route!(SendMessageInput, send_message, SEND_MESSAGE),
            "gmail_create_draft" => route!(CreateDraftInput, create_draft, CREATE_DRAFT),
            "gmail_get_draft" => route!(GetDraftInput, get_draft, GET_DRAFT),
            "gmail_update_draft" => route!(UpdateDraftInput, update_draft, UPDATE_DRAFT),
            "gmail_send_draft" => route!(DraftIdInput, send_draft, SEND_DRAFT),
            "gmail_list_drafts" => route!(ListDraftsInput, list_drafts, LIST_DRAFTS),
            "gmail_delete_draft" => route!(DraftIdInput, delete_draft, DELETE_DRAFT),
            "gmail_list_labels" => route!(ListLabelsInput, list_labels, LIST_LABELS),
            "gmail_create_label" => route!(CreateLabelInput, create_label, CREATE_LABEL),
            "gmail_delete_label" => route!(DeleteLabelInput, delete_label, DELETE_LABEL),
            "gmail_modify_message_labels" => {
                route!(ModifyLabelsInput, modify_message_labels, MODIFY_LABELS)
            }
            "gmail_mark_message_read" => route!(MarkReadInput, mark_message_read, MARK_READ),
            other => conclude(
                DISPATCH,
                Err(AppError::invalid(format!("unknown tool '{other}'"))),
            ),
        }
    }

    pub async fn search_messages(&self, input: SearchMessagesInput) -> ToolOutcome {
        conclude(SEARCH, self.search_messages_impl(input).await)
    }

    pub async fn summarize_emails(&self, input: SummarizeEmailsInput) -> ToolOutcome {
        conclude(SUMMARIZE, self.summarize_emails_impl(input).await)
    }

    pub async fn get_message(&self, input: GetMessageInput) -> ToolOutcome {
        conclude(GET_MESSAGE, self.get_message_impl(input).await)
    }

    pub async fn get_thread(&self, input: GetThreadInput) -> ToolOutcome {
        conclude(GET_THREAD, self.get_thread_impl(input).await)
    }

    pub async fn get_attachment_text(&self, input: GetAttachmentTextInput) -> ToolOutcome {
        conclude(GET_ATTACHMENT, self.get_attachment_text_impl(input).await)
    }

    pub async fn send_message(&self, input: SendMessageInput) -> ToolOutcome {
        conclude(SEND_MESSAGE, self.send_message_impl(input).await)
    }

    pub async fn create_draft(&self, input: CreateDraftInput) -> ToolOutcome {
        conclude(CREATE_DRAFT, self.create_draft_impl(input).await)
    }

    pub async fn get_draft(&self, input: GetDraftInput) -> ToolOutcome {
        conclude(GET_DRAFT, self.get_draft_impl(input).await)
    }

    pub async fn update_draft(&self, input: UpdateDraftInput) -> ToolOutcome {
        conclude(UPDATE_DRAFT, self.update_draft_impl(input).await)
    }

    pub async fn send_draft(&self, input: DraftIdInput) -> ToolOutcome {
        conclude(SEND_DRAFT, self.send_draft_impl(input).await)
    }

    pub async fn list_drafts(&self, input: ListDraftsInput) -> ToolOutcome {
        conclude(LIST_DRAFTS, self.list_drafts_impl(input).await)
    }

    pub async fn delete_draft(&self, input: DraftIdInput) -> ToolOutcome {
        conclude(DELETE_DRAFT, self.delete_draft_impl(input).await)
    }

    pub async fn list_labels(&self, input: ListLabelsInput) -> ToolOutcome {
        conclude(LIST_LABELS, self.list_labels_impl(input).await)
    }

    pub async fn create_label(&self, input: CreateLabelInput) -> ToolOutcome {
        conclude(CREATE_LABEL, self.create_label_impl(input).await)
    }

    pub async fn delete_label(&self, input: DeleteLabelInput) -> ToolOutcome {
        conclude(DELETE_LABEL, self.delete_label_impl(input).await)
    }

    pub async fn modify_message_labels(&self, input: ModifyLabelsInput) -> ToolOutcome {
        conclude(MODIFY_LABELS, self.modify_message_labels_impl(input).await)
    }

    pub async fn mark_message_read(&self, input: MarkReadInput) -> ToolOutcome {
        conclude(MARK_READ, self.mark_message_read_impl(input).await)
    }

    /// List matching ids, then fetch each message in list order
    async fn fetch_page(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> AppResult<Page<CanonicalMessage>> {
        let list = self
            .client
            .list_messages(query, max_results, page_token)
            .await?;
        let mut messages = Vec::with_capacity(list.messages.len());
        for item in &list.messages {
            let id = provider_id(&item.id)?;
            messages.push(payload::normalize(self.client.get_message(&id).await?)?);
        }
        Ok(Page::new(
            messages,
            list.next_page_token,
            list.result_size_estimate,
        ))
    }

    async fn search_messages_impl(&self, input: SearchMessagesInput) -> AppResult<String> {
        let query = validate_query(&input.query)?;
        validate_range(input.max_results, 1, 100, "max_results")?;
        let page_token = pagination::validate_page_token(input.page_token.as_deref())?;

        let page = self
            .fetch_page(&query, input.max_results, page_token.as_deref())
            .await?;
        if is_exhausted(&page) && input.response_format == ResponseFormat::Markdown {
            return Ok(NO_MESSAGES.to_owned());
        }
        let text = render::render_search(&query, &page, input.response_format)?.into_text()?;
        Ok(governor::bound(text, true))
    }

    async fn summarize_emails_impl(&self, input: SummarizeEmailsInput) -> AppResult<String> {
        let query = validate_query(&input.query)?;
        validate_range(input.max_results, 1, 50, "max_results")?;
        let page_token = pagination::validate_page_token(input.page_token.as_deref())?;

        let page = self
            .fetch_page(&query, input.max_results, page_token.as_deref())
            .await?;
        if is_exhausted(&page) {
            return Ok(NO_MESSAGES_TO_SUMMARIZE.to_owned());
        }
        let text = render::render_summary(&query, &page, input.include_body);
        Ok(governor::bound(text, true))
    }

    async fn get_message_impl(&self, input: GetMessageInput) -> AppResult<String> {
        let id = ResourceId::parse(&input.message_id, "message_id")?;
        let message = payload::normalize(self.client.get_message(&id).await?)?;
        let text = render::render_message(
            &message,
            input.include_attachments_info,
            input.response_format,
        )?
        .into_text()?;
        Ok(governor::bound(text, false))
    }

    async fn get_thread_impl(&self, input: GetThreadInput) -> AppResult<String> {
        let id = ResourceId::parse(&input.thread_id, "thread_id")?;
        let raw = self.client.get_thread(&id).await?;
        let thread = Thread {
            thread_id: raw.id,
            messages: raw
                .messages
                .into_iter()
                .map(payload::normalize)
                .collect::<AppResult<_>>()?,
        };
        let text = render::render_thread(&thread, input.response_format)?.into_text()?;
        Ok(governor::bound(text, false))
    }

    async fn get_attachment_text_impl(&self, input: GetAttachmentTextInput) -> AppResult<String> {
        let message_id = ResourceId::parse(&input.message_id, "message_id")?;
        let attachment_id = ResourceId::parse(&input.attachment_id, "attachment_id")?;
        let mime_type = validate_mime_type(&input.mime_type)?;

        let attachment = self
            .client
            .get_attachment(&message_id, &attachment_id)
            .await?;
        let data = attachment
            .data
            .ok_or_else(|| AppError::Malformed("attachment response has no data".to_owned()))?;
        let bytes = payload::decode_base64url(&data)?;
        debug!(
            size = attachment.size,
            decoded = bytes.len(),
            mime_type = %mime_type,
            "extracting attachment text"
        );

        let text = tokio::task::spawn_blocking(move || extract::extract_text(&bytes, &mime_type))
            .await
            .map_err(|e| AppError::Internal(format!("attachment extraction task failed: {e}")))?;
        Ok(governor::bound(text, false))
    }

    async fn send_message_impl(&self, input: SendMessageInput) -> AppResult<String> {
        let message = OutboundMessage::new(
            &input.to,
            &input.subject,
            &input.body,
            input.cc.as_deref(),
            input.bcc.as_deref(),
        )?;
        let thread_id = optional_id(input.thread_id.as_deref(), "thread_id")?;

        let sent = self
            .client
            .send_message(message.encode_raw(), thread_id.as_ref())
            .await?;
        Ok(governor::bound(
            render::sent_confirmation(
                &sent.id,
                sent.thread_id.as_deref(),
                thread_id.as_ref().map(ResourceId::as_str),
                &message.to,
                &message.subject,
            ),
            false,
        ))
    }

    async fn create_draft_impl(&self, input: CreateDraftInput) -> AppResult<String> {
        let message = OutboundMessage::new(
            &input.to,
            &input.subject,
            &input.body,
            input.cc.as_deref(),
            input.bcc.as_deref(),
        )?;
        let thread_id = optional_id(input.thread_id.as_deref(), "thread_id")?;

        let draft = self
            .client
            .create_draft(message.encode_raw(), thread_id.as_ref())
            .await?;
        Ok(governor::bound(
            render::draft_saved_confirmation(
                "created",
                &draft.id,
                &draft.message.id,
                &message.to,
                &message.subject,
            ),
            false,
        ))
    }

    async fn get_draft_impl(&self, input: GetDraftInput) -> AppResult<String> {
        let id = ResourceId::parse(&input.draft_id, "draft_id")?;
        let draft = self.client.get_draft(&id).await?;
        let entry = DraftEntry {
            draft_id: draft.id,
            message: payload::normalize(draft.message)?,
        };
        let text = render::render_draft(&entry, input.response_format)?.into_text()?;
        Ok(governor::bound(text, false))
    }

    async fn update_draft_impl(&self, input: UpdateDraftInput) -> AppResult<String> {
        let id = ResourceId::parse(&input.draft_id, "draft_id")?;
        let message = OutboundMessage::new(
            &input.to,
            &input.subject,
            &input.body,
            input.cc.as_deref(),
            input.bcc.as_deref(),
        )?;
        let thread_id = optional_id(input.thread_id.as_deref(), "thread_id")?;

        let draft = self
            .client
            .update_draft(&id, message.encode_raw(), thread_id.as_ref())
            .await?;
        Ok(governor::bound(
            render::draft_saved_confirmation(
                "updated",
                &draft.id,
                &draft.message.id,
                &message.to,
                &message.subject,
            ),
            false,
        ))
    }

    async fn send_draft_impl(&self, input: DraftIdInput) -> AppResult<String> {
        let id = ResourceId::parse(&input.draft_id, "draft_id")?;
        let sent = self.client.send_draft(&id).await?;
        Ok(governor::bound(
            render::draft_sent_confirmation(id.as_str(), &sent.id, sent.thread_id.as_deref()),
            false,
        ))
    }

    async fn list_drafts_impl(&self, input: ListDraftsInput) -> AppResult<String> {
        validate_range(input.max_results, 1, 100, "max_results")?;
        let page_token = pagination::validate_page_token(input.page_token.as_deref())?;

        let list = self
            .client
            .list_drafts(input.max_results, page_token.as_deref())
            .await?;
        let mut drafts = Vec::with_capacity(list.drafts.len());
        for item in &list.drafts {
            let id = provider_id(&item.id)?;
            let draft = self.client.get_draft(&id).await?;
            drafts.push(DraftEntry {
                draft_id: draft.id,
                message: payload::normalize(draft.message)?,
            });
        }
        let page = Page::new(drafts, list.next_page_token, list.result_size_estimate);

        if is_exhausted(&page) && input.response_format == ResponseFormat::Markdown {
            return Ok(NO_DRAFTS.to_owned());
        }
        let text = render::render_drafts(&page, input.response_format)?.into_text()?;
        Ok(governor::bound(text, true))
    }

    async fn delete_draft_impl(&self, input: DraftIdInput) -> AppResult<String> {
        let id = ResourceId::parse(&input.draft_id, "draft_id")?;
        self.client.delete_draft(&id).await?;
        Ok(format!("✅ Draft {id} deleted successfully."))
    }

    async fn list_labels_impl(&self, input: ListLabelsInput) -> AppResult<String> {
        let labels = self.client.list_labels().await?;
        let text = render::render_labels(&labels, input.response_format)?.into_text()?;
        Ok(governor::bound(text, false))
    }

    async fn create_label_impl(&self, input: CreateLabelInput) -> AppResult<String> {
        let name = validate_label_name(&input.name)?;
        let label = self
            .client
            .create_label(
                &name,
                input.label_list_visibility,
                input.message_list_visibility,
            )
            .await?;
        Ok(governor::bound(
            render::label_created_confirmation(&label),
            false,
        ))
    }

    async fn delete_label_impl(&self, input: DeleteLabelInput) -> AppResult<String> {
        let id = ResourceId::parse(&input.label_id, "label_id")?;
        self.client.delete_label(&id).await?;
        Ok(format!("✅ Label {id} deleted successfully."))
    }

    async fn modify_message_labels_impl(&self, input: ModifyLabelsInput) -> AppResult<String> {
        let id = ResourceId::parse(&input.message_id, "message_id")?;
        let add = ids::parse_label_ids(
            input.add_label_ids.as_deref().unwrap_or_default(),
            "add_label_ids",
        )?;
        let remove = ids::parse_label_ids(
            input.remove_label_ids.as_deref().unwrap_or_default(),
            "remove_label_ids",
        )?;
        if add.is_empty() && remove.is_empty() {
            return Err(AppError::invalid(
                "at least one of add_label_ids or remove_label_ids must be non-empty",
            ));
        }

        let updated = self.client.modify_message(&id, &add, &remove).await?;
        Ok(governor::bound(
            render::labels_modified_confirmation(id.as_str(), &updated.label_ids),
            false,
        ))
    }

    async fn mark_message_read_impl(&self, input: MarkReadInput) -> AppResult<String> {
        let id = ResourceId::parse(&input.message_id, "message_id")?;
        let unread = ResourceId::parse("UNREAD", "label")?;
        let (add, remove, state) = if input.mark_as_read {
            (Vec::new(), vec![unread], "read")
        } else {
            (vec![unread], Vec::new(), "unread")
        };
        self.client.modify_message(&id, &add, &remove).await?;
        Ok(format!("✅ Message {id} marked as {state}."))
    }
}

/// Empty page with no continuation; a token on an empty page is still reported
fn is_exhausted<T>(page: &Page<T>) -> bool {
    page.items.is_empty() && !page.has_more()
}

/// Identifier that came from the provider rather than the caller
fn provider_id(raw: &str) -> AppResult<ResourceId> {
    ResourceId::parse(raw, "provider id").map_err(|e| AppError::Malformed(e.to_string()))
}

fn optional_id(raw: Option<&str>, field: &str) -> AppResult<Option<ResourceId>> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| ResourceId::parse(v, field))
        .transpose()
}

fn validate_range(value: u32, min: u32, max: u32, field: &str) -> AppResult<()> {
    if !(min..=max).contains(&value) {
        return Err(AppError::invalid(format!(
            "{field} must be in [{min}, {max}]"
        )));
    }
    Ok(())
}

/// Trim a free-text field and enforce its character-length bounds
fn validate_text(raw: &str, field: &str, max_chars: usize) -> AppResult<String> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > max_chars {
        return Err(AppError::invalid(format!(
            "{field} must be 1..{max_chars} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

fn validate_query(raw: &str) -> AppResult<String> {
    let query = validate_text(raw, "query", MAX_QUERY_CHARS)?;
    if query.chars().any(char::is_control) {
        return Err(AppError::invalid("query must not contain control characters"));
    }
    Ok(query)
}

fn validate_label_name(raw: &str) -> AppResult<String> {
    let name = validate_text(raw, "name", MAX_LABEL_NAME_CHARS)?;
    if name.chars().any(char::is_control) {
        return Err(AppError::invalid("name must not contain control characters"));
    }
    Ok(name)
}

fn validate_mime_type(raw: &str) -> AppResult<String> {
    let mime = validate_text(raw, "mime_type", MAX_MIME_TYPE_CHARS)?;
    if mime.chars().any(char::is_control) {
        return Err(AppError::invalid("mime_type must not contain control characters"));
    }
    Ok(mime)
}
