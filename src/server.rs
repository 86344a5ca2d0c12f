//! MCP server adapter
//!
//! Registers the 17 Gmail tools with `rmcp` and forwards each call to the
//! shared [`MailboxTools`] surface. Results are plain text on both the
//! success and failure path.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, tool, tool_handler, tool_router};

use crate::models::{
    CreateDraftInput, CreateLabelInput, DeleteLabelInput, DraftIdInput, GetAttachmentTextInput,
    GetDraftInput, GetMessageInput, GetThreadInput, ListDraftsInput, ListLabelsInput,
    MarkReadInput, ModifyLabelsInput, SearchMessagesInput, SendMessageInput,
    SummarizeEmailsInput, UpdateDraftInput,
};
use crate::tools::MailboxTools;

/// Gmail MCP server
#[derive(Clone)]
pub struct GmailMcpServer {
    tools: Arc<MailboxTools>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GmailMcpServer {
    pub fn new(tools: Arc<MailboxTools>) -> Self {
        Self {
            tools,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "gmail_search_messages",
        description = "Search Gmail messages using Gmail query syntax (from:, to:, subject:, is:unread, has:attachment, after:YYYY/MM/DD, label:). Returns sender, date, snippet and attachment names per message. Use page_token from a previous result to get the next page."
    )]
    async fn search_messages(&self, Parameters(input): Parameters<SearchMessagesInput>) -> String {
        self.tools.search_messages(input).await.into_text()
    }

    #[tool(
        name = "gmail_summarize_emails",
        description = "Fetch emails matching a query with body previews, formatted for summarization."
    )]
    async fn summarize_emails(
        &self,
        Parameters(input): Parameters<SummarizeEmailsInput>,
    ) -> String {
        self.tools.summarize_emails(input).await.into_text()
    }

    #[tool(
        name = "gmail_get_message",
        description = "Retrieve a message with headers, plain text body, labels and attachment metadata."
    )]
    async fn get_message(&self, Parameters(input): Parameters<GetMessageInput>) -> String {
        self.tools.get_message(input).await.into_text()
    }

    #[tool(
        name = "gmail_get_thread",
        description = "Retrieve every message of a conversation thread in order."
    )]
    async fn get_thread(&self, Parameters(input): Parameters<GetThreadInput>) -> String {
        self.tools.get_thread(input).await.into_text()
    }

    #[tool(
        name = "gmail_get_attachment_text",
        description = "Download an attachment and extract its text. Supports text/plain, application/pdf and Word documents; other types return a placeholder."
    )]
    async fn get_attachment_text(
        &self,
        Parameters(input): Parameters<GetAttachmentTextInput>,
    ) -> String {
        self.tools.get_attachment_text(input).await.into_text()
    }

    #[tool(
        name = "gmail_send_message",
        description = "Send a plain text email. Pass thread_id to reply within an existing thread."
    )]
    async fn send_message(&self, Parameters(input): Parameters<SendMessageInput>) -> String {
        self.tools.send_message(input).await.into_text()
    }

    #[tool(
        name = "gmail_create_draft",
        description = "Save a plain text email as a draft without sending it."
    )]
    async fn create_draft(&self, Parameters(input): Parameters<CreateDraftInput>) -> String {
        self.tools.create_draft(input).await.into_text()
    }

    #[tool(name = "gmail_get_draft", description = "Retrieve a draft and its message.")]
    async fn get_draft(&self, Parameters(input): Parameters<GetDraftInput>) -> String {
        self.tools.get_draft(input).await.into_text()
    }

    #[tool(
        name = "gmail_update_draft",
        description = "Replace the recipients, subject and body of an existing draft."
    )]
    async fn update_draft(&self, Parameters(input): Parameters<UpdateDraftInput>) -> String {
        self.tools.update_draft(input).await.into_text()
    }

    #[tool(name = "gmail_send_draft", description = "Send an existing draft.")]
    async fn send_draft(&self, Parameters(input): Parameters<DraftIdInput>) -> String {
        self.tools.send_draft(input).await.into_text()
    }

    #[tool(
        name = "gmail_list_drafts",
        description = "List drafts with recipients and snippets. Use page_token to get more."
    )]
    async fn list_drafts(&self, Parameters(input): Parameters<ListDraftsInput>) -> String {
        self.tools.list_drafts(input).await.into_text()
    }

    #[tool(name = "gmail_delete_draft", description = "Permanently delete a draft.")]
    async fn delete_draft(&self, Parameters(input): Parameters<DraftIdInput>) -> String {
        self.tools.delete_draft(input).await.into_text()
    }

    #[tool(
        name = "gmail_list_labels",
        description = "List system and user labels with their IDs."
    )]
    async fn list_labels(&self, Parameters(input): Parameters<ListLabelsInput>) -> String {
        self.tools.list_labels(input).await.into_text()
    }

    #[tool(
        name = "gmail_create_label",
        description = "Create a user label. Use '/' in the name to nest labels."
    )]
    async fn create_label(&self, Parameters(input): Parameters<CreateLabelInput>) -> String {
        self.tools.create_label(input).await.into_text()
    }

    #[tool(
        name = "gmail_delete_label",
        description = "Delete a user label. System labels cannot be deleted."
    )]
    async fn delete_label(&self, Parameters(input): Parameters<DeleteLabelInput>) -> String {
        self.tools.delete_label(input).await.into_text()
    }

    #[tool(
        name = "gmail_modify_message_labels",
        description = "Add and/or remove labels on a message, e.g. add STARRED or remove INBOX to archive."
    )]
    async fn modify_message_labels(
        &self,
        Parameters(input): Parameters<ModifyLabelsInput>,
    ) -> String {
        self.tools.modify_message_labels(input).await.into_text()
    }

    #[tool(
        name = "gmail_mark_message_read",
        description = "Mark a message as read or unread."
    )]
    async fn mark_message_read(&self, Parameters(input): Parameters<MarkReadInput>) -> String {
        self.tools.mark_message_read(input).await.into_text()
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for GmailMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build()).with_instructions(
            "Gmail tools: search, read threads and attachments, send mail, manage drafts and labels. Every tool returns text; failures are reported as a one-line message starting with 'Error' or 'Invalid input'.",
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::GmailMcpServer;
    use crate::gmail::testing::client_for;
    use crate::tools::{MailboxTools, TOOL_NAMES};

    #[test]
    fn registers_every_dispatchable_tool() {
        let server = GmailMcpServer::new(Arc::new(MailboxTools::new(client_for(
            "http://127.0.0.1:1",
        ))));
        let mut registered: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        registered.sort();

        let mut expected: Vec<String> = TOOL_NAMES.iter().map(|n| (*n).to_owned()).collect();
        expected.sort();
        assert_eq!(registered, expected);
    }

    #[test]
    fn published_schemas_carry_typed_fields() {
        let server = GmailMcpServer::new(Arc::new(MailboxTools::new(client_for(
            "http://127.0.0.1:1",
        ))));
        let thread = server
            .tool_router
            .list_all()
            .into_iter()
            .find(|tool| tool.name == "gmail_get_thread")
            .expect("thread tool registered");
        let schema = serde_json::Value::Object((*thread.input_schema).clone());

        assert_eq!(schema["required"], serde_json::json!(["thread_id"]));
        assert!(schema["properties"]["response_format"].is_object());
    }
}
