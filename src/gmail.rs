//! Gmail REST transport
//!
//! Thin authenticated wrapper over the provider's JSON API. Every request
//! acquires a fresh credential, is bounded by the configured timeout and
//! maps failures onto [`AppError`]:
//!
//! - no response obtained → `Transport`
//! - non-2xx status → `Provider` with the decoded `error.message` if any
//! - undecodable 2xx body → `Malformed`

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::credentials::{self, CredentialProvider};
use crate::errors::{AppError, AppResult};
use crate::ids::ResourceId;
use crate::models::{LabelListVisibility, MessageListVisibility};
use crate::payload::RawMessage;

/// Reference returned by list, send and modify endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    pub thread_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
}

/// `users.messages.list` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: Option<u64>,
}

/// `users.threads.get` response
#[derive(Debug, Clone, Deserialize)]
pub struct RawThread {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

/// `users.messages.attachments.get` response
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentData {
    pub data: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// Draft resource; list responses carry only message ids
#[derive(Debug, Clone, Deserialize)]
pub struct RawDraft {
    pub id: String,
    #[serde(default)]
    pub message: RawMessage,
}

/// `users.drafts.list` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftList {
    #[serde(default)]
    pub drafts: Vec<RawDraft>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: Option<u64>,
}

/// Label resource
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub label_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_list_visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_list_visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_unread: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: Vec<Label>,
}

/// Authenticated Gmail API client
pub struct GmailClient {
    http: reqwest::Client,
    /// `{api_base_url}/users/{user_id}`
    user_root: String,
    credentials: Box<dyn CredentialProvider>,
}

impl GmailClient {
    /// Build a client from server configuration
    ///
    /// # Errors
    ///
    /// - `Internal` if the HTTP client cannot be constructed
    pub fn from_config(config: &ServerConfig) -> AppResult<Self> {
        Self::new(
            &config.api_base_url,
            &config.user_id,
            Duration::from_millis(config.http_timeout_ms),
            credentials::from_source(&config.credentials),
        )
    }

    pub fn new(
        api_base_url: &str,
        user_id: &str,
        timeout: Duration,
        credentials: Box<dyn CredentialProvider>,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            user_root: format!(
                "{}/users/{}",
                api_base_url.trim_end_matches('/'),
                urlencoding::encode(user_id)
            ),
            credentials,
        })
    }

    /// Issue one authenticated request relative to the mailbox root
    ///
    /// `endpoint` starts with `/`, e.g. `/messages/{id}`. An empty success
    /// body (as returned by deletes) yields `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> AppResult<Value> {
        let token = self.credentials.acquire().await?;
        let token = credentials::header_safe(&token)?;

        debug!(%method, endpoint, "gmail request");
        let mut builder = self
            .http
            .request(method.clone(), format!("{}{}", self.user_root, endpoint))
            .bearer_auth(token);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = provider_message(&text);
            warn!(%method, endpoint, status = status.as_u16(), "gmail request rejected");
            return Err(AppError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| AppError::Malformed(format!("response from {endpoint} is not JSON: {e}")))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> AppResult<T> {
        let value = self.request(method, endpoint, query, body).await?;
        serde_json::from_value(value)
            .map_err(|e| AppError::Malformed(format!("unexpected response from {endpoint}: {e}")))
    }

    pub async fn list_messages(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> AppResult<MessageList> {
        let mut params = vec![("q", query.to_owned()), ("maxResults", max_results.to_string())];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_owned()));
        }
        self.call(Method::GET, "/messages", &params, None).await
    }

    pub async fn get_message(&self, id: &ResourceId) -> AppResult<RawMessage> {
        let endpoint = format!("/messages/{}", id.path_segment());
        self.call(Method::GET, &endpoint, &[("format", "full".to_owned())], None)
            .await
    }

    pub async fn get_thread(&self, id: &ResourceId) -> AppResult<RawThread> {
        let endpoint = format!("/threads/{}", id.path_segment());
        self.call(Method::GET, &endpoint, &[("format", "full".to_owned())], None)
            .await
    }

    pub async fn get_attachment(
        &self,
        message_id: &ResourceId,
        attachment_id: &ResourceId,
    ) -> AppResult<AttachmentData> {
        let endpoint = format!(
            "/messages/{}/attachments/{}",
            message_id.path_segment(),
            attachment_id.path_segment()
        );
        self.call(Method::GET, &endpoint, &[], None).await
    }

    /// Send an encoded message, optionally into an existing thread
    pub async fn send_message(
        &self,
        raw: String,
        thread_id: Option<&ResourceId>,
    ) -> AppResult<MessageRef> {
        let body = raw_message(raw, thread_id);
        self.call(Method::POST, "/messages/send", &[], Some(&body))
            .await
    }

    pub async fn create_draft(
        &self,
        raw: String,
        thread_id: Option<&ResourceId>,
    ) -> AppResult<RawDraft> {
        let body = json!({ "message": raw_message(raw, thread_id) });
        self.call(Method::POST, "/drafts", &[], Some(&body)).await
    }

    pub async fn update_draft(
        &self,
        draft_id: &ResourceId,
        raw: String,
        thread_id: Option<&ResourceId>,
    ) -> AppResult<RawDraft> {
        let body = json!({ "id": draft_id.as_str(), "message": raw_message(raw, thread_id) });
        let endpoint = format!("/drafts/{}", draft_id.path_segment());
        self.call(Method::PUT, &endpoint, &[], Some(&body)).await
    }

    pub async fn get_draft(&self, draft_id: &ResourceId) -> AppResult<RawDraft> {
        let endpoint = format!("/drafts/{}", draft_id.path_segment());
        self.call(Method::GET, &endpoint, &[("format", "full".to_owned())], None)
            .await
    }

    pub async fn send_draft(&self, draft_id: &ResourceId) -> AppResult<MessageRef> {
        let body = json!({ "id": draft_id.as_str() });
        self.call(Method::POST, "/drafts/send", &[], Some(&body))
            .await
    }

    pub async fn list_drafts(
        &self,
        max_results: u32,
        page_token: Option<&str>,
    ) -> AppResult<DraftList> {
        let mut params = vec![("maxResults", max_results.to_string())];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_owned()));
        }
        self.call(Method::GET, "/drafts", &params, None).await
    }

    pub async fn delete_draft(&self, draft_id: &ResourceId) -> AppResult<()> {
        let endpoint = format!("/drafts/{}", draft_id.path_segment());
        self.request(Method::DELETE, &endpoint, &[], None).await?;
        Ok(())
    }

    pub async fn list_labels(&self) -> AppResult<Vec<Label>> {
        let list: LabelList = self.call(Method::GET, "/labels", &[], None).await?;
        Ok(list.labels)
    }

    pub async fn create_label(
        &self,
        name: &str,
        label_list_visibility: LabelListVisibility,
        message_list_visibility: MessageListVisibility,
    ) -> AppResult<Label> {
        let body = json!({
            "name": name,
            "labelListVisibility": label_list_visibility,
            "messageListVisibility": message_list_visibility,
        });
        self.call(Method::POST, "/labels", &[], Some(&body)).await
    }

    pub async fn delete_label(&self, label_id: &ResourceId) -> AppResult<()> {
        let endpoint = format!("/labels/{}", label_id.path_segment());
        self.request(Method::DELETE, &endpoint, &[], None).await?;
        Ok(())
    }

    /// Add and remove labels in one call; empty lists are omitted
    pub async fn modify_message(
        &self,
        message_id: &ResourceId,
        add: &[ResourceId],
        remove: &[ResourceId],
    ) -> AppResult<MessageRef> {
        let mut body = serde_json::Map::new();
        if !add.is_empty() {
            body.insert("addLabelIds".to_owned(), id_array(add));
        }
        if !remove.is_empty() {
            body.insert("removeLabelIds".to_owned(), id_array(remove));
        }
        let endpoint = format!("/messages/{}/modify", message_id.path_segment());
        self.call(Method::POST, &endpoint, &[], Some(&Value::Object(body)))
            .await
    }
}

fn raw_message(raw: String, thread_id: Option<&ResourceId>) -> Value {
    let mut message = json!({ "raw": raw });
    if let Some(thread_id) = thread_id {
        message["threadId"] = Value::String(thread_id.as_str().to_owned());
    }
    message
}

fn id_array(ids: &[ResourceId]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| Value::String(id.as_str().to_owned()))
            .collect(),
    )
}

fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Transport("request timed out".to_owned())
    } else {
        AppError::Transport(e.to_string())
    }
}

/// Decode `{"error": {"message": ...}}` from a failure body
fn provider_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::String(s) => Some(s.clone()),
        error => Some(
            error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_owned(),
        ),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::GmailClient;
    use crate::credentials::StaticToken;

    pub const TEST_TOKEN: &str = "test-token";

    /// Client pointed at a mock server root
    pub fn client_for(base_url: &str) -> GmailClient {
        GmailClient::new(
            base_url,
            "me",
            Duration::from_secs(5),
            Box::new(StaticToken::new(SecretString::new(TEST_TOKEN.into()))),
        )
        .expect("client builds")
    }
}
