//! HTTP client for the NoteHub API.
//!
//! Three operations are exposed through [`NotesApi`]:
//! - `GET /notes?page=&perPage=&search=` lists one page of notes
//! - `POST /notes` creates a note from a [`NoteDraft`]
//! - `DELETE /notes/{id}` removes a note and returns it
//!
//! Every request carries `Authorization: Bearer <token>` when a token is
//! configured. A missing token is left for the server to reject.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Config;
use crate::models::{Note, NoteDraft, NotesPage};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No usable response: connection failure or timeout.
    #[error("HTTP request failed: {0}")]
    Transport(#[source] BoxError),

    /// A success response whose body is not the expected JSON.
    #[error("Unexpected response body: {0}")]
    Decode(#[source] BoxError),

    #[error("Server returned {status}: {body}")]
    Http { status: u16, body: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(Box::new(e))
        } else {
            Self::Transport(Box::new(e))
        }
    }
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// 4xx responses: the server rejected the request as sent.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Transport failures and 5xx responses may succeed on a second attempt.
    /// An undecodable body fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Decode(_) => false,
            Self::Http { status, .. } => *status >= 500,
        }
    }
}

/// The remote notes operations.
#[async_trait]
pub trait NotesApi: Send + Sync {
    /// List a page of notes. `search` is sent only when non-empty.
    async fn list_notes(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<NotesPage, ClientError>;

    async fn create_note(&self, draft: &NoteDraft) -> Result<Note, ClientError>;

    async fn delete_note(&self, id: &str) -> Result<Note, ClientError>;
}

/// Query parameters for `GET /notes`.
pub fn list_query(page: u32, per_page: u32, search: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![("page", page.to_string()), ("perPage", per_page.to_string())];
    if let Some(s) = search.filter(|s| !s.is_empty()) {
        params.push(("search", s.to_string()));
    }
    params
}

/// HTTP client for the NoteHub API.
#[derive(Debug, Clone)]
pub struct NotesClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl NotesClient {
    /// Create with explicit configuration and the default transport.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            client: Client::new(),
        }
    }

    /// Create from a loaded [`Config`], applying its request timeout.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with the bearer header attached.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Decode a success body, or turn the status and body into [`ClientError::Http`].
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("NoteHub returned {}: {}", status, body);
            Err(ClientError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl NotesApi for NotesClient {
    async fn list_notes(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<NotesPage, ClientError> {
        let params = list_query(page, per_page, search);
        tracing::debug!(?params, "GET /notes");
        let response = self
            .request(Method::GET, "/notes")
            .query(&params)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn create_note(&self, draft: &NoteDraft) -> Result<Note, ClientError> {
        tracing::debug!(title = %draft.title, tag = %draft.tag, "POST /notes");
        let response = self
            .request(Method::POST, "/notes")
            .json(draft)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn delete_note(&self, id: &str) -> Result<Note, ClientError> {
        tracing::debug!(id, "DELETE /notes/{{id}}");
        let response = self
            .request(
                Method::DELETE,
                &format!("/notes/{}", urlencoding::encode(id)),
            )
            .send()
            .await?;
        self.handle_response(response).await
    }
}
