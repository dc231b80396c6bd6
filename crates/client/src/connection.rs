//! HTTP transport to the session server

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use thiserror::Error;
use tracing::debug;

use tinychat_common::{
    ChatMessage, ConnectRequest, ConnectResponse, CreateSessionResponse, Route,
    SendMessageRequest, CREATOR_HEADER,
};

use crate::config::ConnectionSettings;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session not found")]
    NotFound,
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("server response did not include a token")]
    MissingToken,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }
}

/// The three session operations the chat loop depends on.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Joins `code` as `username` and returns the bearer token.
    async fn connect(&self, code: &str, username: &str) -> Result<String, ApiError>;

    async fn send(&self, code: &str, token: &str, text: &str) -> Result<(), ApiError>;

    /// Full message list in server order.
    async fn list(&self, code: &str) -> Result<Vec<ChatMessage>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    http: Client,
    base_url: Url,
}

impl HttpSessionClient {
    pub fn new(settings: &ConnectionSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", settings.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(settings.base_url.clone()));
        }

        let http = Client::builder()
            .user_agent(concat!("tinychat/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout())
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, route: Route<'_>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(route.segments());
        }
        url
    }

    /// Creates a new session owned by `creator` and returns its code.
    pub async fn create_session(&self, creator: &str) -> Result<String, ApiError> {
        let resp = self.http
            .post(self.endpoint(Route::Create))
            .header(CREATOR_HEADER, creator)
            .send()
            .await?;
        let resp = expect_status(resp, &[StatusCode::CREATED, StatusCode::OK], false).await?;
        let created: CreateSessionResponse = resp.json().await?;
        Ok(created.session_id)
    }

    /// Deletes a session. The server only honours this for the creator's token.
    pub async fn destroy_session(&self, code: &str, token: &str) -> Result<(), ApiError> {
        let resp = self.http
            .delete(self.endpoint(Route::Destroy(code)))
            .bearer_auth(token)
            .send()
            .await?;
        expect_status(resp, &[StatusCode::NO_CONTENT, StatusCode::OK], true).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionApi for HttpSessionClient {
    async fn connect(&self, code: &str, username: &str) -> Result<String, ApiError> {
        let resp = self.http
            .post(self.endpoint(Route::Connect(code)))
            .json(&ConnectRequest { username: username.to_string() })
            .send()
            .await?;
        let resp = expect_status(resp, &[StatusCode::OK], true).await?;
        let body: ConnectResponse = resp.json().await?;

        match body.token {
            Some(token) if !token.is_empty() => {
                debug!(session = %code, user = %username, "Obtained session token");
                Ok(token)
            }
            _ => Err(ApiError::MissingToken),
        }
    }

    async fn send(&self, code: &str, token: &str, text: &str) -> Result<(), ApiError> {
        let resp = self.http
            .post(self.endpoint(Route::Messages(code)))
            .bearer_auth(token)
            .json(&SendMessageRequest { text: text.to_string() })
            .send()
            .await?;
        expect_status(resp, &[StatusCode::OK, StatusCode::NO_CONTENT], false).await?;
        Ok(())
    }

    async fn list(&self, code: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let resp = self.http
            .get(self.endpoint(Route::Messages(code)))
            .send()
            .await?;
        let resp = expect_status(resp, &[StatusCode::OK], true).await?;
        Ok(resp.json().await?)
    }
}

/// Maps a response onto the error taxonomy. 404 becomes `NotFound` only for
/// endpoints where it means the session is gone.
async fn expect_status(
    resp: Response,
    accepted: &[StatusCode],
    not_found_is_session: bool,
) -> Result<Response, ApiError> {
    let status = resp.status();
    if accepted.contains(&status) {
        return Ok(resp);
    }
    if not_found_is_session && status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Server { status: status.as_u16(), body })
}
