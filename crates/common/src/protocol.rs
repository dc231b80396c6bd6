//! Wire types for the session server's JSON API

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Header carrying the creator's name on session creation.
pub const CREATOR_HEADER: &str = "X-User";

/// A chat message as returned by the list endpoint.
///
/// Position in the returned list is the message's sequence number; `ts` is
/// informational only and may collide between messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "from", default)]
    pub sender: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            ts: None,
        }
    }

    pub fn sent_at(&self) -> Option<DateTime<Local>> {
        self.ts
            .and_then(|ms| Local.timestamp_millis_opt(ms).single())
    }
}

impl std::fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.sender, self.text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Endpoints exposed under `/api/sessions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Create,
    Connect(&'a str),
    Messages(&'a str),
    Destroy(&'a str),
}

impl<'a> Route<'a> {
    /// Path segments relative to the server base URL. The session code is
    /// always a single segment, so callers must percent-encode it as one.
    pub fn segments(&self) -> Vec<&'a str> {
        let mut segments = vec!["api", "sessions"];
        match *self {
            Route::Create => {}
            Route::Connect(code) => segments.extend([code, "connect"]),
            Route::Messages(code) => segments.extend([code, "messages"]),
            Route::Destroy(code) => segments.extend([code, "destroy"]),
        }
        segments
    }
}
