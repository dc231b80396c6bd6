//! Joining a session: prompt, advisory name check, connect, retry

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::connection::{ApiError, SessionApi};
use crate::console::{LineSource, Transcript};

/// A joined session. The token is fixed once issued.
#[derive(Debug, Clone)]
pub struct Session {
    pub code: String,
    pub username: String,
    token: String,
}

impl Session {
    pub fn new(code: impl Into<String>, username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            username: username.into(),
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Debug, Clone, Default)]
pub struct HandshakeOptions {
    /// Used for the first attempt instead of prompting.
    pub username: Option<String>,
    /// Used for the first attempt instead of prompting.
    pub code: Option<String>,
    pub warn_on_name_collision: bool,
    /// Abandons the handshake, including any request in flight.
    pub interrupt: CancellationToken,
}

/// Prompts until the server hands out a token. Returns `None` when the
/// operator ends input or the interrupt fires.
pub async fn establish<A, L>(
    api: &A,
    input: &mut L,
    transcript: &dyn Transcript,
    mut options: HandshakeOptions,
) -> Option<Session>
where
    A: SessionApi + ?Sized,
    L: LineSource + ?Sized,
{
    loop {
        let username = match options.username.take() {
            Some(username) => username,
            None => input.prompt("Username: ").await?,
        };
        let code = match options.code.take() {
            Some(code) => code,
            None => input.prompt("Session code: ").await?,
        };
        let (username, code) = (username.trim(), code.trim());

        if username.is_empty() || code.is_empty() {
            transcript.notice("Username and session code are both required.");
            continue;
        }

        if options.warn_on_name_collision {
            match unless_interrupted(&options.interrupt, name_in_use(api, code, username)).await? {
                Ok(true) => {
                    let answer = input
                        .prompt(&format!(
                            "The name '{}' already appears in this session's messages. Pick a different name? (y/n): ",
                            username
                        ))
                        .await?;
                    if answer.trim().to_lowercase().starts_with('y') {
                        continue;
                    }
                }
                Ok(false) => {}
                Err(ApiError::NotFound) => {
                    transcript.notice("Session not found. Try again.");
                    continue;
                }
                Err(e) => {
                    transcript.notice(&format!("Warning: could not list messages before connecting: {}", e));
                }
            }
        }

        match unless_interrupted(&options.interrupt, api.connect(code, username)).await? {
            Ok(token) => {
                info!(session = %code, user = %username, "Joined session");
                transcript.notice("Connected successfully!");
                return Some(Session::new(code, username, token));
            }
            Err(ApiError::NotFound) => {
                transcript.notice("Session not found. Try again.");
            }
            Err(ApiError::MissingToken) => {
                transcript.error("invalid server response (token missing)");
            }
            Err(e) => {
                debug!(session = %code, error = %e, "Connect failed");
                transcript.error(&format!("could not connect: {}", e));
            }
        }
    }
}

async fn unless_interrupted<F: Future>(interrupt: &CancellationToken, request: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = interrupt.cancelled() => {
            debug!("Handshake interrupted");
            None
        }
        output = request => Some(output),
    }
}

/// Whether `username` has already posted in the session. Only a hint:
/// names are not reserved server-side.
async fn name_in_use<A: SessionApi + ?Sized>(
    api: &A,
    code: &str,
    username: &str,
) -> Result<bool, ApiError> {
    let history = api.list(code).await?;
    Ok(history.iter().any(|m| m.sender == username))
}
