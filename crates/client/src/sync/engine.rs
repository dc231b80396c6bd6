//! Poll loop that emits each message of a session exactly once

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Cursor;
use crate::connection::{ApiError, SessionApi};
use crate::console::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncExit {
    /// The stop signal was raised by someone else.
    Stopped,
    /// The server reported the session gone; the stop signal was raised here.
    SessionRemoved,
}

pub struct SyncEngine<A: ?Sized> {
    api: Arc<A>,
    code: String,
    cursor: Cursor,
    interval: Duration,
    transcript: Arc<dyn Transcript>,
}

impl<A: SessionApi + ?Sized> SyncEngine<A> {
    pub fn new(
        api: Arc<A>,
        code: impl Into<String>,
        interval: Duration,
        transcript: Arc<dyn Transcript>,
    ) -> Self {
        Self {
            api,
            code: code.into(),
            cursor: Cursor::default(),
            interval,
            transcript,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Places the cursor at the end of the existing history.
    ///
    /// Only `NotFound` is returned as an error. Any other failure starts the
    /// cursor at zero, so history is replayed once a later poll succeeds.
    /// Messages appended between this fetch and the first poll are not
    /// distinguished from history and will not be shown.
    pub async fn prime(&mut self) -> Result<(), ApiError> {
        match self.api.list(&self.code).await {
            Ok(list) => {
                self.cursor = Cursor::at(list.len());
                debug!(session = %self.code, cursor = list.len(), "Sync cursor initialised");
                Ok(())
            }
            Err(e) if e.is_not_found() => Err(e),
            Err(e) => {
                warn!(session = %self.code, error = %e, "Initial message fetch failed; starting from the beginning");
                self.cursor = Cursor::default();
                Ok(())
            }
        }
    }

    /// Fetches the list once and writes every unseen message to the
    /// transcript. The cursor is left untouched on error.
    pub async fn poll_once(&mut self) -> Result<usize, ApiError> {
        let list = self.api.list(&self.code).await?;
        let fresh = self.cursor.unseen(&list);
        for msg in fresh {
            self.transcript.message(msg);
        }
        let emitted = fresh.len();
        self.cursor.advance_to(list.len());
        Ok(emitted)
    }

    pub async fn run(mut self, stop: CancellationToken) -> SyncExit {
        let primed = tokio::select! {
            biased;
            _ = stop.cancelled() => return SyncExit::Stopped,
            primed = self.prime() => primed,
        };
        if primed.is_err() {
            return self.session_removed(&stop);
        }

        loop {
            let polled = tokio::select! {
                biased;
                _ = stop.cancelled() => return SyncExit::Stopped,
                polled = self.poll_once() => polled,
            };

            match polled {
                Ok(0) => {}
                Ok(emitted) => {
                    debug!(session = %self.code, emitted, cursor = self.cursor().position(), "New messages");
                }
                Err(e) if e.is_not_found() => return self.session_removed(&stop),
                Err(e) => {
                    warn!(session = %self.code, error = %e, "Poll failed");
                    self.transcript.error(&format!("failed to fetch messages: {}", e));
                }
            }

            tokio::select! {
                biased;
                _ = stop.cancelled() => return SyncExit::Stopped,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    fn session_removed(&self, stop: &CancellationToken) -> SyncExit {
        info!(session = %self.code, "Session removed on the server");
        self.transcript.notice("Session was removed on the server. Stopping message sync.");
        stop.cancel();
        SyncExit::SessionRemoved
    }
}
