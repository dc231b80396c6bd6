//! Runs message sync alongside the operator's input/send loop

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SyncSettings;
use crate::connection::SessionApi;
use crate::console::{LineSource, Transcript};
use crate::handshake::Session;
use crate::sync::SyncEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// End of input or Ctrl+C.
    InputClosed,
    /// The operator typed a quit command.
    Quit,
    SessionRemoved,
}

pub struct Coordinator<A: ?Sized> {
    api: Arc<A>,
    session: Session,
    transcript: Arc<dyn Transcript>,
    settings: SyncSettings,
}

impl<A: SessionApi + ?Sized + 'static> Coordinator<A> {
    pub fn new(
        api: Arc<A>,
        session: Session,
        transcript: Arc<dyn Transcript>,
        settings: SyncSettings,
    ) -> Self {
        Self { api, session, transcript, settings }
    }

    /// Runs until the input loop ends, then stops the sync task, waiting at
    /// most the configured grace period before abandoning it.
    pub async fn run<L: LineSource + ?Sized>(self, input: &mut L) -> ShutdownReason {
        info!(session = %self.session.code, user = %self.session.username, "Chat started");
        let stop = CancellationToken::new();
        let engine = SyncEngine::new(
            self.api.clone(),
            self.session.code.clone(),
            self.settings.poll_interval(),
            self.transcript.clone(),
        );
        let mut sync_task = tokio::spawn(engine.run(stop.clone()));

        let reason = self.input_loop(input, &stop).await;
        debug!(?reason, "Input loop finished");

        stop.cancel();
        let grace = self.settings.shutdown_grace();
        match tokio::time::timeout(grace, &mut sync_task).await {
            Ok(Ok(exit)) => debug!(?exit, "Message sync stopped"),
            Ok(Err(e)) => warn!(error = %e, "Message sync task failed"),
            Err(_) => {
                warn!(?grace, "Message sync did not stop in time; abandoning it");
                sync_task.abort();
            }
        }

        reason
    }

    async fn input_loop<L: LineSource + ?Sized>(
        &self,
        input: &mut L,
        stop: &CancellationToken,
    ) -> ShutdownReason {
        loop {
            // Only the sync task can raise the signal while this loop runs.
            let line = tokio::select! {
                line = input.next_line() => line,
                _ = stop.cancelled() => return ShutdownReason::SessionRemoved,
            };
            let Some(line) = line else {
                return ShutdownReason::InputClosed;
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if is_quit_command(text) {
                return ShutdownReason::Quit;
            }

            if let Err(e) = self.api.send(&self.session.code, self.session.token(), text).await {
                warn!(session = %self.session.code, error = %e, "Send failed");
                self.transcript.error(&format!("failed to send message: {}", e));
            }
        }
    }
}

fn is_quit_command(text: &str) -> bool {
    matches!(text, "/quit" | "/exit")
}
