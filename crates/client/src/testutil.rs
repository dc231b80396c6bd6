//! In-memory doubles for the transport, input and transcript

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use tinychat_common::ChatMessage;

use crate::connection::{ApiError, SessionApi};
use crate::console::{LineSource, Transcript};

pub fn msgs(texts: &[&str]) -> Vec<ChatMessage> {
    texts.iter().map(|t| ChatMessage::new("user", *t)).collect()
}

#[derive(Debug, Clone)]
pub enum ListReply {
    Messages(Vec<ChatMessage>),
    NotFound,
    Fail(u16),
}

#[derive(Debug, Clone)]
pub enum ConnectReply {
    Token(String),
    Empty,
    NotFound,
    Fail(u16),
}

fn server_error(status: u16) -> ApiError {
    ApiError::Server { status, body: "scripted failure".to_string() }
}

/// Replays scripted replies. Once a script runs out its last entry repeats.
#[derive(Default)]
pub struct FakeApi {
    lists: Mutex<VecDeque<ListReply>>,
    last_list: Mutex<Option<ListReply>>,
    connects: Mutex<VecDeque<ConnectReply>>,
    send_statuses: Mutex<VecDeque<u16>>,
    sent: Mutex<Vec<String>>,
    connect_calls: Mutex<Vec<(String, String)>>,
    list_calls: AtomicUsize,
    connect_delay: Duration,
    send_delay: Duration,
}

impl FakeApi {
    pub fn with_lists(lists: Vec<ListReply>) -> Self {
        let api = Self::default();
        *api.lists.lock().unwrap() = lists.into();
        api
    }

    pub fn connects(self, replies: Vec<ConnectReply>) -> Self {
        *self.connects.lock().unwrap() = replies.into();
        self
    }

    /// Status codes for successive sends; sends past the end succeed.
    pub fn send_statuses(self, statuses: Vec<u16>) -> Self {
        *self.send_statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Each send completes only after `delay`.
    pub fn send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// Texts of sends that ran to completion.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn connect_calls(&self) -> Vec<(String, String)> {
        self.connect_calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionApi for FakeApi {
    async fn connect(&self, code: &str, username: &str) -> Result<String, ApiError> {
        self.connect_calls
            .lock()
            .unwrap()
            .push((code.to_string(), username.to_string()));
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        match self.connects.lock().unwrap().pop_front() {
            Some(ConnectReply::Token(token)) => Ok(token),
            Some(ConnectReply::Empty) => Err(ApiError::MissingToken),
            Some(ConnectReply::NotFound) => Err(ApiError::NotFound),
            Some(ConnectReply::Fail(status)) => Err(server_error(status)),
            None => Err(server_error(500)),
        }
    }

    async fn send(&self, _code: &str, _token: &str, text: &str) -> Result<(), ApiError> {
        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }
        self.sent.lock().unwrap().push(text.to_string());
        match self.send_statuses.lock().unwrap().pop_front() {
            None | Some(200) | Some(204) => Ok(()),
            Some(status) => Err(server_error(status)),
        }
    }

    async fn list(&self, _code: &str) -> Result<Vec<ChatMessage>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let reply = {
            let mut last = self.last_list.lock().unwrap();
            match self.lists.lock().unwrap().pop_front() {
                Some(reply) => {
                    *last = Some(reply.clone());
                    reply
                }
                None => last.clone().unwrap_or(ListReply::Messages(Vec::new())),
            }
        };

        match reply {
            ListReply::Messages(list) => Ok(list),
            ListReply::NotFound => Err(ApiError::NotFound),
            ListReply::Fail(status) => Err(server_error(status)),
        }
    }
}

/// Hands out fixed lines, then either reports end of input or never
/// returns again.
pub struct ScriptedInput {
    lines: VecDeque<String>,
    delay: Duration,
    hang_when_done: bool,
}

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            delay: Duration::ZERO,
            hang_when_done: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn hang_when_done(mut self) -> Self {
        self.hang_when_done = true;
        self
    }
}

#[async_trait]
impl LineSource for ScriptedInput {
    async fn next_line(&mut self) -> Option<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.lines.pop_front() {
            Some(line) => Some(line),
            None if self.hang_when_done => std::future::pending().await,
            None => None,
        }
    }

    async fn prompt(&mut self, _label: &str) -> Option<String> {
        self.next_line().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Message(String),
    Notice(String),
    Error(String),
}

#[derive(Default)]
pub struct RecordingTranscript {
    entries: Mutex<Vec<Entry>>,
}

impl RecordingTranscript {
    pub fn messages(&self) -> Vec<String> {
        self.collect(|e| match e {
            Entry::Message(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn notices(&self) -> Vec<String> {
        self.collect(|e| match e {
            Entry::Notice(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.collect(|e| match e {
            Entry::Error(m) => Some(m.clone()),
            _ => None,
        })
    }

    fn collect(&self, pick: impl Fn(&Entry) -> Option<String>) -> Vec<String> {
        self.entries.lock().unwrap().iter().filter_map(pick).collect()
    }
}

impl Transcript for RecordingTranscript {
    fn message(&self, msg: &ChatMessage) {
        self.entries.lock().unwrap().push(Entry::Message(msg.to_string()));
    }

    fn notice(&self, text: &str) {
        self.entries.lock().unwrap().push(Entry::Notice(text.to_string()));
    }

    fn error(&self, text: &str) {
        self.entries.lock().unwrap().push(Entry::Error(text.to_string()));
    }
}
