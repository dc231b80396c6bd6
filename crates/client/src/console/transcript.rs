//! Chat transcript output

use tinychat_common::ChatMessage;

/// Where incoming messages and operator-facing diagnostics are written.
pub trait Transcript: Send + Sync {
    fn message(&self, msg: &ChatMessage);
    fn notice(&self, text: &str);
    fn error(&self, text: &str);
}

pub struct StdoutTranscript {
    show_timestamps: bool,
}

impl StdoutTranscript {
    pub fn new(show_timestamps: bool) -> Self {
        Self { show_timestamps }
    }
}

impl Transcript for StdoutTranscript {
    fn message(&self, msg: &ChatMessage) {
        println!("{}", format_message(msg, self.show_timestamps));
    }

    fn notice(&self, text: &str) {
        println!("{}", text);
    }

    fn error(&self, text: &str) {
        println!("Error: {}", text);
    }
}

pub fn format_message(msg: &ChatMessage, show_timestamps: bool) -> String {
    match msg.sent_at() {
        Some(at) if show_timestamps => format!("{} {}", at.format("%H:%M:%S"), msg),
        _ => msg.to_string(),
    }
}
