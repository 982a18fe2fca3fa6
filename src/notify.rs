use anyhow::Result;
use std::time::{Duration, Instant};

/// How long a status message stays in the info line
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// Transient user-facing notifications
pub trait Notifier {
    fn success(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Status line message that clears itself after [`STATUS_TIMEOUT`]
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: Level,
    pub shown_at: Instant,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, level: Level) -> Self {
        Self {
            text: text.into(),
            level,
            shown_at: Instant::now(),
        }
    }

    pub fn expired(&self) -> bool {
        self.shown_at.elapsed() >= STATUS_TIMEOUT
    }
}

/// Info line notifier, optionally mirrored to desktop notifications
#[derive(Debug, Default)]
pub struct StatusLine {
    pub message: Option<StatusMessage>,
    pub desktop: bool,
}

impl StatusLine {
    pub fn new(desktop: bool) -> Self {
        Self {
            message: None,
            desktop,
        }
    }

    /// Show a message in the info line only
    pub fn show(&mut self, text: impl Into<String>, level: Level) {
        self.message = Some(StatusMessage::new(text, level));
    }

    /// Drop the message once it has been visible long enough
    pub fn expire(&mut self) {
        if self.message.as_ref().map(|m| m.expired()).unwrap_or(false) {
            self.message = None;
        }
    }

    fn mirror(&self, body: &str) {
        if self.desktop {
            let body = body.to_string();
            off_ui_thread(move || {
                if let Err(e) = desktop("stockbook", &body) {
                    tracing::warn!("Desktop notification failed: {}", e);
                }
            });
        }
    }
}

impl Notifier for StatusLine {
    fn success(&mut self, msg: &str) {
        self.show(msg, Level::Success);
        self.mirror(msg);
    }

    fn error(&mut self, msg: &str) {
        self.show(msg, Level::Error);
        self.mirror(msg);
    }
}

/// Run a blocking job on tokio's blocking pool, or inline outside a runtime.
/// Desktop notifications go over D-Bus and must not stall the draw loop.
fn off_ui_thread(job: impl FnOnce() + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(job);
        }
        Err(_) => job(),
    }
}

/// Show a desktop notification
pub fn desktop(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("accessories-calculator")
        .show()?;
    Ok(())
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Notifier that keeps every message it was given
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub messages: Vec<(Level, String)>,
    }

    impl RecordingNotifier {
        pub fn last(&self) -> Option<&(Level, String)> {
            self.messages.last()
        }
    }

    impl Notifier for RecordingNotifier {
        fn success(&mut self, msg: &str) {
            self.messages.push((Level::Success, msg.to_string()));
        }

        fn error(&mut self, msg: &str) {
            self.messages.push((Level::Error, msg.to_string()));
        }
    }
}
