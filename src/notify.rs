//! User-visible notifications raised by the cache & mutation layer.
//!
//! Notices flow through an unbounded channel so the layer never blocks on
//! the presentation side; the CLI drains and prints them after each command.

use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  Success(String),
  Error(String),
}

/// Cloneable sending half handed to the cache layer and views.
#[derive(Clone)]
pub struct Notifier {
  tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  pub fn success(&self, message: impl Into<String>) {
    // Ignore send errors - the receiver may have been dropped
    let _ = self.tx.send(Notice::Success(message.into()));
  }

  pub fn error(&self, message: impl Into<String>) {
    let _ = self.tx.send(Notice::Error(message.into()));
  }
}
