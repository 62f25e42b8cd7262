//! Suspend/resume primitive for argument collection
//!
//! The coordinator parks on a [`PromptWaiter`] while the UI keeps running.
//! The UI side holds the [`PromptHandle`]: submitting resumes the waiter
//! with the arguments, dropping it (surface hidden or destroyed) resumes it
//! with [`PromptOutcome::Cancelled`].

use tokio::sync::oneshot;

use dcnview_core::ArgumentMap;

#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutcome {
    Submitted(ArgumentMap),
    Cancelled,
}

/// UI-side half
#[derive(Debug)]
pub struct PromptHandle {
    tx: oneshot::Sender<ArgumentMap>,
}

impl PromptHandle {
    /// Resume the waiter. Returns false if it already gave up.
    pub fn submit(self, args: ArgumentMap) -> bool {
        self.tx.send(args).is_ok()
    }

    /// Explicit cancellation; same as dropping the handle
    pub fn cancel(self) {}

    pub fn is_waiting(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Coordinator-side half
#[derive(Debug)]
pub struct PromptWaiter {
    rx: oneshot::Receiver<ArgumentMap>,
}

impl PromptWaiter {
    pub async fn wait(self) -> PromptOutcome {
        match self.rx.await {
            Ok(args) => PromptOutcome::Submitted(args),
            Err(_) => PromptOutcome::Cancelled,
        }
    }
}

pub fn argument_prompt() -> (PromptHandle, PromptWaiter) {
    let (tx, rx) = oneshot::channel();
    (PromptHandle { tx }, PromptWaiter { rx })
}
