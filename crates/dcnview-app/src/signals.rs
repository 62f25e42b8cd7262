//! OS signal handling for graceful shutdown

use dcnview_core::prelude::*;

use crate::bridge::WeakUi;
use crate::message::Message;

/// Spawn a task that posts [`Message::Quit`] on the first termination signal
pub fn spawn_signal_handler(ui: WeakUi) {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(name) => info!("Received {}, quitting", name),
            Err(e) => {
                error!("Signal handler error: {}", e);
                return;
            }
        }
        if !ui.post(Message::Quit) {
            debug!("UI already gone at shutdown signal");
        }
    });
}

/// Wait for a termination signal and return its name
#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let listen = |kind: SignalKind, name: &str| {
        signal(kind).map_err(|e| Error::terminal(format!("Failed to listen for {name}: {e}")))
    };
    let mut sigint = listen(SignalKind::interrupt(), "SIGINT")?;
    let mut sigterm = listen(SignalKind::terminate(), "SIGTERM")?;
    let mut sighup = listen(SignalKind::hangup(), "SIGHUP")?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sighup.recv() => "SIGHUP",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::terminal(format!("Failed to listen for Ctrl+C: {e}")))?;
    Ok("Ctrl+C")
}
