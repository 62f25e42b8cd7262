//! TUI runner - terminal lifecycle and the main event loop

use dcnview_app::Engine;
use dcnview_core::prelude::*;
use dcnview_transport::Transport;

use super::{event, render, terminal};

/// Run the TUI until the user quits or a signal arrives.
///
/// Subscriptions must already be in place on `engine`.
pub async fn run<T>(mut engine: Engine<T>) -> Result<()>
where
    T: Transport + Send + Sync + 'static,
{
    terminal::install_panic_hook();
    let mut term = ratatui::try_init().map_err(|e| Error::TerminalInit(e.to_string()))?;

    let result = run_loop(&mut term, &mut engine);

    engine.shutdown();
    ratatui::restore();

    result
}

fn run_loop<T>(terminal: &mut ratatui::DefaultTerminal, engine: &mut Engine<T>) -> Result<()>
where
    T: Transport + Send + Sync + 'static,
{
    while !engine.should_quit() {
        // Bridge posts and invocation results
        let drained = engine.drain_pending_messages();
        if drained > 0 {
            trace!("Processed {} queued message(s)", drained);
        }

        terminal.draw(|frame| render::view(frame, &engine.state))?;

        if let Some(message) = event::poll()? {
            engine.process_message(message);
        }
    }
    Ok(())
}
