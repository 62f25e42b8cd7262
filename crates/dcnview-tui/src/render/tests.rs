use super::*;
use dcnview_app::{AppConfig, ExecutionPhase, ExecutionSurface, WeakUi};
use dcnview_core::{CommandRecord, EntityRef, InfoRecord, Schema, Value};
use ratatui::{backend::TestBackend, Terminal};

fn command(name: &str) -> CommandRecord {
    CommandRecord {
        entity: EntityRef::new("aa:01", "sensor", "control", name),
        enabled: true,
        arguments: Schema::new(),
        response: Schema::new(),
    }
}

fn test_state() -> AppState {
    let mut state = AppState::new(AppConfig::default(), WeakUi::detached());
    state.directory.upsert_info(
        InfoRecord::new(
            EntityRef::new("aa:01", "sensor", "readings", "temperature"),
            Value::Float(21.5),
        ),
        None,
    );
    state.directory.upsert_command(command("calibrate"));
    state.ensure_selection();
    state
}

fn render(state: &AppState) -> String {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    terminal.draw(|f| view(f, state)).unwrap();
    terminal
        .backend()
        .buffer()
        .content
        .iter()
        .map(|c| c.symbol())
        .collect()
}

#[test]
fn test_browse_view_shows_tree_and_status() {
    let state = test_state();
    let content = render(&state);

    assert!(content.contains("dcnview"));
    assert!(content.contains("aa:01"));
    assert!(content.contains("temperature: 21.5"));
    assert!(content.contains("› calibrate"));
    assert!(content.contains("[Enter] execute"));
}

#[test]
fn test_execution_dialog_overlays_tree() {
    let mut state = test_state();
    let mut surface = ExecutionSurface::calling(command("calibrate"));
    surface.phase = ExecutionPhase::Error("sensor offline".into());
    state.show_execution(surface);

    let content = render(&state);
    assert!(content.contains("sensor offline"));
    assert!(content.contains("[Esc] close"));
}

#[test]
fn test_value_update_is_visible_next_frame() {
    let mut state = test_state();
    state.directory.upsert_info(
        InfoRecord::new(
            EntityRef::new("aa:01", "sensor", "readings", "temperature"),
            Value::Float(22.0),
        ),
        None,
    );
    let content = render(&state);
    assert!(content.contains("temperature: 22"));
    assert!(!content.contains("21.5"));
}

#[test]
fn test_tiny_terminal_does_not_panic() {
    let state = test_state();
    let mut terminal = Terminal::new(TestBackend::new(10, 4)).unwrap();
    terminal.draw(|f| view(f, &state)).unwrap();
}
