//! Status bar widget
//!
//! One line at the bottom: the pending status message if any, otherwise the
//! key hints for the current mode.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use dcnview_app::{AppState, UiMode};

use crate::theme::styles;

pub struct StatusBar<'a> {
    state: &'a AppState,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn hints(mode: UiMode) -> &'static [(&'static str, &'static str)] {
        match mode {
            UiMode::Browse => &[("j/k", "select"), ("Enter", "execute"), ("q", "quit")],
            UiMode::ArgumentForm => &[("Enter", "call"), ("Esc", "cancel")],
            UiMode::Calling | UiMode::Response => &[("Esc", "close")],
        }
    }

    fn selection(&self) -> Option<Span<'static>> {
        let record = self.state.selected_command()?;
        Some(Span::styled(
            record.identifier().to_string(),
            styles::text_secondary(),
        ))
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![Span::raw(" ")];
        match &self.state.status {
            Some(message) => spans.push(Span::styled(message.clone(), styles::status_yellow())),
            None => {
                for (key, label) in Self::hints(self.state.ui_mode()) {
                    spans.push(Span::styled(format!("[{key}]"), styles::keybinding()));
                    spans.push(Span::styled(format!(" {label}  "), styles::text_muted()));
                }
            }
        }
        if let Some(selection) = self.selection() {
            spans.push(Span::styled("│ ", styles::text_muted()));
            spans.push(selection);
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcnview_app::{AppConfig, WeakUi};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 1)).unwrap();
        terminal
            .draw(|f| f.render_widget(StatusBar::new(state), f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_browse_hints() {
        let state = AppState::new(AppConfig::default(), WeakUi::detached());
        let content = render(&state);
        assert!(content.contains("[Enter] execute"));
        assert!(content.contains("[q] quit"));
    }

    #[test]
    fn test_status_message_replaces_hints() {
        let mut state = AppState::new(AppConfig::default(), WeakUi::detached());
        state.status = Some("reboot is disabled on the device".into());
        let content = render(&state);
        assert!(content.contains("reboot is disabled on the device"));
        assert!(!content.contains("[q] quit"));
    }
}
