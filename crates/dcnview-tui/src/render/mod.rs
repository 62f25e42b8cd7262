//! Main render/view function (View in TEA pattern)

#[cfg(test)]
mod tests;

use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::Frame;

use dcnview_app::AppState;

use super::{layout, widgets};
use crate::theme::palette;

/// Render the complete UI.
///
/// Pure with respect to `state`: scroll position is derived from the
/// selection on every frame.
pub fn view(frame: &mut Frame, state: &AppState) {
    let area = frame.area();

    let bg_block = Block::default().style(Style::default().bg(palette::DEEPEST_BG));
    frame.render_widget(bg_block, area);

    let areas = layout::create(area);

    frame.render_widget(
        widgets::MainHeader::new(&state.config.version, &state.directory),
        areas.header,
    );
    frame.render_widget(
        widgets::ServiceTree::new(&state.directory, state.config.layout)
            .selected(state.selected.as_ref()),
        areas.tree,
    );
    frame.render_widget(widgets::StatusBar::new(state), areas.status);

    // Modal on top of everything else
    if let Some(surface) = &state.execution {
        frame.render_widget(widgets::ExecutionDialog::new(surface), area);
    }
}
