//! Screen layout for the TUI

use ratatui::layout::{Constraint, Layout, Rect};

/// Screen areas for the main layout
#[derive(Debug, Clone, Copy)]
pub struct ScreenAreas {
    /// Title, version and directory counts
    pub header: Rect,

    /// Service tree
    pub tree: Rect,

    /// Status message or key hints
    pub status: Rect,
}

pub fn create(area: Rect) -> ScreenAreas {
    let [header, tree, status] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    ScreenAreas {
        header,
        tree,
        status,
    }
}
