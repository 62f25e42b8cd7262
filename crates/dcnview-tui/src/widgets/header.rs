//! Header bar
//!
//! App title, version, and live directory counts.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use dcnview_app::ServiceDirectory;

use crate::theme::{palette, styles};

pub struct MainHeader<'a> {
    version: &'a str,
    directory: &'a ServiceDirectory,
}

impl<'a> MainHeader<'a> {
    pub fn new(version: &'a str, directory: &'a ServiceDirectory) -> Self {
        Self { version, directory }
    }

    fn counts(&self) -> Line<'static> {
        let counts = [
            (self.directory.device_count(), "devices"),
            (self.directory.service_count(), "services"),
            (self.directory.info_count(), "info"),
            (self.directory.command_count(), "commands"),
        ];
        let mut spans = Vec::new();
        for (count, label) in counts {
            spans.push(Span::styled(count.to_string(), styles::accent()));
            spans.push(Span::styled(format!(" {label}  "), styles::text_muted()));
        }
        Line::from(spans)
    }
}

impl Widget for MainHeader<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = styles::glass_block(false).style(Style::default().bg(palette::CARD_BG));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let (dot, dot_style) = if self.directory.is_empty() {
            ("○", styles::text_muted())
        } else {
            ("●", styles::status_green())
        };
        let title = Line::from(vec![
            Span::raw(" "),
            Span::styled(dot, dot_style),
            Span::raw(" "),
            Span::styled("dcnview", styles::accent_bold()),
            Span::raw(" "),
            Span::styled(format!("v{}", self.version), styles::text_secondary()),
        ]);
        let title_width = title.width() as u16;
        buf.set_line(inner.x, inner.y, &title, inner.width);

        // Right-align counts when they fit next to the title
        let counts = self.counts();
        let counts_width = counts.width() as u16;
        if title_width + counts_width + 2 <= inner.width {
            let x = inner.x + inner.width - counts_width;
            buf.set_line(x, inner.y, &counts, counts_width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcnview_core::{CommandRecord, EntityRef, Schema};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(directory: &ServiceDirectory, width: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, 3)).unwrap();
        terminal
            .draw(|f| f.render_widget(MainHeader::new("1.2.3", directory), f.area()))
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
    fn test_header_shows_title_and_version() {
        let content = render(&ServiceDirectory::new(), 80);
        assert!(content.contains("dcnview"));
        assert!(content.contains("v1.2.3"));
        assert!(content.contains("0 devices"));
    }

    #[test]
    fn test_header_counts_track_directory() {
        let mut directory = ServiceDirectory::new();
        directory.upsert_command(CommandRecord {
            entity: EntityRef::new("aa", "svc", "cat", "go"),
            enabled: true,
            arguments: Schema::new(),
            response: Schema::new(),
        });
        let content = render(&directory, 80);
        assert!(content.contains("1 devices"));
        assert!(content.contains("1 commands"));
    }

    #[test]
    fn test_narrow_header_drops_counts() {
        let content = render(&ServiceDirectory::new(), 24);
        assert!(content.contains("dcnview"));
        assert!(!content.contains("devices"));
    }
}
