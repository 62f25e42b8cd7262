//! Execution dialog
//!
//! Modal view of the shown execution surface: the argument form while
//! collecting, a waiting line while the call is in flight, then either the
//! rendered response fields or the error text.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget, Wrap};

use dcnview_app::{ArgumentField, ExecutionPhase, ExecutionSurface, ResponseLine};

use super::modal_overlay;
use crate::theme::styles;

const DIALOG_WIDTH: u16 = 60;

pub struct ExecutionDialog<'a> {
    surface: &'a ExecutionSurface,
}

impl<'a> ExecutionDialog<'a> {
    pub fn new(surface: &'a ExecutionSurface) -> Self {
        Self { surface }
    }

    fn body(&self) -> Vec<Line<'static>> {
        match &self.surface.phase {
            ExecutionPhase::CollectingArguments => self.form_lines(),
            ExecutionPhase::Calling => vec![Line::from(Span::styled(
                format!("Calling {}…", self.surface.title()),
                styles::text_secondary(),
            ))],
            ExecutionPhase::Response(lines) => lines.iter().map(response_line).collect(),
            ExecutionPhase::Error(text) => {
                vec![Line::from(Span::styled(text.clone(), styles::status_red()))]
            }
        }
    }

    fn form_lines(&self) -> Vec<Line<'static>> {
        let form = &self.surface.form;
        let mut lines = Vec::new();
        for (index, field) in form.fields().iter().enumerate() {
            lines.push(field_line(field, index == form.focus()));
            if let Some(error) = &field.error {
                lines.push(Line::from(Span::styled(
                    format!("    {error}"),
                    styles::status_red(),
                )));
            }
        }
        lines
    }

    fn hints(&self) -> Line<'static> {
        let pairs: &[(&str, &str)] = match self.surface.phase {
            ExecutionPhase::CollectingArguments => &[
                ("Enter", "call"),
                ("Tab", "next"),
                ("Ctrl+E", "optional"),
                ("Esc", "cancel"),
            ],
            ExecutionPhase::Calling => &[("Esc", "close")],
            _ => &[("Enter", "close")],
        };
        let mut spans = Vec::new();
        for (key, label) in pairs {
            spans.push(Span::styled(format!("[{key}]"), styles::keybinding()));
            spans.push(Span::styled(format!(" {label}  "), styles::text_muted()));
        }
        Line::from(spans)
    }
}

fn field_line(field: &ArgumentField, focused: bool) -> Line<'static> {
    let marker = if focused { "▸ " } else { "  " };
    let label_style = if field.enabled {
        styles::text_primary()
    } else {
        styles::disabled()
    };
    let mut spans = vec![
        Span::styled(marker, styles::accent()),
        Span::styled(field.name.clone(), label_style),
        Span::styled(format!(" ({})", field.value_type()), styles::text_muted()),
        Span::raw(": "),
    ];
    if field.enabled {
        let text = if focused {
            format!("{}▏", field.text)
        } else {
            field.text.clone()
        };
        let style = if focused {
            styles::focused_selected()
        } else {
            styles::text_primary()
        };
        spans.push(Span::styled(text, style));
    } else {
        spans.push(Span::styled("off", styles::text_muted()));
    }
    Line::from(spans)
}

fn response_line(line: &ResponseLine) -> Line<'static> {
    let style = match line {
        ResponseLine::Field { .. } => styles::text_primary(),
        ResponseLine::InvalidField { .. } | ResponseLine::InvalidValue { .. } => {
            styles::status_yellow()
        }
    };
    Line::from(Span::styled(line.to_string(), style))
}

impl Widget for ExecutionDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let body = self.body();
        let height = u16::try_from(body.len())
            .unwrap_or(u16::MAX)
            .max(1)
            .saturating_add(4);
        let modal = modal_overlay::centered_rect(DIALOG_WIDTH, height, area);
        modal_overlay::prepare_modal(buf, area, modal);

        let title = format!(" {} ", self.surface.title());
        let block = styles::modal_block(&title);
        let inner = block.inner(modal);
        block.render(modal, buf);

        let [content, _, hints] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .render(content, buf);
        Paragraph::new(self.hints()).render(hints, buf);
    }
}
