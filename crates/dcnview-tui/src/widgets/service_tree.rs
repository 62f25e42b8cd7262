//! Service tree widget
//!
//! Renders devices, their services, and each service's categories with the
//! info fields and commands inside. Each level can be laid out stacked or
//! side by side. The whole tree is drawn into a scratch buffer first and the
//! window around the selected command is copied into the frame.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use dcnview_app::config::LayoutOrientation;
use dcnview_app::directory::{CategoryGroup, DeviceNode, ServiceDirectory, ServiceNode};
use dcnview_core::Identifier;

use crate::theme::styles;

pub struct ServiceTree<'a> {
    directory: &'a ServiceDirectory,
    layout: LayoutOrientation,
    selected: Option<&'a Identifier>,
}

impl<'a> ServiceTree<'a> {
    pub fn new(directory: &'a ServiceDirectory, layout: LayoutOrientation) -> Self {
        Self {
            directory,
            layout,
            selected: None,
        }
    }

    pub fn selected(mut self, selected: Option<&'a Identifier>) -> Self {
        self.selected = selected;
        self
    }

    /// Rows needed to show the whole tree without clipping
    pub fn content_height(&self) -> u16 {
        let heights = self.directory.devices().map(|device| self.device_height(device));
        if self.layout.device_horizontal {
            heights.max().unwrap_or(0)
        } else {
            heights.fold(0, u16::saturating_add)
        }
    }

    fn device_height(&self, device: &DeviceNode) -> u16 {
        device
            .services()
            .map(|service| self.service_height(service))
            .fold(2, u16::saturating_add)
    }

    fn service_height(&self, service: &ServiceNode) -> u16 {
        let heights = service
            .categories()
            .iter()
            .map(|group| self.category_height(group));
        let inner = if self.layout.category_horizontal {
            heights.max().unwrap_or(0)
        } else {
            heights.fold(0, u16::saturating_add)
        };
        inner.saturating_add(2)
    }

    fn category_height(&self, group: &CategoryGroup) -> u16 {
        let items = group.info.len() + group.commands.len();
        let rows = if self.layout.object_horizontal {
            items.min(1)
        } else {
            items
        };
        u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(1)
    }

    /// Draw the full tree into `buf`, returning the row of the selection
    fn render_content(&self, area: Rect, buf: &mut Buffer) -> Option<u16> {
        let devices: Vec<&DeviceNode> = self.directory.devices().collect();
        let rects = if self.layout.device_horizontal {
            side_by_side(area, devices.len())
        } else {
            let heights: Vec<u16> = devices.iter().map(|d| self.device_height(d)).collect();
            stacked(area, &heights)
        };

        let mut selected_row = None;
        for (device, rect) in devices.into_iter().zip(rects) {
            self.render_device(device, rect, buf, &mut selected_row);
        }
        selected_row
    }

    fn render_device(
        &self,
        device: &DeviceNode,
        area: Rect,
        buf: &mut Buffer,
        selected_row: &mut Option<u16>,
    ) {
        let block = styles::glass_block(false)
            .title(Span::styled(format!(" {} ", device.mac()), styles::accent_bold()));
        let inner = block.inner(area);
        block.render(area, buf);

        let services: Vec<&ServiceNode> = device.services().collect();
        let heights: Vec<u16> = services.iter().map(|s| self.service_height(s)).collect();
        for (service, rect) in services.into_iter().zip(stacked(inner, &heights)) {
            self.render_service(service, rect, buf, selected_row);
        }
    }

    fn render_service(
        &self,
        service: &ServiceNode,
        area: Rect,
        buf: &mut Buffer,
        selected_row: &mut Option<u16>,
    ) {
        let block = styles::glass_block(false).title(Line::from(vec![
            Span::styled(format!(" {} ", service.name()), styles::text_primary()),
            Span::styled(
                format!("{} info · {} cmd ", service.info_count(), service.command_count()),
                styles::text_muted(),
            ),
        ]));
        let inner = block.inner(area);
        block.render(area, buf);

        let groups = service.categories();
        let rects = if self.layout.category_horizontal {
            side_by_side(inner, groups.len())
        } else {
            let heights: Vec<u16> = groups.iter().map(|g| self.category_height(g)).collect();
            stacked(inner, &heights)
        };
        for (group, rect) in groups.iter().zip(rects) {
            self.render_category(service, group, rect, buf, selected_row);
        }
    }

    fn render_category(
        &self,
        service: &ServiceNode,
        group: &CategoryGroup,
        area: Rect,
        buf: &mut Buffer,
        selected_row: &mut Option<u16>,
    ) {
        if area.height == 0 {
            return;
        }
        let title = Line::from(Span::styled(
            format!("▾ {}", group.name),
            styles::text_secondary().add_modifier(Modifier::BOLD),
        ));

        let mut items: Vec<(Vec<Span>, bool)> = Vec::new();
        for name in &group.info {
            if let Some(node) = service.info(name) {
                items.push((
                    vec![
                        Span::styled(format!("{name}: "), styles::text_muted()),
                        Span::styled(node.display_value(), styles::text_primary()),
                    ],
                    false,
                ));
            }
        }
        for name in &group.commands {
            if let Some(node) = service.command(name) {
                let selected = self.selected == Some(&node.record().identifier());
                let style = match (selected, node.is_enabled()) {
                    (true, _) => styles::focused_selected(),
                    (false, true) => styles::accent(),
                    (false, false) => styles::disabled(),
                };
                items.push((vec![Span::styled(format!("› {name}"), style)], selected));
            }
        }

        let mut lines = vec![title];
        if self.layout.object_horizontal {
            let mut spans = Vec::new();
            for (index, (item, selected)) in items.into_iter().enumerate() {
                if index > 0 {
                    spans.push(Span::styled("  │  ", styles::text_muted()));
                }
                if selected {
                    *selected_row = Some(area.y + 1);
                }
                spans.extend(item);
            }
            if !spans.is_empty() {
                lines.push(Line::from(spans));
            }
        } else {
            for (row, (item, selected)) in items.into_iter().enumerate() {
                if selected {
                    *selected_row = Some(area.y.saturating_add(row as u16 + 1));
                }
                lines.push(Line::from(item));
            }
        }

        Paragraph::new(lines).render(area, buf);
    }
}

impl Widget for ServiceTree<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        if self.directory.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "Waiting for devices…",
                styles::text_muted(),
            )))
            .centered()
            .render(area, buf);
            return;
        }

        let content = Rect::new(0, 0, area.width, self.content_height().max(1));
        let mut scratch = Buffer::empty(content);
        let selected_row = self.render_content(content, &mut scratch);
        let offset = scroll_offset(selected_row, content.height, area.height);

        for row in 0..area.height {
            let source_y = row.saturating_add(offset);
            if source_y >= content.height {
                break;
            }
            for col in 0..area.width {
                if let (Some(source), Some(target)) = (
                    scratch.cell((col, source_y)),
                    buf.cell_mut((area.x + col, area.y + row)),
                ) {
                    *target = source.clone();
                }
            }
        }
    }
}

/// First content row to show so the selection sits mid-view when possible
pub fn scroll_offset(selected_row: Option<u16>, content_height: u16, view_height: u16) -> u16 {
    let max_offset = content_height.saturating_sub(view_height);
    match selected_row {
        Some(row) => row.saturating_sub(view_height / 2).min(max_offset),
        None => 0,
    }
}

fn stacked(area: Rect, heights: &[u16]) -> Vec<Rect> {
    let mut y = area.y;
    heights
        .iter()
        .map(|&height| {
            let height = height.min(area.bottom().saturating_sub(y));
            let rect = Rect::new(area.x, y, area.width, height);
            y = y.saturating_add(height);
            rect
        })
        .collect()
}

fn side_by_side(area: Rect, count: usize) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    Layout::horizontal((0..count).map(|_| Constraint::Ratio(1, count)))
        .split(area)
        .to_vec()
}
