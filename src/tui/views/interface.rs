use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::config::Config;
use crate::output::device_rows;
use crate::output::rate::Units;
use crate::state::CycleReport;
use crate::tui::theme::Theme;

use super::{rate_cell, rate_width};

/// Render the device table: each interface followed by its addresses.
pub fn render(frame: &mut Frame, area: Rect, report: &CycleReport, config: &Config, theme: &Theme) {
    let block = Block::default().borders(Borders::ALL).title(" Devices ");
    let rows = device_rows(&report.interfaces, config);
    if rows.is_empty() {
        frame.render_widget(
            Paragraph::new("No interfaces found")
                .style(theme.normal_style())
                .block(block),
            area,
        );
        return;
    }

    let units = Units::from_config(config);
    let header = Row::new(
        ["DEVICE", "TX", "RX", "SUM"]
            .into_iter()
            .map(|n| Cell::from(Span::styled(n, theme.header_style()))),
    );

    let body: Vec<Row> = rows
        .iter()
        .map(|r| {
            let (label, style) = match &r.address {
                Some(addr) => (format!("  {addr}"), theme.normal_style()),
                None => (r.device.clone(), theme.device_style()),
            };
            Row::new(vec![
                Cell::from(label),
                rate_cell(r.tx, units, theme),
                rate_cell(r.rx, units, theme),
                rate_cell(r.sum, units, theme),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(24),
        rate_width(units),
        rate_width(units),
        rate_width(units),
    ];
    frame.render_widget(Table::new(body, widths).header(header).block(block), area);
}
