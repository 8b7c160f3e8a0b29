use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::config::{AgeFormat, Config};
use crate::output::rate::{Units, format_age};
use crate::output::{ConnectionRow, connection_rows};
use crate::state::CycleReport;
use crate::tui::theme::Theme;

use super::{rate_cell, rate_width};

/// Render the connection table.
///
/// Compact mode stacks source over destination in two-line rows; wide mode
/// puts every column on one line.
pub fn render(frame: &mut Frame, area: Rect, report: &CycleReport, config: &Config, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Connections ");

    if !report.primed {
        frame.render_widget(
            Paragraph::new("Collecting first sample...")
                .style(theme.normal_style())
                .block(block),
            area,
        );
        return;
    }

    let units = Units::from_config(config);
    let show_age = report.age_tracking && config.age != AgeFormat::Hidden;
    let rows = connection_rows(report, config);
    let columns = Columns {
        id: config.show_id,
        state: config.show_status,
        age: show_age,
    };

    let (header, widths, body) = if config.wide {
        wide_table(&rows, columns, units, config.age, theme)
    } else {
        compact_table(&rows, columns, units, config.age, theme)
    };

    let table = Table::new(body, widths).header(header).block(block);
    frame.render_widget(table, area);
}

#[derive(Clone, Copy)]
struct Columns {
    id: bool,
    state: bool,
    age: bool,
}

fn header_row(names: Vec<&'static str>, theme: &Theme) -> Row<'static> {
    Row::new(
        names
            .into_iter()
            .map(|n| Cell::from(Span::styled(n, theme.header_style()))),
    )
}

fn wide_table(
    rows: &[ConnectionRow],
    cols: Columns,
    units: Units,
    age: AgeFormat,
    theme: &Theme,
) -> (Row<'static>, Vec<Constraint>, Vec<Row<'static>>) {
    let mut names = Vec::new();
    let mut widths = Vec::new();
    if cols.id {
        names.push("ID");
        widths.push(Constraint::Length(10));
    }
    names.extend(["IN", "OUT", "PROTO", "SRC", "SPORT"]);
    widths.extend([
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Min(16),
        Constraint::Length(8),
    ]);
    if cols.state {
        names.push("STATE");
        widths.push(Constraint::Length(10));
    }
    names.extend(["DST", "DPORT", "TX", "RX", "SUM"]);
    widths.extend([
        Constraint::Min(16),
        Constraint::Length(8),
        rate_width(units),
        rate_width(units),
        rate_width(units),
    ]);
    if cols.age {
        names.push("AGE");
        widths.push(Constraint::Length(17));
    }

    let body = rows
        .iter()
        .map(|r| {
            let mut cells = Vec::new();
            if cols.id {
                cells.push(Cell::from(r.id.to_string()));
            }
            cells.extend([
                Cell::from(r.ingress.clone()),
                Cell::from(r.egress.clone()),
                Cell::from(r.proto.clone()),
                Cell::from(r.src.clone()),
                Cell::from(r.sport.clone()),
            ]);
            if cols.state {
                cells.push(Cell::from(r.state.clone().unwrap_or_default()));
            }
            cells.extend([
                Cell::from(r.dst.clone()),
                Cell::from(r.dport.clone()),
                rate_cell(r.tx, units, theme),
                rate_cell(r.rx, units, theme),
                rate_cell(r.sum, units, theme),
            ]);
            if cols.age {
                cells.push(Cell::from(r.age.map(|a| format_age(a, age)).unwrap_or_default()));
            }
            Row::new(cells).style(theme.normal_style())
        })
        .collect();

    (header_row(names, theme), widths, body)
}

fn compact_table(
    rows: &[ConnectionRow],
    cols: Columns,
    units: Units,
    age: AgeFormat,
    theme: &Theme,
) -> (Row<'static>, Vec<Constraint>, Vec<Row<'static>>) {
    let mut names = vec!["IN/OUT", "PROTO", "SRC/DST", "PORT"];
    let mut widths = vec![
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Length(8),
    ];
    if cols.state {
        names.push("STATE");
        widths.push(Constraint::Length(10));
    }
    names.extend(["TX", "RX", "SUM"]);
    widths.extend([rate_width(units), rate_width(units), rate_width(units)]);
    if cols.age {
        names.push("AGE");
        widths.push(Constraint::Length(17));
    }
    if cols.id {
        names.push("ID");
        widths.push(Constraint::Length(10));
    }

    let stacked = |top: &str, bottom: &str| {
        Cell::from(Text::from(vec![
            Line::from(top.to_string()),
            Line::from(bottom.to_string()),
        ]))
    };

    let body = rows
        .iter()
        .map(|r| {
            let mut cells = vec![
                stacked(&r.ingress, &r.egress),
                Cell::from(r.proto.clone()),
                stacked(&r.src, &r.dst),
                stacked(&r.sport, &r.dport),
            ];
            if cols.state {
                cells.push(Cell::from(r.state.clone().unwrap_or_default()));
            }
            cells.extend([
                rate_cell(r.tx, units, theme),
                rate_cell(r.rx, units, theme),
                rate_cell(r.sum, units, theme),
            ]);
            if cols.age {
                cells.push(Cell::from(r.age.map(|a| format_age(a, age)).unwrap_or_default()));
            }
            if cols.id {
                cells.push(Cell::from(r.id.to_string()));
            }
            Row::new(cells).height(2).style(theme.normal_style())
        })
        .collect();

    (header_row(names, theme), widths, body)
}
