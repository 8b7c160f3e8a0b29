use std::io::Write;

use crate::config::Config;
use crate::error::ConntopError;
use crate::state::CycleReport;

use super::rate::{Units, format_age, format_rate};
use super::{connection_rows, device_rows};

/// Write one cycle as an aligned text table.
pub fn write_pretty(
    report: &CycleReport,
    config: &Config,
    writer: &mut impl Write,
) -> Result<(), ConntopError> {
    write_pretty_inner(report, config, writer).map_err(ConntopError::Serialization)
}

fn write_pretty_inner(report: &CycleReport, config: &Config, w: &mut impl Write) -> Result<(), std::io::Error> {
    let units = Units::from_config(config);

    writeln!(
        w,
        "flows: {}  shown: {}  RX: {}  TX: {}",
        report.flow_count,
        report.connections.len(),
        format_rate(report.totals.rx, units),
        format_rate(report.totals.tx, units),
    )?;

    if config.device_view {
        writeln!(w, "{:<16} {:<40} {:>12} {:>12} {:>12}", "DEVICE", "ADDRESS", "TX", "RX", "SUM")?;
        for row in device_rows(&report.interfaces, config) {
            let (device, address) = match &row.address {
                Some(addr) => ("", addr.as_str()),
                None => (row.device.as_str(), ""),
            };
            writeln!(
                w,
                "{:<16} {:<40} {:>12} {:>12} {:>12}",
                truncate(device, 16),
                address,
                format_rate(row.tx, units),
                format_rate(row.rx, units),
                format_rate(row.sum, units),
            )?;
        }
        writeln!(w)?;
        return Ok(());
    }

    let show_age = report.age_tracking && config.age != crate::config::AgeFormat::Hidden;
    let mut header = String::new();
    if config.show_id {
        header.push_str(&format!("{:<10} ", "ID"));
    }
    header.push_str(&format!(
        "{:<10} {:<10} {:<6} {:<28} {:<10} ",
        "IN", "OUT", "PROTO", "SRC", "SPORT"
    ));
    if config.show_status {
        header.push_str(&format!("{:<11} ", "STATE"));
    }
    header.push_str(&format!(
        "{:<28} {:<10} {:>12} {:>12} {:>12}",
        "DST", "DPORT", "TX", "RX", "SUM"
    ));
    if show_age {
        header.push_str(&format!(" {:>17}", "AGE"));
    }
    writeln!(w, "{header}")?;

    for row in connection_rows(report, config) {
        let mut line = String::new();
        if config.show_id {
            line.push_str(&format!("{:<10} ", row.id));
        }
        line.push_str(&format!(
            "{:<10} {:<10} {:<6} {:<28} {:<10} ",
            truncate(&row.ingress, 10),
            truncate(&row.egress, 10),
            row.proto,
            truncate(&row.src, 28),
            truncate(&row.sport, 10),
        ));
        if config.show_status {
            line.push_str(&format!("{:<11} ", row.state.as_deref().unwrap_or("")));
        }
        line.push_str(&format!(
            "{:<28} {:<10} {:>12} {:>12} {:>12}",
            truncate(&row.dst, 28),
            truncate(&row.dport, 10),
            format_rate(row.tx, units),
            format_rate(row.rx, units),
            format_rate(row.sum, units),
        ));
        if let Some(age) = row.age.filter(|_| show_age) {
            line.push_str(&format!(" {:>17}", format_age(age, config.age)));
        }
        writeln!(w, "{}", line.trim_end())?;
    }

    if report.connections.is_empty() {
        writeln!(w, "(no flows above threshold)")?;
    }
    writeln!(w)?;
    Ok(())
}

/// Truncate to at most `max` characters, keeping the tail for long hostnames.
pub fn truncate(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    let tail: String = s.chars().skip(count - max + 1).collect();
    format!("~{tail}")
}
