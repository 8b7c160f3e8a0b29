pub mod json;
pub mod pretty;
pub mod rate;
pub mod tsv;

use std::io::Write;
use std::net::IpAddr;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::{AgeFormat, Config};
use crate::enrichment::port_annotation::port_label;
use crate::error::ConntopError;
use crate::model::{Connection, Interface};
use crate::state::CycleReport;

pub const REDACTED: &str = "REDACTED";

/// Address as displayed: redacted, numeric, or its resolved hostname.
pub fn address_label(ip: IpAddr, host: Option<&str>, numeric: bool, redact: bool) -> String {
    if redact {
        return REDACTED.to_string();
    }
    match host {
        Some(host) if !numeric => host.to_string(),
        _ => ip.to_string(),
    }
}

/// One connection flattened for line output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConnectionRow {
    pub id: u32,
    pub ingress: String,
    pub egress: String,
    pub proto: String,
    pub src: String,
    pub sport: String,
    pub dst: String,
    pub dport: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub snat: bool,
    pub dnat: bool,
    pub tx: i64,
    pub rx: i64,
    pub sum: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

impl ConnectionRow {
    pub fn new(conn: &Connection, config: &Config, age_tracking: bool) -> Self {
        Self {
            id: conn.id,
            ingress: conn.ingress.name().to_string(),
            egress: conn.egress.name().to_string(),
            proto: conn.protocol_label(),
            src: address_label(
                conn.local.src,
                conn.local.src_host.as_deref(),
                config.numeric_local,
                config.redact_local,
            ),
            sport: port_label(conn.sport, conn.l4, config.numeric_port),
            dst: address_label(
                conn.local.dst,
                conn.local.dst_host.as_deref(),
                config.numeric_remote,
                config.redact_remote,
            ),
            dport: port_label(conn.dport, conn.l4, config.numeric_port),
            state: conn.state.map(|s| s.to_string()),
            snat: conn.nat.src,
            dnat: conn.nat.dst,
            tx: conn.rates.tx,
            rx: conn.rates.rx,
            sum: conn.rates.sum,
            age: (age_tracking && config.age != AgeFormat::Hidden).then_some(conn.delta),
        }
    }
}

/// One interface or address line of the device view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeviceRow {
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub tx: i64,
    pub rx: i64,
    pub sum: i64,
}

/// Interface rows, each followed by its address rows. Loopback devices are
/// left out unless loopback flows are included.
pub fn device_rows(interfaces: &[Interface], config: &Config) -> Vec<DeviceRow> {
    let mut rows = Vec::new();
    for iface in interfaces {
        if iface.is_loopback() && !config.include_loopback {
            continue;
        }
        rows.push(DeviceRow {
            device: iface.name.clone(),
            address: None,
            tx: iface.rates.tx,
            rx: iface.rates.rx,
            sum: iface.rates.sum,
        });
        for addr in &iface.addresses {
            rows.push(DeviceRow {
                device: iface.name.clone(),
                address: Some(address_label(addr.ip, None, true, config.redact_local)),
                tx: addr.rates.tx,
                rx: addr.rates.rx,
                sum: addr.rates.sum,
            });
        }
    }
    rows
}

pub fn connection_rows(report: &CycleReport, config: &Config) -> Vec<ConnectionRow> {
    report
        .connections
        .iter()
        .map(|c| ConnectionRow::new(c, config, report.age_tracking))
        .collect()
}

/// Line-oriented presentation for redirected or continuous output.
#[derive(Debug, Default)]
pub struct LineOutput {
    header_written: bool,
}

impl LineOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one cycle. The first cycle carries no rates and is skipped.
    pub fn write_report(
        &mut self,
        report: &CycleReport,
        config: &Config,
        writer: &mut impl Write,
    ) -> Result<(), ConntopError> {
        if !report.primed {
            return Ok(());
        }
        match config.format {
            OutputFormat::Tsv => tsv::write_tsv(report, config, !self.header_written, writer)?,
            OutputFormat::Json => json::write_json(report, config, writer)?,
            OutputFormat::Pretty => pretty::write_pretty(report, config, writer)?,
        }
        self.header_written = true;
        writer.flush().map_err(ConntopError::Serialization)
    }
}
