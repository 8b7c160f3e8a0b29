use std::io::Write;

use crate::config::Config;
use crate::error::ConntopError;
use crate::state::CycleReport;

use super::{connection_rows, device_rows};

const CONNECTION_HEADER: &str =
    "timestamp\tid\tin\tout\tproto\tsrc\tsport\tdst\tdport\tstate\tsnat\tdnat\ttx_bps\trx_bps\tsum_bps\tage";
const DEVICE_HEADER: &str = "timestamp\tdevice\taddress\ttx_bps\trx_bps\tsum_bps";

/// Write one cycle as TSV rows with raw bits/s values.
///
/// Every row carries the cycle timestamp; the header is written only when
/// `header` is set.
pub fn write_tsv(
    report: &CycleReport,
    config: &Config,
    header: bool,
    writer: &mut impl Write,
) -> Result<(), ConntopError> {
    write_tsv_inner(report, config, header, writer).map_err(ConntopError::Serialization)
}

fn write_tsv_inner(
    report: &CycleReport,
    config: &Config,
    header: bool,
    w: &mut impl Write,
) -> Result<(), std::io::Error> {
    let ts = report.timestamp;

    if config.device_view {
        if header {
            writeln!(w, "{DEVICE_HEADER}")?;
        }
        for row in device_rows(&report.interfaces, config) {
            writeln!(
                w,
                "{ts}\t{}\t{}\t{}\t{}\t{}",
                escape_tsv(&row.device),
                row.address.as_deref().map(escape_tsv).unwrap_or_default(),
                row.tx,
                row.rx,
                row.sum,
            )?;
        }
        return Ok(());
    }

    if header {
        writeln!(w, "{CONNECTION_HEADER}")?;
    }
    for row in connection_rows(report, config) {
        writeln!(
            w,
            "{ts}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.id,
            escape_tsv(&row.ingress),
            escape_tsv(&row.egress),
            row.proto,
            escape_tsv(&row.src),
            row.sport,
            escape_tsv(&row.dst),
            row.dport,
            row.state.as_deref().unwrap_or("-"),
            u8::from(row.snat),
            u8::from(row.dnat),
            row.tx,
            row.rx,
            row.sum,
            row.age.map(|a| a.to_string()).unwrap_or_default(),
        )?;
    }
    Ok(())
}

/// Escape tabs and newlines in a string for TSV output.
fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}
