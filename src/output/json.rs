use std::io::Write;

use serde::Serialize;

use crate::config::Config;
use crate::error::ConntopError;
use crate::model::Rates;
use crate::state::CycleReport;

use super::{ConnectionRow, DeviceRow, connection_rows, device_rows};

/// One cycle as a single JSON object.
#[derive(Serialize)]
struct JsonCycle {
    timestamp: i64,
    flows: usize,
    totals: Rates,
    #[serde(skip_serializing_if = "Option::is_none")]
    connections: Option<Vec<ConnectionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    devices: Option<Vec<DeviceRow>>,
}

/// Write one cycle as a newline-terminated JSON object (NDJSON).
pub fn write_json(
    report: &CycleReport,
    config: &Config,
    writer: &mut impl Write,
) -> Result<(), ConntopError> {
    let (connections, devices) = if config.device_view {
        (None, Some(device_rows(&report.interfaces, config)))
    } else {
        (Some(connection_rows(report, config)), None)
    };
    let cycle = JsonCycle {
        timestamp: report.timestamp,
        flows: report.flow_count,
        totals: report.totals,
        connections,
        devices,
    };
    serde_json::to_writer(&mut *writer, &cycle)
        .map_err(|e| ConntopError::Serialization(std::io::Error::other(e.to_string())))?;
    writeln!(writer).map_err(ConntopError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    fn render(config: &Config) -> serde_json::Value {
        let mut buf = Vec::new();
        write_json(&fixtures::report(), config, &mut buf).unwrap();
        assert!(buf.ends_with(b"\n"));
        assert_eq!(buf.iter().filter(|&&b| b == b'\n').count(), 1);
        serde_json::from_slice(&buf).unwrap()
    }

    // UT-15.1: Connection cycle
    #[test]
    fn test_json_connections() {
        let v = render(&Config::default());
        assert_eq!(v["timestamp"], 1_700_000_000);
        assert_eq!(v["flows"], 3);
        assert_eq!(v["totals"]["sum"], 40_000);
        let conns = v["connections"].as_array().unwrap();
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0]["dst"], "example.com");
        assert_eq!(conns[0]["rx"], 36_000);
        assert!(conns[0].get("age").is_none());
        assert!(v.get("devices").is_none());
    }

    // UT-15.2: Device cycle
    #[test]
    fn test_json_devices() {
        let config = Config {
            device_view: true,
            ..Config::default()
        };
        let v = render(&config);
        let devs = v["devices"].as_array().unwrap();
        assert_eq!(devs.len(), 2);
        assert_eq!(devs[0]["device"], "eth0");
        assert!(devs[0].get("address").is_none());
        assert_eq!(devs[1]["address"], "192.168.1.10");
        assert!(v.get("connections").is_none());
    }
}
