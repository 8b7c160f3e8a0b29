//! procfs conntrack text through the whole engine.
//!
//! Two literal `/proc/net/nf_conntrack` dumps are parsed and fed to the
//! monitor, checking identity synthesis, rate derivation and status display.
//!
//! Run with: `cargo test --test conntrack_pipeline`

use std::io::Write;
use std::net::IpAddr;

use conntop::config::Config;
use conntop::enrichment::dns_resolver::NameResolver;
use conntop::error::ConntopError;
use conntop::model::status::FlowState;
use conntop::output::LineOutput;
use conntop::state::Monitor;
use conntop::system::conntrack::ProcConntrack;
use conntop::system::{FlowSource, RawAddress, RawInterface};

const NS: u64 = 1_000_000_000;

const DUMP_1: &str = "\
ipv4     2 tcp      6 431999 ESTABLISHED src=192.168.1.10 dst=93.184.216.34 sport=51234 dport=443 packets=12 bytes=2000 src=93.184.216.34 dst=192.168.1.10 sport=443 dport=51234 packets=10 bytes=100000 [ASSURED] mark=0 zone=0 delta-time=100 use=1
ipv4     2 udp      17 28 src=192.168.1.10 dst=192.168.1.255 sport=137 dport=137 packets=1 bytes=78 [UNREPLIED] src=192.168.1.255 dst=192.168.1.10 sport=137 dport=137 packets=0 bytes=0 mark=0 delta-time=5 use=2
ipv4     2 gre      47 170 src=192.168.1.10 dst=198.51.100.1 srckey=0x0 dstkey=0x0 packets=3 bytes=300 src=198.51.100.1 dst=192.168.1.10 srckey=0x0 dstkey=0x0 packets=3 bytes=300 mark=0 delta-time=40 use=1
";

const DUMP_2: &str = "\
ipv4     2 tcp      6 431999 ESTABLISHED src=192.168.1.10 dst=93.184.216.34 sport=51234 dport=443 packets=30 bytes=4000 src=93.184.216.34 dst=192.168.1.10 sport=443 dport=51234 packets=80 bytes=300000 [ASSURED] mark=0 zone=0 delta-time=102 use=1
ipv4     2 udp      17 26 src=192.168.1.10 dst=192.168.1.255 sport=137 dport=137 packets=2 bytes=156 [UNREPLIED] src=192.168.1.255 dst=192.168.1.10 sport=137 dport=137 packets=0 bytes=0 mark=0 delta-time=7 use=2
ipv4     2 gre      47 168 src=192.168.1.10 dst=198.51.100.1 srckey=0x0 dstkey=0x0 packets=9 bytes=900 src=198.51.100.1 dst=192.168.1.10 srckey=0x0 dstkey=0x0 packets=9 bytes=900 mark=0 delta-time=42 use=1
";

struct NoDns;

impl NameResolver for NoDns {
    fn reverse(&self, _ip: IpAddr) -> Option<String> {
        None
    }
}

fn eth0() -> Vec<RawInterface> {
    vec![RawInterface {
        name: "eth0".into(),
        flags: 0,
        addresses: vec![RawAddress {
            ip: "192.168.1.10".parse().unwrap(),
            netmask: "255.255.255.0".parse().unwrap(),
        }],
    }]
}

fn config() -> Config {
    Config {
        dns: false,
        show_status: true,
        ..Config::default()
    }
}

#[test]
fn two_dumps_produce_rates() {
    let mut collector = ProcConntrack::new();
    let mut monitor = Monitor::new(NoDns);

    let first = collector.parse_dump(DUMP_1, 1_700_000_000 * NS);
    assert_eq!(first.len(), 3);
    let report = monitor.process(&config(), first, eth0(), 1_700_000_000);
    assert!(!report.primed);
    assert_eq!(report.flow_count, 3);

    let second = collector.parse_dump(DUMP_2, 1_700_000_002 * NS);
    let report = monitor.process(&config(), second, eth0(), 1_700_000_002);

    assert!(report.primed);
    assert!(report.age_tracking);
    // GRE is dropped as unsupported
    assert_eq!(report.connections.len(), 2);

    let tcp = &report.connections[0];
    assert_eq!(tcp.dport, 443);
    assert_eq!(tcp.protocol_label(), "tcp");
    assert_eq!(tcp.state, Some(FlowState::Assured));
    // 200,000 reply bytes and 2,000 original bytes over 2 s
    assert_eq!(tcp.rates.rx, 800_000);
    assert_eq!(tcp.rates.tx, 8_000);
    assert_eq!(tcp.ingress.name(), "eth0");
    assert_eq!(tcp.egress.name(), "eth0");

    let udp = &report.connections[1];
    assert_eq!(udp.state, Some(FlowState::Unreplied));
    assert_eq!(udp.rates.tx, 312);
}

#[test]
fn tsv_lines_after_priming() {
    let mut collector = ProcConntrack::new();
    let mut monitor = Monitor::new(NoDns);
    let mut config = config();
    config.format = conntop::cli::OutputFormat::Tsv;
    config.raw_bps = true;

    let mut out = LineOutput::new();
    let mut buf = Vec::new();

    let report = monitor.process(&config, collector.parse_dump(DUMP_1, 1_700_000_000 * NS), eth0(), 1_700_000_000);
    out.write_report(&report, &config, &mut buf).unwrap();
    assert!(buf.is_empty());

    let report = monitor.process(&config, collector.parse_dump(DUMP_2, 1_700_000_002 * NS), eth0(), 1_700_000_002);
    out.write_report(&report, &config, &mut buf).unwrap();
    out.write_report(&report, &config, &mut buf).unwrap();

    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // header once, two flows per cycle
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("timestamp\t"));
    assert!(lines[1].contains("\t808000\t"));
    assert_eq!(lines.iter().filter(|l| l.starts_with("timestamp")).count(), 1);
}

#[test]
fn collector_reads_table_file() {
    let path = std::env::temp_dir().join(format!("conntop-test-{}", std::process::id()));
    std::fs::File::create(&path)
        .and_then(|mut f| f.write_all(DUMP_1.as_bytes()))
        .unwrap();

    let mut collector = ProcConntrack::with_path(&path);
    let flows = collector.collect_connections().unwrap();
    assert_eq!(flows.len(), 3);
    assert!(flows.iter().all(|f| f.start_ts.is_some()));

    std::fs::remove_file(&path).unwrap();
    let err = collector.collect_connections().unwrap_err();
    assert!(matches!(err, ConntopError::ConntrackUnavailable(_)));
}
