use clap::{ArgAction, Parser, ValueEnum};

use crate::config::{AgeFormat, Config, DEFAULT_INTERVAL_SECS, DEFAULT_THRESHOLD, InterfaceFilter};
use crate::state::sort::SortSpec;

#[derive(Parser, Debug)]
#[command(
    name = "conntop",
    version,
    disable_version_flag = true,
    about = "Live per-connection and per-interface throughput from Linux conntrack"
)]
pub struct Cli {
    /// Show IPv4 flows only
    #[arg(short = '4', conflicts_with = "ipv6_only")]
    pub ipv4_only: bool,

    /// Show IPv6 flows only
    #[arg(short = '6')]
    pub ipv6_only: bool,

    /// Age column: 0 hidden, 1 seconds, 2 days/hours/minutes/seconds
    #[arg(short = 'a', long = "age", value_parser = clap::value_parser!(u8).range(0..=2))]
    pub age: Option<u8>,

    /// Show rates in bytes instead of bits
    #[arg(short = 'b', long)]
    pub bytes: bool,

    /// Show raw bits/s without unit scaling
    #[arg(short = 'B', long = "bps")]
    pub raw_bps: bool,

    /// Continuous line output instead of the full-screen view
    #[arg(short = 'c', long)]
    pub continuous: bool,

    /// Show devices instead of connections
    #[arg(short = 'd', long = "dev")]
    pub device_view: bool,

    /// Only flows entering on this interface (trailing '+' matches a prefix)
    #[arg(short = 'i', long = "in", value_parser = parse_interface_filter)]
    pub in_filter: Option<InterfaceFilter>,

    /// Only flows leaving on this interface (trailing '+' matches a prefix)
    #[arg(short = 'o', long = "out", value_parser = parse_interface_filter)]
    pub out_filter: Option<InterfaceFilter>,

    /// Show the conntrack id column
    #[arg(short = 'I', long = "id")]
    pub show_id: bool,

    /// Include loopback flows
    #[arg(short = 'L', long)]
    pub loopback: bool,

    /// Machine mode: wide, raw bps, continuous, id and age in seconds, as TSV
    #[arg(short = 'm', long)]
    pub machine: bool,

    /// Numeric local addresses (no reverse DNS)
    #[arg(short = 'n')]
    pub numeric_local: bool,

    /// Numeric remote addresses (no reverse DNS)
    #[arg(short = 'N')]
    pub numeric_remote: bool,

    /// Numeric ports (no service names)
    #[arg(short = 'P')]
    pub numeric_port: bool,

    /// Redact local addresses
    #[arg(short = 'r')]
    pub redact_local: bool,

    /// Redact remote addresses
    #[arg(short = 'R')]
    pub redact_remote: bool,

    /// Sort field: id, in, out, sport, dport, rx, tx, sum, age, proto or none; '+' prefix for ascending
    #[arg(short = 's', long, default_value = "sum", value_parser = parse_sort)]
    pub sort: SortSpec,

    /// Use 1024-based unit scaling (Ki, Mi, ...)
    #[arg(short = 'S', long)]
    pub si: bool,

    /// Minimum throughput in bits/s for a flow to be shown
    #[arg(short = 't', long, default_value_t = DEFAULT_THRESHOLD, allow_negative_numbers = true)]
    pub threshold: i64,

    /// Update interval in seconds
    #[arg(short = 'u', long = "interval", default_value_t = DEFAULT_INTERVAL_SECS, value_parser = validate_interval)]
    pub interval: u64,

    /// Show the flow status column
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// One line per flow with every column
    #[arg(short = 'w', long)]
    pub wide: bool,

    /// Line output format when not running full-screen
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Never reverse-resolve addresses
    #[arg(long)]
    pub no_dns: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    _version: Option<bool>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tsv,
    Json,
    Pretty,
}

fn validate_interval(s: &str) -> Result<u64, String> {
    let val: u64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid integer"))?;
    if val < 1 {
        Err("interval must be at least 1 second".to_string())
    } else if val > 999 {
        Err("interval must be at most 999 seconds".to_string())
    } else {
        Ok(val)
    }
}

fn parse_sort(s: &str) -> Result<SortSpec, String> {
    s.parse()
}

fn parse_interface_filter(s: &str) -> Result<InterfaceFilter, String> {
    s.parse()
}

impl Cli {
    /// Build the initial runtime configuration.
    pub fn into_config(self) -> Config {
        let mut config = Config {
            interval_secs: self.interval,
            threshold: self.threshold,
            sort: self.sort,
            ipv4: !self.ipv6_only,
            ipv6: !self.ipv4_only,
            include_loopback: self.loopback,
            in_filter: self.in_filter,
            out_filter: self.out_filter,
            dns: !self.no_dns,
            numeric_local: self.numeric_local,
            numeric_remote: self.numeric_remote,
            numeric_port: self.numeric_port,
            redact_local: self.redact_local,
            redact_remote: self.redact_remote,
            age: self.age.map(AgeFormat::from_level).unwrap_or_default(),
            show_status: self.verbose,
            show_id: self.show_id,
            bytes: self.bytes,
            si: self.si,
            raw_bps: self.raw_bps,
            wide: self.wide,
            continuous: self.continuous,
            device_view: self.device_view,
            format: self.format,
            no_color: self.no_color || std::env::var_os("NO_COLOR").is_some(),
        };

        if self.machine {
            config.wide = true;
            config.raw_bps = true;
            config.continuous = true;
            config.show_id = true;
            config.format = OutputFormat::Tsv;
            if self.age.is_none() {
                config.age = AgeFormat::Seconds;
            }
        }
        config
    }
}
