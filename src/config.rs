use std::str::FromStr;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::state::sort::SortSpec;

pub const DEFAULT_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_THRESHOLD: i64 = 1;

/// How the flow age column is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AgeFormat {
    #[default]
    Hidden,
    Seconds,
    /// `Dd Hh Mm Ss`
    Dhms,
}

impl AgeFormat {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Hidden,
            1 => Self::Seconds,
            _ => Self::Dhms,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Hidden => Self::Dhms,
            Self::Seconds | Self::Dhms => Self::Hidden,
        }
    }
}

/// Interface name filter; a trailing `+` turns it into a prefix match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceFilter {
    pub name: String,
    pub prefix: bool,
}

impl InterfaceFilter {
    pub fn matches(&self, name: &str) -> bool {
        if self.prefix {
            name.starts_with(&self.name)
        } else {
            name == self.name
        }
    }
}

impl FromStr for InterfaceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("interface name must not be empty".to_string());
        }
        match s.strip_suffix('+') {
            Some(stem) if !stem.is_empty() => Ok(Self {
                name: stem.to_string(),
                prefix: true,
            }),
            _ => Ok(Self {
                name: s.to_string(),
                prefix: false,
            }),
        }
    }
}

impl std::fmt::Display for InterfaceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.prefix {
            write!(f, "{}+", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Runtime options for one cycle. Never mutated in place: interactive
/// commands derive a new value through [`Config::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub interval_secs: u64,
    /// Minimum `bps_sum` for a flow to be displayed and aggregated.
    pub threshold: i64,
    pub sort: SortSpec,
    pub ipv4: bool,
    pub ipv6: bool,
    pub include_loopback: bool,
    pub in_filter: Option<InterfaceFilter>,
    pub out_filter: Option<InterfaceFilter>,
    pub dns: bool,
    pub numeric_local: bool,
    pub numeric_remote: bool,
    pub numeric_port: bool,
    pub redact_local: bool,
    pub redact_remote: bool,
    pub age: AgeFormat,
    pub show_status: bool,
    pub show_id: bool,
    pub bytes: bool,
    pub si: bool,
    pub raw_bps: bool,
    pub wide: bool,
    pub continuous: bool,
    pub device_view: bool,
    pub format: OutputFormat,
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            threshold: DEFAULT_THRESHOLD,
            sort: SortSpec::default(),
            ipv4: true,
            ipv6: true,
            include_loopback: false,
            in_filter: None,
            out_filter: None,
            dns: true,
            numeric_local: false,
            numeric_remote: false,
            numeric_port: false,
            redact_local: false,
            redact_remote: false,
            age: AgeFormat::Hidden,
            show_status: false,
            show_id: false,
            bytes: false,
            si: false,
            raw_bps: false,
            wide: false,
            continuous: false,
            device_view: false,
            format: OutputFormat::Pretty,
            no_color: false,
        }
    }
}

/// A runtime change requested from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    ToggleNumericLocal,
    ToggleNumericRemote,
    SetInterval(u64),
    SetThreshold(i64),
    ToggleAge,
    ToggleWide,
    ToggleRedactLocal,
    ToggleRedactRemote,
    ToggleSi,
    ToggleStatus,
    ToggleId,
    ToggleBytes,
    ToggleRawBps,
    ToggleContinuous,
    ToggleLoopback,
    BothFamilies,
    /// Force IPv4 on and flip IPv6.
    KeepIpv4ToggleIpv6,
    /// Force IPv6 on and flip IPv4.
    KeepIpv6ToggleIpv4,
    ToggleDeviceView,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn interval_i64(&self) -> i64 {
        i64::try_from(self.interval_secs).unwrap_or(i64::MAX)
    }

    /// Return a copy of this configuration with `command` applied.
    pub fn apply(&self, command: Command) -> Config {
        let mut next = self.clone();
        match command {
            Command::ToggleNumericLocal => next.numeric_local = !self.numeric_local,
            Command::ToggleNumericRemote => next.numeric_remote = !self.numeric_remote,
            Command::SetInterval(secs) => next.interval_secs = secs,
            Command::SetThreshold(bps) => next.threshold = bps,
            Command::ToggleAge => next.age = self.age.toggled(),
            Command::ToggleWide => next.wide = !self.wide,
            Command::ToggleRedactLocal => next.redact_local = !self.redact_local,
            Command::ToggleRedactRemote => next.redact_remote = !self.redact_remote,
            Command::ToggleSi => next.si = !self.si,
            Command::ToggleStatus => next.show_status = !self.show_status,
            Command::ToggleId => next.show_id = !self.show_id,
            Command::ToggleBytes => next.bytes = !self.bytes,
            Command::ToggleRawBps => next.raw_bps = !self.raw_bps,
            Command::ToggleContinuous => next.continuous = !self.continuous,
            Command::ToggleLoopback => next.include_loopback = !self.include_loopback,
            Command::BothFamilies => {
                next.ipv4 = true;
                next.ipv6 = true;
            }
            Command::KeepIpv4ToggleIpv6 => {
                next.ipv4 = true;
                next.ipv6 = !self.ipv6;
            }
            Command::KeepIpv6ToggleIpv4 => {
                next.ipv6 = true;
                next.ipv4 = !self.ipv4;
            }
            Command::ToggleDeviceView => next.device_view = !self.device_view,
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // UT-8.1: Defaults
    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.interval_secs, 2);
        assert_eq!(c.threshold, 1);
        assert!(c.ipv4 && c.ipv6);
        assert!(!c.include_loopback);
        assert!(c.dns);
        assert_eq!(c.sort, SortSpec::default());
    }

    // UT-8.2: apply leaves the original untouched
    #[test]
    fn test_apply_is_pure() {
        let c = Config::default();
        let next = c.apply(Command::ToggleWide);
        assert!(next.wide);
        assert!(!c.wide);
        assert_eq!(next.apply(Command::ToggleWide), c);
    }

    // UT-8.3: Family keys
    #[test]
    fn test_family_commands() {
        let c = Config::default();
        let v4_only = c.apply(Command::KeepIpv4ToggleIpv6);
        assert!(v4_only.ipv4 && !v4_only.ipv6);
        let v6_only = c.apply(Command::KeepIpv6ToggleIpv4);
        assert!(!v6_only.ipv4 && v6_only.ipv6);
        let both = v6_only.apply(Command::BothFamilies);
        assert!(both.ipv4 && both.ipv6);
    }

    // UT-8.4: Age toggles between hidden and D-H-M-S
    #[test]
    fn test_age_toggle() {
        let c = Config::default().apply(Command::ToggleAge);
        assert_eq!(c.age, AgeFormat::Dhms);
        assert_eq!(c.apply(Command::ToggleAge).age, AgeFormat::Hidden);
        assert_eq!(AgeFormat::Seconds.toggled(), AgeFormat::Hidden);
    }

    // UT-8.5: Interface filter parsing
    #[test]
    fn test_interface_filter() {
        let exact: InterfaceFilter = "eth0".parse().unwrap();
        assert!(exact.matches("eth0"));
        assert!(!exact.matches("eth01"));

        let prefix: InterfaceFilter = "eth+".parse().unwrap();
        assert!(prefix.prefix);
        assert!(prefix.matches("eth1"));
        assert!(!prefix.matches("wlan0"));
        assert_eq!(prefix.to_string(), "eth+");

        let plus: InterfaceFilter = "+".parse().unwrap();
        assert!(!plus.prefix);
        assert!("".parse::<InterfaceFilter>().is_err());
    }

    // UT-8.6: Interval and threshold commands
    #[test]
    fn test_set_values() {
        let c = Config::default()
            .apply(Command::SetInterval(5))
            .apply(Command::SetThreshold(1_000));
        assert_eq!(c.interval(), Duration::from_secs(5));
        assert_eq!(c.threshold, 1_000);
    }
}
