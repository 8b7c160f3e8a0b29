use crate::config::{AgeFormat, Config};

/// How rates are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Units {
    pub bytes: bool,
    /// 1024-based scaling with `Ki`-style prefixes.
    pub si: bool,
    /// Raw bits/s integers, no scaling.
    pub raw: bool,
}

impl Units {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bytes: config.bytes,
            si: config.si,
            raw: config.raw_bps,
        }
    }

    pub fn label(self) -> &'static str {
        match (self.raw, self.bytes, self.si) {
            (true, _, _) => "bps (raw)",
            (false, true, true) => "iBps",
            (false, true, false) => "Bps",
            (false, false, true) => "ibps",
            (false, false, false) => "bps",
        }
    }
}

/// Formats a bits-per-second rate with auto-scaling units.
///
/// Output examples: `"512 bps"`, `"1.5 Kbps"`, `"2.0 KiBps"`, `"23.4 Mbps"`.
pub fn format_rate(bits_per_sec: i64, units: Units) -> String {
    if units.raw {
        return bits_per_sec.to_string();
    }

    let (value, unit) = if units.bytes {
        (bits_per_sec as f64 / 8.0, "Bps")
    } else {
        (bits_per_sec as f64, "bps")
    };
    let (base, infix) = if units.si { (1024.0, "i") } else { (1000.0, "") };

    if value.abs() < base {
        return format!("{value:.0} {unit}");
    }

    let mut scaled = value / base;
    let mut prefix = 'K';
    for next in ['M', 'G', 'T'] {
        if scaled.abs() < base {
            break;
        }
        scaled /= base;
        prefix = next;
    }
    format!("{scaled:.1} {prefix}{infix}{unit}")
}

/// Formats a flow age in seconds; empty when hidden.
pub fn format_age(secs: i64, format: AgeFormat) -> String {
    match format {
        AgeFormat::Hidden => String::new(),
        AgeFormat::Seconds => secs.to_string(),
        AgeFormat::Dhms => {
            let secs = secs.max(0);
            format!(
                "{:>4}d {:>2}h {:>2}m {:>2}s",
                secs / 86_400,
                secs % 86_400 / 3_600,
                secs % 3_600 / 60,
                secs % 60
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BITS: Units = Units {
        bytes: false,
        si: false,
        raw: false,
    };

    // ---- format_rate ----

    #[test]
    fn rate_zero() {
        assert_eq!(format_rate(0, BITS), "0 bps");
    }

    #[test]
    fn rate_below_kilo() {
        assert_eq!(format_rate(512, BITS), "512 bps");
        assert_eq!(format_rate(999, BITS), "999 bps");
    }

    #[test]
    fn rate_scaled() {
        assert_eq!(format_rate(1_500, BITS), "1.5 Kbps");
        assert_eq!(format_rate(1_024_000, BITS), "1.0 Mbps");
        assert_eq!(format_rate(23_400_000_000, BITS), "23.4 Gbps");
        assert_eq!(format_rate(5_000_000_000_000_000, BITS), "5000.0 Tbps");
    }

    #[test]
    fn rate_binary_prefixes() {
        let si = Units { si: true, ..BITS };
        assert_eq!(format_rate(1_000, si), "1000 bps");
        assert_eq!(format_rate(2_048, si), "2.0 Kibps");
    }

    #[test]
    fn rate_bytes() {
        let bytes = Units { bytes: true, ..BITS };
        assert_eq!(format_rate(800, bytes), "100 Bps");
        assert_eq!(format_rate(16_000, bytes), "2.0 KBps");
        let both = Units { bytes: true, si: true, raw: false };
        assert_eq!(format_rate(16_384, both), "2.0 KiBps");
    }

    #[test]
    fn rate_raw() {
        let raw = Units { raw: true, ..BITS };
        assert_eq!(format_rate(1_234_567, raw), "1234567");
    }

    // ---- format_age ----

    #[test]
    fn age_formats() {
        assert_eq!(format_age(90_061, AgeFormat::Dhms), "   1d  1h  1m  1s");
        assert_eq!(format_age(42, AgeFormat::Seconds), "42");
        assert_eq!(format_age(42, AgeFormat::Hidden), "");
    }
}
