//! Connection-tracking dump read from `/proc/net/nf_conntrack`.
//!
//! The procfs table carries no conntrack id and reports flow age only as
//! `delta-time` seconds (when `nf_conntrack_timestamp` is enabled), so both
//! the id and the start timestamp are synthesized here and kept stable
//! across dumps.

use std::hash::{Hash, Hasher};
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::{FxHashMap, FxHasher};

use crate::error::ConntopError;
use crate::model::status::{
    IPS_ASSURED, IPS_CONFIRMED, IPS_DST_NAT, IPS_SEEN_REPLY, IPS_SRC_NAT, TcpState,
};

use super::{FlowSource, RawFlow};

pub const CONNTRACK_PATH: &str = "/proc/net/nf_conntrack";

const NSEC_PER_SEC: u64 = 1_000_000_000;
const IPPROTO_TCP: u8 = 6;

/// Collector backed by the procfs conntrack table.
pub struct ProcConntrack {
    path: PathBuf,
    /// Start timestamps handed out in the previous dump, by synthesized id.
    starts: FxHashMap<u32, u64>,
}

impl ProcConntrack {
    pub fn new() -> Self {
        Self::with_path(CONNTRACK_PATH)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            starts: FxHashMap::default(),
        }
    }

    /// Parse one full dump taken at `now_ns`.
    pub fn parse_dump(&mut self, content: &str, now_ns: u64) -> Vec<RawFlow> {
        let mut flows = Vec::new();
        let mut starts = FxHashMap::default();

        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let Some(entry) = parse_conntrack_line(line) else {
                log::debug!("Skipping unparsable conntrack line: {line}");
                continue;
            };
            let flow = entry.into_raw(now_ns, &self.starts);
            if let Some(start) = flow.start_ts {
                starts.insert(flow.id, start);
            }
            flows.push(flow);
        }

        self.starts = starts;
        flows
    }
}

impl Default for ProcConntrack {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowSource for ProcConntrack {
    fn collect_connections(&mut self) -> Result<Vec<RawFlow>, ConntopError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConntopError::ConntrackUnavailable(format!(
                "{} not found (is the nf_conntrack module loaded?)",
                self.path.display()
            )),
            io::ErrorKind::PermissionDenied => ConntopError::ConntrackUnavailable(format!(
                "permission denied reading {} (run as root)",
                self.path.display()
            )),
            _ => ConntopError::Conntrack(e),
        })?;

        let flows = self.parse_dump(&content, now_nanos());
        log::debug!("Collected {} conntrack entries from {}", flows.len(), self.path.display());
        Ok(flows)
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() * NSEC_PER_SEC + u64::from(d.subsec_nanos()))
        .unwrap_or(0)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tuple {
    src: Option<IpAddr>,
    dst: Option<IpAddr>,
    sport: u16,
    dport: u16,
    bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConntrackEntry {
    l3: u8,
    l4: u8,
    tcp_state: Option<TcpState>,
    orig: Tuple,
    reply: Tuple,
    unreplied: bool,
    assured: bool,
    zone: u16,
    delta_time: Option<u64>,
}

/// Parse one line of `/proc/net/nf_conntrack`:
///
/// `ipv4 2 tcp 6 117 ESTABLISHED src=.. dst=.. sport=.. dport=.. packets=.. bytes=..
///  src=.. dst=.. sport=.. dport=.. packets=.. bytes=.. [ASSURED] mark=0 zone=0 delta-time=12 use=2`
fn parse_conntrack_line(line: &str) -> Option<ConntrackEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return None;
    }

    let l3: u8 = fields[1].parse().ok()?;
    let l4: u8 = fields[3].parse().ok()?;

    let mut entry = ConntrackEntry {
        l3,
        l4,
        tcp_state: None,
        orig: Tuple::default(),
        reply: Tuple::default(),
        unreplied: false,
        assured: false,
        zone: 0,
        delta_time: None,
    };
    let mut in_reply = false;

    // fields[4] is the remaining timeout.
    for token in &fields[5..] {
        if let Some(flag) = token.strip_prefix('[') {
            match flag.trim_end_matches(']') {
                "UNREPLIED" => entry.unreplied = true,
                "ASSURED" => entry.assured = true,
                _ => {}
            }
            continue;
        }

        let Some((key, value)) = token.split_once('=') else {
            if l4 == IPPROTO_TCP {
                entry.tcp_state = TcpState::from_name(token);
            }
            continue;
        };

        if key == "src" && entry.orig.src.is_some() {
            in_reply = true;
        }
        let tuple = if in_reply {
            &mut entry.reply
        } else {
            &mut entry.orig
        };

        match key {
            "src" => tuple.src = Some(value.parse().ok()?),
            "dst" => tuple.dst = Some(value.parse().ok()?),
            "sport" => tuple.sport = value.parse().ok()?,
            "dport" => tuple.dport = value.parse().ok()?,
            "bytes" => tuple.bytes = value.parse().ok()?,
            "zone" => entry.zone = value.parse().unwrap_or(0),
            "delta-time" => entry.delta_time = value.parse().ok(),
            _ => {}
        }
    }

    if entry.orig.src.is_none()
        || entry.orig.dst.is_none()
        || entry.reply.src.is_none()
        || entry.reply.dst.is_none()
    {
        return None;
    }
    Some(entry)
}

impl ConntrackEntry {
    fn synthetic_id(&self) -> u32 {
        let mut hasher = FxHasher::default();
        self.l3.hash(&mut hasher);
        self.l4.hash(&mut hasher);
        self.orig.src.hash(&mut hasher);
        self.orig.dst.hash(&mut hasher);
        self.orig.sport.hash(&mut hasher);
        self.orig.dport.hash(&mut hasher);
        self.zone.hash(&mut hasher);
        let h = hasher.finish();
        (h ^ (h >> 32)) as u32
    }

    fn status(&self) -> u32 {
        let mut status = IPS_CONFIRMED;
        if !self.unreplied {
            status |= IPS_SEEN_REPLY;
        }
        if self.assured {
            status |= IPS_ASSURED;
        }
        if self.reply.dst != self.orig.src {
            status |= IPS_SRC_NAT;
        }
        if self.reply.src != self.orig.dst {
            status |= IPS_DST_NAT;
        }
        status
    }

    fn into_raw(self, now_ns: u64, previous_starts: &FxHashMap<u32, u64>) -> RawFlow {
        let id = self.synthetic_id();
        let start_ts = self.delta_time.map(|secs| {
            let computed = now_ns.saturating_sub(secs.saturating_mul(NSEC_PER_SEC));
            match previous_starts.get(&id) {
                Some(&prev) if prev.abs_diff(computed) <= NSEC_PER_SEC => prev,
                _ => computed,
            }
        });
        let status = self.status();

        // Presence of all four addresses is checked by the parser.
        let unspecified = IpAddr::from([0u8; 4]);
        RawFlow {
            id,
            start_ts,
            stop_ts: None,
            l3: self.l3,
            l4: self.l4,
            tcp_state: self.tcp_state.map(TcpState::number),
            status,
            bytes_orig: self.orig.bytes,
            bytes_repl: self.reply.bytes,
            local_src: self.orig.src.unwrap_or(unspecified),
            local_dst: self.orig.dst.unwrap_or(unspecified),
            remote_src: self.reply.src.unwrap_or(unspecified),
            remote_dst: self.reply.dst.unwrap_or(unspecified),
            sport: self.orig.sport,
            dport: self.orig.dport,
        }
    }
}
