pub mod directory;
pub mod status;

use std::net::IpAddr;

use serde::{Serialize, Serializer};

use self::status::{FlowState, NatFlags, TcpState};

/// Name shown for an interface that could not be resolved.
pub const UNKNOWN_INTERFACE: &str = "*";

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum L3Protocol {
    Ipv4,
    Ipv6,
}

impl L3Protocol {
    /// Map an address family number (`AF_INET`/`AF_INET6`) to a protocol.
    pub fn from_family(family: u8) -> Option<Self> {
        match i32::from(family) {
            libc::AF_INET => Some(Self::Ipv4),
            libc::AF_INET6 => Some(Self::Ipv6),
            _ => None,
        }
    }
}

impl std::fmt::Display for L3Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "ipv4"),
            Self::Ipv6 => write!(f, "ipv6"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum L4Protocol {
    Tcp,
    Udp,
    Icmp,
    Icmpv6,
    Igmp,
    Other(u8),
}

impl L4Protocol {
    pub fn from_number(number: u8) -> Self {
        match number {
            6 => Self::Tcp,
            17 => Self::Udp,
            1 => Self::Icmp,
            58 => Self::Icmpv6,
            2 => Self::Igmp,
            n => Self::Other(n),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::Tcp => 6,
            Self::Udp => 17,
            Self::Icmp => 1,
            Self::Icmpv6 => 58,
            Self::Igmp => 2,
            Self::Other(n) => n,
        }
    }

    /// Transports the monitor keeps; everything else is dropped at collection.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Short lowercase label, suffixed with `6` for IPv6 flows.
    pub fn label(self, l3: L3Protocol) -> String {
        let base = match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp | Self::Icmpv6 => "icmp",
            Self::Igmp => "igmp",
            Self::Other(41) => "ipv6",
            Self::Other(89) => "ospf",
            Self::Other(112) => "vrrp",
            Self::Other(n) => return n.to_string(),
        };
        match l3 {
            L3Protocol::Ipv4 => base.to_string(),
            L3Protocol::Ipv6 => format!("{base}6"),
        }
    }
}

impl Serialize for L4Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

/// Signed bits-per-second rates in both directions.
#[derive(Clone, Copy, Serialize, Debug, Default, PartialEq, Eq)]
pub struct Rates {
    pub rx: i64,
    pub tx: i64,
    pub sum: i64,
}

impl Rates {
    pub fn new(rx: i64, tx: i64) -> Self {
        Self {
            rx,
            tx,
            sum: rx.saturating_add(tx),
        }
    }

    pub fn add(&mut self, other: Rates) {
        self.rx = self.rx.saturating_add(other.rx);
        self.tx = self.tx.saturating_add(other.tx);
        self.sum = self.sum.saturating_add(other.sum);
    }

    /// The same rates seen from the other side of the host.
    pub fn mirrored(self) -> Self {
        Self {
            rx: self.tx,
            tx: self.rx,
            sum: self.sum,
        }
    }
}

/// One side of a tracked flow. The local side is the original tuple, the
/// remote side is the reply tuple.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub src: IpAddr,
    pub dst: IpAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_host: Option<String>,
}

impl Endpoints {
    pub fn new(src: IpAddr, dst: IpAddr) -> Self {
        Self {
            src,
            dst,
            src_host: None,
            dst_host: None,
        }
    }
}

/// Interface association of a connection, captured at resolution time.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum InterfaceRef {
    Resolved {
        index: usize,
        name: String,
        flags: u32,
    },
    #[default]
    Unknown,
}

impl InterfaceRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Resolved { name, .. } => name,
            Self::Unknown => UNKNOWN_INTERFACE,
        }
    }

    pub fn is_loopback(&self) -> bool {
        match self {
            Self::Resolved { flags, .. } => flags & libc::IFF_LOOPBACK as u32 != 0,
            Self::Unknown => false,
        }
    }
}

impl Serialize for InterfaceRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// One tracked flow for the current cycle.
#[derive(Clone, Serialize, Debug)]
pub struct Connection {
    pub id: u32,
    /// Creation time in nanoseconds since the epoch, when the kernel keeps it.
    pub start_time: Option<u64>,
    /// Age in seconds, or the poll interval when no start time is known.
    pub delta: i64,
    pub l3: L3Protocol,
    pub l4: L4Protocol,
    pub local: Endpoints,
    pub remote: Endpoints,
    pub sport: u16,
    pub dport: u16,
    pub bytes_orig: u64,
    pub bytes_repl: u64,
    pub bytes_sum: u64,
    pub rates: Rates,
    pub status: u32,
    pub tcp_state: Option<TcpState>,
    pub state: Option<FlowState>,
    pub nat: NatFlags,
    pub ingress: InterfaceRef,
    pub egress: InterfaceRef,
}

impl Connection {
    /// Cross-cycle identity: the id alone may be reused by a newer flow.
    pub fn key(&self) -> (u32, Option<u64>) {
        (self.id, self.start_time)
    }

    pub fn protocol_label(&self) -> String {
        self.l4.label(self.l3)
    }
}

/// One IP address bound to an interface.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct Address {
    pub ip: IpAddr,
    pub netmask: IpAddr,
    pub rates: Rates,
}

impl Address {
    pub fn new(ip: IpAddr, netmask: IpAddr) -> Self {
        Self {
            ip,
            netmask,
            rates: Rates::default(),
        }
    }

    /// Byte-wise `address & netmask == candidate & netmask` over the
    /// address's natural width. Families never match each other.
    pub fn contains(&self, candidate: IpAddr) -> bool {
        match (self.ip, self.netmask, candidate) {
            (IpAddr::V4(ip), IpAddr::V4(mask), IpAddr::V4(other)) => {
                masked_equal(&ip.octets(), &mask.octets(), &other.octets())
            }
            (IpAddr::V6(ip), IpAddr::V6(mask), IpAddr::V6(other)) => {
                masked_equal(&ip.octets(), &mask.octets(), &other.octets())
            }
            _ => false,
        }
    }
}

fn masked_equal(ip: &[u8], mask: &[u8], other: &[u8]) -> bool {
    ip.iter()
        .zip(mask)
        .zip(other)
        .all(|((a, m), b)| a & m == b & m)
}

/// A network device and the rates aggregated onto it this cycle.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub flags: u32,
    pub addresses: Vec<Address>,
    pub rates: Rates,
}

impl Interface {
    pub fn is_loopback(&self) -> bool {
        self.flags & libc::IFF_LOOPBACK as u32 != 0
    }
}
