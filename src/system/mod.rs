pub mod conntrack;
pub mod interface;

use std::net::IpAddr;

use crate::error::ConntopError;

/// One flow record as reported by the connection-tracking table.
///
/// The local side is the original-direction tuple, the remote side is the
/// reply-direction tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFlow {
    pub id: u32,
    /// Nanoseconds since the epoch.
    pub start_ts: Option<u64>,
    pub stop_ts: Option<u64>,
    /// Address family number (`AF_INET`, `AF_INET6`).
    pub l3: u8,
    /// IP protocol number.
    pub l4: u8,
    pub tcp_state: Option<u8>,
    pub status: u32,
    pub bytes_orig: u64,
    pub bytes_repl: u64,
    pub local_src: IpAddr,
    pub local_dst: IpAddr,
    pub remote_src: IpAddr,
    pub remote_dst: IpAddr,
    pub sport: u16,
    pub dport: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAddress {
    pub ip: IpAddr,
    pub netmask: IpAddr,
}

/// Raw interface data from the address enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInterface {
    pub name: String,
    pub flags: u32,
    pub addresses: Vec<RawAddress>,
}

/// Source of the kernel's connection-tracking dump.
pub trait FlowSource {
    fn collect_connections(&mut self) -> Result<Vec<RawFlow>, ConntopError>;
}

/// Source of the machine's interfaces and their addresses.
pub trait InterfaceSource {
    fn enumerate_interfaces(&self) -> Result<Vec<RawInterface>, ConntopError>;
}
