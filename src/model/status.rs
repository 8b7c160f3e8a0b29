//! Conntrack status bits and the human-readable flow state derived from them.

use serde::Serialize;

pub const IPS_SEEN_REPLY: u32 = 1 << 1;
pub const IPS_ASSURED: u32 = 1 << 2;
pub const IPS_CONFIRMED: u32 = 1 << 3;
pub const IPS_SRC_NAT: u32 = 1 << 4;
pub const IPS_DST_NAT: u32 = 1 << 5;
pub const IPS_UNTRACKED: u32 = 1 << 12;

/// Kernel TCP conntrack states (`enum tcp_conntrack`).
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TcpState {
    None,
    SynSent,
    SynRecv,
    Established,
    FinWait,
    CloseWait,
    LastAck,
    TimeWait,
    Close,
    SynSent2,
}

impl TcpState {
    pub fn from_number(n: u8) -> Option<Self> {
        Some(match n {
            0 => Self::None,
            1 => Self::SynSent,
            2 => Self::SynRecv,
            3 => Self::Established,
            4 => Self::FinWait,
            5 => Self::CloseWait,
            6 => Self::LastAck,
            7 => Self::TimeWait,
            8 => Self::Close,
            9 => Self::SynSent2,
            _ => return None,
        })
    }

    /// Parse the state word printed in `/proc/net/nf_conntrack`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "NONE" => Self::None,
            "SYN_SENT" => Self::SynSent,
            "SYN_RECV" => Self::SynRecv,
            "ESTABLISHED" => Self::Established,
            "FIN_WAIT" => Self::FinWait,
            "CLOSE_WAIT" => Self::CloseWait,
            "LAST_ACK" => Self::LastAck,
            "TIME_WAIT" => Self::TimeWait,
            "CLOSE" => Self::Close,
            "SYN_SENT2" => Self::SynSent2,
            _ => return None,
        })
    }

    pub fn number(self) -> u8 {
        self as u8
    }
}

/// Displayed state of a flow.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    Unreplied,
    Untracked,
    Assured,
    Confirmed,
    TimeWait,
    Close,
    CloseWait,
    FinWait,
    SynSent,
}

impl FlowState {
    /// Derive the state from the status bitmask, letting TCP teardown and
    /// handshake states override it.
    pub fn derive(status: u32, tcp: Option<TcpState>) -> Option<Self> {
        let base = if status & IPS_SEEN_REPLY == 0 {
            Some(Self::Unreplied)
        } else if status & IPS_UNTRACKED != 0 {
            Some(Self::Untracked)
        } else if status & IPS_ASSURED != 0 {
            Some(Self::Assured)
        } else if status & IPS_CONFIRMED != 0 {
            Some(Self::Confirmed)
        } else {
            None
        };

        match tcp {
            Some(TcpState::TimeWait) => Some(Self::TimeWait),
            Some(TcpState::Close) => Some(Self::Close),
            Some(TcpState::CloseWait) => Some(Self::CloseWait),
            Some(TcpState::FinWait) => Some(Self::FinWait),
            Some(TcpState::SynSent | TcpState::SynSent2) => Some(Self::SynSent),
            _ => base,
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unreplied => "UNREPLIED",
            Self::Untracked => "UNTRACKED",
            Self::Assured => "ASSURED",
            Self::Confirmed => "CONFIRMED",
            Self::TimeWait => "TIME_WAIT",
            Self::Close => "CLOSE",
            Self::CloseWait => "CLOSE_WAIT",
            Self::FinWait => "FIN_WAIT",
            Self::SynSent => "SYN_SENT",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Serialize, Debug, Default, PartialEq, Eq)]
pub struct NatFlags {
    pub src: bool,
    pub dst: bool,
}

impl NatFlags {
    pub fn from_status(status: u32) -> Self {
        Self {
            src: status & IPS_SRC_NAT != 0,
            dst: status & IPS_DST_NAT != 0,
        }
    }
}
