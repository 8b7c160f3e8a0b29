//! Snapshot diff: turns raw flow records into connections and derives
//! throughput by matching them against the previous cycle.

use rustc_hash::FxHashMap;

use crate::model::directory::Directory;
use crate::model::status::{FlowState, NatFlags, TcpState};
use crate::model::{Connection, Endpoints, InterfaceRef, L3Protocol, L4Protocol, Rates};
use crate::system::RawFlow;

const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Connections built from one raw dump.
#[derive(Debug, Default)]
pub struct Classified {
    pub connections: Vec<Connection>,
    /// Some flow came without a start timestamp.
    pub timestamps_missing: bool,
    pub discarded: usize,
}

/// Build this cycle's connections, dropping non-IP families and unsupported
/// transports. A flow's `delta` is its age in seconds at `now_secs` (or at
/// its stop time), or `interval` when the kernel keeps no start time.
pub fn classify(raw: Vec<RawFlow>, now_secs: i64, interval: i64) -> Classified {
    let mut out = Classified {
        connections: Vec::with_capacity(raw.len()),
        ..Default::default()
    };

    for flow in raw {
        let Some(l3) = L3Protocol::from_family(flow.l3) else {
            out.discarded += 1;
            continue;
        };
        let l4 = L4Protocol::from_number(flow.l4);
        if !l4.is_supported() {
            out.discarded += 1;
            continue;
        }

        let tcp_state = match l4 {
            L4Protocol::Tcp => flow.tcp_state.and_then(TcpState::from_number),
            _ => None,
        };

        let start_time = flow.start_ts.filter(|&ts| ts > 0);
        let delta = match start_time {
            Some(start) => {
                let stop = flow.stop_ts.map_or(now_secs, secs);
                stop - secs(start)
            }
            None => {
                out.timestamps_missing = true;
                interval
            }
        };

        out.connections.push(Connection {
            id: flow.id,
            start_time,
            delta,
            l3,
            l4,
            local: Endpoints::new(flow.local_src, flow.local_dst),
            remote: Endpoints::new(flow.remote_src, flow.remote_dst),
            sport: flow.sport,
            dport: flow.dport,
            bytes_orig: flow.bytes_orig,
            bytes_repl: flow.bytes_repl,
            bytes_sum: flow.bytes_orig.saturating_add(flow.bytes_repl),
            rates: Rates::default(),
            status: flow.status,
            tcp_state,
            state: FlowState::derive(flow.status, tcp_state),
            nat: NatFlags::from_status(flow.status),
            ingress: InterfaceRef::Unknown,
            egress: InterfaceRef::Unknown,
        });
    }

    if out.discarded > 0 {
        log::debug!("Discarded {} flows with unsupported protocols", out.discarded);
    }
    out
}

fn secs(ns: u64) -> i64 {
    i64::try_from(ns / NSEC_PER_SEC).unwrap_or(i64::MAX)
}

/// Compute rates for every connection in `current` that has a counterpart
/// with the same id and start time in `previous`.
///
/// The elapsed time is the difference of the two ages, or `interval` when
/// the ages are equal or unknown. Byte counters that went backwards count
/// as a reset and contribute nothing. When the original destination is a
/// local address, original-direction bytes are received and reply bytes
/// transmitted; otherwise the reverse.
pub fn apply_rates(
    current: &mut [Connection],
    previous: &[Connection],
    directory: &Directory,
    interval: i64,
) {
    let index: FxHashMap<(u32, Option<u64>), usize> = previous
        .iter()
        .enumerate()
        .map(|(i, c)| (c.key(), i))
        .collect();

    for conn in current.iter_mut() {
        let Some(&i) = index.get(&conn.key()) else {
            continue;
        };
        let prev = &previous[i];

        if conn.local.src_host.is_none() {
            conn.local.src_host.clone_from(&prev.local.src_host);
        }
        if conn.local.dst_host.is_none() {
            conn.local.dst_host.clone_from(&prev.local.dst_host);
        }

        let elapsed = if conn.delta > 0 && conn.delta != prev.delta {
            conn.delta - prev.delta
        } else {
            interval
        };
        if elapsed <= 0 {
            continue;
        }
        let elapsed = elapsed.unsigned_abs();

        let repl = conn.bytes_repl.checked_sub(prev.bytes_repl).unwrap_or(0);
        let orig = conn.bytes_orig.checked_sub(prev.bytes_orig).unwrap_or(0);
        let bits = |bytes: u64| i64::try_from((bytes / elapsed).saturating_mul(8)).unwrap_or(i64::MAX);
        let local = directory.is_local(conn.local.dst);

        let (mut rx, mut tx) = (0i64, 0i64);
        if repl > 0 {
            if local {
                tx = tx.saturating_add(bits(repl));
            } else {
                rx = rx.saturating_add(bits(repl));
            }
        }
        if orig > 0 {
            if local {
                rx = rx.saturating_add(bits(orig));
            } else {
                tx = tx.saturating_add(bits(orig));
            }
        }
        conn.rates = Rates::new(rx, tx);
    }
}
