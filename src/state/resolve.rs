//! Interface resolution, rate aggregation and display filtering.

use std::net::IpAddr;

use crate::config::Config;
use crate::model::directory::Directory;
use crate::model::{Connection, InterfaceRef, L3Protocol};

/// Most connections kept for display in one cycle.
pub const DISPLAY_LIMIT: usize = 1024;

/// Resolve and aggregate every rate-bearing connection that clears the
/// threshold for an enabled family, and return the indices of those that
/// also pass the interface and loopback filters.
///
/// Aggregates are zeroed first, so calling this again on the same cycle
/// yields the same totals.
pub fn resolve(
    directory: &mut Directory,
    connections: &mut [Connection],
    config: &Config,
) -> Vec<usize> {
    directory.reset_rates();
    let mut shown = Vec::new();

    for (i, conn) in connections.iter_mut().enumerate() {
        if !is_candidate(conn, config) {
            continue;
        }

        let rates = conn.rates;
        let ips: [IpAddr; 4] = [conn.local.src, conn.local.dst, conn.remote.src, conn.remote.dst];

        let ingress = directory
            .lookup(conn.local.dst)
            .or_else(|| directory.lookup(conn.remote.dst));
        conn.ingress = match ingress {
            Some(idx) => {
                directory.credit(idx, rates, rates, &ips);
                directory.reference(idx)
            }
            None => InterfaceRef::Unknown,
        };

        let egress = directory
            .lookup(conn.local.src)
            .or_else(|| directory.lookup(conn.local.dst));
        conn.egress = match egress {
            Some(idx) => {
                // Rates are measured at the host, so the far side sees them mirrored.
                if egress != ingress {
                    directory.credit(idx, rates.mirrored(), rates, &ips);
                }
                directory.reference(idx)
            }
            None => InterfaceRef::Unknown,
        };

        if shown.len() < DISPLAY_LIMIT && passes_filters(conn, config) {
            shown.push(i);
        }
    }

    shown
}

/// Family, age and threshold gate applied before resolution.
pub fn is_candidate(conn: &Connection, config: &Config) -> bool {
    let family_enabled = match conn.l3 {
        L3Protocol::Ipv4 => config.ipv4,
        L3Protocol::Ipv6 => config.ipv6,
    };
    family_enabled && conn.delta > 0 && conn.rates.sum >= config.threshold
}

/// Interface name and loopback filters, evaluated on resolved connections.
pub fn passes_filters(conn: &Connection, config: &Config) -> bool {
    if let Some(filter) = &config.in_filter
        && !filter.matches(conn.ingress.name())
    {
        return false;
    }
    if let Some(filter) = &config.out_filter
        && !filter.matches(conn.egress.name())
    {
        return false;
    }
    config.include_loopback || !conn.ingress.is_loopback()
}
