pub mod diff;
pub mod resolve;
pub mod sort;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::config::Config;
use crate::enrichment::dns_cache::DnsCache;
use crate::enrichment::dns_resolver::{NameResolver, resolve_hostname};
use crate::error::ConntopError;
use crate::model::directory::Directory;
use crate::model::{Connection, Interface, Rates};
use crate::system::{FlowSource, InterfaceSource, RawFlow, RawInterface};

use self::sort::SortKey;

/// Everything presentation needs from one cycle.
#[derive(Clone, Debug, Serialize)]
pub struct CycleReport {
    /// Seconds since the epoch when the cycle ran.
    pub timestamp: i64,
    /// False on the first cycle, before any flow can carry a rate.
    pub primed: bool,
    /// Flows in the kernel table, including discarded ones.
    pub flow_count: usize,
    pub age_tracking: bool,
    /// Displayed connections in display order.
    pub connections: Vec<Connection>,
    /// All interfaces with this cycle's aggregates.
    pub interfaces: Vec<Interface>,
    /// Sum of the displayed connections' rates.
    pub totals: Rates,
}

/// Cycle driver. Owns the only state carried between cycles: the previous
/// snapshot and the reverse DNS cache.
pub struct Monitor<R: NameResolver> {
    previous: Option<Vec<Connection>>,
    dns: DnsCache,
    resolver: R,
    age_tracking: bool,
}

impl<R: NameResolver> Monitor<R> {
    pub fn new(resolver: R) -> Self {
        Self::with_cache(resolver, DnsCache::new())
    }

    pub fn with_cache(resolver: R, dns: DnsCache) -> Self {
        Self {
            previous: None,
            dns,
            resolver,
            age_tracking: true,
        }
    }

    pub fn age_tracking(&self) -> bool {
        self.age_tracking
    }

    pub fn dns_cache(&self) -> &DnsCache {
        &self.dns
    }

    /// Collect from both sources and run one cycle. A collector error aborts
    /// the cycle before anything is retained.
    pub fn run_cycle(
        &mut self,
        config: &Config,
        flows: &mut dyn FlowSource,
        interfaces: &dyn InterfaceSource,
    ) -> Result<CycleReport, ConntopError> {
        let raw_interfaces = interfaces.enumerate_interfaces()?;
        let raw_flows = flows.collect_connections()?;
        Ok(self.process(config, raw_flows, raw_interfaces, now_secs()))
    }

    /// Diff, resolve, name and sort already-collected data. The current
    /// snapshot replaces the previous one only once the cycle is complete.
    pub fn process(
        &mut self,
        config: &Config,
        raw_flows: Vec<RawFlow>,
        raw_interfaces: Vec<RawInterface>,
        now_secs: i64,
    ) -> CycleReport {
        let mut directory = Directory::from_raw(raw_interfaces);
        let flow_count = raw_flows.len();
        let interval = config.interval_i64();

        let classified = diff::classify(raw_flows, now_secs, interval);
        if classified.timestamps_missing && self.age_tracking {
            log::warn!(
                "Flow start timestamps unavailable, age tracking disabled (net.netfilter.nf_conntrack_timestamp=0?)"
            );
            self.age_tracking = false;
        }
        let mut current = classified.connections;

        let primed = self.previous.is_some();
        let shown = match &self.previous {
            Some(previous) => {
                diff::apply_rates(&mut current, previous, &directory, interval);
                resolve::resolve(&mut directory, &mut current, config)
            }
            None => Vec::new(),
        };

        for &i in &shown {
            self.resolve_names(&mut current[i], config);
        }

        let mut connections: Vec<Connection> = shown.iter().map(|&i| current[i].clone()).collect();
        if !config.device_view {
            sort::sort_connections(&mut connections, config.sort);
        }
        let mut totals = Rates::default();
        for conn in &connections {
            totals.add(conn.rates);
        }

        let mut interfaces = directory.into_interfaces();
        if config.sort.key != SortKey::None {
            sort::sort_interfaces(&mut interfaces, config.sort.ascending);
        }

        log::debug!(
            "Cycle: {} flows, {} tracked, {} displayed",
            flow_count,
            current.len(),
            connections.len()
        );
        self.previous = Some(current);

        CycleReport {
            timestamp: now_secs,
            primed,
            flow_count,
            age_tracking: self.age_tracking,
            connections,
            interfaces,
            totals,
        }
    }

    fn resolve_names(&mut self, conn: &mut Connection, config: &Config) {
        if !config.dns {
            return;
        }
        if !config.numeric_local && !config.redact_local && conn.local.src_host.is_none() {
            conn.local.src_host = Some(resolve_hostname(&mut self.dns, &self.resolver, conn.local.src));
        }
        if !config.numeric_remote && !config.redact_remote && conn.local.dst_host.is_none() {
            conn.local.dst_host = Some(resolve_hostname(&mut self.dns, &self.resolver, conn.local.dst));
        }
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
