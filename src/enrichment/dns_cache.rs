use std::net::IpAddr;

use rustc_hash::FxHashMap;

/// Capacity of the process-wide reverse DNS cache.
pub const DNS_CACHE_CAPACITY: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
struct DnsEntry {
    ip: IpAddr,
    hostname: String,
}

/// Fixed-capacity address to hostname cache.
///
/// Slots are written in strict insertion order through a wrapping cursor;
/// once full, each insert overwrites the oldest entry. Reads never promote.
/// A failed lookup is stored with the address text as its hostname.
#[derive(Debug)]
pub struct DnsCache {
    slots: Vec<Option<DnsEntry>>,
    cursor: usize,
    index: FxHashMap<IpAddr, usize>,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::with_capacity(DNS_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            cursor: 0,
            index: FxHashMap::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn lookup(&self, ip: IpAddr) -> Option<&str> {
        let slot = *self.index.get(&ip)?;
        self.slots[slot].as_ref().map(|e| e.hostname.as_str())
    }

    pub fn insert(&mut self, ip: IpAddr, hostname: impl Into<String>) {
        let slot = self.cursor;
        if let Some(evicted) = self.slots[slot].take()
            && self.index.get(&evicted.ip) == Some(&slot)
        {
            self.index.remove(&evicted.ip);
        }
        self.slots[slot] = Some(DnsEntry {
            ip,
            hostname: hostname.into(),
        });
        self.index.insert(ip, slot);
        self.cursor = (slot + 1) % self.slots.len();
    }
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(n: u32) -> IpAddr {
        IpAddr::V4(Ipv4Addr::from(n))
    }

    // UT-5.1: Hit after insert
    #[test]
    fn test_insert_then_lookup() {
        let mut cache = DnsCache::with_capacity(4);
        assert!(cache.is_empty());
        cache.insert(ip(1), "one.example");
        assert_eq!(cache.lookup(ip(1)), Some("one.example"));
        assert_eq!(cache.lookup(ip(2)), None);
        assert_eq!(cache.len(), 1);
    }

    // UT-5.2: capacity + 1 inserts evict exactly the first entry
    #[test]
    fn test_overflow_evicts_first_only() {
        let mut cache = DnsCache::with_capacity(DNS_CACHE_CAPACITY);
        for n in 0..=DNS_CACHE_CAPACITY as u32 {
            cache.insert(ip(n), format!("h{n}"));
        }
        assert_eq!(cache.lookup(ip(0)), None);
        for n in 1..=DNS_CACHE_CAPACITY as u32 {
            assert_eq!(cache.lookup(ip(n)), Some(format!("h{n}").as_str()));
        }
        assert_eq!(cache.len(), DNS_CACHE_CAPACITY);
    }

    // UT-5.3: Reads do not promote
    #[test]
    fn test_no_promotion_on_read() {
        let mut cache = DnsCache::with_capacity(2);
        cache.insert(ip(1), "a");
        cache.insert(ip(2), "b");
        assert_eq!(cache.lookup(ip(1)), Some("a"));
        cache.insert(ip(3), "c");
        assert_eq!(cache.lookup(ip(1)), None);
        assert_eq!(cache.lookup(ip(2)), Some("b"));
    }

    // UT-5.4: Re-inserting an address keeps the newest slot reachable
    #[test]
    fn test_reinsert_survives_old_slot_eviction() {
        let mut cache = DnsCache::with_capacity(2);
        cache.insert(ip(1), "old");
        cache.insert(ip(1), "new");
        // Overwrites slot 0, which held the stale copy.
        cache.insert(ip(2), "b");
        assert_eq!(cache.lookup(ip(1)), Some("new"));
    }
}
