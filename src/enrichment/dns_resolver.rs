use std::net::IpAddr;

use super::dns_cache::DnsCache;

/// Reverse name lookup for one address.
pub trait NameResolver {
    /// Returns the hostname for `ip`, or `None` when it has no usable name.
    fn reverse(&self, ip: IpAddr) -> Option<String>;
}

/// Blocking reverse lookup through the system resolver (`getnameinfo`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl NameResolver for SystemResolver {
    fn reverse(&self, ip: IpAddr) -> Option<String> {
        match dns_lookup::lookup_addr(&ip) {
            // getnameinfo falls back to the numeric form when no PTR exists.
            Ok(name) if name != ip.to_string() => Some(name),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Reverse lookup for {ip} failed: {e}");
                None
            }
        }
    }
}

/// Hostname for `ip`, consulting `cache` first. A miss queries `resolver`
/// once and caches the answer, or the address text when there is none.
pub fn resolve_hostname(cache: &mut DnsCache, resolver: &dyn NameResolver, ip: IpAddr) -> String {
    if let Some(hostname) = cache.lookup(ip) {
        return hostname.to_string();
    }
    let hostname = resolver.reverse(ip).unwrap_or_else(|| ip.to_string());
    cache.insert(ip, hostname.clone());
    hostname
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::net::Ipv4Addr;

    struct Counting {
        calls: Cell<usize>,
        answer: Option<&'static str>,
    }

    impl NameResolver for Counting {
        fn reverse(&self, _ip: IpAddr) -> Option<String> {
            self.calls.set(self.calls.get() + 1);
            self.answer.map(str::to_string)
        }
    }

    // UT-5.5: Cached names short-circuit the resolver
    #[test]
    fn test_lookup_once() {
        let mut cache = DnsCache::with_capacity(8);
        let resolver = Counting {
            calls: Cell::new(0),
            answer: Some("gw.example"),
        };
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(resolve_hostname(&mut cache, &resolver, ip), "gw.example");
        assert_eq!(resolve_hostname(&mut cache, &resolver, ip), "gw.example");
        assert_eq!(resolver.calls.get(), 1);
    }

    // UT-5.6: Failures cache the address itself
    #[test]
    fn test_failure_cached_as_address() {
        let mut cache = DnsCache::with_capacity(8);
        let resolver = Counting {
            calls: Cell::new(0),
            answer: None,
        };
        let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9));
        assert_eq!(resolve_hostname(&mut cache, &resolver, ip), "203.0.113.9");
        assert_eq!(cache.lookup(ip), Some("203.0.113.9"));
        resolve_hostname(&mut cache, &resolver, ip);
        assert_eq!(resolver.calls.get(), 1);
    }

    // UT-5.7: Eviction allows a retry on a later cycle
    #[test]
    fn test_retry_after_eviction() {
        let mut cache = DnsCache::with_capacity(1);
        let resolver = Counting {
            calls: Cell::new(0),
            answer: None,
        };
        let a = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
        let b = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2));
        resolve_hostname(&mut cache, &resolver, a);
        resolve_hostname(&mut cache, &resolver, b);
        resolve_hostname(&mut cache, &resolver, a);
        assert_eq!(resolver.calls.get(), 3);
    }
}
