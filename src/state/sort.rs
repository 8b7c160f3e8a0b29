//! Ordering of the display set.
//!
//! Numeric keys treat a zero on either side as equal to anything, so brand
//! new flows whose rates are not populated yet do not churn the order. That
//! comparator is not a total order, which the std slice sorts may reject by
//! panicking; connections are therefore ordered with a plain merge sort.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::model::{Connection, Interface};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    None,
    Id,
    In,
    Out,
    Sport,
    Dport,
    Rx,
    Tx,
    #[default]
    Sum,
    Age,
    Proto,
}

impl SortKey {
    pub const ALL: [SortKey; 11] = [
        SortKey::None,
        SortKey::Id,
        SortKey::In,
        SortKey::Out,
        SortKey::Sport,
        SortKey::Dport,
        SortKey::Rx,
        SortKey::Tx,
        SortKey::Sum,
        SortKey::Age,
        SortKey::Proto,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Id => "id",
            Self::In => "in",
            Self::Out => "out",
            Self::Sport => "sport",
            Self::Dport => "dport",
            Self::Rx => "rx",
            Self::Tx => "tx",
            Self::Sum => "sum",
            Self::Age => "age",
            Self::Proto => "proto",
        }
    }

    fn numeric(self, c: &Connection) -> i64 {
        match self {
            Self::Id => i64::from(c.id),
            Self::Sport => i64::from(c.sport),
            Self::Dport => i64::from(c.dport),
            Self::Rx => c.rates.rx,
            Self::Tx => c.rates.tx,
            Self::Sum => c.rates.sum,
            Self::Age => c.delta,
            Self::Proto => i64::from(c.l4.number()),
            Self::None | Self::In | Self::Out => 0,
        }
    }
}

/// Sort key plus direction. Descending is the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub ascending: bool,
}

impl FromStr for SortSpec {
    type Err = String;

    /// `[+]field`, where a leading `+` selects ascending order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ascending, field) = match s.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let key = SortKey::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(field))
            .ok_or_else(|| {
                format!(
                    "'{s}' is not a valid sort field (expected [+]id|in|out|sport|dport|rx|tx|sum|age|proto|none)"
                )
            })?;
        Ok(Self { key, ascending })
    }
}

impl std::fmt::Display for SortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ascending {
            write!(f, "+{}", self.key.name())
        } else {
            f.write_str(self.key.name())
        }
    }
}

/// Numeric comparison: zero on either side is equal; otherwise larger
/// values come first when descending and last when ascending.
pub fn compare_numeric(a: i64, b: i64, ascending: bool) -> Ordering {
    if a == 0 || b == 0 {
        return Ordering::Equal;
    }
    let ord = b.cmp(&a);
    if ascending { ord.reverse() } else { ord }
}

/// Name comparison: natural order when descending, operands swapped when
/// ascending.
pub fn compare_names(a: &str, b: &str, ascending: bool) -> Ordering {
    if ascending { b.cmp(a) } else { a.cmp(b) }
}

pub fn compare_connections(a: &Connection, b: &Connection, spec: SortSpec) -> Ordering {
    match spec.key {
        SortKey::None => Ordering::Equal,
        SortKey::In => compare_names(a.ingress.name(), b.ingress.name(), spec.ascending),
        SortKey::Out => compare_names(a.egress.name(), b.egress.name(), spec.ascending),
        key => compare_numeric(key.numeric(a), key.numeric(b), spec.ascending),
    }
}

pub fn sort_connections(connections: &mut Vec<Connection>, spec: SortSpec) {
    if spec.key == SortKey::None {
        return;
    }
    let items = std::mem::take(connections);
    *connections = merge_sort_by(items, &|a, b| compare_connections(a, b, spec));
}

/// Order interfaces by name and each interface's addresses by their text.
pub fn sort_interfaces(interfaces: &mut [Interface], ascending: bool) {
    interfaces.sort_by(|a, b| compare_names(&a.name, &b.name, ascending));
    for iface in interfaces.iter_mut() {
        iface.addresses.sort_by_cached_key(|addr| addr.ip.to_string());
    }
}

fn merge_sort_by<T, F>(mut items: Vec<T>, cmp: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort_by(items, cmp);
    let right = merge_sort_by(right, cmp);

    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut l = left.into_iter().peekable();
    let mut r = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (l.peek(), r.peek()) {
        let next = if cmp(b, a) == Ordering::Less {
            r.next()
        } else {
            l.next()
        };
        out.extend(next);
    }
    out.extend(l);
    out.extend(r);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::status::NatFlags;
    use crate::model::{Address, Endpoints, InterfaceRef, L3Protocol, L4Protocol, Rates};

    fn conn(id: u32, sum: i64, ingress: &str) -> Connection {
        let ip = "10.0.0.1".parse().unwrap();
        Connection {
            id,
            start_time: None,
            delta: i64::from(id),
            l3: L3Protocol::Ipv4,
            l4: L4Protocol::Tcp,
            local: Endpoints::new(ip, ip),
            remote: Endpoints::new(ip, ip),
            sport: 0,
            dport: 0,
            bytes_orig: 0,
            bytes_repl: 0,
            bytes_sum: 0,
            rates: Rates::new(sum, 0),
            status: 0,
            tcp_state: None,
            state: None,
            nat: NatFlags::default(),
            ingress: if ingress == "*" {
                InterfaceRef::Unknown
            } else {
                InterfaceRef::Resolved {
                    index: 0,
                    name: ingress.into(),
                    flags: 0,
                }
            },
            egress: InterfaceRef::Unknown,
        }
    }

    fn ids(conns: &[Connection]) -> Vec<u32> {
        conns.iter().map(|c| c.id).collect()
    }

    // UT-9.1: Parse sort fields
    #[test]
    fn test_parse_sort_spec() {
        assert_eq!(
            "sum".parse::<SortSpec>().unwrap(),
            SortSpec { key: SortKey::Sum, ascending: false }
        );
        assert_eq!(
            "+dport".parse::<SortSpec>().unwrap(),
            SortSpec { key: SortKey::Dport, ascending: true }
        );
        assert!("bogus".parse::<SortSpec>().is_err());
        assert!("+".parse::<SortSpec>().is_err());
        assert_eq!("+age".parse::<SortSpec>().unwrap().to_string(), "+age");
    }

    // UT-9.2: Zero on either side compares equal
    #[test]
    fn test_zero_equality_rule() {
        let zero = conn(1, 0, "eth0");
        let big = conn(2, 1_000_000, "eth0");
        let spec = SortSpec::default();
        assert_eq!(compare_connections(&zero, &big, spec), Ordering::Equal);
        assert_eq!(compare_connections(&big, &zero, spec), Ordering::Equal);
    }

    // UT-9.3: Descending puts larger first, ascending last
    #[test]
    fn test_numeric_direction() {
        assert_eq!(compare_numeric(10, 5, false), Ordering::Less);
        assert_eq!(compare_numeric(10, 5, true), Ordering::Greater);
        assert_eq!(compare_numeric(5, 5, false), Ordering::Equal);
    }

    // UT-9.4: Sorting by sum
    #[test]
    fn test_sort_by_sum() {
        let mut conns = vec![conn(1, 100, "a"), conn(2, 300, "a"), conn(3, 200, "a")];
        sort_connections(&mut conns, SortSpec::default());
        assert_eq!(ids(&conns), vec![2, 3, 1]);
        sort_connections(&mut conns, "+sum".parse().unwrap());
        assert_eq!(ids(&conns), vec![1, 3, 2]);
    }

    // UT-9.5: Interface names swap operands when ascending
    #[test]
    fn test_sort_by_ingress_name() {
        let mut conns = vec![conn(1, 1, "wlan0"), conn(2, 1, "eth0"), conn(3, 1, "*")];
        sort_connections(&mut conns, "in".parse().unwrap());
        assert_eq!(ids(&conns), vec![3, 2, 1]);
        sort_connections(&mut conns, "+in".parse().unwrap());
        assert_eq!(ids(&conns), vec![1, 2, 3]);
    }

    // UT-9.6: None leaves the order alone
    #[test]
    fn test_sort_none() {
        let mut conns = vec![conn(1, 1, "a"), conn(2, 9, "a")];
        sort_connections(&mut conns, "none".parse().unwrap());
        assert_eq!(ids(&conns), vec![1, 2]);
    }

    // UT-9.7: Many zero-valued records sort without panicking
    #[test]
    fn test_sort_tolerates_zero_rule() {
        let mut conns: Vec<Connection> = (0..200)
            .map(|i| conn(i + 1, if i % 3 == 0 { 0 } else { i64::from(i) }, "a"))
            .collect();
        sort_connections(&mut conns, SortSpec::default());
        assert_eq!(conns.len(), 200);
    }

    // UT-9.8: Interfaces by name, addresses by text
    #[test]
    fn test_sort_interfaces() {
        let mk = |name: &str, addrs: &[&str]| Interface {
            name: name.into(),
            flags: 0,
            addresses: addrs
                .iter()
                .map(|a| Address::new(a.parse().unwrap(), a.parse().unwrap()))
                .collect(),
            rates: Rates::default(),
        };
        let mut ifaces = vec![mk("wlan0", &[]), mk("eth0", &["10.0.0.9", "10.0.0.10"])];
        sort_interfaces(&mut ifaces, false);
        assert_eq!(ifaces[0].name, "eth0");
        assert_eq!(ifaces[0].addresses[0].ip.to_string(), "10.0.0.10");
        sort_interfaces(&mut ifaces, true);
        assert_eq!(ifaces[0].name, "wlan0");
    }
}
