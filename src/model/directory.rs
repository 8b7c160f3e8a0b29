use std::net::IpAddr;

use crate::system::RawInterface;

use super::{Address, Interface, InterfaceRef, Rates};

/// The machine's interfaces and their addresses for one cycle.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    interfaces: Vec<Interface>,
}

impl Directory {
    pub fn new(interfaces: Vec<Interface>) -> Self {
        Self { interfaces }
    }

    pub fn from_raw(raw: Vec<RawInterface>) -> Self {
        let interfaces = raw
            .into_iter()
            .map(|iface| Interface {
                name: iface.name,
                flags: iface.flags,
                addresses: iface
                    .addresses
                    .into_iter()
                    .map(|a| Address::new(a.ip, a.netmask))
                    .collect(),
                rates: Rates::default(),
            })
            .collect();
        Self { interfaces }
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn into_interfaces(self) -> Vec<Interface> {
        self.interfaces
    }

    /// True when `ip` is assigned to any interface of this host.
    pub fn is_local(&self, ip: IpAddr) -> bool {
        self.interfaces
            .iter()
            .any(|iface| iface.addresses.iter().any(|a| a.ip == ip))
    }

    /// Index of the interface owning `ip`: an exact address match anywhere
    /// wins over subnet containment, and within each pass the first interface
    /// in enumeration order wins.
    pub fn lookup(&self, ip: IpAddr) -> Option<usize> {
        self.interfaces
            .iter()
            .position(|iface| iface.addresses.iter().any(|a| a.ip == ip))
            .or_else(|| {
                self.interfaces
                    .iter()
                    .position(|iface| iface.addresses.iter().any(|a| a.contains(ip)))
            })
    }

    pub fn reference(&self, index: usize) -> InterfaceRef {
        match self.interfaces.get(index) {
            Some(iface) => InterfaceRef::Resolved {
                index,
                name: iface.name.clone(),
                flags: iface.flags,
            },
            None => InterfaceRef::Unknown,
        }
    }

    /// Zero every interface and address aggregate.
    pub fn reset_rates(&mut self) {
        for iface in &mut self.interfaces {
            iface.rates = Rates::default();
            for addr in &mut iface.addresses {
                addr.rates = Rates::default();
            }
        }
    }

    /// Add `iface_rates` to interface `index`, and `addr_rates` to each of its
    /// addresses equal to one of `ips`.
    pub fn credit(&mut self, index: usize, iface_rates: Rates, addr_rates: Rates, ips: &[IpAddr]) {
        let Some(iface) = self.interfaces.get_mut(index) else {
            return;
        };
        iface.rates.add(iface_rates);
        for addr in &mut iface.addresses {
            if ips.contains(&addr.ip) {
                addr.rates.add(addr_rates);
            }
        }
    }
}
