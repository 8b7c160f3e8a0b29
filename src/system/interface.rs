use std::ffi::CStr;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::ConntopError;

use super::{InterfaceSource, RawAddress, RawInterface};

/// Interface enumeration through `getifaddrs(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn enumerate_interfaces(&self) -> Result<Vec<RawInterface>, ConntopError> {
        list_interfaces()
    }
}

/// Enumerate all network interfaces with their IPv4/IPv6 addresses and netmasks.
///
/// Interfaces keep the order in which the kernel first reports them.
pub fn list_interfaces() -> Result<Vec<RawInterface>, ConntopError> {
    let mut ifaddrs: *mut libc::ifaddrs = std::ptr::null_mut();

    if unsafe { libc::getifaddrs(&mut ifaddrs) } != 0 {
        return Err(ConntopError::Interface(std::io::Error::last_os_error()));
    }

    // Ensure freeifaddrs is called on all exit paths
    let interfaces = collect_interfaces(ifaddrs);

    unsafe { libc::freeifaddrs(ifaddrs) };

    log::debug!("Enumerated {} interfaces", interfaces.len());
    Ok(interfaces)
}

fn collect_interfaces(ifaddrs: *mut libc::ifaddrs) -> Vec<RawInterface> {
    let mut interfaces: Vec<RawInterface> = Vec::new();
    let mut current = ifaddrs;

    while !current.is_null() {
        let entry = unsafe { &*current };
        current = entry.ifa_next;

        if entry.ifa_name.is_null() {
            continue;
        }
        let name = unsafe { CStr::from_ptr(entry.ifa_name) }
            .to_string_lossy()
            .into_owned();

        let pos = match interfaces.iter().position(|i| i.name == name) {
            Some(pos) => pos,
            None => {
                interfaces.push(RawInterface {
                    name,
                    ..Default::default()
                });
                interfaces.len() - 1
            }
        };
        let iface = &mut interfaces[pos];
        iface.flags = entry.ifa_flags;

        let Some(ip) = (unsafe { sockaddr_to_ip(entry.ifa_addr) }) else {
            continue;
        };
        let netmask = unsafe { sockaddr_to_ip(entry.ifa_netmask) }.unwrap_or(match ip {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::BROADCAST),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(u128::MAX)),
        });
        iface.addresses.push(RawAddress { ip, netmask });
    }

    interfaces
}

/// Read an IPv4/IPv6 address out of a `sockaddr`, ignoring other families.
///
/// # Safety
/// `sa` must be null or point to a valid `sockaddr` of the advertised family.
unsafe fn sockaddr_to_ip(sa: *const libc::sockaddr) -> Option<IpAddr> {
    if sa.is_null() {
        return None;
    }
    match i32::from(unsafe { (*sa).sa_family }) {
        libc::AF_INET => {
            let sa_in = unsafe { &*(sa as *const libc::sockaddr_in) };
            Some(IpAddr::V4(Ipv4Addr::from(
                sa_in.sin_addr.s_addr.to_ne_bytes(),
            )))
        }
        libc::AF_INET6 => {
            let sa_in6 = unsafe { &*(sa as *const libc::sockaddr_in6) };
            Some(IpAddr::V6(Ipv6Addr::from(sa_in6.sin6_addr.s6_addr)))
        }
        _ => None,
    }
}
