use crate::model::L4Protocol;

/// Service name for a well-known port, or None if unknown.
///
/// Names follow `/etc/services`; transport-specific entries only match their
/// own protocol.
pub fn annotate_port(port: u16, proto: L4Protocol) -> Option<&'static str> {
    use L4Protocol::{Tcp, Udp};

    match (port, proto) {
        (53, Tcp | Udp) => Some("domain"),
        (5353, Udp) => Some("mdns"),
        (123, Udp) => Some("ntp"),
        (1900, Udp) => Some("ssdp"),
        (5355, Udp) => Some("llmnr"),
        (67, Udp) => Some("bootps"),
        (68, Udp) => Some("bootpc"),
        (161, Udp) => Some("snmp"),
        (514, Udp) => Some("syslog"),
        (51820, Udp) => Some("wireguard"),
        (443, Udp) => Some("quic"),
        (80, Tcp) => Some("http"),
        (443, Tcp) => Some("https"),
        (8080, Tcp) => Some("http-alt"),
        (8443, Tcp) => Some("https-alt"),
        (22, Tcp) => Some("ssh"),
        (21, Tcp) => Some("ftp"),
        (23, Tcp) => Some("telnet"),
        (25, Tcp) => Some("smtp"),
        (587, Tcp) => Some("submission"),
        (465, Tcp) => Some("smtps"),
        (143, Tcp) => Some("imap"),
        (993, Tcp) => Some("imaps"),
        (110, Tcp) => Some("pop3"),
        (995, Tcp) => Some("pop3s"),
        (179, Tcp) => Some("bgp"),
        (3306, Tcp) => Some("mysql"),
        (5432, Tcp) => Some("postgresql"),
        (6379, Tcp) => Some("redis"),
        (27017, Tcp) => Some("mongodb"),
        _ => None,
    }
}

/// Port as displayed: the service name unless `numeric`, otherwise the number.
/// Portless transports show an empty string.
pub fn port_label(port: u16, proto: L4Protocol, numeric: bool) -> String {
    if !matches!(proto, L4Protocol::Tcp | L4Protocol::Udp) {
        return String::new();
    }
    if !numeric && let Some(name) = annotate_port(port, proto) {
        return name.to_string();
    }
    port.to_string()
}
