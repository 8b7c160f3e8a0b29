pub mod dns_cache;
pub mod dns_resolver;
pub mod port_annotation;
