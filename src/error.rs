#[derive(Debug, thiserror::Error)]
pub enum ConntopError {
    #[error("conntrack table unavailable: {0}")]
    ConntrackUnavailable(String),
    #[error("conntrack query failed: {0}")]
    Conntrack(#[source] std::io::Error),
    #[error("interface enumeration error: {0}")]
    Interface(#[source] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[source] std::io::Error),
    #[error("TUI error: {0}")]
    Tui(#[source] std::io::Error),
    #[error("fatal: {0}")]
    Fatal(String),
}
