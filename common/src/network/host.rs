use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

/// Liveness of every host a worker probed, keyed by address.
pub type HostMap = HashMap<Ipv4Addr, bool>;

/// The outcome of probing a single host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeResult {
    pub addr: Ipv4Addr,
    pub reachable: bool,
}

impl ProbeResult {
    pub fn new(addr: Ipv4Addr, reachable: bool) -> Self {
        Self { addr, reachable }
    }
}

impl From<(Ipv4Addr, bool)> for ProbeResult {
    fn from((addr, reachable): (Ipv4Addr, bool)) -> Self {
        Self::new(addr, reachable)
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status: &str = if self.reachable {
            "reply received"
        } else {
            "reply not received"
        };
        write!(f, "{}: ICMP echo {}", self.addr, status)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
