//! Final, address-ordered view of a scan.

use std::net::Ipv4Addr;

use sweepr_common::network::host::{HostMap, ProbeResult};

/// Sorts results by numeric address value, lowest first.
pub fn sort_results(results: &mut [ProbeResult]) {
    results.sort_unstable_by_key(|result| u32::from(result.addr));
}

/// Sorts addresses by numeric value, lowest first.
pub fn sort_addresses(addrs: &mut [Ipv4Addr]) {
    addrs.sort_unstable_by_key(|addr| u32::from(*addr));
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    results: Vec<ProbeResult>,
}

impl ScanReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Every probed host, ascending.
    pub fn iter(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter()
    }

    /// Hosts that answered, ascending.
    pub fn reachable(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|result| result.reachable)
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable().count()
    }
}

impl From<HostMap> for ScanReport {
    fn from(map: HostMap) -> Self {
        let mut results: Vec<ProbeResult> = map.into_iter().map(ProbeResult::from).collect();
        sort_results(&mut results);
        Self { results }
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
