//! # Subnet Partitioning
//!
//! Splits a [`ScanScope`] into contiguous sub-ranges, one per worker.
//!
//! The subnet is cut into `2^D` equal blocks, where `D` is the requested depth
//! clamped to `32 - prefix`. Ownership of the boundary addresses is fixed:
//!
//! * the parent's network and broadcast address are never part of a block's
//!   host walk,
//! * when the scope includes them, the first block owns the network address and
//!   the last block owns the broadcast address,
//! * a `/32` has a single block whose network and broadcast address coincide;
//!   it owns that address once,
//! * blocks left without any address (a one-address block holding only an
//!   excluded boundary) are dropped.

use std::net::Ipv4Addr;

use sweepr_common::network::range::Ipv4Range;
use sweepr_common::network::subnet::ScanScope;

/// A contiguous slice of the scope, assigned to exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRange {
    /// Position of the block within the subnet.
    pub index: usize,
    /// Usable hosts inside the block.
    pub hosts: Option<Ipv4Range>,
    /// The parent's network address, when this block owns it.
    pub network: Option<Ipv4Addr>,
    /// The parent's broadcast address, when this block owns it.
    pub broadcast: Option<Ipv4Addr>,
}

impl SubRange {
    /// Every address the owning worker probes, ascending.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let hosts = self.hosts.into_iter().flat_map(|range| range.iter());
        self.network.into_iter().chain(hosts).chain(self.broadcast)
    }

    pub fn len(&self) -> u64 {
        self.hosts.map_or(0, |range| range.len())
            + u64::from(self.network.is_some())
            + u64::from(self.broadcast.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cuts `scope` into at most `2^depth` non-empty sub-ranges, in ascending order.
pub fn partition(scope: &ScanScope, depth: u8) -> Vec<SubRange> {
    let prefix: u8 = scope.subnet.prefix();
    let depth: u8 = depth.min(32 - prefix);
    let block_size: u64 = 1u64 << (32 - prefix - depth);

    let network: u64 = u32::from(scope.subnet.network()).into();
    let broadcast: u64 = u32::from(scope.subnet.broadcast()).into();
    let owned_network: Option<Ipv4Addr> = scope.network();
    let owned_broadcast: Option<Ipv4Addr> = scope.broadcast();

    (0..1u64 << depth)
        .filter_map(|index| {
            let start: u64 = network + index * block_size;
            let end: u64 = start + block_size - 1;

            // Usable hosts are (network, broadcast) exclusive.
            let host_start: u64 = start.max(network + 1);
            let host_end: u64 = end.min(broadcast.saturating_sub(1));
            let hosts: Option<Ipv4Range> = (host_start <= host_end).then(|| {
                Ipv4Range::new(to_addr(host_start), to_addr(host_end))
            });

            let sub_range = SubRange {
                index: index as usize,
                hosts,
                network: owned_network.filter(|_| start == network),
                broadcast: owned_broadcast.filter(|_| end == broadcast),
            };
            (!sub_range.is_empty()).then_some(sub_range)
        })
        .collect()
}

// Every value passed in lies inside a u32 subnet.
fn to_addr(value: u64) -> Ipv4Addr {
    Ipv4Addr::from(value as u32)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
