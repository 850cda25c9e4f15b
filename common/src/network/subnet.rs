//! # Subnet Model
//!
//! A validated IPv4 network literal and the exact set of addresses a scan of
//! it reports on.
//!
//! Usable hosts are the addresses strictly between the network and broadcast
//! address. A `/31` and a `/32` therefore have none; their addresses are only
//! scanned when the caller asks for the boundary addresses explicitly.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use pnet::ipnetwork::Ipv4Network;

use crate::error::ScanError;
use crate::network::address;
use crate::network::range::Ipv4Range;

/// An IPv4 network whose address has no host bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    inner: Ipv4Network,
}

impl FromStr for Subnet {
    type Err = ScanError;

    /// Parses `a.b.c.d/p`.
    ///
    /// Malformed literals are [`ScanError::InvalidSubnet`]. A literal whose
    /// address is not the network address of its prefix (`10.0.0.1/24`) is
    /// [`ScanError::HostBitsSet`] and is never rounded down.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !address::validate_subnet(s) {
            return Err(ScanError::InvalidSubnet(s.to_string()));
        }

        let (ip_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| ScanError::InvalidSubnet(s.to_string()))?;
        let ip: Ipv4Addr = ip_str
            .parse()
            .map_err(|_| ScanError::InvalidSubnet(s.to_string()))?;
        let prefix: u8 = prefix_str
            .parse()
            .map_err(|_| ScanError::InvalidSubnet(s.to_string()))?;

        let subnet = Self::new(ip, prefix).ok_or_else(|| ScanError::InvalidSubnet(s.to_string()))?;
        if subnet.network() != ip {
            return Err(ScanError::HostBitsSet(s.to_string()));
        }
        Ok(subnet)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix())
    }
}

impl Subnet {
    /// Builds the network containing `ip`. Host bits are masked off, so this is
    /// only for callers that already hold a trusted address.
    pub fn new(ip: Ipv4Addr, prefix: u8) -> Option<Self> {
        if prefix == 0 {
            return None;
        }
        let net = Ipv4Network::new(ip, prefix).ok()?;
        let inner = Ipv4Network::new(net.network(), prefix).ok()?;
        Some(Self { inner })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.inner.network()
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        self.inner.broadcast()
    }

    pub fn prefix(&self) -> u8 {
        self.inner.prefix()
    }

    /// Addresses strictly between the network and broadcast address.
    pub fn usable_hosts(&self) -> Option<Ipv4Range> {
        let network: u32 = self.network().into();
        let broadcast: u32 = self.broadcast().into();
        if broadcast.saturating_sub(network) < 2 {
            return None;
        }
        Some(Ipv4Range::new(
            Ipv4Addr::from(network + 1),
            Ipv4Addr::from(broadcast - 1),
        ))
    }

    /// `2^(32-p) - 2` for prefixes up to 30, zero for `/31` and `/32`.
    pub fn usable_host_count(&self) -> u64 {
        self.usable_hosts().map_or(0, |range| range.len())
    }
}

/// The exact set of addresses a scan reports on: the usable hosts of a subnet
/// plus whichever boundary addresses were requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanScope {
    pub subnet: Subnet,
    pub include_network: bool,
    pub include_broadcast: bool,
}

impl ScanScope {
    pub fn new(subnet: Subnet) -> Self {
        Self {
            subnet,
            include_network: false,
            include_broadcast: false,
        }
    }

    pub fn with_boundaries(mut self, include: bool) -> Self {
        self.include_network = include;
        self.include_broadcast = include;
        self
    }

    /// Network address, if it is part of the scope.
    pub fn network(&self) -> Option<Ipv4Addr> {
        self.include_network.then(|| self.subnet.network())
    }

    /// Broadcast address, if it is part of the scope and distinct from an
    /// included network address.
    pub fn broadcast(&self) -> Option<Ipv4Addr> {
        let broadcast: Ipv4Addr = self.subnet.broadcast();
        let duplicate: bool = self.network() == Some(broadcast);
        (self.include_broadcast && !duplicate).then_some(broadcast)
    }

    pub fn len(&self) -> u64 {
        self.subnet.usable_host_count()
            + u64::from(self.network().is_some())
            + u64::from(self.broadcast().is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.network() == Some(addr)
            || self.broadcast() == Some(addr)
            || self
                .subnet
                .usable_hosts()
                .is_some_and(|hosts| hosts.contains(addr))
    }

    /// Every address of the scope in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let hosts = self.subnet.usable_hosts().into_iter().flat_map(|range| range.iter());
        self.network()
            .into_iter()
            .chain(hosts)
            .chain(self.broadcast())
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
