//! Best-effort selection of the local address probes are sent from.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;
use tracing::debug;

use crate::network::subnet::Subnet;

/// Picks a source address for probing `subnet`.
///
/// In order of preference:
/// 1. an address of an interface whose network contains the subnet,
/// 2. the address the routing table would use to reach the subnet,
/// 3. the first non-loopback IPv4 address of any interface that is up,
/// 4. `0.0.0.0`, which lets the kernel fill in the source.
pub fn resolve_source(subnet: &Subnet) -> Ipv4Addr {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces()
        .into_iter()
        .filter(|i| i.is_up() && !i.ips.is_empty())
        .collect();

    if let Some(addr) = find_local_source(&interfaces, subnet) {
        debug!("using {addr} from the interface attached to {subnet}");
        return addr;
    }

    if let Some(addr) = resolve_route_source_ip(subnet) {
        debug!("using {addr} from the route towards {subnet}");
        return addr;
    }

    if let Some(addr) = first_non_loopback(&interfaces) {
        debug!("falling back to interface address {addr}");
        return addr;
    }

    Ipv4Addr::UNSPECIFIED
}

fn find_local_source(interfaces: &[NetworkInterface], subnet: &Subnet) -> Option<Ipv4Addr> {
    interfaces
        .iter()
        .flat_map(|iface| iface.ips.iter())
        .find_map(|net| match net {
            IpNetwork::V4(v4) if v4.contains(subnet.network()) && v4.prefix() <= subnet.prefix() => {
                Some(v4.ip())
            }
            _ => None,
        })
}

fn resolve_route_source_ip(subnet: &Subnet) -> Option<Ipv4Addr> {
    let socket: UdpSocket = UdpSocket::bind("0.0.0.0:0").ok()?;
    let target: Ipv4Addr = subnet
        .usable_hosts()
        .map_or(subnet.network(), |hosts| hosts.start_addr);

    socket.connect((target, 53)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(v4) if !v4.is_unspecified() => Some(v4),
        _ => None,
    }
}

fn first_non_loopback(interfaces: &[NetworkInterface]) -> Option<Ipv4Addr> {
    interfaces
        .iter()
        .filter(|iface| !iface.is_loopback())
        .flat_map(|iface| iface.ips.iter())
        .find_map(|net| match net {
            IpNetwork::V4(v4) if !v4.ip().is_loopback() => Some(v4.ip()),
            _ => None,
        })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::ipnetwork::Ipv4Network;

    fn ni(name: &str, index: u32, ips: &[IpNetwork], flags: u32) -> NetworkInterface {
        NetworkInterface {
            name: name.into(),
            description: "".into(),
            index,
            mac: None,
            ips: ips.to_vec(),
            flags,
        }
    }

    fn v4(a: u8, b: u8, c: u8, d: u8, p: u8) -> IpNetwork {
        IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(a, b, c, d), p).unwrap())
    }

    fn subnet(s: &str) -> Subnet {
        s.parse().unwrap()
    }

    #[test]
    fn test_local_source_matches_attached_network() {
        let interfaces = vec![
            ni("lo", 1, &[v4(127, 0, 0, 1, 8)], 0),
            ni("eth0", 2, &[v4(192, 168, 1, 42, 24)], 0),
            ni("eth1", 3, &[v4(10, 0, 0, 5, 16)], 0),
        ];

        assert_eq!(
            find_local_source(&interfaces, &subnet("10.0.3.0/24")),
            Some(Ipv4Addr::new(10, 0, 0, 5))
        );
        assert_eq!(
            find_local_source(&interfaces, &subnet("192.168.1.0/28")),
            Some(Ipv4Addr::new(192, 168, 1, 42))
        );
    }

    #[test]
    fn test_local_source_ignores_narrower_interface_network() {
        // eth0 sits in a /24, which does not cover a scan of the whole /16.
        let interfaces = vec![ni("eth0", 2, &[v4(192, 168, 1, 42, 24)], 0)];
        assert_eq!(find_local_source(&interfaces, &subnet("192.168.0.0/16")), None);
    }

    #[test]
    fn test_first_non_loopback_skips_loopback() {
        let interfaces = vec![
            ni("lo", 1, &[v4(127, 0, 0, 1, 8)], 0),
            ni("wlan0", 2, &[v4(172, 16, 4, 2, 20)], 0),
        ];
        assert_eq!(first_non_loopback(&interfaces), Some(Ipv4Addr::new(172, 16, 4, 2)));
    }
}
