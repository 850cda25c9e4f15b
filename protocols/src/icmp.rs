//! ICMP echo over IPv4.
//!
//! Requests are built together with their IPv4 header so the caller controls the
//! source address. Incoming datagrams are reduced to the echo exchange they
//! answer, if any.

use std::net::Ipv4Addr;

use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet::packet::icmp::{IcmpCode, IcmpPacket, IcmpTypes, checksum};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;

use crate::ip::{self, IP_V4_HDR_LEN};

pub const ICMP_ECHO_REQ_LEN: usize = 8;
/// Bytes between the ICMP header and the quoted datagram of an error message.
const ICMP_ERROR_UNUSED_LEN: usize = 4;

/// Identifies one echo exchange: who was asked, and with which id/sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EchoKey {
    pub target: Ipv4Addr,
    pub identifier: u16,
    pub sequence: u16,
}

/// How an echo exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoOutcome {
    /// The target answered with an echo reply.
    Reply,
    /// Some router or the target answered with an ICMP error quoting our request.
    Rejected { icmp_type: u8, icmp_code: u8 },
}

/// Builds a complete IPv4 datagram carrying an ICMP echo request (type 8, code 0).
pub fn create_echo_request_v4(src_addr: Ipv4Addr, dst_addr: Ipv4Addr, key: &EchoKey) -> anyhow::Result<Vec<u8>> {
    let mut pkt = [0u8; IP_V4_HDR_LEN + ICMP_ECHO_REQ_LEN];
    ip::create_ipv4_header(
        &mut pkt,
        (IP_V4_HDR_LEN + ICMP_ECHO_REQ_LEN) as u16,
        IpNextHeaderProtocols::Icmp,
        src_addr,
        dst_addr,
    )?;

    let mut icmp = MutableEchoRequestPacket::new(&mut pkt[IP_V4_HDR_LEN..])
        .context("failed to create echo request packet")?;
    icmp.set_icmp_type(IcmpTypes::EchoRequest);
    icmp.set_icmp_code(IcmpCode::new(0));
    icmp.set_identifier(key.identifier);
    icmp.set_sequence_number(key.sequence);

    icmp.set_checksum(0);
    let icmp_imm = icmp.to_immutable();
    let icmp_pkt = IcmpPacket::new(icmp_imm.packet()).context("failed to create ICMP packet")?;
    let csm = checksum(&icmp_pkt);
    icmp.set_checksum(csm);
    Ok(Vec::from(pkt))
}

/// Matches a received IPv4 datagram to the echo exchange it concludes.
///
/// Echo replies are keyed by their sender. Destination-unreachable and
/// time-exceeded messages are keyed by the request they quote. Anything else,
/// including our own requests looping back, yields `None`.
pub fn classify(bytes: &[u8]) -> Option<(EchoKey, EchoOutcome)> {
    let ipv4 = Ipv4Packet::new(bytes)?;
    if ipv4.get_next_level_protocol() != IpNextHeaderProtocols::Icmp {
        return None;
    }
    let icmp = IcmpPacket::new(ipv4.payload())?;

    match icmp.get_icmp_type() {
        IcmpTypes::EchoReply => {
            let reply = EchoReplyPacket::new(ipv4.payload())?;
            let key = EchoKey {
                target: ipv4.get_source(),
                identifier: reply.get_identifier(),
                sequence: reply.get_sequence_number(),
            };
            Some((key, EchoOutcome::Reply))
        }
        IcmpTypes::DestinationUnreachable | IcmpTypes::TimeExceeded => {
            let key = quoted_request(icmp.payload())?;
            let outcome = EchoOutcome::Rejected {
                icmp_type: icmp.get_icmp_type().0,
                icmp_code: icmp.get_icmp_code().0,
            };
            Some((key, outcome))
        }
        _ => None,
    }
}

fn quoted_request(payload: &[u8]) -> Option<EchoKey> {
    let inner = Ipv4Packet::new(payload.get(ICMP_ERROR_UNUSED_LEN..)?)?;
    if inner.get_next_level_protocol() != IpNextHeaderProtocols::Icmp {
        return None;
    }
    let request = EchoRequestPacket::new(inner.payload())?;
    if request.get_icmp_type() != IcmpTypes::EchoRequest {
        return None;
    }
    Some(EchoKey {
        target: inner.get_destination(),
        identifier: request.get_identifier(),
        sequence: request.get_sequence_number(),
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
