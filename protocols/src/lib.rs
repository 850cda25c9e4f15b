//! Wire formats used by the raw ICMP probe.

pub mod icmp;
pub mod ip;
