use std::io;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Everything that can stop a scan.
///
/// Variants fall into three groups. Input errors are raised before any probe is
/// sent. Setup errors mean a probing strategy cannot run on this machine.
/// Internal errors mean the engine broke its own bookkeeping.
///
/// An unreachable host is never an error; it is a `false` probe result.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{0} is not a valid IP address")]
    InvalidAddress(String),

    #[error("{0} is not a valid subnet")]
    InvalidSubnet(String),

    #[error("{0} has host bits set")]
    HostBitsSet(String),

    #[error("failed to open raw ICMP socket: {0}")]
    RawSocket(#[source] io::Error),

    #[error("ping executable '{0}' not found in PATH")]
    PingUnavailable(String),

    #[error("failed to start scan runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("worker {0} has not finished")]
    WorkerNotFinished(usize),

    #[error("worker task failed: {0}")]
    WorkerPanicked(String),

    #[error("host {0} was reported by more than one worker")]
    DuplicateHost(Ipv4Addr),

    #[error("host {0} is outside of the scanned subnet")]
    UnexpectedHost(Ipv4Addr),

    #[error("{count} host(s) missing from worker results, first is {first}")]
    MissingHosts { count: u64, first: Ipv4Addr },
}

impl ScanError {
    /// Malformed or semantically invalid user input.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_) | Self::InvalidSubnet(_) | Self::HostBitsSet(_)
        )
    }

    /// Broken partitioning or worker bookkeeping. Should never happen.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::WorkerNotFinished(_)
                | Self::WorkerPanicked(_)
                | Self::DuplicateHost(_)
                | Self::UnexpectedHost(_)
                | Self::MissingHosts { .. }
        )
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
