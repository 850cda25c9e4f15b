//! The probing **abstraction**.
//!
//! A [`Prober`] answers one question for one host: did it answer an ICMP echo?
//! Workers only ever talk to this trait, so the strategy (raw socket or OS
//! `ping` process) is chosen once, up front, by [`build_prober`].
//!
//! Setup failures (no raw socket, no `ping` binary) surface from the
//! constructors. Once a prober exists, every probe ends in a plain `bool`.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sweepr_common::ScanError;
use sweepr_common::config::{Config, ProbeStrategy};

mod icmp;
mod ping;

pub use icmp::IcmpProber;
pub use ping::{PingInvocation, PingProber};

/// Checks the liveness of a single host.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Returns `true` iff `target` answered an echo request sent from `source`.
    async fn probe(&self, source: Ipv4Addr, target: Ipv4Addr, timeout: Duration) -> bool;

    /// How many probes one worker may keep outstanding at once.
    fn max_in_flight(&self) -> usize {
        1
    }

    fn name(&self) -> &'static str;
}

/// Sets up the probing strategy selected in `cfg`.
pub fn build_prober(cfg: &Config) -> Result<Arc<dyn Prober>, ScanError> {
    let prober: Arc<dyn Prober> = match cfg.strategy {
        ProbeStrategy::Raw => Arc::new(IcmpProber::new()?),
        ProbeStrategy::Process => Arc::new(PingProber::new(cfg.max_processes)?),
    };
    Ok(prober)
}
