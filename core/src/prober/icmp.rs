//! Privileged probing with hand-built ICMP echo requests.
//!
//! Requires **root privileges** (or `CAP_NET_RAW`) to open the raw socket.

use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sweepr_common::ScanError;
use sweepr_protocols::icmp::{self, EchoKey, EchoOutcome};
use tracing::{debug, warn};

use super::Prober;
use crate::network::transport::{self, IcmpHandle};

/// First attempt plus one retry after a timeout.
const ATTEMPTS: usize = 2;

pub struct IcmpProber {
    handle: IcmpHandle,
    identifier: u16,
    sequence: AtomicU16,
}

impl IcmpProber {
    pub fn new() -> Result<Self, ScanError> {
        let handle: IcmpHandle = transport::start_icmp_capture().map_err(|e| {
            if !is_root::is_root() {
                warn!("raw sockets usually need root, try again with sudo or use --user");
            }
            ScanError::RawSocket(e)
        })?;

        Ok(Self {
            handle,
            identifier: rand::random(),
            sequence: AtomicU16::new(0),
        })
    }

    /// Sends one echo request and waits for its answer.
    ///
    /// `Ok(None)` means nothing arrived within `timeout`.
    async fn exchange(
        &self,
        source: Ipv4Addr,
        target: Ipv4Addr,
        timeout: Duration,
    ) -> anyhow::Result<Option<EchoOutcome>> {
        let key = EchoKey {
            target,
            identifier: self.identifier,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };
        let datagram: Vec<u8> = icmp::create_echo_request_v4(source, target, &key)?;

        let reply = self.handle.register(key)?;
        if let Err(e) = self.handle.send_to(&datagram, target) {
            self.handle.unregister(&key);
            return Err(e.into());
        }

        match tokio::time::timeout(timeout, reply).await {
            Ok(Ok(outcome)) => Ok(Some(outcome)),
            Ok(Err(_)) => Ok(None),
            Err(_elapsed) => {
                self.handle.unregister(&key);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, source: Ipv4Addr, target: Ipv4Addr, timeout: Duration) -> bool {
        with_retry(target, || self.exchange(source, target, timeout)).await
    }

    fn name(&self) -> &'static str {
        "raw icmp"
    }
}

/// Runs `exchange` until it yields an answer, retrying only after a timeout.
async fn with_retry<F, Fut>(target: Ipv4Addr, mut exchange: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<EchoOutcome>>>,
{
    for attempt in 1..=ATTEMPTS {
        match exchange().await {
            Ok(Some(EchoOutcome::Reply)) => return true,
            Ok(Some(EchoOutcome::Rejected { icmp_type, icmp_code })) => {
                debug!("{target} rejected with ICMP type {icmp_type} code {icmp_code}");
                return false;
            }
            Ok(None) => debug!("{target} timed out (attempt {attempt}/{ATTEMPTS})"),
            Err(e) => {
                debug!("failed to probe {target}: {e}");
                return false;
            }
        }
    }
    false
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
    use std::cell::Cell;

    const TARGET: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 9);

    /// Replays `answers` in order and counts how many exchanges were made.
    async fn attempts_for(answers: Vec<Option<EchoOutcome>>) -> (bool, usize) {
        let calls = Cell::new(0);
        let reachable = with_retry(TARGET, || {
            let answer = answers.get(calls.get()).copied().flatten();
            calls.set(calls.get() + 1);
            async move { Ok(answer) }
        })
        .await;
        (reachable, calls.get())
    }

    #[tokio::test]
    async fn test_timeout_is_retried_exactly_once() {
        assert_eq!(attempts_for(vec![None, None, None]).await, (false, 2));
    }

    #[tokio::test]
    async fn test_reply_on_retry_counts() {
        assert_eq!(attempts_for(vec![None, Some(EchoOutcome::Reply)]).await, (true, 2));
    }

    #[tokio::test]
    async fn test_first_reply_stops() {
        assert_eq!(attempts_for(vec![Some(EchoOutcome::Reply)]).await, (true, 1));
    }

    #[tokio::test]
    async fn test_rejection_is_final() {
        let unreachable = EchoOutcome::Rejected {
            icmp_type: 3,
            icmp_code: 1,
        };
        assert_eq!(attempts_for(vec![Some(unreachable), Some(EchoOutcome::Reply)]).await, (false, 1));
    }

    #[tokio::test]
    async fn test_send_failure_is_not_retried() {
        let calls = Cell::new(0);
        let reachable = with_retry(TARGET, || {
            calls.set(calls.get() + 1);
            async { Err(anyhow::anyhow!("network is unreachable")) }
        })
        .await;
        assert!(!reachable);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    #[ignore]
    async fn icmp_probe_should_reach_loopback() {
        let prober = IcmpProber::new().unwrap();
        let localhost = Ipv4Addr::LOCALHOST;
        assert!(prober.probe(localhost, localhost, Duration::from_millis(100)).await);
    }

    #[tokio::test]
    #[ignore]
    async fn icmp_probe_should_time_out_on_documentation_range() {
        let prober = IcmpProber::new().unwrap();
        let target = Ipv4Addr::new(203, 0, 113, 1);
        assert!(!prober.probe(Ipv4Addr::UNSPECIFIED, target, Duration::from_millis(100)).await);
    }
}
