//! One worker per sub-range.
//!
//! A worker walks its sub-range in ascending order and keeps at most
//! [`Prober::max_in_flight`] probes outstanding. Results are owned by the
//! worker alone and only become readable once [`ScanWorker::run`] returns.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use sweepr_common::ScanError;
use sweepr_common::network::host::{HostMap, ProbeResult};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

use crate::partition::SubRange;
use crate::prober::Prober;

/// Receives every probe result the moment it completes.
pub type ProgressSender = UnboundedSender<ProbeResult>;

pub struct ScanWorker {
    range: SubRange,
    source: Ipv4Addr,
    timeout: Duration,
    results: Option<HostMap>,
}

impl ScanWorker {
    pub fn new(range: SubRange, source: Ipv4Addr, timeout: Duration) -> Self {
        Self {
            range,
            source,
            timeout,
            results: None,
        }
    }

    pub fn index(&self) -> usize {
        self.range.index
    }

    pub fn is_finished(&self) -> bool {
        self.results.is_some()
    }

    /// Probes every address of the sub-range and returns the finished worker.
    pub async fn run(mut self, prober: Arc<dyn Prober>, progress: Option<ProgressSender>) -> Self {
        let limit: usize = prober.max_in_flight().max(1);
        let mut in_flight: JoinSet<ProbeResult> = JoinSet::new();
        let mut results: HostMap = HostMap::new();

        debug!(
            "worker {} probing {} address(es) with {}",
            self.index(),
            self.range.len(),
            prober.name()
        );

        for target in self.range.addresses() {
            if in_flight.len() >= limit {
                if let Some(joined) = in_flight.join_next().await {
                    record(&mut results, joined, progress.as_ref());
                }
            }

            let prober: Arc<dyn Prober> = Arc::clone(&prober);
            let (source, timeout) = (self.source, self.timeout);
            in_flight.spawn(async move {
                let reachable: bool = prober.probe(source, target, timeout).await;
                ProbeResult::new(target, reachable)
            });
        }

        while let Some(joined) = in_flight.join_next().await {
            record(&mut results, joined, progress.as_ref());
        }

        debug!("worker {} finished with {} result(s)", self.index(), results.len());
        self.results = Some(results);
        self
    }

    /// The worker's results. Errors until [`ScanWorker::run`] has completed.
    pub fn results(&self) -> Result<&HostMap, ScanError> {
        self.results
            .as_ref()
            .ok_or(ScanError::WorkerNotFinished(self.index()))
    }

    pub fn into_results(self) -> Result<HostMap, ScanError> {
        let index: usize = self.index();
        self.results.ok_or(ScanError::WorkerNotFinished(index))
    }
}

fn record(results: &mut HostMap, joined: Result<ProbeResult, JoinError>, progress: Option<&ProgressSender>) {
    match joined {
        Ok(result) => {
            results.insert(result.addr, result.reachable);
            if let Some(tx) = progress {
                let _ = tx.send(result);
            }
        }
        Err(e) => error!("probe task failed: {e}"),
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
