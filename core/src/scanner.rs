//! The sweep engine.
//!
//! A [`Scanner`] splits a [`ScanScope`] into sub-ranges, runs one
//! [`ScanWorker`] per sub-range, waits for every worker to finish and only
//! then merges their results into a [`ScanReport`]. Where the workers run is
//! decided by the runtime the caller drives the scan on, see [`runtime`].

use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use sweepr_common::ScanError;
use sweepr_common::config::{Config, Schedule};
use sweepr_common::network::host::HostMap;
use sweepr_common::network::subnet::ScanScope;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinSet;
use tracing::debug;

use crate::aggregate;
use crate::partition::{self, SubRange};
use crate::prober::Prober;
use crate::report::ScanReport;
use crate::worker::{ProgressSender, ScanWorker};

pub struct Scanner {
    prober: Arc<dyn Prober>,
    source: Ipv4Addr,
    timeout: Duration,
    depth: u8,
}

impl Scanner {
    pub fn new(cfg: &Config, prober: Arc<dyn Prober>) -> Self {
        Self {
            prober,
            source: cfg.source,
            timeout: cfg.timeout,
            depth: cfg.partition_depth,
        }
    }

    /// Probes every address of `scope` and returns the sorted report.
    ///
    /// `progress`, when given, receives each result as soon as its probe
    /// completes. The channel closes once every worker is done.
    pub async fn scan(
        &self,
        scope: &ScanScope,
        progress: Option<ProgressSender>,
    ) -> Result<ScanReport, ScanError> {
        let ranges: Vec<SubRange> = partition::partition(scope, self.depth);
        debug!(
            "{} split into {} sub-range(s), probing with {}",
            scope.subnet,
            ranges.len(),
            self.prober.name()
        );

        let mut workers: JoinSet<ScanWorker> = JoinSet::new();
        for range in ranges {
            let worker = ScanWorker::new(range, self.source, self.timeout);
            workers.spawn(worker.run(Arc::clone(&self.prober), progress.clone()));
        }
        drop(progress);

        let mut outputs: Vec<HostMap> = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            let worker: ScanWorker = joined.map_err(|e| ScanError::WorkerPanicked(e.to_string()))?;
            outputs.push(worker.into_results()?);
        }

        let merged: HostMap = aggregate::merge(scope, outputs)?;
        Ok(ScanReport::from(merged))
    }
}

/// Builds the runtime the scan is driven on.
///
/// [`Schedule::Threaded`] gets one OS thread per worker, [`Schedule::Cooperative`]
/// keeps every worker on the calling thread.
pub fn runtime(schedule: Schedule, workers: usize) -> io::Result<Runtime> {
    match schedule {
        Schedule::Threaded => Builder::new_multi_thread()
            .worker_threads(workers.max(1))
            .thread_name("sweepr-worker")
            .enable_all()
            .build(),
        Schedule::Cooperative => Builder::new_current_thread().enable_all().build(),
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
