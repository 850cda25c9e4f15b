use std::net::Ipv4Addr;
use std::time::Duration;

use crate::network::subnet::{ScanScope, Subnet};

/// Sub-ranges per scan are `2^depth`.
pub const DEFAULT_PARTITION_DEPTH: u8 = 4;
/// How long the raw ICMP probe waits for a reply before its single retry.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// How a single host is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStrategy {
    /// Hand-built ICMP echo over a raw socket. Needs elevated privileges.
    #[default]
    Raw,
    /// One OS `ping` process per host.
    Process,
}

/// How workers are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// Workers spread across a pool of OS threads.
    #[default]
    Threaded,
    /// Every worker on one thread, yielding at each probe's wait.
    Cooperative,
}

pub struct Config {
    /// Address probes are sent from.
    pub source: Ipv4Addr,
    /// Print each host as soon as its probe completes.
    pub verbose: bool,
    /// Report unreachable hosts too.
    pub all_hosts: bool,
    pub strategy: ProbeStrategy,
    pub schedule: Schedule,
    pub partition_depth: u8,
    /// Per-attempt reply timeout of the raw ICMP probe.
    pub timeout: Duration,
    /// Also probe the network and broadcast address.
    pub include_boundaries: bool,
    /// Upper bound on concurrent `ping` processes per worker.
    pub max_processes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: Ipv4Addr::UNSPECIFIED,
            verbose: false,
            all_hosts: false,
            strategy: ProbeStrategy::default(),
            schedule: Schedule::default(),
            partition_depth: DEFAULT_PARTITION_DEPTH,
            timeout: DEFAULT_PROBE_TIMEOUT,
            include_boundaries: false,
            max_processes: None,
        }
    }
}

impl Config {
    /// Resolves the `--user` and `--asynchronous` flags. User mode wins.
    pub fn with_mode(mut self, user: bool, asynchronous: bool) -> Self {
        (self.strategy, self.schedule) = match (user, asynchronous) {
            (true, _) => (ProbeStrategy::Process, Schedule::Threaded),
            (false, true) => (ProbeStrategy::Raw, Schedule::Cooperative),
            (false, false) => (ProbeStrategy::Raw, Schedule::Threaded),
        };
        self
    }

    pub fn scope(&self, subnet: Subnet) -> ScanScope {
        ScanScope::new(subnet).with_boundaries(self.include_boundaries)
    }

    /// Number of sub-ranges a scan of `subnet` is split into.
    pub fn worker_count(&self, subnet: &Subnet) -> usize {
        let depth: u8 = self.partition_depth.min(32 - subnet.prefix());
        1usize << depth
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
