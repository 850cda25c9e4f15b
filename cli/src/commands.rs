pub mod sweep;

use std::time::Duration;

use clap::Parser;
use sweepr_common::config::DEFAULT_PROBE_TIMEOUT;

#[derive(Parser)]
#[command(name = "sweepr")]
#[command(version)]
#[command(about = "Ping every host of an IPv4 subnet and report which ones answer.")]
pub struct CommandLine {
    /// Subnet to sweep in CIDR notation, e.g. 192.168.1.0/24
    pub subnet: String,

    /// Address to send probes from
    #[arg(short, long)]
    pub source: Option<String>,

    /// Print each host as soon as its probe completes
    #[arg(short, long)]
    pub verbose: bool,

    /// Also report hosts that did not answer
    #[arg(short, long)]
    pub all_hosts: bool,

    /// Probe through the system ping utility, no privileges required
    #[arg(short, long)]
    pub user: bool,

    /// Run every worker on a single thread
    #[arg(short = 'A', long)]
    pub asynchronous: bool,

    /// Also probe the network and broadcast address
    #[arg(short, long)]
    pub boundaries: bool,

    /// Reply timeout per raw ICMP attempt, in milliseconds
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Upper bound on concurrent ping processes per worker [default: 32]
    #[arg(long)]
    pub max_processes: Option<usize>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
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
