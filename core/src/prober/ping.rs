//! Unprivileged probing through the operating system's `ping` executable.
//!
//! Every probe is its own child process, so a worker can keep many of them in
//! flight and observe each exit as it happens.

use std::env;
use std::ffi::OsString;
use std::io;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use sweepr_common::ScanError;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, warn};

use super::Prober;

/// Concurrent `ping` children per worker unless `--max-processes` says otherwise.
pub const DEFAULT_MAX_PROCESSES: usize = 32;
/// Longest wait for a sibling to exit before spawning again.
const SPAWN_BACKOFF: Duration = Duration::from_millis(50);
/// Spawn failures tolerated for one host before it is given up on.
const SPAWN_RETRIES: usize = 200;

/// How to ask one platform's `ping` for exactly one echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingInvocation {
    pub os: &'static str,
    pub program: &'static str,
    pub count_flag: &'static str,
}

const INVOCATIONS: &[PingInvocation] = &[PingInvocation {
    os: "windows",
    program: "ping.exe",
    count_flag: "-n",
}];

const UNIX_INVOCATION: PingInvocation = PingInvocation {
    os: "unix",
    program: "ping",
    count_flag: "-c",
};

impl PingInvocation {
    /// Looks up the invocation for an OS name as reported by
    /// [`std::env::consts::OS`].
    pub fn for_os(os: &str) -> &'static PingInvocation {
        INVOCATIONS
            .iter()
            .find(|invocation| invocation.os == os)
            .unwrap_or(&UNIX_INVOCATION)
    }

    pub fn current() -> &'static PingInvocation {
        Self::for_os(env::consts::OS)
    }

    pub fn args(&self, target: Ipv4Addr) -> [String; 3] {
        [self.count_flag.to_string(), "1".to_string(), target.to_string()]
    }
}

pub struct PingProber {
    program: PathBuf,
    invocation: &'static PingInvocation,
    max_in_flight: usize,
    /// Woken whenever a child exits, freeing descriptors and process slots.
    exited: Notify,
}

impl PingProber {
    /// Fails when the platform's `ping` is not on `PATH`.
    ///
    /// `max_processes` caps concurrent children per worker, defaulting to
    /// [`DEFAULT_MAX_PROCESSES`].
    pub fn new(max_processes: Option<usize>) -> Result<Self, ScanError> {
        Self::from_path(env::var_os("PATH"), max_processes)
    }

    fn from_path(path: Option<OsString>, max_processes: Option<usize>) -> Result<Self, ScanError> {
        let invocation: &'static PingInvocation = PingInvocation::current();
        let program: PathBuf = find_in_path(invocation.program, path)
            .ok_or_else(|| ScanError::PingUnavailable(invocation.program.to_string()))?;
        debug!("using {}", program.display());

        Ok(Self {
            program,
            invocation,
            max_in_flight: in_flight_limit(max_processes),
            exited: Notify::new(),
        })
    }

    /// Runs one `ping` to completion.
    ///
    /// A spawn that fails for lack of resources is retried once a sibling has
    /// exited, or after [`SPAWN_BACKOFF`] at the latest. A missing program is
    /// not retried.
    async fn run(&self, target: Ipv4Addr) -> io::Result<ExitStatus> {
        let mut failures: usize = 0;
        loop {
            let spawned = Command::new(&self.program)
                .args(self.invocation.args(target))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn();

            match spawned {
                Ok(mut child) => {
                    let status = child.wait().await;
                    drop(child);
                    self.exited.notify_waiters();
                    return status;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(e),
                Err(e) if failures >= SPAWN_RETRIES => return Err(e),
                Err(e) => {
                    failures += 1;
                    debug!("could not spawn ping for {target} ({e}), waiting for a free slot");
                    let _ = tokio::time::timeout(SPAWN_BACKOFF, self.exited.notified()).await;
                }
            }
        }
    }
}

#[async_trait]
impl Prober for PingProber {
    /// `source` and `timeout` are left to the system `ping`.
    async fn probe(&self, _source: Ipv4Addr, target: Ipv4Addr, _timeout: Duration) -> bool {
        match self.run(target).await {
            Ok(status) => status.success(),
            Err(e) => {
                warn!("gave up on pinging {target}: {e}");
                false
            }
        }
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    fn name(&self) -> &'static str {
        "system ping"
    }
}

fn in_flight_limit(max_processes: Option<usize>) -> usize {
    max_processes.unwrap_or(DEFAULT_MAX_PROCESSES).max(1)
}

fn find_in_path(program: &str, path: Option<OsString>) -> Option<PathBuf> {
    let path: OsString = path?;
    env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
