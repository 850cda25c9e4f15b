use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use sweepr_common::ScanError;
use sweepr_common::config::Config;
use sweepr_common::network::address;
use sweepr_common::network::interface;
use sweepr_common::network::subnet::{ScanScope, Subnet};
use sweepr_core::prober::{self, Prober};
use sweepr_core::report::ScanReport;
use sweepr_core::scanner::{self, Scanner};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::commands::CommandLine;
use crate::terminal::print;
use crate::terminal::spinner::Spinner;

pub fn sweep(cli: &CommandLine) -> anyhow::Result<()> {
    let subnet: Subnet = Subnet::from_str(&cli.subnet)?;
    let source: Ipv4Addr = match &cli.source {
        Some(s) => parse_source(s)?,
        None => interface::resolve_source(&subnet),
    };

    let cfg: Config = Config {
        source,
        verbose: cli.verbose,
        all_hosts: cli.all_hosts,
        timeout: cli.timeout(),
        include_boundaries: cli.boundaries,
        max_processes: cli.max_processes,
        ..Config::default()
    }
    .with_mode(cli.user, cli.asynchronous);

    let prober: Arc<dyn Prober> = prober::build_prober(&cfg)?;
    let scope: ScanScope = cfg.scope(subnet);
    let workers: usize = cfg.worker_count(&subnet);
    debug!(
        "{:?} schedule, {} worker(s), {} strategy",
        cfg.schedule,
        workers,
        prober.name()
    );

    let rt = scanner::runtime(cfg.schedule, workers).map_err(ScanError::Runtime)?;

    print::header("sweeping subnet");
    print::print_status(format!("Scanning {subnet} from {source}. Please wait..."));

    let started: Instant = Instant::now();
    let report: ScanReport = rt.block_on(run_scan(&cfg, prober, &scope))?;
    let elapsed = started.elapsed();
    info!("sweep of {} finished", subnet);

    print_report(&report, cfg.all_hosts);
    print::summary(report.reachable_count(), report.len(), elapsed);
    print::end_of_program();
    Ok(())
}

async fn run_scan(
    cfg: &Config,
    prober: Arc<dyn Prober>,
    scope: &ScanScope,
) -> Result<ScanReport, ScanError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let verbose: bool = cfg.verbose;
    let total: u64 = scope.len();

    let printer = tokio::spawn(async move {
        let spinner: Option<Spinner> = (!verbose).then(|| Spinner::start(total));
        let mut probed: u64 = 0;
        while let Some(result) = rx.recv().await {
            probed += 1;
            match &spinner {
                Some(spinner) => spinner.report_progress(probed),
                None => print::live_line(&result),
            }
        }
    });

    let report = Scanner::new(cfg, prober).scan(scope, Some(tx)).await;
    finish_printer(printer).await;
    report
}

/// Waits for the progress printer. Returns `false` if it died.
async fn finish_printer(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            error!("progress printer failed: {e}");
            false
        }
    }
}

fn print_report(report: &ScanReport, all_hosts: bool) {
    if all_hosts {
        report.iter().for_each(print::result_line);
    } else if report.reachable_count() == 0 {
        print::print_status("No host answered");
    } else {
        report.reachable().for_each(print::result_line);
    }
}

fn parse_source(s: &str) -> Result<Ipv4Addr, ScanError> {
    if !address::validate_address(s) {
        return Err(ScanError::InvalidAddress(s.to_string()));
    }
    s.parse()
        .map_err(|_| ScanError::InvalidAddress(s.to_string()))
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
    use clap::Parser;

    #[test]
    fn test_parse_source() {
        assert_eq!(parse_source("192.168.1.7").unwrap(), Ipv4Addr::new(192, 168, 1, 7));
        assert!(matches!(parse_source("192.168.1"), Err(ScanError::InvalidAddress(_))));
        assert!(matches!(parse_source("192.168.1.256"), Err(ScanError::InvalidAddress(_))));
        assert!(matches!(parse_source("01.2.3.4"), Err(ScanError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_printer_failure_is_reported() {
        assert!(finish_printer(tokio::spawn(async {})).await);

        let crashed: JoinHandle<()> = tokio::spawn(async { panic!("terminal went away") });
        assert!(!finish_printer(crashed).await);
    }

    #[test]
    fn test_invalid_subnet_fails_before_probing() {
        let cli = CommandLine::try_parse_from(["sweepr", "10.0.0.0/33"]).unwrap();
        let err = sweep(&cli).unwrap_err();
        let scan_err = err.downcast_ref::<ScanError>().unwrap();
        assert!(scan_err.is_input());
    }

    #[test]
    fn test_host_bits_rejected() {
        let cli = CommandLine::try_parse_from(["sweepr", "-u", "10.0.0.1/24"]).unwrap();
        let err = sweep(&cli).unwrap_err();
        assert!(matches!(err.downcast_ref::<ScanError>(), Some(ScanError::HostBitsSet(_))));
    }

    #[test]
    fn test_invalid_source_rejected() {
        let cli = CommandLine::try_parse_from(["sweepr", "-u", "-s", "10.0.0", "10.0.0.0/24"]).unwrap();
        let err = sweep(&cli).unwrap_err();
        assert!(matches!(err.downcast_ref::<ScanError>(), Some(ScanError::InvalidAddress(_))));
    }
}
