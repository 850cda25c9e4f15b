#![cfg(test)]
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sweepr_common::config::{Config, ProbeStrategy, Schedule};
use sweepr_common::network::subnet::Subnet;
use sweepr_common::ScanError;
use sweepr_core::prober::{self, Prober};
use sweepr_core::report::ScanReport;
use sweepr_core::scanner::{self, Scanner};

/// Stands in for the network: hosts listed in `live` answer, every probe is logged.
struct ScriptedProber {
    live: Vec<Ipv4Addr>,
    in_flight: usize,
    probed: Mutex<Vec<Ipv4Addr>>,
}

impl ScriptedProber {
    fn new(live: &[Ipv4Addr], in_flight: usize) -> Arc<Self> {
        Arc::new(Self {
            live: live.to_vec(),
            in_flight,
            probed: Mutex::new(Vec::new()),
        })
    }

    fn probed(&self) -> Vec<Ipv4Addr> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, _source: Ipv4Addr, target: Ipv4Addr, _timeout: Duration) -> bool {
        self.probed.lock().unwrap().push(target);
        // Later hosts answer first, so completion order differs from report order.
        let delay = 255 - u64::from(target.octets()[3]);
        tokio::time::sleep(Duration::from_micros(delay * 20)).await;
        self.live.contains(&target)
    }

    fn max_in_flight(&self) -> usize {
        self.in_flight
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn sweep(cfg: &Config, subnet: &str, prober: Arc<ScriptedProber>) -> Result<ScanReport, ScanError> {
    let subnet = Subnet::from_str(subnet)?;
    let rt = scanner::runtime(cfg.schedule, cfg.worker_count(&subnet)).map_err(ScanError::Runtime)?;
    let scope = cfg.scope(subnet);
    rt.block_on(Scanner::new(cfg, prober).scan(&scope, None))
}

#[test]
fn slash_30_all_unreachable_reports_both_hosts_in_order() {
    let cfg = Config {
        all_hosts: true,
        ..Config::default()
    };
    let report = sweep(&cfg, "192.168.1.0/30", ScriptedProber::new(&[], 1)).unwrap();

    let lines: Vec<String> = report.iter().map(|r| r.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "192.168.1.1: ICMP echo reply not received",
            "192.168.1.2: ICMP echo reply not received",
        ]
    );
}

#[test]
fn slash_31_is_empty_and_probes_nothing() {
    let prober = ScriptedProber::new(&[], 1);
    let report = sweep(&Config::default(), "10.0.0.0/31", prober.clone()).unwrap();
    assert!(report.is_empty());
    assert!(prober.probed().is_empty());
}

#[test]
fn invalid_prefix_rejected_before_probing() {
    let prober = ScriptedProber::new(&[], 1);
    let err = sweep(&Config::default(), "10.0.0.0/33", prober.clone()).unwrap_err();
    assert!(matches!(err, ScanError::InvalidSubnet(_)));
    assert!(err.is_input());
    assert!(prober.probed().is_empty());
}

#[test]
fn every_schedule_and_concurrency_gives_same_report() {
    let live = [
        Ipv4Addr::new(172, 16, 5, 3),
        Ipv4Addr::new(172, 16, 5, 64),
        Ipv4Addr::new(172, 16, 5, 254),
    ];

    let mut reports = Vec::new();
    for (user, asynchronous) in [(false, false), (false, true), (true, false)] {
        let cfg = Config::default().with_mode(user, asynchronous);
        let in_flight = match cfg.strategy {
            ProbeStrategy::Raw => 1,
            ProbeStrategy::Process => usize::MAX,
        };
        let prober = ScriptedProber::new(&live, in_flight);
        let report = sweep(&cfg, "172.16.5.0/24", prober.clone()).unwrap();

        let mut probed = prober.probed();
        probed.sort();
        probed.dedup();
        assert_eq!(probed.len(), 254);
        reports.push(report);
    }

    let reachable: Vec<Ipv4Addr> = reports[0].reachable().map(|r| r.addr).collect();
    assert_eq!(reachable, live.to_vec());
    assert!(reports.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn boundaries_are_probed_when_requested() {
    let cfg = Config {
        include_boundaries: true,
        schedule: Schedule::Cooperative,
        ..Config::default()
    };
    let report = sweep(&cfg, "10.9.8.0/29", ScriptedProber::new(&[], 1)).unwrap();

    let addrs: Vec<Ipv4Addr> = report.iter().map(|r| r.addr).collect();
    let expected: Vec<Ipv4Addr> = (0..=7).map(|last| Ipv4Addr::new(10, 9, 8, last)).collect();
    assert_eq!(addrs, expected);
}

#[test]
fn large_subnet_covers_every_host_once() {
    let prober = ScriptedProber::new(&[Ipv4Addr::new(10, 20, 3, 7)], 64);
    let cfg = Config::default();
    let report = sweep(&cfg, "10.20.0.0/22", prober.clone()).unwrap();

    assert_eq!(report.len(), 1022);
    assert_eq!(report.reachable_count(), 1);
    let addrs: Vec<u32> = report.iter().map(|r| u32::from(r.addr)).collect();
    assert!(addrs.windows(2).all(|pair| pair[0] < pair[1]));
}

/// Requires the system `ping` utility and a loopback interface.
#[test]
#[ignore]
fn user_mode_pings_loopback() {
    let cfg = Config {
        strategy: ProbeStrategy::Process,
        ..Config::default()
    };
    let prober: Arc<dyn Prober> = prober::build_prober(&cfg).unwrap();
    let subnet = Subnet::from_str("127.0.0.0/30").unwrap();
    let rt = scanner::runtime(cfg.schedule, cfg.worker_count(&subnet)).unwrap();
    let report = rt
        .block_on(Scanner::new(&cfg, prober).scan(&cfg.scope(subnet), None))
        .unwrap();

    assert!(report
        .reachable()
        .any(|r| r.addr == Ipv4Addr::new(127, 0, 0, 1)));
}

/// Requires root for the raw socket.
#[test]
#[ignore]
fn raw_mode_pings_loopback() {
    let cfg = Config {
        source: Ipv4Addr::LOCALHOST,
        ..Config::default()
    };
    let prober: Arc<dyn Prober> = prober::build_prober(&cfg).unwrap();
    let subnet = Subnet::from_str("127.0.0.0/30").unwrap();
    let rt = scanner::runtime(cfg.schedule, cfg.worker_count(&subnet)).unwrap();
    let report = rt
        .block_on(Scanner::new(&cfg, prober).scan(&cfg.scope(subnet), None))
        .unwrap();

    assert!(report
        .reachable()
        .any(|r| r.addr == Ipv4Addr::new(127, 0, 0, 1)));
}
