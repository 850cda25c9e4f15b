//! Folds per-worker results into one map and checks it against the scope.

use std::net::Ipv4Addr;

use sweepr_common::ScanError;
use sweepr_common::network::host::HostMap;
use sweepr_common::network::subnet::ScanScope;

/// Merges worker outputs into a single [`HostMap`].
///
/// Every address of `scope` must appear exactly once across all outputs.
/// An address reported twice, an address outside the scope, or an address
/// never reported at all is an internal error.
pub fn merge<I>(scope: &ScanScope, outputs: I) -> Result<HostMap, ScanError>
where
    I: IntoIterator<Item = HostMap>,
{
    let mut merged: HostMap = HostMap::with_capacity(capacity_hint(scope));

    for output in outputs {
        for (addr, reachable) in output {
            if !scope.contains(addr) {
                return Err(ScanError::UnexpectedHost(addr));
            }
            if merged.insert(addr, reachable).is_some() {
                return Err(ScanError::DuplicateHost(addr));
            }
        }
    }

    let expected: u64 = scope.len();
    let found: u64 = merged.len() as u64;
    if found < expected {
        let first: Ipv4Addr = scope
            .iter()
            .find(|addr| !merged.contains_key(addr))
            .unwrap_or(scope.subnet.network());
        return Err(ScanError::MissingHosts {
            count: expected - found,
            first,
        });
    }

    Ok(merged)
}

fn capacity_hint(scope: &ScanScope) -> usize {
    usize::try_from(scope.len()).unwrap_or(usize::MAX).min(1 << 16)
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
    use std::str::FromStr;
    use sweepr_common::network::subnet::Subnet;

    fn scope(s: &str) -> ScanScope {
        ScanScope::new(Subnet::from_str(s).unwrap())
    }

    fn map(entries: &[([u8; 4], bool)]) -> HostMap {
        entries
            .iter()
            .map(|(octets, reachable)| (Ipv4Addr::from(*octets), *reachable))
            .collect()
    }

    #[test]
    fn test_merge_disjoint_outputs() {
        let merged = merge(
            &scope("10.0.0.0/29"),
            vec![
                map(&[([10, 0, 0, 1], true), ([10, 0, 0, 2], false), ([10, 0, 0, 3], false)]),
                map(&[([10, 0, 0, 4], false), ([10, 0, 0, 5], true), ([10, 0, 0, 6], false)]),
            ],
        )
        .unwrap();

        assert_eq!(merged.len(), 6);
        assert_eq!(merged[&Ipv4Addr::new(10, 0, 0, 5)], true);
    }

    #[test]
    fn test_two_workers_reporting_same_host() {
        let err = merge(
            &scope("10.0.0.0/30"),
            vec![
                map(&[([10, 0, 0, 1], true), ([10, 0, 0, 2], false)]),
                map(&[([10, 0, 0, 2], true)]),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, ScanError::DuplicateHost(a) if a == Ipv4Addr::new(10, 0, 0, 2)));
        assert!(err.is_internal());
    }

    #[test]
    fn test_host_outside_scope() {
        let err = merge(
            &scope("10.0.0.0/30"),
            vec![map(&[([10, 0, 0, 1], true), ([10, 0, 0, 2], false), ([10, 0, 0, 3], true)])],
        )
        .unwrap_err();

        assert!(matches!(err, ScanError::UnexpectedHost(a) if a == Ipv4Addr::new(10, 0, 0, 3)));
    }

    #[test]
    fn test_missing_hosts_names_first_gap() {
        let err = merge(
            &scope("10.0.0.0/29"),
            vec![map(&[([10, 0, 0, 1], true), ([10, 0, 0, 2], false), ([10, 0, 0, 5], false)])],
        )
        .unwrap_err();

        match err {
            ScanError::MissingHosts { count, first } => {
                assert_eq!(count, 3);
                assert_eq!(first, Ipv4Addr::new(10, 0, 0, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_scope_merges_to_nothing() {
        let merged = merge(&scope("10.0.0.0/31"), Vec::<HostMap>::new()).unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn test_boundaries_are_expected_when_included() {
        let scope = scope("10.0.0.0/30").with_boundaries(true);
        let err = merge(&scope, vec![map(&[([10, 0, 0, 1], true), ([10, 0, 0, 2], true)])]).unwrap_err();
        assert!(matches!(err, ScanError::MissingHosts { count: 2, .. }));

        let merged = merge(
            &scope,
            vec![map(&[
                ([10, 0, 0, 0], false),
                ([10, 0, 0, 1], true),
                ([10, 0, 0, 2], true),
                ([10, 0, 0, 3], false),
            ])],
        )
        .unwrap();
        assert_eq!(merged.len(), 4);
    }
}
