//! # Address Validation
//!
//! Strict string checks for dotted-quad addresses and CIDR literals.
//!
//! These are pure predicates. They are stricter than [`std::net::Ipv4Addr`]'s
//! parser in one respect only: zero-padded fields such as `"01"` are refused,
//! and so is a zero-padded prefix like `"/08"`.

const OCTET_COUNT: usize = 4;
const MIN_PREFIX: u8 = 1;
const MAX_PREFIX: u8 = 32;

/// Returns `true` iff `s` is four `.`-separated decimal octets in `0..=255`,
/// none of them zero-padded.
pub fn validate_address(s: &str) -> bool {
    let octets: Vec<&str> = s.split('.').collect();
    octets.len() == OCTET_COUNT && octets.iter().all(|octet| parse_decimal::<u8>(octet).is_some())
}

/// Returns `true` iff `s` is `<address>/<prefix>` with a valid address and a
/// prefix in `1..=32`.
pub fn validate_subnet(s: &str) -> bool {
    let parts: Vec<&str> = s.split('/').collect();
    let [address, prefix] = parts.as_slice() else {
        return false;
    };

    validate_address(address)
        && parse_decimal::<u8>(prefix)
            .is_some_and(|prefix| (MIN_PREFIX..=MAX_PREFIX).contains(&prefix))
}

/// Parses a canonical decimal number: digits only, no sign, no padding.
fn parse_decimal<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse::<T>().ok()
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
    use std::net::Ipv4Addr;

    #[test]
    fn test_validate_address_accepts_canonical() {
        for addr in ["0.0.0.0", "255.255.255.255", "192.168.1.10", "10.0.0.100", "1.2.3.4"] {
            assert!(validate_address(addr), "{addr} should be valid");
        }
    }

    #[test]
    fn test_validate_address_agrees_with_display() {
        // Every address printed by std is canonical and must be accepted.
        for raw in [0u32, 1, 0x0A00_0064, 0xC0A8_0101, 0x7F00_0001, u32::MAX] {
            let addr = Ipv4Addr::from(raw).to_string();
            assert!(validate_address(&addr), "{addr} should be valid");
        }
    }

    #[test]
    fn test_validate_address_rejects_out_of_range() {
        assert!(!validate_address("256.0.0.1"));
        assert!(!validate_address("10.0.0.999"));
        assert!(!validate_address("10.0.0.99999999999999999999"));
    }

    #[test]
    fn test_validate_address_rejects_leading_zeros() {
        assert!(!validate_address("01.2.3.4"));
        assert!(!validate_address("1.2.3.04"));
        assert!(!validate_address("1.2.00.4"));
    }

    #[test]
    fn test_validate_address_rejects_wrong_field_count() {
        assert!(!validate_address("1.2.3"));
        assert!(!validate_address("1.2.3.4.5"));
        assert!(!validate_address(""));
        assert!(!validate_address("1..2.3"));
    }

    #[test]
    fn test_validate_address_rejects_non_numeric() {
        assert!(!validate_address("a.b.c.d"));
        assert!(!validate_address("1.2.3.-4"));
        assert!(!validate_address("1.2.3.+4"));
        assert!(!validate_address(" 1.2.3.4"));
        assert!(!validate_address("1.2.3.4 "));
    }

    #[test]
    fn test_validate_subnet() {
        assert!(validate_subnet("192.168.1.0/24"));
        assert!(validate_subnet("10.0.0.0/1"));
        assert!(validate_subnet("10.0.0.1/32"));

        assert!(!validate_subnet("10.0.0.0/0"));
        assert!(!validate_subnet("10.0.0.0/33"));
        assert!(!validate_subnet("10.0.0.0/08"));
        assert!(!validate_subnet("10.0.0.0/"));
        assert!(!validate_subnet("10.0.0.0"));
        assert!(!validate_subnet("10.0.0.0/24/1"));
        assert!(!validate_subnet("10.0.0.00/24"));
        assert!(!validate_subnet("10.0.0.0/x"));
    }
}
