use std::time::Duration;

use colored::*;
use sweepr_common::network::host::ProbeResult;
use tracing::info;

use crate::terminal::colors;

pub const TOTAL_WIDTH: usize = 64;

/// Events on this target are rendered as-is by the formatter.
pub const PRINT_TARGET: &str = "sweepr::print";
pub const RAW_FIELD: &str = "raw_msg";

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().color(colors::PRIMARY),
        "─".repeat(right)
    )
    .color(colors::SEPARATOR);

    print(&format!("{}", line));
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    let prefix: ColoredString = ">".color(colors::SEPARATOR);
    let message: String = format!("{} {}", prefix, msg.as_ref().color(colors::TEXT_DEFAULT));
    print(&message);
}

pub fn result_line(result: &ProbeResult) {
    let color: Color = if result.reachable {
        colors::REACHABLE
    } else {
        colors::UNREACHABLE
    };
    print(&format!("{}", result.to_string().color(color)));
}

/// Address of a host whose probe just completed, printed while the scan runs.
pub fn live_line(result: &ProbeResult) {
    let color: Color = if result.reachable {
        colors::REACHABLE
    } else {
        colors::SEPARATOR
    };
    print(&format!("{}", result.addr.to_string().color(color)));
}

pub fn summary(reachable: usize, probed: usize, elapsed: Duration) {
    let count: ColoredString = reachable.to_string().color(colors::ACCENT).bold();
    print_status(format!(
        "{} of {} host(s) answered in {:.2}s",
        count,
        probed,
        elapsed.as_secs_f64()
    ));
}

pub fn end_of_program() {
    print(&format!("{}", "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR)));
}
