use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::terminal::colors;

const TICK_INTERVAL: Duration = Duration::from_millis(100);
const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

/// The spinner currently on screen, if any. Log output is drawn around it.
static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Shows a spinner until dropped.
pub struct Spinner {
    pb: ProgressBar,
    total: u64,
}

impl Spinner {
    pub fn start(total: u64) -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICK_STRINGS);

        pb.set_style(style);
        pb.enable_steady_tick(TICK_INTERVAL);

        let spinner = Self { pb, total };
        spinner.report_progress(0);
        *lock_active() = Some(spinner.pb.clone());
        spinner
    }

    pub fn report_progress(&self, probed: u64) {
        self.pb.set_message(format!(
            "Probed {} of {} hosts...",
            probed.to_string().color(colors::REACHABLE).bold(),
            self.total
        ));
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        lock_active().take();
        self.pb.finish_and_clear();
    }
}

fn lock_active() -> std::sync::MutexGuard<'static, Option<ProgressBar>> {
    ACTIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writes to stdout, hiding the active spinner for the duration of the write.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let active: Option<ProgressBar> = lock_active().clone();
        match active {
            Some(pb) => pb.suspend(|| io::stdout().lock().write_all(buf))?,
            None => io::stdout().lock().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}
