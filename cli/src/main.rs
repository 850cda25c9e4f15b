mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, sweep};
use terminal::logging;
use tracing::error;

fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    if let Err(e) = logging::init_logging(commands.verbose) {
        eprintln!("failed to initialize logging: {e:#}");
    }

    match sweep::sweep(&commands) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
