use clap::Parser;
use tsto_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();

    // File logging if possible, stderr otherwise; the CLI never dies on logging.
    if let Err(e) = logging::init_logging(cli.verbose) {
        logging::init_logging_stderr(cli.verbose);
        tracing::warn!("file logging unavailable, using stderr: {e:#}");
    }

    if let Err(err) = cli.run() {
        eprintln!("tsto-patch error: {:#}", err);
        std::process::exit(1);
    }
}
