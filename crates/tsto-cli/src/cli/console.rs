//! Terminal observer: progress lines always, log lines when verbose.

use tsto_core::PatchObserver;

#[derive(Debug, Default)]
pub struct ConsoleObserver {
    verbose: bool,
}

impl ConsoleObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

/// `[ 50%] Replacing URLs...`
pub fn progress_line(percent: u8, status: &str) -> String {
    format!("[{:>3}%] {}", percent, status)
}

impl PatchObserver for ConsoleObserver {
    fn on_progress(&mut self, percent: u8, status: &str) {
        eprintln!("{}", progress_line(percent, status));
    }

    fn on_log(&mut self, line: &str) {
        // Warnings are shown even without --verbose.
        if self.verbose || line.starts_with("WARNING:") {
            eprintln!("       {}", line);
        }
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("error: {}", message);
    }
}
