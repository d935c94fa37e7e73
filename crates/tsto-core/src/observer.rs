//! Progress / log / error channel between a pipeline and its caller.
//!
//! Callbacks run synchronously on the pipeline's thread and nothing buffers
//! them, so implementations must return quickly.

/// Receives pipeline events. Purely observational: nothing a callback does
/// changes the run.
pub trait PatchObserver {
    /// Percent in `0..=100` plus a short status line.
    fn on_progress(&mut self, percent: u8, status: &str);
    fn on_log(&mut self, line: &str);
    fn on_error(&mut self, message: &str);
}

/// Discards every event. The `Reporter` still mirrors them into tracing.
#[derive(Debug, Default)]
pub struct SilentObserver;

impl PatchObserver for SilentObserver {
    fn on_progress(&mut self, _percent: u8, _status: &str) {}
    fn on_log(&mut self, _line: &str) {}
    fn on_error(&mut self, _message: &str) {}
}

/// Wraps an observer: keeps progress non-decreasing and clamped to 100,
/// and mirrors every event into the tracing log.
pub struct Reporter<'a> {
    observer: &'a mut dyn PatchObserver,
    last_percent: u8,
}

impl<'a> Reporter<'a> {
    pub fn new(observer: &'a mut dyn PatchObserver) -> Self {
        Self {
            observer,
            last_percent: 0,
        }
    }

    pub fn progress(&mut self, percent: u8, status: &str) {
        let percent = percent.min(100).max(self.last_percent);
        self.last_percent = percent;
        tracing::info!(percent, "{}", status);
        self.observer.on_progress(percent, status);
    }

    pub fn log(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        tracing::debug!("{}", line);
        self.observer.on_log(line);
    }

    /// Non-fatal problem: goes to the log channel with a `WARNING:` prefix.
    pub fn warn(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        tracing::warn!("{}", line);
        self.observer.on_log(&format!("WARNING: {}", line));
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::error!("{}", message);
        self.observer.on_error(message);
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }
}

/// Observer that records every event; used by tests and by callers that want
/// the trail after the run.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub progress: Vec<(u8, String)>,
    pub logs: Vec<String>,
    pub errors: Vec<String>,
}

impl PatchObserver for RecordingObserver {
    fn on_progress(&mut self, percent: u8, status: &str) {
        self.progress.push((percent, status.to_string()));
    }

    fn on_log(&mut self, line: &str) {
        self.logs.push(line.to_string());
    }

    fn on_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

impl RecordingObserver {
    /// True if any log line contains `needle`.
    pub fn logged(&self, needle: &str) -> bool {
        self.logs.iter().any(|l| l.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_never_decreases() {
        let mut rec = RecordingObserver::default();
        {
            let mut r = Reporter::new(&mut rec);
            r.progress(20, "a");
            r.progress(10, "b");
            r.progress(250, "c");
        }
        let percents: Vec<u8> = rec.progress.iter().map(|(p, _)| *p).collect();
        assert_eq!(percents, vec![20, 20, 100]);
        assert_eq!(rec.progress[1].1, "b");
    }

    #[test]
    fn warn_is_prefixed_on_log_channel() {
        let mut rec = RecordingObserver::default();
        Reporter::new(&mut rec).warn("could not open x");
        assert_eq!(rec.logs, vec!["WARNING: could not open x".to_string()]);
        assert!(rec.errors.is_empty());
    }
}
