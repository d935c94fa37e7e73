//! Subprocess runner: bounded startup, streamed output, exit-code check.
//!
//! Both pipes are drained on helper threads while the child runs; lines are
//! handed to the reporter from the calling thread in arrival order. Only the
//! start is bounded, a running child may take as long as it needs.

use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::error::{PatchError, PatchResult};
use crate::observer::Reporter;

/// A collaborator invocation, built up before it is started.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    label: String,
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    cwd: Option<PathBuf>,
    secrets: Vec<String>,
}

/// Output of a short probe run.
#[derive(Debug, Clone)]
pub struct Captured {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// stdout followed by stderr; `java -version` writes to the latter.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

impl From<Output> for Captured {
    fn from(o: Output) -> Self {
        Self {
            success: o.status.success(),
            stdout: String::from_utf8_lossy(&o.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&o.stderr).into_owned(),
        }
    }
}

impl ToolCommand {
    pub fn new(label: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
            secrets: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (k, v) in vars {
            self = self.env(k, v);
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Argument value that is masked in every rendering of the command line.
    pub fn secret(mut self, value: impl Into<String>) -> Self {
        self.secrets.push(value.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn env_value(&self, key: &str) -> Option<&OsStr> {
        self.envs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    /// Command line for logs, with secrets replaced by `****`.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        for a in &self.args {
            let a = a.to_string_lossy();
            if self.secrets.iter().any(|s| !s.is_empty() && *s == a) {
                parts.push("****".to_string());
            } else if a.contains(' ') {
                parts.push(format!("\"{a}\""));
            } else {
                parts.push(a.into_owned());
            }
        }
        parts.join(" ")
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn failed(&self, reason: impl Into<String>) -> PatchError {
        PatchError::SubprocessFailed {
            tool: self.label.clone(),
            reason: reason.into(),
        }
    }

    /// Starts the child on a helper thread and waits at most `timeout` for it.
    /// A child that starts after the deadline is killed.
    fn spawn_bounded(&self, mut cmd: Command, timeout: Duration) -> PatchResult<Child> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = cmd.spawn();
            if let Err(mpsc::SendError(Ok(mut late))) = tx.send(result) {
                let _ = late.kill();
                let _ = late.wait();
            }
        });
        match rx.recv_timeout(timeout) {
            Ok(Ok(child)) => Ok(child),
            Ok(Err(e)) => Err(self.failed(format!("could not start {}: {e}", self.program.display()))),
            Err(RecvTimeoutError::Timeout) => Err(self.failed(format!(
                "did not start within {}s",
                timeout.as_secs()
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(self.failed("start thread exited")),
        }
    }

    /// Runs to completion, forwarding every output line to `reporter.log`.
    /// A non-zero exit is `SubprocessFailed`.
    pub fn run(&self, timeout: Duration, reporter: &mut Reporter<'_>) -> PatchResult<()> {
        reporter.log(format!("Running: {}", self.display()));
        let mut cmd = self.build();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = self.spawn_bounded(cmd, timeout)?;

        let (tx, rx) = mpsc::channel::<String>();
        let mut drains = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            drains.push(drain_lines(out, tx.clone()));
        }
        if let Some(err) = child.stderr.take() {
            drains.push(drain_lines(err, tx.clone()));
        }
        drop(tx);

        let mut last_line = None;
        for line in rx {
            reporter.log(&line);
            last_line = Some(line);
        }
        for handle in drains {
            let _ = handle.join();
        }

        let status = child
            .wait()
            .map_err(|e| self.failed(format!("wait failed: {e}")))?;
        if status.success() {
            return Ok(());
        }
        let mut reason = match status.code() {
            Some(code) => format!("exited with code {code}"),
            None => "terminated by signal".to_string(),
        };
        if let Some(line) = last_line {
            reason.push_str(&format!(" (last output: {line})"));
        }
        Err(self.failed(reason))
    }

    /// Runs a short probe and returns its collected output; the exit status
    /// is reported, not judged.
    pub fn capture(&self, timeout: Duration) -> PatchResult<Captured> {
        let mut cmd = self.build();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let child = self.spawn_bounded(cmd, timeout)?;
        let output = child
            .wait_with_output()
            .map_err(|e| self.failed(format!("wait failed: {e}")))?;
        Ok(output.into())
    }
}

fn drain_lines<R: Read + Send + 'static>(
    pipe: R,
    tx: mpsc::Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(pipe);
        for chunk in reader.split(b'\n') {
            let Ok(bytes) = chunk else { break };
            let line = String::from_utf8_lossy(&bytes);
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            if tx.send(line.to_string()).is_err() {
                break;
            }
        }
    })
}
