//! Invoking the external build/test tool for a single test.
//!
//! The tool rewrites the coverage report in place, so runs must never
//! overlap. The batch driver calls [`TestRunner::run`] once per identifier and
//! waits for it before reading the report.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::RunnerConfig;
use crate::core::{Error, Result};

/// Outcome of one test-tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Tool exited with status 0.
    Passed,
    /// Tool exited non-zero (or was killed by a signal).
    Failed { code: Option<i32> },
    /// Tool exceeded the configured timeout and was killed.
    TimedOut,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed { code: Some(code) } => write!(f, "failed (exit {code})"),
            Self::Failed { code: None } => write!(f, "failed (signal)"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Runs the tests for one identifier.
pub trait TestRunner {
    /// Run the test. Errors only when the tool could not be executed at all.
    fn run(&self, test: &str) -> Result<RunStatus>;
}

/// Runs a shell command template with `{test}` substituted.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    config: RunnerConfig,
    working_dir: PathBuf,
}

impl ShellRunner {
    pub fn new(config: RunnerConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            working_dir: working_dir.into(),
        }
    }

    /// Command line for `test`.
    pub fn command_line(&self, test: &str) -> String {
        self.config.command.replace("{test}", test)
    }

    /// Where the output of failed runs is written.
    pub fn error_log(&self) -> PathBuf {
        self.working_dir.join(&self.config.error_log)
    }

    fn shell(&self, line: &str) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", line]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", line]);
            c
        };
        cmd.current_dir(&self.working_dir);

        // A timeout must take down everything the shell started, not just
        // the shell itself.
        #[cfg(unix)]
        if self.config.timeout_secs.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }

    fn write_error_log(&self, output: &[u8]) -> Result<()> {
        let path = self.error_log();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, output)?;
        Ok(())
    }
}

impl TestRunner for ShellRunner {
    fn run(&self, test: &str) -> Result<RunStatus> {
        let line = self.command_line(test);
        tracing::info!("command: {}", line);

        let mut cmd = self.shell(&line);
        if self.config.show_output {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::runner(format!("failed to start `{line}`: {e}")))?;
        let capture = Capture::start(&mut child);

        let timeout = self.config.timeout_secs.map(Duration::from_secs);
        let waited = wait_with_timeout(&mut child, timeout)
            .map_err(|e| Error::runner(format!("failed waiting for `{line}`: {e}")))?;

        let (status, output) = match waited {
            Some(status) if status.success() => return Ok(RunStatus::Passed),
            Some(status) => (
                RunStatus::Failed {
                    code: status.code(),
                },
                capture.finish(),
            ),
            // Drain threads are left detached: a descendant outside the
            // process group may still hold the pipes open.
            None => (
                RunStatus::TimedOut,
                format!("`{line}` timed out after {}s\n", timeout.unwrap_or_default().as_secs())
                    .into_bytes(),
            ),
        };

        tracing::error!("test command {}: {}", status, line);
        if !self.config.show_output {
            match self.write_error_log(&output) {
                Ok(()) => tracing::error!("refer to log file {}", self.error_log().display()),
                Err(e) => tracing::warn!("could not write {}: {}", self.error_log().display(), e),
            }
        }
        Ok(status)
    }
}

/// Drains piped stdout/stderr on background threads so a chatty child never
/// blocks on a full pipe.
struct Capture {
    stdout: Option<JoinHandle<Vec<u8>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
}

impl Capture {
    fn start(child: &mut Child) -> Self {
        Self {
            stdout: child.stdout.take().map(drain),
            stderr: child.stderr.take().map(drain),
        }
    }

    fn finish(self) -> Vec<u8> {
        let mut output = Vec::new();
        for handle in [self.stdout, self.stderr].into_iter().flatten() {
            if let Ok(bytes) = handle.join() {
                output.extend(bytes);
            }
        }
        output
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

/// Wait for `child`, killing it after `timeout`. `None` means it timed out.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() > timeout {
            kill_tree(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(Duration::from_millis(50));
    }
}

/// Kill `child` and, on unix, every process in its group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: kill(2) has no memory effects; a negative pid addresses the
        // process group created for this child at spawn.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
}

/// Check that `dir` exists before spawning anything in it.
pub fn ensure_working_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::runner(format!(
            "working directory {} does not exist",
            dir.display()
        )))
    }
}
