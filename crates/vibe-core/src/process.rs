//! The single seam through which `git` and `gh` are executed.
//!
//! Every invocation:
//! - runs with stdin closed and `GIT_TERMINAL_PROMPT=0`, so a credential
//!   prompt fails fast instead of waiting on a terminal that isn't there
//! - is bounded by a timeout; on expiry the child is killed
//! - drains stdout/stderr on background threads so a chatty child cannot
//!   block on a full pipe while we wait for it
//!
//! `run_checked` additionally retries git lock contention with exponential
//! backoff and maps non-zero exits to [`VibeError::GitCommandFailed`].

use crate::config::ProcessConfig;
use crate::error::{Result, VibeError};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct CmdOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
    max_attempts: u32,
    backoff: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::from_config(&ProcessConfig::default())
    }
}

impl ProcessRunner {
    pub fn new(timeout: Duration, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            timeout,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(cfg: &ProcessConfig) -> Self {
        Self::new(cfg.timeout(), cfg.max_attempts, cfg.backoff())
    }

    /// Run once. A non-zero exit is returned as data, not as an error.
    pub fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CmdOutput> {
        let cmdline = command_line(program, args);
        tracing::debug!(command = %cmdline, "spawning");

        let mut command = Command::new(program);
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| VibeError::SpawnFailed {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if started.elapsed() >= self.timeout => {
                    // Cancellation is termination: kill, then reap so no zombie is left.
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(command = %cmdline, "timed out; child killed");
                    return Err(VibeError::GitCommandTimeout {
                        command: cmdline,
                        millis: self.timeout.as_millis(),
                    });
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let stdout = stdout.map(join_drain).unwrap_or_default();
        let stderr = stderr.map(join_drain).unwrap_or_default();
        Ok(CmdOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }

    /// Run, retrying lock contention, and fail on a non-zero exit.
    pub fn run_checked(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<CmdOutput> {
        let mut delay = self.backoff;
        for attempt in 1..=self.max_attempts {
            let output = self.run(program, args, cwd)?;
            if output.success() {
                return Ok(output);
            }
            if !is_lock_contention(&output.stderr) {
                return Err(VibeError::GitCommandFailed {
                    command: command_line(program, args),
                    code: output.code,
                    stderr: output.stderr.trim().to_string(),
                });
            }
            if attempt < self.max_attempts {
                tracing::warn!(
                    command = %command_line(program, args),
                    attempt,
                    "git lock contention; retrying in {}ms",
                    delay.as_millis()
                );
                thread::sleep(delay);
                delay = delay.saturating_mul(2);
            }
        }
        Err(VibeError::GitLockContention {
            command: command_line(program, args),
            attempts: self.max_attempts,
        })
    }

    /// `git <args>` run inside `repo`, checked.
    pub fn git(&self, repo: &Path, args: &[&str]) -> Result<CmdOutput> {
        self.run_checked("git", args, Some(repo))
    }

    /// `git <args>` run inside `repo`, unchecked; for probes where failure is an answer.
    pub fn git_probe(&self, repo: &Path, args: &[&str]) -> Result<CmdOutput> {
        self.run("git", args, Some(repo))
    }
}

type Drain = thread::JoinHandle<String>;

fn drain<R: Read + Send + 'static>(mut reader: R) -> Drain {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_drain(handle: Drain) -> String {
    handle.join().unwrap_or_default()
}

fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Git reports a held lock file in several phrasings depending on the command.
pub fn is_lock_contention(stderr: &str) -> bool {
    let s = stderr.to_ascii_lowercase();
    s.contains("index.lock")
        || s.contains(".lock': file exists")
        || (s.contains("unable to create") && s.contains(".lock"))
        || s.contains("another git process seems to be running")
}
