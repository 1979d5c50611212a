//! Child processes under supervision.
//!
//! The supervisor only sees children through [`ChildLauncher`] and
//! [`MonitoredProcess`], so its polling loop can be driven by fake
//! processes with scripted clocks and memory readings.

use std::env;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use super::memory;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// Exit code; `None` when the child was ended by a signal.
    pub code: Option<i32>,
}

impl ChildExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ChildExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// A running child the supervisor can observe and kill.
pub trait MonitoredProcess {
    fn pid(&self) -> u32;

    /// Wall-clock time since the child was spawned.
    fn elapsed(&self) -> Duration;

    /// Current resident memory, `None` when it cannot be observed.
    fn resident_memory_bytes(&self) -> Option<u64>;

    /// Non-blocking exit check.
    fn poll_exit(&mut self) -> io::Result<Option<ChildExit>>;

    /// Kills and reaps the child. Failures are ignored.
    fn terminate(&mut self);
}

/// Starts the child run for one load test.
pub trait ChildLauncher {
    type Process: MonitoredProcess;

    fn launch(&self, index: usize) -> io::Result<Self::Process>;
}

// ============================================================================
// OS PROCESSES
// ============================================================================

/// Re-runs the current executable in `--load-test <index>` mode.
#[derive(Debug, Clone)]
pub struct SelfRelaunch {
    plan_path: PathBuf,
}

impl SelfRelaunch {
    pub fn new(plan_path: impl Into<PathBuf>) -> Self {
        Self {
            plan_path: plan_path.into(),
        }
    }
}

impl ChildLauncher for SelfRelaunch {
    type Process = OsChild;

    fn launch(&self, index: usize) -> io::Result<OsChild> {
        let exe = env::current_exe()?;
        let child = Command::new(&exe)
            .arg("--load-test")
            .arg(index.to_string())
            .arg("--color")
            .arg("never")
            .arg(&self.plan_path)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;
        debug!(pid = child.id(), exe = %exe.display(), index, "spawned load test child");
        Ok(OsChild::new(child))
    }
}

/// A spawned OS process. Dropping it kills and reaps a child still running.
#[derive(Debug)]
pub struct OsChild {
    child: Child,
    started: Instant,
    exited: bool,
}

impl OsChild {
    pub fn new(child: Child) -> Self {
        Self {
            child,
            started: Instant::now(),
            exited: false,
        }
    }
}

impl MonitoredProcess for OsChild {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn resident_memory_bytes(&self) -> Option<u64> {
        memory::resident_memory_bytes(self.pid())
    }

    fn poll_exit(&mut self) -> io::Result<Option<ChildExit>> {
        let status = self.child.try_wait()?;
        self.exited |= status.is_some();
        Ok(status.map(ChildExit::from))
    }

    fn terminate(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.exited = true;
    }
}

impl Drop for OsChild {
    fn drop(&mut self) {
        if !self.exited {
            self.terminate();
        }
    }
}
