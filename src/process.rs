//! Process probe and controller.
//!
//! Processes are addressed by image name, never by PID: several live processes
//! may share one name and termination always targets all of them.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use sysinfo::{Pid, System};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {}: {source}", path.display())]
    Spawn {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("process list unavailable: {0}")]
    Enumerate(String),

    #[error("failed to terminate pid {pid}: {reason}")]
    Terminate { pid: u32, reason: String },
}

/// Access to the operating system's process table.
pub trait ProcessTable: Send + Sync {
    /// One enumeration of every live process.
    fn snapshot(&self) -> Result<Vec<ProcessEntry>, ProcessError>;

    /// Request forced termination of a single process.
    fn terminate(&self, pid: u32) -> Result<(), ProcessError>;

    /// Launch the image at `path` with no arguments. The child is never waited on.
    fn spawn(&self, path: &Path) -> Result<u32, ProcessError>;
}

/// Outcome of [`kill_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillReport {
    pub matched: usize,
    pub terminated: usize,
    pub failed: usize,
}

fn name_matches(image: &str, name: &str) -> bool {
    image.eq_ignore_ascii_case(name)
}

/// True if any process with one of `names` is alive.
///
/// Enumerates once. A failed enumeration reads as "not running".
pub fn any_running(table: &dyn ProcessTable, names: &[&str]) -> bool {
    match table.snapshot() {
        Ok(entries) => entries
            .iter()
            .any(|e| names.iter().any(|n| name_matches(&e.name, n))),
        Err(e) => {
            debug!(error = %e, "process enumeration failed");
            false
        }
    }
}

pub fn is_running(table: &dyn ProcessTable, name: &str) -> bool {
    any_running(table, &[name])
}

/// Start the executable at `path`, returning the new PID.
pub fn start(table: &dyn ProcessTable, path: &Path) -> Result<u32, ProcessError> {
    let pid = table.spawn(path)?;
    debug!(path = %path.display(), pid, "process started");
    Ok(pid)
}

/// Forcefully terminate every process named `name`.
///
/// Best effort: each match is attempted regardless of earlier failures, and
/// nothing is surfaced beyond the returned counts.
pub fn kill_all(table: &dyn ProcessTable, name: &str) -> KillReport {
    let entries = match table.snapshot() {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, name, "cannot enumerate processes for termination");
            return KillReport::default();
        }
    };

    let mut report = KillReport::default();
    for entry in entries.iter().filter(|e| name_matches(&e.name, name)) {
        report.matched += 1;
        match table.terminate(entry.pid) {
            Ok(()) => report.terminated += 1,
            Err(e) => {
                warn!(error = %e, name, "termination failed");
                report.failed += 1;
            }
        }
    }
    if report.matched > 0 {
        info!(
            name,
            matched = report.matched,
            terminated = report.terminated,
            "kill_all finished"
        );
    }
    report
}

/// [`ProcessTable`] backed by `sysinfo`.
pub struct SysinfoTable {
    system: Mutex<System>,
}

impl SysinfoTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn with_system<T>(&self, f: impl FnOnce(&mut System) -> T) -> T {
        let mut sys = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut sys)
    }
}

impl Default for SysinfoTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoTable {
    fn snapshot(&self) -> Result<Vec<ProcessEntry>, ProcessError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProcessError::Enumerate(
                "unsupported operating system".into(),
            ));
        }
        Ok(self.with_system(|sys| {
            sys.refresh_processes();
            sys.processes()
                .iter()
                .map(|(pid, p)| ProcessEntry {
                    pid: pid.as_u32(),
                    name: p.name().to_string(),
                })
                .collect()
        }))
    }

    fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        self.with_system(|sys| match sys.process(Pid::from_u32(pid)) {
            Some(p) if p.kill() => Ok(()),
            Some(_) => Err(ProcessError::Terminate {
                pid,
                reason: "kill request refused".into(),
            }),
            None => Err(ProcessError::Terminate {
                pid,
                reason: "process already gone".into(),
            }),
        })
    }

    fn spawn(&self, path: &Path) -> Result<u32, ProcessError> {
        let child = Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(child.id())
    }
}
