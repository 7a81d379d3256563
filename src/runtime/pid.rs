// Master pid-file management
//
// Handles pid file creation/removal and process existence checks. Used by
// the bundled master on its own pid file and by the CLI signal commands.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A pid file recording the master process of one gateway service.
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write the current process pid, creating the parent directory if it
    /// is missing.
    pub fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let pid = std::process::id();
        fs::write(&self.path, pid.to_string())
            .with_context(|| format!("Failed to write PID file: {}", self.path.display()))?;
        info!(pid = pid, path = %self.path.display(), "Master PID file written");
        Ok(())
    }

    /// Read the recorded pid.
    pub fn read(&self) -> Result<u32> {
        let pid_str = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read PID file: {}", self.path.display()))?;
        pid_str
            .trim()
            .parse()
            .with_context(|| format!("Invalid PID in file: {}", pid_str))
    }

    /// Remove the pid file (called on shutdown).
    pub fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove PID file: {}", self.path.display()))?;
            info!("Master PID file removed");
        }
        Ok(())
    }

    /// Whether the pid file names a process that is still alive.
    ///
    /// True only when the file exists, parses, and a process with that pid
    /// exists on this host.
    pub fn is_live(&self) -> bool {
        if !self.path.exists() {
            return false;
        }

        match self.read() {
            Ok(pid) => process_exists(pid),
            Err(_) => false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Check if a process with the given pid exists
///
/// Uses platform-specific methods:
/// - Unix: kill(pid, 0) to check existence without sending a signal
/// - Windows: sysinfo crate to enumerate processes
#[cfg(target_family = "unix")]
fn process_exists(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // EPERM still proves the pid is occupied, just by another user
    matches!(kill(Pid::from_raw(pid as i32), None), Ok(()) | Err(Errno::EPERM))
}

#[cfg(target_family = "windows")]
fn process_exists(pid: u32) -> bool {
    use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

    let target = Pid::from(pid as usize);
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[target]),
        true,
        ProcessRefreshKind::nothing(),
    );
    system.process(target).is_some()
}
