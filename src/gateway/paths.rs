// Runtime artifact paths
//
// Derives the pid/log/stdout file locations under the per-service runtime
// directory and prepares their parent directories.

use std::path::{Path, PathBuf};

use super::service::LifecycleError;
use crate::config::GatewayOptions;

/// Resolved filesystem locations for one gateway service.
///
/// Layout: `<runtime-base>/<name>/worker/<name>.pid` and `.log`, unless the
/// options name explicit files. Derivation is pure; directories are only
/// touched by [`RuntimePaths::prepare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    /// Per-service runtime directory, `<runtime-base>/<name>`.
    pub runtime_dir: PathBuf,
    /// Directory holding the derived worker artifacts.
    pub worker_dir: PathBuf,
    /// Master pid file.
    pub pid_file: PathBuf,
    /// Runtime log file.
    pub log_file: PathBuf,
    /// Captured-stdout file; `None` unless explicitly configured.
    pub stdout_file: Option<PathBuf>,
}

impl RuntimePaths {
    /// Derive the artifact locations for `options` under `runtime_base`.
    ///
    /// An explicitly configured path wins; an absent or empty path falls
    /// back to the worker directory defaults. The stdout capture has no
    /// default, it stays unset unless configured.
    pub fn derive(runtime_base: &Path, options: &GatewayOptions) -> Self {
        let name = options.effective_name();
        let runtime_dir = runtime_base.join(name);
        let worker_dir = runtime_dir.join("worker");

        let pid_file = match configured(&options.pid_file) {
            Some(path) => path.clone(),
            None => worker_dir.join(format!("{}.pid", name)),
        };
        let log_file = match configured(&options.log_file) {
            Some(path) => path.clone(),
            None => worker_dir.join(format!("{}.log", name)),
        };
        let stdout_file = configured(&options.stdout_file).cloned();

        Self {
            runtime_dir,
            worker_dir,
            pid_file,
            log_file,
            stdout_file,
        }
    }

    /// Ensure the parent directory of every resolved file exists, creating
    /// recursively with mode 0755. Idempotent.
    pub fn prepare(&self) -> Result<(), LifecycleError> {
        let mut parents: Vec<&Path> = Vec::new();
        if let Some(parent) = self.pid_file.parent() {
            parents.push(parent);
        }
        if let Some(parent) = self.log_file.parent() {
            parents.push(parent);
        }
        if let Some(parent) = self.stdout_file.as_ref().and_then(|path| path.parent()) {
            parents.push(parent);
        }

        for parent in parents {
            create_dir_recursive(parent).map_err(|source| LifecycleError::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

fn configured(path: &Option<PathBuf>) -> Option<&PathBuf> {
    // An empty path string in the overrides counts as unset
    path.as_ref().filter(|path| !path.as_os_str().is_empty())
}

#[cfg(target_family = "unix")]
fn create_dir_recursive(path: &Path) -> std::io::Result<()> {
    use std::fs::DirBuilder;
    use std::os::unix::fs::DirBuilderExt;

    DirBuilder::new().recursive(true).mode(0o755).create(path)
}

#[cfg(not(target_family = "unix"))]
fn create_dir_recursive(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}
