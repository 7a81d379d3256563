// Process-pool runtime contract
//
// The lifecycle orchestrator talks to the external process-pool runtime
// exclusively through this property-setting contract: push a settings
// snapshot and the hooks, then hand over control with `run_all`.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use toml::map::Map;
use toml::Value;

/// Callback fired by the runtime on its own reload trigger, synchronously,
/// whenever the master is asked to hot-reload its worker processes.
pub type ReloadHook = Box<dyn Fn() + Send + Sync>;

/// Callback fired around a worker process's lifetime.
pub type WorkerHook = Box<dyn Fn() + Send + Sync>;

/// Optional worker lifecycle callbacks, passed through to the runtime
/// unchanged. The orchestrator never invokes these itself.
#[derive(Default)]
pub struct WorkerHooks {
    /// Fired after a worker process has started.
    pub on_start: Option<WorkerHook>,
    /// Fired when a worker process shuts down.
    pub on_stop: Option<WorkerHook>,
}

impl WorkerHooks {
    pub fn is_empty(&self) -> bool {
        self.on_start.is_none() && self.on_stop.is_none()
    }
}

/// Flat snapshot of every resolved parameter the runtime needs.
///
/// Applied as one unit before execution starts; the runtime never sees a
/// partially-configured state.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    /// Process-pool label, shown by status tooling.
    pub name: String,
    /// Composed client-facing address, e.g. `text://0.0.0.0:8089`.
    pub listen_address: String,
    /// Number of listener processes.
    pub count: u32,
    /// LAN IP used for inter-process addressing.
    pub lan_ip: String,
    /// First local port claimed for worker-pool communication.
    pub start_port: u16,
    /// Registry service addresses.
    pub register_addresses: Vec<String>,
    /// Shared secret for internal messages.
    pub secret_key: String,
    /// Heartbeat interval in seconds; 0 disables.
    pub ping_interval: u64,
    /// Tolerated silent intervals; 0 disables the response requirement.
    pub ping_not_response_limit: u32,
    /// Heartbeat probe payload.
    pub ping_data: String,
    /// Daemonized operation.
    pub daemonize: bool,
    /// Master pid file.
    pub pid_file: PathBuf,
    /// Runtime log file.
    pub log_file: PathBuf,
    /// Captured-stdout file, when explicitly configured.
    pub stdout_file: Option<PathBuf>,
    /// Options outside this schema, forwarded verbatim.
    pub extra: Map<String, Value>,
}

/// The external process-pool runtime seam.
///
/// Implementations own the socket accept loop, per-connection heartbeats
/// and the inter-process registration protocol; this crate only prepares
/// their parameters. `run_all` blocks the caller for the lifetime of the
/// service, `stop_all` is a cooperative trigger with no drain wait.
#[async_trait]
pub trait ProcessPool: Send {
    /// Apply the resolved parameter snapshot.
    fn configure(&mut self, settings: PoolSettings);

    /// Install the callback invoked when the master is asked to reload
    /// its workers.
    fn install_master_reload(&mut self, hook: ReloadHook);

    /// Install the pass-through worker lifecycle callbacks.
    fn install_worker_hooks(&mut self, hooks: WorkerHooks);

    /// Run every registered process pool; returns only at shutdown.
    async fn run_all(&mut self) -> Result<()>;

    /// Ask every managed process to terminate. Does not wait for drain.
    fn stop_all(&mut self);
}
