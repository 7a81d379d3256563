// Bundled master-process runtime
//
// A minimal ProcessPool implementation covering the master side of the
// contract: pid-file guard, signal dispatch (stop/reload), blocking wait,
// pid cleanup. It supervises no listener processes; socket handling stays
// with a full pool runtime.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use super::pid::PidFile;
use super::pool::{PoolSettings, ProcessPool, ReloadHook, WorkerHooks};
use crate::errors;

/// Cooperative stop trigger for a running master.
///
/// Cloneable so the master can be stopped from another task while
/// `run_all` holds the pool. The trigger is sticky: a stop that fires
/// before the master starts waiting is still honored.
#[derive(Clone)]
pub struct StopHandle {
    tx: broadcast::Sender<()>,
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask the master to shut down. Does not wait.
    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    fn is_triggered(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Master-side process-pool runtime for deployments without a full pool
/// runtime linked in.
///
/// `run_all` refuses to start while the pid file names a live process,
/// writes its own pid, then blocks until a stop trigger or a termination
/// signal; on Unix, SIGUSR1 invokes the installed master-reload hook
/// synchronously. The worker hooks fire around the master's own service
/// window, as the only process this runtime runs.
pub struct MasterProcess {
    settings: Option<PoolSettings>,
    reload_hook: Option<ReloadHook>,
    worker_hooks: WorkerHooks,
    stop: StopHandle,
}

impl MasterProcess {
    pub fn new() -> Self {
        Self {
            settings: None,
            reload_hook: None,
            worker_hooks: WorkerHooks::default(),
            stop: StopHandle::new(),
        }
    }

    /// Handle for stopping the master from outside `run_all`.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    #[cfg(target_family = "unix")]
    async fn wait_for_shutdown(&self) -> Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
        let mut sigusr1 =
            signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;
        let mut stop = self.stop.subscribe();

        if self.stop.is_triggered() {
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, stopping all processes");
                    return Ok(());
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, stopping all processes");
                    return Ok(());
                }
                _ = sigusr1.recv() => {
                    info!("Received SIGUSR1, reloading workers");
                    if let Some(hook) = &self.reload_hook {
                        hook();
                    }
                }
                _ = stop.recv() => {
                    info!("Stop requested, stopping all processes");
                    return Ok(());
                }
            }
        }
    }

    #[cfg(not(target_family = "unix"))]
    async fn wait_for_shutdown(&self) -> Result<()> {
        let mut stop = self.stop.subscribe();

        if self.stop.is_triggered() {
            return Ok(());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, stopping all processes");
                Ok(())
            }
            _ = stop.recv() => {
                info!("Stop requested, stopping all processes");
                Ok(())
            }
        }
    }
}

impl Default for MasterProcess {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessPool for MasterProcess {
    fn configure(&mut self, settings: PoolSettings) {
        self.settings = Some(settings);
    }

    fn install_master_reload(&mut self, hook: ReloadHook) {
        self.reload_hook = Some(hook);
    }

    fn install_worker_hooks(&mut self, hooks: WorkerHooks) {
        self.worker_hooks = hooks;
    }

    async fn run_all(&mut self) -> Result<()> {
        let settings = self
            .settings
            .clone()
            .context("Master process was started before it was configured")?;

        let pid_file = PidFile::new(&settings.pid_file);
        if pid_file.is_live() {
            let pid = pid_file.read()?;
            bail!(errors::gateway_already_running_error(&settings.name, pid));
        }
        pid_file.write()?;

        info!(
            name = %settings.name,
            listen = %settings.listen_address,
            pid = std::process::id(),
            daemonize = settings.daemonize,
            "Gateway master running"
        );
        if let Some(hook) = &self.worker_hooks.on_start {
            hook();
        }

        let result = self.wait_for_shutdown().await;

        if let Some(hook) = &self.worker_hooks.on_stop {
            hook();
        }
        pid_file.remove()?;
        info!(name = %settings.name, "Gateway master stopped");
        result
    }

    fn stop_all(&mut self) {
        self.stop.trigger();
    }
}
