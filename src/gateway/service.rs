// Gateway lifecycle orchestration
//
// Takes resolved options through context check, validation, daemonize and
// name resolution, runtime path preparation and hook installation, then
// hands the assembled parameter set to the process-pool runtime.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::paths::RuntimePaths;
use super::reload::{build_reload_hook, ScriptCache};
use crate::config::{ConfigError, GatewayOptions};
use crate::runtime::{PoolSettings, ProcessPool, WorkerHooks};

/// Where the current process was started from.
///
/// Gateway services bind sockets and block for their whole lifetime, which
/// only makes sense for a console (batch/headless) process. A server
/// context, e.g. a request handler, must not start one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    Console,
    Server,
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Console => write!(f, "console"),
            ExecutionContext::Server => write!(f, "server"),
        }
    }
}

/// Failures raised by the lifecycle orchestrator.
///
/// Everything except `Runtime` happens synchronously during `prepare`,
/// before any process is spawned; none of them is retried.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway was started from a context that cannot host it.
    #[error("the gateway can only be started from a console context, not from a {context} context")]
    UnsupportedContext { context: ExecutionContext },

    /// A runtime directory could not be created.
    #[error("failed to create runtime directory {}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pool runtime failed after delegation. Opaque to this layer.
    #[error("{0}")]
    Runtime(anyhow::Error),
}

/// One gateway service over a process-pool runtime.
///
/// Construction is cheap and infallible; all checks happen in
/// [`GatewayService::prepare`]. `start` consumes the service: once control
/// is delegated to the runtime there is no supported way back, a restart
/// needs a fresh value.
pub struct GatewayService<P: ProcessPool> {
    options: GatewayOptions,
    runtime_base: PathBuf,
    context: ExecutionContext,
    pool: P,
    script_cache: Option<Arc<dyn ScriptCache>>,
    worker_hooks: Option<WorkerHooks>,
    paths: Option<RuntimePaths>,
}

impl<P: ProcessPool> GatewayService<P> {
    /// Build a service for `options` with runtime artifacts kept under
    /// `runtime_base`. Assumes a console context; see
    /// [`GatewayService::with_context`].
    pub fn new(options: GatewayOptions, runtime_base: impl Into<PathBuf>, pool: P) -> Self {
        Self {
            options,
            runtime_base: runtime_base.into(),
            context: ExecutionContext::Console,
            pool,
            script_cache: None,
            worker_hooks: None,
            paths: None,
        }
    }

    /// Declare the context the current process runs in.
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Attach the compiled-script cache evicted on master reload.
    pub fn with_script_cache(mut self, cache: Arc<dyn ScriptCache>) -> Self {
        self.script_cache = Some(cache);
        self
    }

    /// Attach pass-through worker lifecycle callbacks.
    pub fn with_worker_hooks(mut self, hooks: WorkerHooks) -> Self {
        self.worker_hooks = Some(hooks);
        self
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Derived artifact locations; populated by `prepare`.
    pub fn runtime_paths(&self) -> Option<&RuntimePaths> {
        self.paths.as_ref()
    }

    /// Run every pre-delegation step: context precondition, validation,
    /// daemonize and name resolution, path derivation, reload hook
    /// installation, directory creation, parameter propagation.
    ///
    /// Validation failures surface before any filesystem side effect.
    pub fn prepare(&mut self, daemon_flag: bool) -> Result<(), LifecycleError> {
        if self.context != ExecutionContext::Console {
            return Err(LifecycleError::UnsupportedContext {
                context: self.context,
            });
        }
        self.options.validate()?;

        // Either the command-line flag or the option alone daemonizes
        self.options.daemonize = daemon_flag || self.options.daemonize;
        if self.options.name.is_empty() {
            self.options.name = self.options.effective_name().to_string();
        }

        let paths = RuntimePaths::derive(&self.runtime_base, &self.options);
        debug!(path = %paths.runtime_dir.display(), "Runtime path registered");

        self.pool
            .install_master_reload(build_reload_hook(self.script_cache.clone()));

        paths.prepare()?;

        let settings = build_settings(&self.options, &paths)?;
        info!(
            name = %settings.name,
            listen = %settings.listen_address,
            count = settings.count,
            daemonize = settings.daemonize,
            pid_file = %settings.pid_file.display(),
            "Gateway configured"
        );
        self.pool.configure(settings);
        if let Some(hooks) = self.worker_hooks.take() {
            self.pool.install_worker_hooks(hooks);
        }

        self.paths = Some(paths);
        Ok(())
    }

    /// Prepare, then delegate to the runtime's blocking `run_all`.
    /// Returns only at shutdown.
    pub async fn start(mut self, daemon_flag: bool) -> Result<(), LifecycleError> {
        self.prepare(daemon_flag)?;
        info!(name = %self.options.name, "Delegating to the process-pool runtime");
        self.pool.run_all().await.map_err(LifecycleError::Runtime)
    }

    /// Ask the runtime to stop every managed process. Cooperative; does
    /// not wait for drain.
    pub fn stop(&mut self) {
        self.pool.stop_all();
    }
}

fn build_settings(
    options: &GatewayOptions,
    paths: &RuntimePaths,
) -> Result<PoolSettings, ConfigError> {
    Ok(PoolSettings {
        name: options.name.clone(),
        listen_address: options.listen_address()?,
        count: options.count,
        lan_ip: options.lan_ip.clone(),
        start_port: options.start_port,
        register_addresses: options.register_address.as_slice().to_vec(),
        secret_key: options.secret_key.clone(),
        ping_interval: options.ping_interval,
        ping_not_response_limit: options.ping_not_response_limit,
        ping_data: options.ping_data.clone(),
        daemonize: options.daemonize,
        pid_file: paths.pid_file.clone(),
        log_file: paths.log_file.clone(),
        stdout_file: paths.stdout_file.clone(),
        extra: options.extra.clone(),
    })
}
