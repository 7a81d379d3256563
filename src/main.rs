// Socket Gateway - Multi-process socket service lifecycle
// Main entry point

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

use socket_gateway::config::{load_overrides, resolve, GatewayOptions};
use socket_gateway::errors;
use socket_gateway::gateway::{GatewayService, RuntimePaths};
use socket_gateway::runtime::{MasterProcess, PidFile};

#[derive(Parser, Debug)]
#[command(name = "socket-gateway")]
#[command(about = "Multi-process socket gateway service", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Start the gateway service
    Start {
        /// Run detached in the background
        #[arg(long)]
        daemon: bool,

        /// Stay in the foreground even when daemonize is configured
        #[arg(long, hide = true)]
        foreground: bool,

        /// Configuration file (default: ./gateway.toml, then
        /// ~/.socket-gateway/gateway.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Runtime artifact directory (default: ~/.socket-gateway/runtime)
        #[arg(long = "runtime-dir")]
        runtime_dir: Option<PathBuf>,
    },
    /// Stop the running gateway master
    Stop {
        /// Configuration file used at start
        #[arg(long)]
        config: Option<PathBuf>,

        /// Runtime artifact directory used at start
        #[arg(long = "runtime-dir")]
        runtime_dir: Option<PathBuf>,
    },
    /// Ask the running master to reload its workers
    Reload {
        /// Configuration file used at start
        #[arg(long)]
        config: Option<PathBuf>,

        /// Runtime artifact directory used at start
        #[arg(long = "runtime-dir")]
        runtime_dir: Option<PathBuf>,
    },
    /// Show gateway status
    Status {
        /// Configuration file used at start
        #[arg(long)]
        config: Option<PathBuf>,

        /// Runtime artifact directory used at start
        #[arg(long = "runtime-dir")]
        runtime_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Start {
            daemon,
            foreground,
            config,
            runtime_dir,
        } => run_start(daemon, foreground, config, runtime_dir).await,
        Command::Stop {
            config,
            runtime_dir,
        } => run_stop(config, runtime_dir),
        Command::Reload {
            config,
            runtime_dir,
        } => run_reload(config, runtime_dir),
        Command::Status {
            config,
            runtime_dir,
        } => run_status(config, runtime_dir),
    }
}

/// Start the gateway, either in the foreground or detached.
///
/// `--daemon` (or `daemonize = true` in the options) re-spawns this binary
/// detached and exits; the hidden `--foreground` flag marks the re-spawned
/// child, which runs the service with its logs routed to the runtime log
/// file.
async fn run_start(
    daemon: bool,
    foreground: bool,
    config: Option<PathBuf>,
    runtime_dir: Option<PathBuf>,
) -> Result<()> {
    let overrides = load_overrides(config.as_deref())?;
    let options = resolve(GatewayOptions::default(), overrides);
    let runtime_base = resolve_runtime_base(runtime_dir.as_deref())?;

    let daemonize = daemon || options.daemonize;
    if daemonize && !foreground {
        return spawn_detached(&options, &runtime_base, config.as_deref(), runtime_dir.as_deref());
    }

    if daemonize {
        // Detached child: validate before touching the filesystem, then
        // log into the runtime log file
        options.validate()?;
        let paths = RuntimePaths::derive(&runtime_base, &options);
        paths.prepare()?;
        init_file_tracing(&paths.log_file)?;
    } else {
        init_tracing();
    }

    let service = GatewayService::new(options, runtime_base, MasterProcess::new());
    service.start(daemon).await?;
    Ok(())
}

/// Stop the running gateway master via SIGTERM
fn run_stop(config: Option<PathBuf>, runtime_dir: Option<PathBuf>) -> Result<()> {
    let (options, paths) = resolve_command_paths(config.as_deref(), runtime_dir.as_deref())?;
    let name = options.effective_name();
    let pid_file = PidFile::new(&paths.pid_file);

    if !pid_file.is_live() {
        println!("Gateway '{}' is not running", name);
        return Ok(());
    }

    let pid = pid_file.read()?;
    println!("Stopping gateway '{}' (PID: {})...", name, pid);
    signal_stop(pid)?;
    println!("✓ Stop signal sent");
    Ok(())
}

/// Trigger a worker reload on the running master via SIGUSR1
fn run_reload(config: Option<PathBuf>, runtime_dir: Option<PathBuf>) -> Result<()> {
    let (options, paths) = resolve_command_paths(config.as_deref(), runtime_dir.as_deref())?;
    let name = options.effective_name();
    let pid_file = PidFile::new(&paths.pid_file);

    if !pid_file.is_live() {
        bail!(errors::gateway_not_running_error(name, pid_file.path()));
    }

    let pid = pid_file.read()?;
    signal_reload(pid)?;
    println!("✓ Reload signal sent to gateway '{}' (PID: {})", name, pid);
    Ok(())
}

/// Show the gateway's pid, liveness, and resolved addressing
fn run_status(config: Option<PathBuf>, runtime_dir: Option<PathBuf>) -> Result<()> {
    let (options, paths) = resolve_command_paths(config.as_deref(), runtime_dir.as_deref())?;
    let name = options.effective_name();
    let pid_file = PidFile::new(&paths.pid_file);

    if !pid_file.is_live() {
        println!("\x1b[1;33m⚠ Gateway '{}' is not running\x1b[0m", name);
        println!("\nStart it with:");
        println!("  \x1b[1;36msocket-gateway start --daemon\x1b[0m");
        return Ok(());
    }

    let pid = pid_file.read()?;
    let internal_ports: Vec<String> = options
        .internal_ports()
        .map(|port| port.to_string())
        .collect();

    println!("\x1b[1;32m✓ Gateway Status\x1b[0m");
    println!();
    println!("  Name:            {}", name);
    println!("  PID:             {}", pid);
    println!("  Pid file:        {}", paths.pid_file.display());
    println!("  Listen:          {}", options.listen_address()?);
    println!("  Processes:       {}", options.count);
    println!("  Internal ports:  {}", internal_ports.join(", "));
    println!("  Log file:        {}", paths.log_file.display());
    println!();
    Ok(())
}

/// Spawn the gateway as a detached background process
///
/// The child runs `start --foreground --daemon` with stdin closed and
/// stdout/stderr captured into the configured stdout file, or discarded
/// when none is configured.
fn spawn_detached(
    options: &GatewayOptions,
    runtime_base: &Path,
    config: Option<&Path>,
    runtime_dir: Option<&Path>,
) -> Result<()> {
    use std::process::{Command, Stdio};

    options.validate()?;
    let paths = RuntimePaths::derive(runtime_base, options);

    let pid_file = PidFile::new(&paths.pid_file);
    if pid_file.is_live() {
        let pid = pid_file.read()?;
        bail!(errors::gateway_already_running_error(
            options.effective_name(),
            pid
        ));
    }

    paths.prepare()?;

    let exe_path =
        std::env::current_exe().context("Failed to determine current executable path")?;

    let mut command = Command::new(&exe_path);
    command.arg("start").arg("--foreground").arg("--daemon");
    if let Some(path) = config {
        command.arg("--config").arg(path);
    }
    if let Some(dir) = runtime_dir {
        command.arg("--runtime-dir").arg(dir);
    }

    command.stdin(Stdio::null());
    match &paths.stdout_file {
        Some(stdout_path) => {
            let stdout_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(stdout_path)
                .with_context(|| {
                    format!("Failed to open stdout file: {}", stdout_path.display())
                })?;
            command.stdout(Stdio::from(
                stdout_file
                    .try_clone()
                    .context("Failed to clone stdout file handle")?,
            ));
            command.stderr(Stdio::from(stdout_file));
        }
        None => {
            command.stdout(Stdio::null());
            command.stderr(Stdio::null());
        }
    }

    #[cfg(target_family = "windows")]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    let child = command
        .spawn()
        .with_context(|| format!("Failed to spawn gateway: {}", exe_path.display()))?;

    println!(
        "✓ Gateway '{}' starting in the background (PID: {})",
        options.effective_name(),
        child.id()
    );
    println!("  Pid file: {}", paths.pid_file.display());
    println!("  Log file: {}", paths.log_file.display());
    Ok(())
}

/// Resolve the options and artifact paths a signal command targets.
/// Must mirror what `start` used, so `--config`/`--runtime-dir` are
/// accepted here too.
fn resolve_command_paths(
    config: Option<&Path>,
    runtime_dir: Option<&Path>,
) -> Result<(GatewayOptions, RuntimePaths)> {
    let overrides = load_overrides(config)?;
    let options = resolve(GatewayOptions::default(), overrides);
    let runtime_base = resolve_runtime_base(runtime_dir)?;
    let paths = RuntimePaths::derive(&runtime_base, &options);
    Ok((options, paths))
}

fn resolve_runtime_base(runtime_dir: Option<&Path>) -> Result<PathBuf> {
    match runtime_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => {
            let home = dirs::home_dir().context("Failed to determine home directory")?;
            Ok(home.join(".socket-gateway").join("runtime"))
        }
    }
}

/// Initialize console tracing
///
/// Default: INFO level, can be overridden with RUST_LOG env var.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Route tracing into the runtime log file (daemonized child)
fn init_file_tracing(log_path: &Path) -> Result<()> {
    use std::sync::Arc;

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    let file_writer = Arc::new(log_file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(move || file_writer.clone())
        .with_ansi(false); // No ANSI colors in log file

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();
    Ok(())
}

#[cfg(target_family = "unix")]
fn signal_stop(pid: u32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
        .with_context(|| format!("Failed to send SIGTERM to PID {}", pid))?;
    Ok(())
}

#[cfg(target_family = "unix")]
fn signal_reload(pid: u32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGUSR1)
        .with_context(|| format!("Failed to send SIGUSR1 to PID {}", pid))?;
    Ok(())
}

#[cfg(not(target_family = "unix"))]
fn signal_stop(_pid: u32) -> Result<()> {
    bail!("stop is only supported on Unix platforms")
}

#[cfg(not(target_family = "unix"))]
fn signal_reload(_pid: u32) -> Result<()> {
    bail!("reload is only supported on Unix platforms")
}
