// Process-pool runtime module
//
// This module provides the contract between the lifecycle orchestrator and
// the external process-pool runtime, a bundled master-side implementation,
// and the pid-file helpers shared with the CLI.

pub mod master;
pub mod pid;
pub mod pool;

pub use master::{MasterProcess, StopHandle};
pub use pid::PidFile;
pub use pool::{PoolSettings, ProcessPool, ReloadHook, WorkerHook, WorkerHooks};
