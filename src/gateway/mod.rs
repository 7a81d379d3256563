// Lifecycle orchestration module
//
// Public interface for the gateway service: context/validation/path
// preparation, reload-hook wiring, and delegation to the pool runtime.

mod paths;
mod reload;
mod service;

pub use paths::RuntimePaths;
pub use reload::{build_reload_hook, ScriptCache};
pub use service::{ExecutionContext, GatewayService, LifecycleError};
