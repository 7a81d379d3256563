// Socket Gateway - Multi-process socket service lifecycle
// Library exports

// Core modules
pub mod config; // Option schema, override merge, file loading
pub mod errors;
pub mod gateway; // Lifecycle orchestration over the pool runtime
pub mod runtime; // Pool contract, bundled master, pid files
