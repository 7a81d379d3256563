// User-friendly error messages
//
// Provides helpers to convert technical errors into actionable messages
// that guide operators toward solutions.

use std::fmt;
use std::path::Path;

/// Format a gateway already running error
pub fn gateway_already_running_error(name: &str, pid: u32) -> String {
    format!(
        "Gateway '{}' is already running (PID: {})\n\n\
        \x1b[1;32mTo restart the gateway:\x1b[0m\n\
        1. Stop the running master:\n\
           \x1b[36msocket-gateway stop\x1b[0m\n\n\
        2. Start a new one:\n\
           \x1b[36msocket-gateway start\x1b[0m\n\n\
        \x1b[1;32mTo reload workers without a restart:\x1b[0m\n\
           \x1b[36msocket-gateway reload\x1b[0m",
        name, pid
    )
}

/// Format a gateway not running error with helpful suggestions
pub fn gateway_not_running_error(name: &str, pid_file: &Path) -> String {
    format!(
        "Gateway '{}' is not running\n\n\
        \x1b[1;33mPossible causes:\x1b[0m\n\
        • The gateway was never started\n\
        • The master exited and removed its pid file\n\
        • A different --runtime-dir or --config was used at start\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Start the gateway:\n\
           \x1b[36msocket-gateway start --daemon\x1b[0m\n\n\
        2. Check the pid file location:\n\
           \x1b[36mls -la {}\x1b[0m",
        name,
        pid_file.display()
    )
}

/// Wrap a generic error with a suggestion
pub fn wrap_error_with_suggestion(error: impl fmt::Display, suggestion: &str) -> String {
    format!(
        "{}\n\n\
        \x1b[1;33mSuggestion:\x1b[0m {}",
        error, suggestion
    )
}
