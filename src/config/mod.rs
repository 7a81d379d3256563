// Configuration module
// Public interface for option resolution and override loading

mod loader;
mod options;

pub use loader::load_overrides;
pub use options::{
    resolve, ConfigError, GatewayOptions, GatewayOverrides, ListenPort, RegisterAddress,
    DEFAULT_NAME,
};
