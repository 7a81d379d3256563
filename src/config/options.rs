// Gateway option schema
// Documented defaults, structured override merge, and validation

use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::map::Map;
use toml::Value;

/// Default process-pool label, also applied when `name` resolves empty.
pub const DEFAULT_NAME: &str = "think-socket-gateway";

/// Validation errors for resolved gateway options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required string option is empty.
    #[error("required option `{field}` must not be empty")]
    EmptyField { field: &'static str },

    /// The listen port is not an integer in the 0-65535 range.
    #[error("invalid listen port `{value}`: expected an integer between 0 and 65535")]
    InvalidPort { value: String },
}

/// Listen port as supplied by the operator.
///
/// Kept lenient (a number or a piece of text) so that out-of-range and
/// non-numeric values survive deserialization and are reported as
/// [`ConfigError::InvalidPort`] during validation instead of failing the
/// parse. Numeric text such as `"8089"` is accepted. Port 0 is valid and
/// means an OS-assigned ephemeral port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListenPort {
    Number(i64),
    Text(String),
}

impl ListenPort {
    /// Parse and range-check into a concrete port number.
    pub fn as_u16(&self) -> Result<u16, ConfigError> {
        let number = match self {
            ListenPort::Number(number) => *number,
            ListenPort::Text(text) => {
                text.trim().parse::<i64>().map_err(|_| ConfigError::InvalidPort {
                    value: text.clone(),
                })?
            }
        };
        u16::try_from(number).map_err(|_| ConfigError::InvalidPort {
            value: number.to_string(),
        })
    }
}

impl Default for ListenPort {
    fn default() -> Self {
        ListenPort::Number(8089)
    }
}

impl From<u16> for ListenPort {
    fn from(port: u16) -> Self {
        ListenPort::Number(i64::from(port))
    }
}

impl fmt::Display for ListenPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenPort::Number(number) => write!(f, "{}", number),
            ListenPort::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Registry service address(es): a single `host:port` entry, or a set of
/// entries when several registry instances are deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisterAddress {
    Single(String),
    Multiple(Vec<String>),
}

impl RegisterAddress {
    pub fn as_slice(&self) -> &[String] {
        match self {
            RegisterAddress::Single(address) => std::slice::from_ref(address),
            RegisterAddress::Multiple(addresses) => addresses,
        }
    }
}

impl Default for RegisterAddress {
    fn default() -> Self {
        RegisterAddress::Single("127.0.0.1:1236".to_string())
    }
}

/// Resolved gateway configuration.
///
/// Produced by [`resolve`] from the built-in defaults and a partial override
/// set. Immutable once validated; the derived pid/log paths are filled in
/// lazily by the lifecycle orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayOptions {
    /// Process-pool label, shown by status tooling; also names the
    /// per-service runtime directory.
    pub name: String,

    /// Listen scheme exposed to clients: `text://`, `websocket://` or
    /// `http://`.
    pub protocol: String,

    /// IP the listener processes bind. `0.0.0.0` accepts connections on
    /// every interface; `127.0.0.1` restricts access to this host.
    pub listen: String,

    /// Client-facing listen port. Ports below 1024 need elevated privileges.
    pub port: ListenPort,

    /// Number of listener processes. Each process comfortably forwards
    /// thousands of connections; more processes also mean more
    /// inter-process traffic.
    pub count: u32,

    /// LAN IP of this host, used for inter-process addressing. Must be a
    /// real IP (never `0.0.0.0`); only distributed deployments need a
    /// non-loopback value.
    pub lan_ip: String,

    /// First local port used for communication with backend worker
    /// processes. Each listener process claims the next consecutive port,
    /// so services sharing a host need disjoint ranges.
    pub start_port: u16,

    /// Registry service address(es), e.g. `127.0.0.1:1236`.
    pub register_address: RegisterAddress,

    /// Shared secret authenticating internal messages.
    pub secret_key: String,

    /// Heartbeat probe interval in seconds; 0 disables heartbeat checks.
    pub ping_interval: u64,

    /// Number of silent intervals tolerated before a client is
    /// disconnected; 0 removes the response requirement and leaves
    /// dead-connection detection to the TCP layer.
    pub ping_not_response_limit: u32,

    /// Heartbeat probe payload. Any value the clients recognize.
    pub ping_data: String,

    /// Run the process pool as a daemon.
    pub daemonize: bool,

    /// Captured-stdout file; only created and used when explicitly
    /// configured.
    pub stdout_file: Option<PathBuf>,

    /// Master pid file; defaults to `<runtime>/<name>/worker/<name>.pid`.
    pub pid_file: Option<PathBuf>,

    /// Log file; defaults to `<runtime>/<name>/worker/<name>.log`.
    pub log_file: Option<PathBuf>,

    /// Options this schema does not know about, preserved verbatim for the
    /// pool runtime's own option set.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            protocol: "text://".to_string(),
            listen: "0.0.0.0".to_string(),
            port: ListenPort::default(),
            count: 1,
            lan_ip: "127.0.0.1".to_string(),
            start_port: 4000,
            register_address: RegisterAddress::default(),
            secret_key: String::new(),
            ping_interval: 50,
            ping_not_response_limit: 1,
            ping_data: "ping".to_string(),
            daemonize: false,
            stdout_file: None,
            pid_file: None,
            log_file: None,
            extra: Map::new(),
        }
    }
}

impl GatewayOptions {
    /// Check the fields this core depends on. Everything else is accepted
    /// unchecked; the pool runtime applies its own validation at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol.is_empty() {
            return Err(ConfigError::EmptyField { field: "protocol" });
        }
        if self.listen.is_empty() {
            return Err(ConfigError::EmptyField { field: "listen" });
        }
        self.port.as_u16()?;
        Ok(())
    }

    /// The configured name, or [`DEFAULT_NAME`] when the name resolved
    /// empty. Derived runtime paths always use this value.
    pub fn effective_name(&self) -> &str {
        if self.name.is_empty() {
            DEFAULT_NAME
        } else {
            &self.name
        }
    }

    /// Full client-facing listen address, e.g. `text://0.0.0.0:8089`.
    pub fn listen_address(&self) -> Result<String, ConfigError> {
        Ok(format!("{}{}:{}", self.protocol, self.listen, self.port.as_u16()?))
    }

    /// Local ports claimed for worker-pool communication: `count`
    /// consecutive ports starting at `start_port`.
    pub fn internal_ports(&self) -> Range<u32> {
        let start = u32::from(self.start_port);
        start..start.saturating_add(self.count)
    }
}

/// Partial override set, typically deserialized from the configuration file.
///
/// Every schema field is optional. A present field replaces the default even
/// when it is empty, so validation still sees deliberately emptied values.
/// Unknown keys collect in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayOverrides {
    pub name: Option<String>,
    pub protocol: Option<String>,
    pub listen: Option<String>,
    pub port: Option<ListenPort>,
    pub count: Option<u32>,
    pub lan_ip: Option<String>,
    pub start_port: Option<u16>,
    pub register_address: Option<RegisterAddress>,
    pub secret_key: Option<String>,
    pub ping_interval: Option<u64>,
    pub ping_not_response_limit: Option<u32>,
    pub ping_data: Option<String>,
    pub daemonize: Option<bool>,
    pub stdout_file: Option<PathBuf>,
    pub pid_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Merge `overrides` over `defaults`.
///
/// A present override wins, including explicitly empty values; absent fields
/// keep their defaults; unknown keys accumulate in `extra` unchanged. Pure
/// and idempotent.
pub fn resolve(defaults: GatewayOptions, overrides: GatewayOverrides) -> GatewayOptions {
    let mut options = defaults;
    if let Some(name) = overrides.name {
        options.name = name;
    }
    if let Some(protocol) = overrides.protocol {
        options.protocol = protocol;
    }
    if let Some(listen) = overrides.listen {
        options.listen = listen;
    }
    if let Some(port) = overrides.port {
        options.port = port;
    }
    if let Some(count) = overrides.count {
        options.count = count;
    }
    if let Some(lan_ip) = overrides.lan_ip {
        options.lan_ip = lan_ip;
    }
    if let Some(start_port) = overrides.start_port {
        options.start_port = start_port;
    }
    if let Some(register_address) = overrides.register_address {
        options.register_address = register_address;
    }
    if let Some(secret_key) = overrides.secret_key {
        options.secret_key = secret_key;
    }
    if let Some(ping_interval) = overrides.ping_interval {
        options.ping_interval = ping_interval;
    }
    if let Some(ping_not_response_limit) = overrides.ping_not_response_limit {
        options.ping_not_response_limit = ping_not_response_limit;
    }
    if let Some(ping_data) = overrides.ping_data {
        options.ping_data = ping_data;
    }
    if let Some(daemonize) = overrides.daemonize {
        options.daemonize = daemonize;
    }
    if let Some(stdout_file) = overrides.stdout_file {
        options.stdout_file = Some(stdout_file);
    }
    if let Some(pid_file) = overrides.pid_file {
        options.pid_file = Some(pid_file);
    }
    if let Some(log_file) = overrides.log_file {
        options.log_file = Some(log_file);
    }
    for (key, value) in overrides.extra {
        options.extra.insert(key, value);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let options = GatewayOptions::default();
        assert_eq!(options.name, "think-socket-gateway");
        assert_eq!(options.protocol, "text://");
        assert_eq!(options.listen, "0.0.0.0");
        assert_eq!(options.port.as_u16().unwrap(), 8089);
        assert_eq!(options.count, 1);
        assert_eq!(options.lan_ip, "127.0.0.1");
        assert_eq!(options.start_port, 4000);
        assert_eq!(options.register_address.as_slice(), ["127.0.0.1:1236"]);
        assert_eq!(options.ping_interval, 50);
        assert_eq!(options.ping_not_response_limit, 1);
        assert_eq!(options.ping_data, "ping");
        assert!(!options.daemonize);
        assert!(options.pid_file.is_none());
        assert!(options.log_file.is_none());
        assert!(options.stdout_file.is_none());
        options.validate().unwrap();
    }

    #[test]
    fn test_present_override_wins_even_when_empty() {
        let overrides = GatewayOverrides {
            protocol: Some(String::new()),
            port: Some(ListenPort::Number(9000)),
            ..Default::default()
        };
        let options = resolve(GatewayOptions::default(), overrides);
        assert_eq!(options.protocol, "");
        assert_eq!(options.port.as_u16().unwrap(), 9000);
        assert_eq!(
            options.validate(),
            Err(ConfigError::EmptyField { field: "protocol" })
        );
    }

    #[test]
    fn test_absent_fields_keep_defaults() {
        let overrides = GatewayOverrides {
            count: Some(4),
            ..Default::default()
        };
        let options = resolve(GatewayOptions::default(), overrides);
        assert_eq!(options.count, 4);
        assert_eq!(options.listen, "0.0.0.0");
        assert_eq!(options.ping_data, "ping");
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let overrides: GatewayOverrides = toml::from_str(
            r#"
            port = 8090
            business_count = 8
            gateway_tag = "edge-1"
            "#,
        )
        .unwrap();
        let options = resolve(GatewayOptions::default(), overrides);
        assert_eq!(options.extra["business_count"], Value::Integer(8));
        assert_eq!(
            options.extra["gateway_tag"],
            Value::String("edge-1".to_string())
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let overrides: GatewayOverrides = toml::from_str(
            r#"
            name = "chat"
            port = "8090"
            custom_option = true
            "#,
        )
        .unwrap();
        let first = resolve(GatewayOptions::default(), overrides.clone());
        let second = resolve(GatewayOptions::default(), overrides);
        assert_eq!(first, second);
    }

    #[test]
    fn test_effective_name_falls_back_when_empty() {
        let options = resolve(
            GatewayOptions::default(),
            GatewayOverrides {
                name: Some(String::new()),
                ..Default::default()
            },
        );
        assert_eq!(options.name, "");
        assert_eq!(options.effective_name(), DEFAULT_NAME);

        let options = resolve(
            GatewayOptions::default(),
            GatewayOverrides {
                name: Some("chat".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(options.effective_name(), "chat");
    }

    #[test]
    fn test_empty_listen_fails_validation() {
        let options = resolve(
            GatewayOptions::default(),
            GatewayOverrides {
                listen: Some(String::new()),
                ..Default::default()
            },
        );
        assert_eq!(
            options.validate(),
            Err(ConfigError::EmptyField { field: "listen" })
        );
    }

    #[test]
    fn test_port_range_validation() {
        for port in [0i64, 80, 8089, 65535] {
            let options = GatewayOptions {
                port: ListenPort::Number(port),
                ..Default::default()
            };
            assert!(options.validate().is_ok(), "port {} should be valid", port);
        }
        for port in [-1i64, 65536, 70000] {
            let options = GatewayOptions {
                port: ListenPort::Number(port),
                ..Default::default()
            };
            assert_eq!(
                options.validate(),
                Err(ConfigError::InvalidPort {
                    value: port.to_string()
                })
            );
        }
    }

    #[test]
    fn test_numeric_text_port_is_accepted() {
        let port = ListenPort::Text("8089".to_string());
        assert_eq!(port.as_u16().unwrap(), 8089);

        let port = ListenPort::Text("not-a-port".to_string());
        assert_eq!(
            port.as_u16(),
            Err(ConfigError::InvalidPort {
                value: "not-a-port".to_string()
            })
        );
    }

    #[test]
    fn test_listen_address_composition() {
        let options = GatewayOptions::default();
        assert_eq!(options.listen_address().unwrap(), "text://0.0.0.0:8089");

        let options = GatewayOptions {
            protocol: "websocket://".to_string(),
            listen: "127.0.0.1".to_string(),
            port: ListenPort::Number(8282),
            ..Default::default()
        };
        assert_eq!(
            options.listen_address().unwrap(),
            "websocket://127.0.0.1:8282"
        );
    }

    #[test]
    fn test_internal_port_claim() {
        let options = GatewayOptions {
            count: 2,
            start_port: 4000,
            ..Default::default()
        };
        let ports: Vec<u32> = options.internal_ports().collect();
        assert_eq!(ports, vec![4000, 4001]);

        let options = GatewayOptions {
            count: 4,
            start_port: 4000,
            ..Default::default()
        };
        assert_eq!(options.internal_ports(), 4000..4004);
    }

    #[test]
    fn test_register_address_forms() {
        let single: RegisterAddress = toml::from_str::<GatewayOverrides>(
            r#"register_address = "192.168.0.5:1236""#,
        )
        .unwrap()
        .register_address
        .unwrap();
        assert_eq!(single.as_slice(), ["192.168.0.5:1236"]);

        let multiple: RegisterAddress = toml::from_str::<GatewayOverrides>(
            r#"register_address = ["192.168.0.1:1236", "192.168.0.2:1236"]"#,
        )
        .unwrap()
        .register_address
        .unwrap();
        assert_eq!(
            multiple.as_slice(),
            ["192.168.0.1:1236", "192.168.0.2:1236"]
        );
    }
}
