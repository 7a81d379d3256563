// Test configuration resolution and path derivation
//
// This test suite verifies that:
// 1. Overrides merge over the documented defaults
// 2. Validation catches empty fields and bad ports before any side effect
// 3. Runtime paths derive deterministically from the resolved name
// 4. The override file loader feeds the same pipeline

use std::path::{Path, PathBuf};

use socket_gateway::config::{
    load_overrides, resolve, ConfigError, GatewayOptions, GatewayOverrides,
};
use socket_gateway::gateway::RuntimePaths;
use tempfile::TempDir;

/// Test the documented deployment scenario end to end
#[test]
fn test_standard_deployment_scenario() {
    let overrides: GatewayOverrides = toml::from_str(
        r#"
        protocol = "text://"
        listen = "0.0.0.0"
        port = 8089
        count = 2
        start_port = 4000
        "#,
    )
    .unwrap();

    let options = resolve(GatewayOptions::default(), overrides);
    options.validate().unwrap();

    assert_eq!(options.name, "think-socket-gateway");
    assert_eq!(options.listen_address().unwrap(), "text://0.0.0.0:8089");
    let ports: Vec<u32> = options.internal_ports().collect();
    assert_eq!(ports, vec![4000, 4001]);

    let paths = RuntimePaths::derive(Path::new("/run/app"), &options);
    assert_eq!(
        paths.pid_file,
        PathBuf::from("/run/app/think-socket-gateway/worker/think-socket-gateway.pid")
    );
    assert_eq!(
        paths.log_file,
        PathBuf::from("/run/app/think-socket-gateway/worker/think-socket-gateway.log")
    );
    assert_eq!(paths.stdout_file, None);
}

/// Test that an empty configured name still yields usable derived paths
#[test]
fn test_empty_name_falls_back_in_derived_paths() {
    let options = resolve(
        GatewayOptions::default(),
        GatewayOverrides {
            name: Some(String::new()),
            ..Default::default()
        },
    );

    let paths = RuntimePaths::derive(Path::new("/run/app"), &options);
    assert_eq!(
        paths.runtime_dir,
        PathBuf::from("/run/app/think-socket-gateway")
    );
    assert_eq!(
        paths.pid_file,
        PathBuf::from("/run/app/think-socket-gateway/worker/think-socket-gateway.pid")
    );
}

/// Test that an out-of-range port fails validation with InvalidPort
#[test]
fn test_port_70000_is_rejected() {
    let overrides: GatewayOverrides = toml::from_str("port = 70000").unwrap();
    let options = resolve(GatewayOptions::default(), overrides);

    assert_eq!(
        options.validate(),
        Err(ConfigError::InvalidPort {
            value: "70000".to_string()
        })
    );
}

/// Test that numeric text ports validate and non-numeric text fails
#[test]
fn test_text_port_handling() {
    let overrides: GatewayOverrides = toml::from_str(r#"port = "8282""#).unwrap();
    let options = resolve(GatewayOptions::default(), overrides);
    options.validate().unwrap();
    assert_eq!(options.listen_address().unwrap(), "text://0.0.0.0:8282");

    let overrides: GatewayOverrides = toml::from_str(r#"port = "eight""#).unwrap();
    let options = resolve(GatewayOptions::default(), overrides);
    assert_eq!(
        options.validate(),
        Err(ConfigError::InvalidPort {
            value: "eight".to_string()
        })
    );
}

/// Test that resolution is pure and idempotent
#[test]
fn test_resolution_is_idempotent() {
    let overrides: GatewayOverrides = toml::from_str(
        r#"
        name = "chat"
        listen = "127.0.0.1"
        business_worker = 4
        "#,
    )
    .unwrap();

    let first = resolve(GatewayOptions::default(), overrides.clone());
    let second = resolve(GatewayOptions::default(), overrides);
    assert_eq!(first, second);
}

/// Test that unknown override keys survive into the resolved extra table
#[test]
fn test_unknown_keys_survive_resolution() {
    let overrides: GatewayOverrides = toml::from_str(
        r#"
        port = 8090
        business_count = 8
        gateway_tag = "edge-1"
        "#,
    )
    .unwrap();

    let options = resolve(GatewayOptions::default(), overrides);
    assert_eq!(
        options.extra["business_count"],
        toml::Value::Integer(8)
    );
    assert_eq!(
        options.extra["gateway_tag"],
        toml::Value::String("edge-1".to_string())
    );
}

/// Test the loader feeding the resolver from a real override file
#[test]
fn test_loader_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gateway.toml");
    std::fs::write(
        &config_path,
        r#"
        name = "chat"
        protocol = "websocket://"
        port = 8282
        count = 4
        register_address = ["192.168.0.1:1236", "192.168.0.2:1236"]
        business_count = 8
        "#,
    )
    .unwrap();

    let overrides = load_overrides(Some(&config_path)).unwrap();
    let options = resolve(GatewayOptions::default(), overrides);
    options.validate().unwrap();

    assert_eq!(options.name, "chat");
    assert_eq!(
        options.listen_address().unwrap(),
        "websocket://0.0.0.0:8282"
    );
    assert_eq!(
        options.register_address.as_slice(),
        ["192.168.0.1:1236", "192.168.0.2:1236"]
    );
    assert_eq!(options.extra["business_count"], toml::Value::Integer(8));

    let paths = RuntimePaths::derive(temp_dir.path(), &options);
    assert_eq!(paths.pid_file, temp_dir.path().join("chat/worker/chat.pid"));
}

/// Test that a present-but-empty override still replaces the default
#[test]
fn test_present_empty_override_wins() {
    let overrides: GatewayOverrides = toml::from_str(r#"protocol = """#).unwrap();
    let options = resolve(GatewayOptions::default(), overrides);

    assert_eq!(
        options.validate(),
        Err(ConfigError::EmptyField { field: "protocol" })
    );
}
