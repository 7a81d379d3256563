// Override file loading
// Reads the gateway option overrides from a TOML file

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use super::options::GatewayOverrides;

use crate::errors;

/// Candidate next to the working directory, checked when no explicit path
/// is given.
const LOCAL_CONFIG: &str = "gateway.toml";

/// Load the override table for the gateway.
///
/// An explicit path must exist; without one, `./gateway.toml` and
/// `~/.socket-gateway/gateway.toml` are tried in that order, and a missing
/// fallback simply means "run with the built-in defaults". The resolver
/// itself never reads files; this is the only filesystem entry point of the
/// configuration layer.
pub fn load_overrides(explicit: Option<&Path>) -> Result<GatewayOverrides> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!(errors::wrap_error_with_suggestion(
                format!("Configuration file not found: {}", path.display()),
                "Pass --config with an existing file, or drop the flag to use\n\
                 ./gateway.toml or ~/.socket-gateway/gateway.toml"
            ));
        }
        return read_overrides(path);
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        return read_overrides(local);
    }

    if let Some(home) = dirs::home_dir() {
        let fallback = home.join(".socket-gateway").join(LOCAL_CONFIG);
        if fallback.exists() {
            return read_overrides(&fallback);
        }
    }

    Ok(GatewayOverrides::default())
}

fn read_overrides(path: &Path) -> Result<GatewayOverrides> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::options::ListenPort;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_is_loaded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gateway.toml");
        fs::write(
            &path,
            r#"
            name = "chat"
            port = 8282
            business_count = 4
            "#,
        )
        .unwrap();

        let overrides = load_overrides(Some(&path)).unwrap();
        assert_eq!(overrides.name.as_deref(), Some("chat"));
        assert_eq!(overrides.port, Some(ListenPort::Number(8282)));
        assert!(overrides.extra.contains_key("business_count"));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");

        let err = load_overrides(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gateway.toml");
        fs::write(&path, "port = [not toml").unwrap();

        let err = load_overrides(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }
}
