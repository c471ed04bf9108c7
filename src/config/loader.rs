//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub cache_url: Option<String>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(bind) = self.bind_address {
            config.listener.bind_address = bind;
        }
        if let Some(url) = self.cache_url {
            config.cache.url = url;
        }
    }
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Read `path` (or start from defaults), apply `overrides`, then validate.
///
/// A value in the file that an override replaces is never checked.
pub fn load_with_overrides(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [security]
            https_redirect = true
            trusted_hosts = ["kyc.example.com"]
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert!(config.security.https_redirect);
        assert_eq!(config.security.trusted_hosts, vec!["kyc.example.com"]);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nurl = \"http://localhost:6379\"").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("cache.url"));
    }

    #[test]
    fn test_override_replaces_invalid_file_value() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nurl = \"http://localhost:6379\"").unwrap();

        let overrides = ConfigOverrides {
            bind_address: Some("127.0.0.1:9100".into()),
            cache_url: Some("redis://cache.internal:6379/2".into()),
        };
        let config = load_with_overrides(Some(file.path()), overrides).unwrap();
        assert_eq!(config.cache.url, "redis://cache.internal:6379/2");
        assert_eq!(config.listener.bind_address, "127.0.0.1:9100");
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let overrides = ConfigOverrides {
            cache_url: Some("memcached://localhost".into()),
            ..ConfigOverrides::default()
        };
        let err = load_with_overrides(None, overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors[0].field == "cache.url"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
