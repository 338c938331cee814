//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
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

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:18080"

            [upstream]
            address = "127.0.0.1:13000"

            [local]
            cluster_name = "frontend"

            [health_check]
            pass_through_mode = false

            [[health_check.headers]]
            name = "user-agent"
            prefix_match = "ELB-HealthChecker"

            [[health_check.cluster_min_healthy_percentages]]
            cluster = "api"
            min_healthy_percentage = 50.0

            [[health_check.cluster_min_healthy_percentages]]
            cluster = "db"
            min_healthy_percentage = 0.0

            [[clusters]]
            name = "api"
            total = 4
            healthy = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:18080");
        assert_eq!(config.local.cluster_name, "frontend");
        assert_eq!(config.health_check.headers.len(), 1);
        assert_eq!(config.health_check.headers[0].prefix_match.as_deref(), Some("ELB-HealthChecker"));

        // Threshold order is preserved.
        let names: Vec<_> = config
            .health_check
            .cluster_min_healthy_percentages
            .iter()
            .map(|t| t.cluster.as_str())
            .collect();
        assert_eq!(names, vec!["api", "db"]);

        assert_eq!(config.clusters[0].degraded, 0);
        // Sections left out fall back to defaults.
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let err = parse_config(
            r#"
            [health_check]
            cache_time_ms = 500
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("requires pass_through_mode"));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[health_check\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
