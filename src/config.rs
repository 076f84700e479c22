//! Configuration management for Riverdale.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use crate::error::{Result, RiverdaleError};

/// Prefix of environment variables that override file settings,
/// e.g. `RIVERDALE__SERVER__HTTP_ADDR=0.0.0.0:8080`.
pub const ENV_PREFIX: &str = "RIVERDALE";

/// Main configuration for the Riverdale service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiverdaleConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Admin notification configuration
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,

    /// Reverse proxies allowed to report the client address through
    /// `X-Forwarded-For`/`X-Real-IP`
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            trusted_proxies: Vec::new(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Path to the endpoint rules file
    pub rules_path: Option<String>,

    /// How often expired counters are swept, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// How long past its reset a counter survives before a sweep drops it
    #[serde(default = "default_sweep_grace")]
    pub sweep_grace_ms: u64,

    /// Hard bound on the number of tracked keys
    #[serde(default)]
    pub max_entries: Option<usize>,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            sweep_interval_secs: default_sweep_interval(),
            sweep_grace_ms: default_sweep_grace(),
            max_entries: None,
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_sweep_grace() -> u64 {
    0
}

/// Admin notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Address notifications about new submissions are queued for
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            admin_email: default_admin_email(),
        }
    }
}

fn default_admin_email() -> String {
    "bookings@riverdale.example".to_string()
}

impl RiverdaleConfig {
    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RiverdaleConfig =
            serde_yaml::from_str(yaml).map_err(|e| RiverdaleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional YAML file layered under
    /// `RIVERDALE__*` environment variables.
    ///
    /// `RIVERDALE__SERVER__TRUSTED_PROXIES` takes a comma-separated list.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Yaml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.trusted_proxies")
                .try_parsing(true),
        );

        let config: RiverdaleConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limiting.sweep_interval_secs == 0 {
            return Err(RiverdaleError::Config(
                "rate_limiting.sweep_interval_secs must be positive".to_string(),
            ));
        }
        if self.rate_limiting.max_entries == Some(0) {
            return Err(RiverdaleError::Config(
                "rate_limiting.max_entries must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RiverdaleConfig::default();
        assert_eq!(config.server.http_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.rate_limiting.sweep_interval_secs, 60);
        assert_eq!(config.rate_limiting.max_entries, None);
        assert!(config.server.trusted_proxies.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
server:
  http_addr: 0.0.0.0:3000
  trusted_proxies: [10.0.0.1, "::1"]
rate_limiting:
  rules_path: /etc/riverdale/rules.yaml
  max_entries: 50000
"#;
        let config = RiverdaleConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.http_addr.port(), 3000);
        assert_eq!(
            config.server.trusted_proxies,
            vec![
                "10.0.0.1".parse::<IpAddr>().unwrap(),
                "::1".parse::<IpAddr>().unwrap()
            ]
        );
        assert_eq!(
            config.rate_limiting.rules_path.as_deref(),
            Some("/etc/riverdale/rules.yaml")
        );
        assert_eq!(config.rate_limiting.max_entries, Some(50_000));
        assert_eq!(config.rate_limiting.sweep_grace_ms, 0);
        assert_eq!(
            config.notifications.admin_email,
            "bookings@riverdale.example"
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let yaml = r#"
rate_limiting:
  sweep_interval_secs: 0
"#;
        assert!(matches!(
            RiverdaleConfig::from_yaml(yaml),
            Err(RiverdaleError::Config(_))
        ));

        let yaml = r#"
rate_limiting:
  max_entries: 0
"#;
        assert!(RiverdaleConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = RiverdaleConfig::load(None).unwrap();
        assert_eq!(config.rate_limiting.sweep_interval_secs, 60);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("riverdale-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "rate_limiting:\n  sweep_interval_secs: 15\n\
             notifications:\n  admin_email: ops@example.com\n",
        )
        .unwrap();

        let config = RiverdaleConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.rate_limiting.sweep_interval_secs, 15);
        assert_eq!(config.notifications.admin_email, "ops@example.com");
    }

    #[test]
    fn test_env_overrides_file() {
        let path = std::env::temp_dir().join(format!("riverdale-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "server:\n  http_addr: 127.0.0.1:3000\n").unwrap();

        // The only test that touches these variables
        std::env::set_var("RIVERDALE__SERVER__HTTP_ADDR", "0.0.0.0:9090");
        std::env::set_var("RIVERDALE__SERVER__TRUSTED_PROXIES", "10.0.0.1,10.0.0.2");
        let result = RiverdaleConfig::load(Some(&path));
        std::env::remove_var("RIVERDALE__SERVER__HTTP_ADDR");
        std::env::remove_var("RIVERDALE__SERVER__TRUSTED_PROXIES");
        std::fs::remove_file(&path).unwrap();

        let config = result.unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:9090".parse().unwrap());
        assert_eq!(config.server.trusted_proxies.len(), 2);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = RiverdaleConfig::load(Some(Path::new("/nonexistent/riverdale.yaml")));
        assert!(matches!(result, Err(RiverdaleError::Config(_))));
    }
}
