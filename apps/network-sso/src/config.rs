//! Node configuration loaded from a YAML file with environment overrides.
//!
//! Loading fails fast on unreadable or inconsistent files. Security
//! problems with the network secret are reported separately by
//! [`NodeConfig::validate_security_config`] so that development nodes can
//! start with a warning.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use xavyo_api_network_sso::{NetworkSecret, NetworkSsoConfig, NetworkUser, Site};

/// Placeholder secret shipped in sample configuration files.
pub const INSECURE_NETWORK_SECRET: &str = "development-network-sso-secret-change-in-production";

/// Minimum signing secret length accepted in production.
pub const MIN_SECRET_BYTES: usize = 32;

/// Upper bound for every configured lifetime (one year).
pub const MAX_TTL_SECONDS: i64 = 365 * 24 * 3600;

/// Application environment mode.
///
/// - `Development`: insecure secrets are allowed with WARN-level logging.
/// - `Production`: insecure secrets cause the node to refuse startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
}

impl AppEnvironment {
    /// Parse an `APP_ENV` value; `None` when it is not recognized.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }

    /// Parse from the `APP_ENV` environment variable value.
    /// Defaults to `Development` if unrecognized.
    #[must_use]
    pub fn from_env_str(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

impl std::fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Root node configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub network: NetworkConfig,
    #[serde(default)]
    pub sso: NetworkSsoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Set from `APP_ENV`, never from the file
    #[serde(skip)]
    pub app_env: AppEnvironment,
    /// Raw `APP_ENV` value that could not be parsed, reported at startup
    #[serde(skip)]
    pub unrecognized_app_env: Option<String>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// The sites and accounts of the network.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Network-wide signing secret, usually supplied via `NETWORK_SSO_SECRET`
    #[serde(default)]
    pub secret: Option<String>,
    pub sites: Vec<Site>,
    #[serde(default)]
    pub users: Vec<NetworkUser>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl NodeConfig {
    /// Load `.env`, the YAML file and environment overrides, then check consistency.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = Self::from_file(Self::config_path())?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
                path: path.as_ref().display().to_string(),
                message: e.to_string(),
            })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Get the configuration file path from environment or default.
    pub fn config_path() -> String {
        std::env::var("NETWORK_SSO_CONFIG")
            .unwrap_or_else(|_| "./config/network.yaml".to_string())
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("NETWORK_SSO_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("NETWORK_SSO_PORT") {
            self.server.port = port.parse().map_err(|e| ConfigError::InvalidValue {
                var: "NETWORK_SSO_PORT".to_string(),
                message: format!("{e}"),
            })?;
        }
        if let Ok(secret) = std::env::var("NETWORK_SSO_SECRET") {
            self.network.secret = Some(secret);
        }
        let raw = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        self.app_env = AppEnvironment::from_env_str(&raw);
        self.unrecognized_app_env = AppEnvironment::parse(&raw).is_none().then_some(raw);
        Ok(())
    }

    /// Checks that sites and users describe one consistent network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.sites.is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "network.sites".to_string(),
                message: "at least one site is required".to_string(),
            });
        }

        let mut ids = HashSet::new();
        let mut locations = HashSet::new();
        for site in &self.network.sites {
            if !ids.insert(site.id) {
                return Err(ConfigError::InvalidValue {
                    var: "network.sites".to_string(),
                    message: format!("duplicate site id {}", site.id),
                });
            }
            if !locations.insert(site.base_url().to_ascii_lowercase()) {
                return Err(ConfigError::InvalidValue {
                    var: "network.sites".to_string(),
                    message: format!("duplicate site location {}", site.base_url()),
                });
            }
            if url::Url::parse(&site.base_url()).is_err() {
                return Err(ConfigError::InvalidValue {
                    var: "network.sites".to_string(),
                    message: format!("site {} has an invalid domain or path", site.id),
                });
            }
        }

        let mut logins = HashSet::new();
        for user in &self.network.users {
            if !logins.insert(user.login.to_ascii_lowercase()) {
                return Err(ConfigError::InvalidValue {
                    var: "network.users".to_string(),
                    message: format!("duplicate login {}", user.login),
                });
            }
            if let Some(unknown) = user.sites.iter().find(|id| !ids.contains(*id)) {
                return Err(ConfigError::InvalidValue {
                    var: "network.users".to_string(),
                    message: format!("user {} is a member of unknown site {unknown}", user.login),
                });
            }
        }

        for (var, seconds) in [
            ("sso.assertion_ttl_seconds", self.sso.assertion_ttl_seconds),
            ("sso.nonce_ttl_seconds", self.sso.nonce_ttl_seconds),
            ("sso.session_max_age_seconds", self.sso.session_max_age_seconds),
        ] {
            if !(1..=MAX_TTL_SECONDS).contains(&seconds) {
                return Err(ConfigError::InvalidValue {
                    var: var.to_string(),
                    message: format!(
                        "must be between 1 and {MAX_TTL_SECONDS} seconds, got {seconds}"
                    ),
                });
            }
        }

        Ok(())
    }

    /// The network signing secret, if one is configured.
    #[must_use]
    pub fn network_secret(&self) -> Option<NetworkSecret> {
        self.network
            .secret
            .as_deref()
            .and_then(|s| NetworkSecret::new(s.as_bytes()))
    }

    /// Validate security configuration based on the application environment.
    ///
    /// In **production** mode: returns `Err(errors)` listing every problem found.
    /// In **development** mode: returns `Ok(warnings)` listing every problem found.
    pub fn validate_security_config(&self) -> Result<Vec<String>, Vec<String>> {
        let mut issues = Vec::new();

        match self.network.secret.as_deref() {
            None | Some("") => issues.push(
                "NETWORK_SSO_SECRET is not set; every SSO handshake will be refused".to_string(),
            ),
            Some(INSECURE_NETWORK_SECRET) => issues
                .push("NETWORK_SSO_SECRET is using the default insecure value".to_string()),
            Some(secret) if secret.len() < MIN_SECRET_BYTES => issues.push(format!(
                "NETWORK_SSO_SECRET is shorter than {MIN_SECRET_BYTES} bytes"
            )),
            Some(_) => {}
        }

        if let Some(site) = self.network.sites.iter().find(|s| !s.is_secure()) {
            if self.app_env.is_production() {
                issues.push(format!(
                    "Site {} is served over {}; session cookies will not be Secure",
                    site.id, site.scheme
                ));
            }
        }

        for user in &self.network.users {
            if argon2::PasswordHash::new(&user.credential_hash).is_err() {
                issues.push(format!(
                    "User {} has no valid password hash and cannot log in",
                    user.login
                ));
            }
        }

        if let Some(raw) = &self.unrecognized_app_env {
            issues.push(format!(
                "Unrecognized APP_ENV value '{raw}', running in {} mode",
                self.app_env
            ));
        }

        if self.app_env.is_production() && !issues.is_empty() {
            Err(issues)
        } else {
            Ok(issues)
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
