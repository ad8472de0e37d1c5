use domain::services::{DEFAULT_FLUSH_THRESHOLD, MAX_FLUSH_THRESHOLD};
use graph::GraphClientConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub tenant_metadata: TenantMetadataConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,

    /// API version serving `$batch` and the teamwork endpoints
    #[serde(default = "default_batch_version")]
    pub batch_version: String,

    /// API version for direct user lookups
    #[serde(default = "default_user_version")]
    pub user_version: String,

    #[serde(default = "default_graph_timeout")]
    pub timeout_secs: u64,

    /// Pending secondary lookups that trigger a batch dispatch when exceeded
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    /// Whether device list continuation pages are fetched
    #[serde(default = "default_follow_next_links")]
    pub follow_next_links: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantMetadataConfig {
    /// Federation metadata host
    #[serde(default = "default_metadata_base_url")]
    pub base_url: String,

    #[serde(default = "default_metadata_timeout")]
    pub timeout_secs: u64,
}

/// Either a pre-acquired `access_token` or an app registration for the
/// client-credentials grant.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_authority_url")]
    pub authority_url: String,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub access_token: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("authority_url", &self.authority_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_graph_base_url() -> String {
    "https://graph.microsoft.com".to_string()
}
fn default_batch_version() -> String {
    "beta".to_string()
}
fn default_user_version() -> String {
    "v1.0".to_string()
}
fn default_graph_timeout() -> u64 {
    60
}
fn default_flush_threshold() -> usize {
    DEFAULT_FLUSH_THRESHOLD
}
fn default_follow_next_links() -> bool {
    true
}
fn default_metadata_base_url() -> String {
    "https://accounts.accesscontrol.windows.net".to_string()
}
fn default_metadata_timeout() -> u64 {
    30
}
fn default_authority_url() -> String {
    "https://login.microsoftonline.com".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_graph_base_url(),
            batch_version: default_batch_version(),
            user_version: default_user_version(),
            timeout_secs: default_graph_timeout(),
            flush_threshold: default_flush_threshold(),
            follow_next_links: default_follow_next_links(),
        }
    }
}

impl Default for TenantMetadataConfig {
    fn default() -> Self {
        Self {
            base_url: default_metadata_base_url(),
            timeout_secs: default_metadata_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authority_url: default_authority_url(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            access_token: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl GraphConfig {
    pub fn client_config(&self) -> GraphClientConfig {
        GraphClientConfig {
            base_url: self.base_url.clone(),
            batch_version: self.batch_version.clone(),
            user_version: self.user_version.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

impl AuthConfig {
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    pub fn has_client_credentials(&self) -> bool {
        !self.tenant_id.is_empty() && !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration (optional)
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with M365__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("M365").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// This method creates a config entirely from defaults and overrides,
    /// without relying on config files (which may not be accessible during tests).
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        // Embed defaults directly to avoid file system dependency in tests
        let defaults = r#"
            [graph]
            base_url = "https://graph.microsoft.com"
            batch_version = "beta"
            user_version = "v1.0"
            timeout_secs = 60
            flush_threshold = 15
            follow_next_links = true

            [tenant_metadata]
            base_url = "https://accounts.accesscontrol.windows.net"
            timeout_secs = 30

            [auth]
            authority_url = "https://login.microsoftonline.com"

            [logging]
            level = "info"
            format = "json"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.graph.flush_threshold == 0 || self.graph.flush_threshold > MAX_FLUSH_THRESHOLD {
            return Err(ConfigValidationError::InvalidValue(format!(
                "graph.flush_threshold must be between 1 and {}",
                MAX_FLUSH_THRESHOLD
            )));
        }

        if self.graph.timeout_secs == 0 || self.tenant_metadata.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "timeout_secs cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Checks that Graph credentials are configured.
    ///
    /// Only Graph commands need them; the tenant domain lookup is anonymous.
    pub fn require_auth(&self) -> Result<(), ConfigValidationError> {
        // Either a ready token or a complete app registration
        if !self.auth.has_access_token() && !self.auth.has_client_credentials() {
            return Err(ConfigValidationError::MissingRequired(
                "M365__AUTH__ACCESS_TOKEN or M365__AUTH__TENANT_ID, M365__AUTH__CLIENT_ID and M365__AUTH__CLIENT_SECRET must be set".to_string(),
            ));
        }
        Ok(())
    }
}
