use domain::services::roster::DEFAULT_MAX_ERROR_DETAILS;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Email service configuration
    #[serde(default)]
    pub email: EmailConfig,
    /// Registration and check-in tuning
    #[serde(default)]
    pub ticketing: TicketingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Name shown in logs and ticket emails
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Shared key for administrative routes, presented as `X-API-Key`
    #[serde(default)]
    pub admin_api_key: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_app_name() -> String {
    "Event Ticketing".to_string()
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

/// Email service configuration for ticket delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether email sending is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Email provider: smtp, sendgrid, or console (for development)
    #[serde(default = "default_email_provider")]
    pub provider: String,

    /// SMTP server host (for smtp provider)
    #[serde(default)]
    pub smtp_host: String,

    /// SMTP server port (for smtp provider)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username (for smtp provider)
    #[serde(default)]
    pub smtp_username: String,

    /// SMTP password (for smtp provider)
    #[serde(default)]
    pub smtp_password: String,

    /// Whether to use STARTTLS for SMTP (default: true)
    #[serde(default = "default_smtp_tls")]
    pub smtp_use_tls: bool,

    /// SendGrid API key (for sendgrid provider)
    #[serde(default)]
    pub sendgrid_api_key: String,

    /// Sender email address (From header)
    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    /// Sender name (From header)
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_use_tls: default_smtp_tls(),
            sendgrid_api_key: String::new(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
        }
    }
}

fn default_email_provider() -> String {
    "console".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> bool {
    true
}

fn default_sender_email() -> String {
    "tickets@example.com".to_string()
}

fn default_sender_name() -> String {
    "Event Ticketing".to_string()
}

/// Registration and check-in tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketingConfig {
    /// Upper bound on one ticket email attempt
    #[serde(default = "default_notification_timeout")]
    pub notification_timeout_secs: u64,

    /// Recent check-ins returned when no limit is given
    #[serde(default = "default_recent_limit")]
    pub default_recent_limit: i64,

    /// Ceiling on requested recent check-ins
    #[serde(default = "default_max_recent_limit")]
    pub max_recent_limit: i64,

    /// Error messages kept in a roster import summary
    #[serde(default = "default_max_import_error_details")]
    pub max_import_error_details: usize,
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            notification_timeout_secs: default_notification_timeout(),
            default_recent_limit: default_recent_limit(),
            max_recent_limit: default_max_recent_limit(),
            max_import_error_details: default_max_import_error_details(),
        }
    }
}

impl TicketingConfig {
    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_timeout_secs)
    }

    /// Resolves a requested recent-check-in limit against the configured bounds.
    pub fn recent_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_recent_limit)
            .clamp(1, self.max_recent_limit.max(1))
    }
}

fn default_notification_timeout() -> u64 {
    10
}

fn default_recent_limit() -> i64 {
    domain::models::checkin::DEFAULT_RECENT_LIMIT
}

fn default_max_recent_limit() -> i64 {
    domain::models::checkin::MAX_RECENT_LIMIT
}

fn default_max_import_error_details() -> usize {
    DEFAULT_MAX_ERROR_DETAILS
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
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with TK__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("TK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
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
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            app_name = "Event Ticketing"

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            admin_api_key = ""

            [email]
            enabled = false
            provider = "console"
            sender_email = "test@example.com"
            sender_name = "Test"

            [ticketing]
            notification_timeout_secs = 10
            default_recent_limit = 10
            max_recent_limit = 50
            max_import_error_details = 10
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
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TK__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.security.admin_api_key.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TK__SECURITY__ADMIN_API_KEY environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.ticketing.max_import_error_details < DEFAULT_MAX_ERROR_DETAILS {
            return Err(ConfigValidationError::InvalidValue(format!(
                "ticketing.max_import_error_details must be at least {}",
                DEFAULT_MAX_ERROR_DETAILS
            )));
        }

        if self.ticketing.max_recent_limit < 1 {
            return Err(ConfigValidationError::InvalidValue(
                "ticketing.max_recent_limit must be at least 1".to_string(),
            ));
        }

        match self.email.provider.as_str() {
            "console" | "smtp" | "sendgrid" => {}
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown email provider '{}'",
                    other
                )))
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
