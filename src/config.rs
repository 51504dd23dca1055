use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub vk: VkSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VkSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Community token: messages and caller lookups
    #[validate(length(min = 1))]
    pub group_token: String,
    /// User token: people search and photos
    #[validate(length(min = 1))]
    pub user_token: String,
    /// Answer to the Callback API `confirmation` event
    #[validate(length(min = 1))]
    pub confirmation_token: String,
    pub secret: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

fn default_api_url() -> String { "https://api.vk.com".to_string() }
fn default_api_version() -> String { "5.131".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
    #[serde(default = "default_session_idle_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_timeout_secs: default_session_idle_secs(),
        }
    }
}

fn default_max_sessions() -> u64 { 10_000 }
fn default_session_idle_secs() -> u64 { 1800 }

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_count")]
    pub count: u32,
    #[serde(default = "default_age_spread")]
    pub age_spread: u8,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            count: default_search_count(),
            age_spread: default_age_spread(),
        }
    }
}

fn default_search_count() -> u32 { 50 }
fn default_age_spread() -> u8 { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with VKINDER_)
    /// 4. VK_GROUP_TOKEN, VK_USER_TOKEN and DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g., VKINDER__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("VKINDER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }
}

/// Apply the bare token and database variables on top of loaded settings
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    let overrides = [
        ("VK_GROUP_TOKEN", "vk.group_token"),
        ("VK_USER_TOKEN", "vk.user_token"),
        ("VK_CONFIRMATION_TOKEN", "vk.confirmation_token"),
        ("DATABASE_URL", "database.url"),
    ];

    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const MINIMAL: &str = r#"
        [server]
        host = "0.0.0.0"
        port = 8080

        [vk]
        group_token = "group"
        user_token = "user"
        confirmation_token = "abc123"

        [database]
        url = "postgres://localhost/vkinder"
    "#;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = parse(MINIMAL);

        assert_eq!(settings.vk.api_url, "https://api.vk.com");
        assert_eq!(settings.vk.api_version, "5.131");
        assert_eq!(settings.sessions.max_sessions, 10_000);
        assert_eq!(settings.sessions.idle_timeout_secs, 1800);
        assert_eq!(settings.search.count, 50);
        assert_eq!(settings.search.age_spread, 5);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, "json");
        assert!(settings.vk.validate().is_ok());
    }

    #[test]
    fn test_empty_token_fails_validation() {
        let settings = parse(&MINIMAL.replace(r#"group_token = "group""#, r#"group_token = """#));
        assert!(settings.vk.validate().is_err());
    }
}
