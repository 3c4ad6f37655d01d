use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
pub const DEFAULT_CONFIG_FILE: &str = "chat.toml";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_TYPING_DEBOUNCE: Duration = Duration::from_millis(2000);
pub const DEFAULT_TYPING_EXPIRY: Duration = Duration::from_millis(3000);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatConfig {
    pub server_url: String,
    pub reconnect_delay: Duration,
    pub typing_debounce: Duration,
    pub typing_expiry: Duration,
}

impl ChatConfig {
    pub fn new(server_url: String) -> Self {
        Self {
            server_url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            typing_debounce: DEFAULT_TYPING_DEBOUNCE,
            typing_expiry: DEFAULT_TYPING_EXPIRY,
        }
    }

    /// Defaults, then the TOML file (`chat.toml` when `path` is `None`), then `CHAT_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let raw: FileConfig = Figment::from(Serialized::defaults(FileConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("CHAT_"))
            .extract()
            .map_err(Box::new)?;
        raw.try_into()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL.to_string())
    }
}

/// On-disk shape; durations are plain milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct FileConfig {
    server_url: String,
    reconnect_delay_ms: u64,
    typing_debounce_ms: u64,
    typing_expiry_ms: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY.as_millis() as u64,
            typing_debounce_ms: DEFAULT_TYPING_DEBOUNCE.as_millis() as u64,
            typing_expiry_ms: DEFAULT_TYPING_EXPIRY.as_millis() as u64,
        }
    }
}

impl TryFrom<FileConfig> for ChatConfig {
    type Error = ConfigError;

    fn try_from(raw: FileConfig) -> Result<Self, Self::Error> {
        let server_url = raw.server_url.trim();
        if server_url.is_empty() {
            return Err(ConfigError::Invalid("server_url is required".to_string()));
        }
        Ok(Self {
            server_url: server_url.to_string(),
            reconnect_delay: Duration::from_millis(raw.reconnect_delay_ms),
            typing_debounce: Duration::from_millis(raw.typing_debounce_ms),
            typing_expiry: Duration::from_millis(raw.typing_expiry_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatConfig, DEFAULT_SERVER_URL};
    use std::path::Path;
    use std::time::Duration;

    /// `new` populates the server and leaves timings at their defaults.
    #[test]
    fn new_sets_defaults() {
        // Arrange
        // Act
        let config = ChatConfig::new("http://chat.example".to_string());
        // Assert
        assert_eq!(config.server_url, "http://chat.example");
        assert_eq!(config.reconnect_delay, Duration::from_millis(3000));
        assert_eq!(config.typing_debounce, Duration::from_millis(2000));
        assert_eq!(config.typing_expiry, Duration::from_millis(3000));
    }

    /// Without a file or env vars the built-in defaults apply.
    #[test]
    fn load_without_sources_uses_defaults() {
        figment::Jail::expect_with(|_jail| {
            // Act
            let config = ChatConfig::load(None).map_err(|err| err.to_string())?;
            // Assert
            assert_eq!(config, ChatConfig::new(DEFAULT_SERVER_URL.to_string()));
            Ok(())
        });
    }

    /// The TOML file overrides defaults and env vars override the file.
    #[test]
    fn load_layers_file_then_env() {
        figment::Jail::expect_with(|jail| {
            // Arrange
            jail.create_file(
                "chat.toml",
                r#"
                server_url = "http://chat.example:8080"
                reconnect_delay_ms = 1500
                typing_expiry_ms = 4000
                "#,
            )?;
            jail.set_env("CHAT_TYPING_EXPIRY_MS", "4500");

            // Act
            let config = ChatConfig::load(None).map_err(|err| err.to_string())?;

            // Assert
            assert_eq!(config.server_url, "http://chat.example:8080");
            assert_eq!(config.reconnect_delay, Duration::from_millis(1500));
            assert_eq!(config.typing_debounce, Duration::from_millis(2000));
            assert_eq!(config.typing_expiry, Duration::from_millis(4500));
            Ok(())
        });
    }

    /// An explicit path is read instead of the default file name.
    #[test]
    fn load_reads_explicit_path() {
        figment::Jail::expect_with(|jail| {
            // Arrange
            jail.create_file("custom.toml", r#"typing_debounce_ms = 250"#)?;

            // Act
            let config = ChatConfig::load(Some(Path::new("custom.toml")))
                .map_err(|err| err.to_string())?;

            // Assert
            assert_eq!(config.typing_debounce, Duration::from_millis(250));
            Ok(())
        });
    }

    /// A blank server url is rejected.
    #[test]
    fn load_rejects_blank_server() {
        figment::Jail::expect_with(|jail| {
            // Arrange
            jail.set_env("CHAT_SERVER_URL", "  ");
            // Act
            let result = ChatConfig::load(None);
            // Assert
            assert!(result.is_err());
            Ok(())
        });
    }
}
