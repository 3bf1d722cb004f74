use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// Base URL of the WhatsApp bridge sidecar (e.g., "http://localhost:3000").
    bridge_url: String,
    /// Directory for state files (logs). Defaults to current directory.
    data_dir: Option<String>,
    /// Maximum numbers accepted per request.
    #[serde(default = "default_max_batch_size")]
    max_batch_size: usize,
    /// Fixed delay between fresh presence checks, in milliseconds.
    #[serde(default = "default_check_delay_ms")]
    check_delay_ms: u64,
    /// How often to poll the bridge session state, in seconds.
    #[serde(default = "default_session_poll_secs")]
    session_poll_secs: u64,
}

fn default_max_batch_size() -> usize {
    50
}

fn default_check_delay_ms() -> u64 {
    2000
}

fn default_session_poll_secs() -> u64 {
    5
}

pub struct Config {
    pub telegram_bot_token: String,
    pub bridge_url: String,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
    pub max_batch_size: usize,
    pub check_delay_ms: u64,
    pub session_poll_secs: u64,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        // Validate required fields
        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if !file.bridge_url.starts_with("http://") && !file.bridge_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "bridge_url must be an http(s) URL".into()
            ));
        }
        if file.max_batch_size == 0 {
            return Err(ConfigError::Validation("max_batch_size must be at least 1".into()));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            bridge_url: file.bridge_url,
            data_dir,
            max_batch_size: file.max_batch_size,
            check_delay_ms: file.check_delay_ms,
            session_poll_secs: file.session_poll_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz",
            "bridge_url": "http://localhost:3000"
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.bridge_url, "http://localhost:3000");
    }

    #[test]
    fn test_defaults_applied() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "bridge_url": "http://localhost:3000"
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.check_delay_ms, 2000);
        assert_eq!(config.session_poll_secs, 5);
        assert_eq!(config.data_dir, PathBuf::from("."));
    }

    #[test]
    fn test_overrides_respected() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "bridge_url": "http://localhost:3000",
            "max_batch_size": 10,
            "check_delay_ms": 500,
            "data_dir": "/var/lib/nomorbot"
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.max_batch_size, 10);
        assert_eq!(config.check_delay_ms, 500);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/nomorbot"));
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{
            "telegram_bot_token": "",
            "bridge_url": "http://localhost:3000"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telegram_bot_token"));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let file = write_config(r#"{
            "telegram_bot_token": "invalid_token_no_colon",
            "bridge_url": "http://localhost:3000"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_invalid_token_format_non_numeric_id() {
        let file = write_config(r#"{
            "telegram_bot_token": "notanumber:ABCdef",
            "bridge_url": "http://localhost:3000"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_bridge_url() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "bridge_url": "localhost:3000"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("bridge_url"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "bridge_url": "http://localhost:3000",
            "max_batch_size": 0
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
