use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::CurrencyPair;

/// Errors raised while loading a settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Full configuration for both processes.
///
/// Every field has a default, so an empty file (or no file) yields the
/// stock setup: server on port 8080 serving `/cotacao`, USD-BRL from
/// economia.awesomeapi.com.br, `cotacoes.db`, and the client writing
/// `cotacao.txt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub database: DatabaseSettings,
    pub client: ClientSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub route: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            route: "/cotacao".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub pair: CurrencyPair,
    pub timeout_ms: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "https://economia.awesomeapi.com.br".to_string(),
            pair: CurrencyPair::usd_brl(),
            timeout_ms: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    /// One budget shared by connection open, schema creation and insert.
    pub timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cotacoes.db"),
            timeout_ms: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub server_url: String,
    pub timeout_ms: u64,
    pub output: PathBuf,
    pub label: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080/cotacao".to_string(),
            timeout_ms: 300,
            output: PathBuf::from("cotacao.txt"),
            label: "Dólar".to_string(),
        }
    }
}

/// The three fixed deadlines of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub upstream: Duration,
    pub database: Duration,
    pub client: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Settings::default().timeouts()
    }
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            upstream: Duration::from_millis(self.upstream.timeout_ms),
            database: Duration::from_millis(self.database.timeout_ms),
            client: Duration::from_millis(self.client.timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.upstream, Duration::from_millis(200));
        assert_eq!(timeouts.database, Duration::from_millis(10));
        assert_eq!(timeouts.client, Duration::from_millis(300));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.route, "/cotacao");
        assert_eq!(settings.upstream.pair, CurrencyPair::usd_brl());
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::from_toml_str(
            r#"
            [upstream]
            pair = "EUR-BRL"
            timeout_ms = 500

            [database]
            timeout_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(settings.upstream.pair, CurrencyPair::new("EUR", "BRL"));
        assert_eq!(
            settings.upstream.base_url,
            "https://economia.awesomeapi.com.br"
        );
        let timeouts = settings.timeouts();
        assert_eq!(timeouts.upstream, Duration::from_millis(500));
        assert_eq!(timeouts.database, Duration::from_millis(50));
        assert_eq!(timeouts.client, Duration::from_millis(300));
    }

    #[test]
    fn test_invalid_pair_rejected() {
        let err = Settings::from_toml_str("[upstream]\npair = \"USDBRL\"\n").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/cotacao.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
