use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for lostfound. Missing keys take defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LostFoundConfig {
    /// Where the workflow state lives
    pub storage: StorageConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Candidate listing settings
    pub matching: MatchingConfig,
    /// Operator identity recorded on handoffs
    pub operator: OperatorConfig,
    /// Database settings (optional, `database` feature)
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON state file
    pub state_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or EnvFilter directive
    pub log_level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Log workflow counters when a command finishes
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Unconfirmed candidates below this score are hidden
    pub min_score: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Recorded as initiator/completer when a command names no operator
    pub default_operator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
    /// Snapshots older than this many days are pruned
    pub retain_days: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(".lostfound/state.json"),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
            metrics_enabled: false,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { min_score: 0 }
    }
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            default_operator: None,
        }
    }
}

impl LostFoundConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (lostfound.toml, .lostfound-rc)
    /// 3. Environment variables (prefixed with LOSTFOUND_, `__` between sections)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`LostFoundConfig::load`] with config files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let toml_file = dir.join("lostfound.toml");
        if toml_file.exists() {
            builder = builder.add_source(File::from(toml_file));
        }

        let rc_file = dir.join(".lostfound-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("LOSTFOUND")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let loaded: LostFoundConfig = config.try_deserialize()?;
        Ok(loaded)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<LostFoundConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = LostFoundConfig::load_env_file();
        LostFoundConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static LostFoundConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let loaded = LostFoundConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded.storage, LostFoundConfig::default().storage);
        assert_eq!(loaded.matching.min_score, 0);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("lostfound.toml"),
            "[matching]\nmin_score = 40\n\n[operator]\ndefault_operator = \"front-desk\"\n",
        )
        .unwrap();

        let loaded = LostFoundConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded.matching.min_score, 40);
        assert_eq!(loaded.operator.default_operator.as_deref(), Some("front-desk"));
        assert_eq!(loaded.observability.log_level, "warn");
    }

    #[test]
    fn test_save_round_trips_through_loader() {
        let dir = TempDir::new().unwrap();
        let mut original = LostFoundConfig::default();
        original.storage.state_file = PathBuf::from("/var/lib/lostfound/state.json");
        original.observability.json_logs = true;
        original.save_to_file(dir.path().join("lostfound.toml")).unwrap();

        let loaded = LostFoundConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded.storage, original.storage);
        assert!(loaded.observability.json_logs);
    }
}
