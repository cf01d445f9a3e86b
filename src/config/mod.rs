use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_MODEL: &str = "llama3";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub ollama_url: String,
    pub resolve_timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    model: Option<String>,
    ollama_url: Option<String>,
    resolve_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return read_config(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        match read_config(default_path) {
            Ok(config) => Ok(config),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("Configuration file not found; using defaults");
                Ok(Self::default())
            }
            Err(other) => Err(other),
        }
    }

    pub fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            resolve_timeout_secs: DEFAULT_RESOLVE_TIMEOUT_SECS,
        }
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading gateway configuration file");
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(AppConfig {
        model: parsed.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        ollama_url: parsed
            .ollama_url
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
        resolve_timeout_secs: parsed
            .resolve_timeout_secs
            .unwrap_or(DEFAULT_RESOLVE_TIMEOUT_SECS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn reads_model_and_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateway.toml");
        let mut file = File::create(&path).expect("create config");
        writeln!(
            file,
            r#"
model = "mistral"
ollama_url = "http://10.0.0.5:11434"
resolve_timeout_secs = 30
"#
        )
        .expect("write");

        let config = AppConfig::load(Some(&path)).expect("load config");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.ollama_url, "http://10.0.0.5:11434");
        assert_eq!(config.resolve_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateway.toml");
        fs::write(&path, "model = \"mistral\"").expect("write");

        let config = AppConfig::load(Some(&path)).expect("load");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.ollama_url, DEFAULT_OLLAMA_URL);
        assert_eq!(config.resolve_timeout_secs, DEFAULT_RESOLVE_TIMEOUT_SECS);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope.toml");
        let error = AppConfig::load(Some(&path)).expect_err("missing explicit path fails");
        assert!(matches!(error, ConfigError::Io { .. }));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateway.toml");
        fs::write(&path, "model = [not toml").expect("write");
        let error = AppConfig::load(Some(&path)).expect_err("bad toml fails");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }
}
