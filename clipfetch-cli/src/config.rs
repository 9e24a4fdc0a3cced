use crate::error::{CliError, Result};
use clipfetch::FetchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const TOKEN_ENV: &str = "CLIPFETCH_TOKEN";
pub const COOKIES_ENV: &str = "CLIPFETCH_COOKIES";
pub const FFMPEG_ENV: &str = "FFMPEG_PATH";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Clips downloaded at the same time by `batch`.
    pub batch_concurrency: usize,
    pub fetch: FetchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: 2,
            fetch: FetchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read the TOML file (missing is fine), then let the environment override it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(&p)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        if config.batch_concurrency == 0 {
            return Err(CliError::Config(
                "batch_concurrency must be at least 1".to_owned(),
            ));
        }
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("clipfetch").join("config.toml"))
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(token) = lookup(TOKEN_ENV) {
            self.fetch.bearer_token = Some(token);
        }
        if let Some(cookies) = lookup(COOKIES_ENV) {
            self.fetch.cookies = Some(cookies);
        }
        if let Some(ffmpeg) = lookup(FFMPEG_ENV) {
            self.fetch.ffmpeg_path = ffmpeg;
        }
    }

    /// TOML rendering with credentials masked.
    pub fn show(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.fetch.bearer_token.is_some() {
            redacted.fetch.bearer_token = Some("***".to_owned());
        }
        if redacted.fetch.cookies.is_some() {
            redacted.fetch.cookies = Some("***".to_owned());
        }
        Ok(toml::to_string_pretty(&redacted)?)
    }

    /// Overwrite the config file with defaults.
    pub fn reset(path: Option<&Path>) -> Result<PathBuf> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(Self::default_path)
            .ok_or_else(|| CliError::Config("no configuration directory".to_owned()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(&Self::default())?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut config: AppConfig = toml::from_str("").unwrap();
        config.apply_env(|_| None);
        assert_eq!(config.batch_concurrency, 2);
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_ok());
    }

    #[test]
    fn test_partial_file() {
        let toml = r#"
            batch_concurrency = 4

            [fetch]
            cdn_base = "https://cdn.test/"
            ffmpeg_timeout = 60
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.batch_concurrency, 4);
        assert_eq!(config.fetch.cdn_base, "https://cdn.test/");
        assert_eq!(config.fetch.ffmpeg_timeout, Duration::from_secs(60));
        assert_eq!(config.fetch.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: AppConfig = toml::from_str(
            r#"
            [fetch]
            bearer_token = "from-file"
            cookies = "a=b"
        "#,
        )
        .unwrap();
        config.apply_env(|key| match key {
            TOKEN_ENV => Some("from-env".to_owned()),
            COOKIES_ENV => Some(String::new()),
            FFMPEG_ENV => Some("/opt/ffmpeg".to_owned()),
            _ => None,
        });
        assert_eq!(config.fetch.bearer_token.as_deref(), Some("from-env"));
        assert_eq!(config.fetch.cookies.as_deref(), Some("a=b"));
        assert_eq!(config.fetch.ffmpeg_path, "/opt/ffmpeg");
    }

    #[test]
    fn test_show_redacts_credentials() {
        let mut config = AppConfig::default();
        config.fetch.bearer_token = Some("secret-token".to_owned());
        let shown = config.show().unwrap();
        assert!(!shown.contains("secret-token"));
        assert!(shown.contains("***"));
    }

    #[test]
    fn test_reset_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "batch_concurrency = 9").unwrap();

        let written = AppConfig::reset(Some(&path)).unwrap();
        assert_eq!(written, path);
        let content = std::fs::read_to_string(&path).unwrap();
        let config: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.batch_concurrency, 2);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "batch_concurrency = 0").unwrap();
        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(CliError::Config(_))
        ));
    }
}
