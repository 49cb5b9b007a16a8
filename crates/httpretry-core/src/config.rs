use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::{Budget, Retry, DEFAULT_BACKOFF_MAX, DEFAULT_REDIRECT, DEFAULT_TOTAL};

/// Retry policy parameters (`[retry]` section in config.toml).
///
/// Budgets are written as a count, `true` (unlimited) or `false` (disabled).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub total: Budget,
    pub connect: Budget,
    pub read: Budget,
    pub redirect: Budget,
    pub status: Budget,
    pub other: Budget,
    /// Methods eligible for retry. Missing = idempotent methods; empty list = all methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
    /// Statuses retried even though the server answered.
    pub status_forcelist: Vec<u16>,
    /// Backoff factor in seconds (sleep = factor * 2^(errors-1)).
    pub backoff_factor: f64,
    /// Maximum backoff sleep in seconds.
    pub backoff_max_secs: f64,
    pub raise_on_redirect: bool,
    pub raise_on_status: bool,
    pub respect_retry_after_header: bool,
    /// Headers dropped on cross-host redirects. Missing = Authorization and Cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_headers_on_redirect: Option<Vec<String>>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            total: Budget::Remaining(DEFAULT_TOTAL),
            connect: Budget::Unlimited,
            read: Budget::Disabled,
            redirect: Budget::Remaining(DEFAULT_REDIRECT),
            status: Budget::Unlimited,
            other: Budget::Unlimited,
            allowed_methods: None,
            status_forcelist: Vec::new(),
            backoff_factor: 0.0,
            backoff_max_secs: DEFAULT_BACKOFF_MAX.as_secs_f64(),
            raise_on_redirect: true,
            raise_on_status: true,
            respect_retry_after_header: true,
            remove_headers_on_redirect: None,
        }
    }
}

impl RetryConfig {
    /// Build the retry policy described by this section.
    pub fn to_retry(&self) -> Result<Retry> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            anyhow::bail!(
                "backoff_factor must be a non-negative number (got {})",
                self.backoff_factor
            );
        }
        let backoff_max = Duration::try_from_secs_f64(self.backoff_max_secs).with_context(|| {
            format!("invalid backoff_max_secs {}", self.backoff_max_secs)
        })?;

        let mut b = Retry::builder()
            .total(self.total)
            .connect(self.connect)
            .read(self.read)
            .redirect(self.redirect)
            .status(self.status)
            .other(self.other)
            .status_forcelist(self.status_forcelist.iter().copied())
            .backoff_factor(self.backoff_factor)
            .backoff_max(backoff_max)
            .raise_on_redirect(self.raise_on_redirect)
            .raise_on_status(self.raise_on_status)
            .respect_retry_after_header(self.respect_retry_after_header);
        if let Some(methods) = &self.allowed_methods {
            b = b.allowed_methods(Some(methods.iter().cloned()));
        }
        if let Some(headers) = &self.remove_headers_on_redirect {
            b = b.remove_headers_on_redirect(headers.iter().cloned());
        }
        Ok(b.build())
    }
}

/// Global configuration loaded from `~/.config/httpretry/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry: Some(RetryConfig::default()),
        }
    }
}

impl Config {
    /// Retry section, or defaults when the file has none.
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("httpretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = Config::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_matches_default_policy() {
        let cfg = Config::default();
        let retry = cfg.retry_config().to_retry().unwrap();
        assert_eq!(retry, Retry::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = Config::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert!(cfg.retry.is_none());
        assert_eq!(cfg.retry_config(), RetryConfig::default());
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            [retry]
            total = 3
            read = false
            connect = true
            status_forcelist = [500, 502, 503]
            backoff_factor = 0.5
            backoff_max_secs = 15
            allowed_methods = ["get", "post"]
            raise_on_status = false
        "#;
        let cfg: Config = toml::from_str(toml).unwrap();
        let rc = cfg.retry.as_ref().unwrap();
        assert_eq!(rc.total, Budget::Remaining(3));
        assert_eq!(rc.read, Budget::Disabled);
        assert_eq!(rc.connect, Budget::Unlimited);
        assert_eq!(rc.redirect, Budget::Remaining(5));

        let retry = rc.to_retry().unwrap();
        assert!(retry.is_method_retryable("POST"));
        assert!(!retry.is_method_retryable("PATCH"));
        assert!(retry.is_retry("GET", 502, false));
        assert!(!retry.raise_on_status());
        assert_eq!(retry.backoff_max(), Duration::from_secs(15));
    }

    #[test]
    fn empty_method_list_allows_all() {
        let cfg: Config = toml::from_str("[retry]\nallowed_methods = []").unwrap();
        let retry = cfg.retry_config().to_retry().unwrap();
        assert!(retry.is_method_retryable("PATCH"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(toml::from_str::<Config>("[retry]\ntotal = -1").is_err());

        let rc = RetryConfig {
            backoff_max_secs: -1.0,
            ..Default::default()
        };
        assert!(rc.to_retry().is_err());

        let rc = RetryConfig {
            backoff_factor: f64::INFINITY,
            ..Default::default()
        };
        assert!(rc.to_retry().is_err());
    }

    #[test]
    fn load_from_path_reads_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[retry]\ntotal = 2\nredirect = false").unwrap();
        let cfg = load_from_path(f.path()).unwrap();
        let retry = cfg.retry_config().to_retry().unwrap();
        assert_eq!(retry.total(), Budget::Remaining(2));
        assert_eq!(retry.redirect(), Budget::Remaining(0));
        assert!(!retry.raise_on_redirect());
    }

    #[test]
    fn load_from_path_reports_bad_toml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[retry\ntotal = ").unwrap();
        let err = load_from_path(f.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("parse config"));
    }
}
