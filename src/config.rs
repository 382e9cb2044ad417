/// Plugin configuration loading
use std::ffi::CStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{CSV_QUERY_MARKER, DEFAULT_POLL_INTERVAL_MS};

/// Fatal startup errors. None of these are retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("the plugin configuration is missing the HAProxy URL")]
    MissingUrl,
    #[error("the poll interval must be greater than zero")]
    InvalidInterval,
    #[error("a proxy entry has an empty name")]
    EmptyProxy,
    #[error("the value {0} is defined twice; each proxy name is required to be unique")]
    DuplicateProxy(String),
}

/// Raw shape of `param.json`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub source: Option<String>,
    pub poll_interval: Option<u64>,
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub proxies: Vec<String>,
}

/// Basic auth credentials sent with every stats request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Stats endpoint, always ending in the CSV query marker
    pub url: String,
    pub credentials: Option<Credentials>,
    /// Prefix for entity display names
    pub source: String,
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
    /// `rawName[,alias]` entries, in configuration order
    pub proxies: Vec<String>,
}

impl Config {
    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let url = raw
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUrl)?;

        let interval_ms = raw.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if interval_ms == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        let credentials = raw.username.map(|username| Credentials {
            username,
            password: raw.password.unwrap_or_default(),
        });

        let source = match raw.source.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => local_hostname(),
        };

        Ok(Config {
            url: with_csv_marker(url),
            credentials,
            source,
            poll_interval: Duration::from_millis(interval_ms),
            timeout: raw.timeout_ms.map(Duration::from_millis),
            proxies: raw.proxies,
        })
    }
}

/// Append the CSV query marker unless the URL already ends with it
pub fn with_csv_marker(mut url: String) -> String {
    if !url.ends_with(CSV_QUERY_MARKER) {
        url.push_str(CSV_QUERY_MARKER);
    }
    url
}

/// Host name of this machine via gethostname(2), "localhost" if it cannot be read
pub fn local_hostname() -> String {
    let mut buf = [0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return "localhost".to_string();
    }
    // POSIX leaves truncated names unterminated
    buf[buf.len() - 1] = 0;
    match CStr::from_bytes_until_nul(&buf) {
        Ok(name) if !name.is_empty() => name.to_string_lossy().trim().to_string(),
        _ => "localhost".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_url_is_fatal() {
        let err = Config::from_json(r#"{"proxies": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl));
    }

    #[test]
    fn test_blank_url_is_fatal() {
        let err = Config::from_json(r#"{"url": "   "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl));
    }

    #[test]
    fn test_csv_marker_appended() {
        let cfg = Config::from_json(r#"{"url": "http://lb:8080/stats", "source": "h"}"#).unwrap();
        assert_eq!(cfg.url, "http://lb:8080/stats;csv");
    }

    #[test]
    fn test_csv_marker_not_duplicated() {
        assert_eq!(
            with_csv_marker("http://lb/stats;csv".to_string()),
            "http://lb/stats;csv"
        );
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_json(r#"{"url": "http://lb/stats"}"#).unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
        assert!(cfg.credentials.is_none());
        assert!(cfg.timeout.is_none());
        assert!(cfg.proxies.is_empty());
        assert!(!cfg.source.is_empty());
    }

    #[test]
    fn test_source_trimmed() {
        let cfg = Config::from_json(r#"{"url": "http://lb", "source": " host1 "}"#).unwrap();
        assert_eq!(cfg.source, "host1");
    }

    #[test]
    fn test_blank_source_falls_back_to_hostname() {
        let cfg = Config::from_json(r#"{"url": "http://lb", "source": ""}"#).unwrap();
        assert_eq!(cfg.source, local_hostname());
    }

    #[test]
    fn test_credentials_require_username() {
        let cfg = Config::from_json(r#"{"url": "http://lb", "password": "secret"}"#).unwrap();
        assert!(cfg.credentials.is_none());

        let cfg = Config::from_json(r#"{"url": "http://lb", "username": "admin"}"#).unwrap();
        assert_eq!(
            cfg.credentials,
            Some(Credentials {
                username: "admin".to_string(),
                password: String::new(),
            })
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Config::from_json(r#"{"url": "http://lb", "pollInterval": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInterval));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "url": "http://lb/haproxy?stats",
                "username": "admin",
                "password": "pw",
                "source": "host1",
                "pollInterval": 5000,
                "timeoutMs": 2000,
                "proxies": ["web,prod-web", "api"]
            }}"#
        )
        .unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.url, "http://lb/haproxy?stats;csv");
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.timeout, Some(Duration::from_secs(2)));
        assert_eq!(cfg.proxies, vec!["web,prod-web", "api"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("param.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = Config::from_json("{ url: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_local_hostname_not_empty() {
        assert!(!local_hostname().is_empty());
    }
}
