/// Stats page retrieval
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::{Config, Credentials};

/// Per-cycle fetch failures. The cycle is abandoned and the next one runs as usual.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to HAProxy failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HAProxy returned status {0}; recheck the URL and credentials")]
    Status(u16),
    #[error("HAProxy statistics returned empty")]
    EmptyBody,
}

/// Anything that can produce one raw CSV report per call
pub trait StatsSource {
    fn fetch(&mut self) -> Result<String, FetchError>;
}

/// Blocking HTTP GET against the HAProxy stats page
pub struct HttpStatsSource {
    client: Client,
    url: String,
    credentials: Option<Credentials>,
}

impl HttpStatsSource {
    pub fn new(
        url: &str,
        credentials: Option<Credentials>,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        // None disables reqwest's default 30s timeout
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpStatsSource {
            client,
            url: url.to_string(),
            credentials,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(&config.url, config.credentials.clone(), config.timeout)
    }
}

impl StatsSource for HttpStatsSource {
    fn fetch(&mut self) -> Result<String, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send()?;
        check_status(response.status())?;
        non_empty(response.text()?)
    }
}

fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(FetchError::Status(status.as_u16()))
    }
}

fn non_empty(body: String) -> Result<String, FetchError> {
    if body.is_empty() {
        Err(FetchError::EmptyBody)
    } else {
        Ok(body)
    }
}
