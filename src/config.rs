// src/config.rs

use anyhow::{Context, Result};
use std::{env, str::FromStr, time::Duration};

use crate::fetch::{DataSource, RetryPolicy};

/// Where the course dataset lives.
pub const DEFAULT_DATA_URL: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMDeveloperSkillsNetwork-DV0101EN-SkillsNetwork/Data%20Files/historical_automobile_sales.csv";

pub const DEFAULT_PORT: u16 = 8050;

/// Per-request limit for the dataset fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Years offered by the year selector.
pub const FIRST_YEAR: i32 = 1980;
pub const LAST_YEAR: i32 = 2023;

#[derive(Debug, Clone)]
pub struct Config {
    pub source: DataSource,
    pub bind: String,
    pub port: u16,
    pub retry: RetryPolicy,
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: DataSource::Remote(
                url::Url::parse(DEFAULT_DATA_URL).expect("default data URL should parse"),
            ),
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            retry: RetryPolicy::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl Config {
    /// Build from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("AUTOSALES_DATA_URL") {
            cfg.source = DataSource::parse(&raw)
                .with_context(|| format!("AUTOSALES_DATA_URL={:?}", raw))?;
        }
        if let Some(bind) = lookup("AUTOSALES_BIND") {
            cfg.bind = bind;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            cfg.port = port;
        }
        if let Some(n) = parse_var(&lookup, "AUTOSALES_FETCH_RETRIES")? {
            cfg.retry.max_retries = n;
        }
        if let Some(ms) = parse_var(&lookup, "AUTOSALES_FETCH_BACKOFF_MS")? {
            cfg.retry.initial_backoff_ms = ms;
        }
        if let Some(secs) = parse_var::<_, u64>(&lookup, "AUTOSALES_FETCH_TIMEOUT_SECS")? {
            if secs == 0 {
                anyhow::bail!("AUTOSALES_FETCH_TIMEOUT_SECS must be greater than zero");
            }
            cfg.fetch_timeout = Duration::from_secs(secs);
        }

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => {
            let v = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {}: {:?}", key, raw))?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}
