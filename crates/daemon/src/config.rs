//! Daemon configuration from environment variables

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use ytflow_api_http::HttpServerConfig;
use ytflow_core::application::constants::DEFAULT_RECONCILE_WINDOW_MS;
use ytflow_infra_bus::DEFAULT_BUS_CAPACITY;

const DEFAULT_DB_PATH: &str = "~/.ytflow/state.db";
const DEFAULT_RATE_LIMIT_BURST: u32 = 200;
const DEFAULT_RATE_LIMIT_RATE: u32 = 100;

/// How job ids are minted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// `job_<millis>_<suffix>`
    Timestamp,
    /// `job_<uuid>`
    Uuid,
}

impl FromStr for IdStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(IdStrategy::Timestamp),
            "uuid" => Ok(IdStrategy::Uuid),
            other => Err(anyhow!("unknown id strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(anyhow!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub http: HttpServerConfig,
    pub id_strategy: IdStrategy,
    pub bus_capacity: usize,
    pub store_timeout: Option<Duration>,
    pub emit_timeout: Option<Duration>,
    /// 0 disables startup reconciliation
    pub reconcile_window_ms: i64,
    pub rate_limit_burst: u32,
    pub rate_limit_rate: u32,
    pub log_format: LogFormat,
}

impl DaemonConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("YTFLOW_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let defaults = HttpServerConfig::default();

        let config = Self {
            db_path: shellexpand::tilde(&db_path).into_owned(),
            http: HttpServerConfig {
                host: lookup("YTFLOW_HTTP_HOST").unwrap_or(defaults.host),
                port: parse_or(&lookup, "YTFLOW_HTTP_PORT", defaults.port)?,
            },
            id_strategy: parse_or(&lookup, "YTFLOW_ID_STRATEGY", IdStrategy::Timestamp)?,
            bus_capacity: parse_or(&lookup, "YTFLOW_BUS_CAPACITY", DEFAULT_BUS_CAPACITY)?,
            store_timeout: parse_opt::<u64, _>(&lookup, "YTFLOW_STORE_TIMEOUT_MS")?
                .map(Duration::from_millis),
            emit_timeout: parse_opt::<u64, _>(&lookup, "YTFLOW_EMIT_TIMEOUT_MS")?
                .map(Duration::from_millis),
            reconcile_window_ms: parse_or(
                &lookup,
                "YTFLOW_RECONCILE_WINDOW_MS",
                DEFAULT_RECONCILE_WINDOW_MS,
            )?,
            rate_limit_burst: parse_or(&lookup, "YTFLOW_RATE_LIMIT_BURST", DEFAULT_RATE_LIMIT_BURST)?,
            rate_limit_rate: parse_or(&lookup, "YTFLOW_RATE_LIMIT_RATE", DEFAULT_RATE_LIMIT_RATE)?,
            log_format: parse_or(&lookup, "YTFLOW_LOG_FORMAT", LogFormat::Pretty)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.bus_capacity == 0 {
            return Err(anyhow!("YTFLOW_BUS_CAPACITY must be greater than 0"));
        }
        if self.reconcile_window_ms < 0 {
            return Err(anyhow!("YTFLOW_RECONCILE_WINDOW_MS must not be negative"));
        }
        if self.store_timeout == Some(Duration::ZERO) || self.emit_timeout == Some(Duration::ZERO)
        {
            return Err(anyhow!("step timeouts must be greater than 0 when set"));
        }
        Ok(())
    }

    /// sqlx connection string for `db_path`
    pub fn database_url(&self) -> String {
        if self.db_path.starts_with("sqlite:") {
            self.db_path.clone()
        } else {
            format!("sqlite://{}", self.db_path)
        }
    }

    /// Directory that has to exist before the database file can be created
    pub fn db_dir(&self) -> Option<&Path> {
        if self.db_path.starts_with("sqlite:") {
            return None;
        }
        Path::new(&self.db_path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    pub fn reconcile_enabled(&self) -> bool {
        self.reconcile_window_ms > 0
    }
}

fn parse_opt<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: '{}'", key, raw)),
        _ => Ok(None),
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}
