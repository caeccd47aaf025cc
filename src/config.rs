use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::core::client::conflict_retry::{
    ConflictRetryPolicy, DEFAULT_CONFLICT_ATTEMPTS, DEFAULT_CONFLICT_BACKOFF,
};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_KUBE_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Process configuration, read from `QBERT_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Deadline applied to each cluster call made for a request.
    pub request_timeout: Duration,
    pub conflict_retry: ConflictRetryPolicy,
    pub kube_connect_timeout: Duration,
    /// When set, logs are also written to a daily rolling file here.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_or(&lookup, "QBERT_BIND_ADDR", || {
            SocketAddr::from_str(DEFAULT_BIND_ADDR).context("invalid default bind address")
        })?;

        let request_timeout_secs: u64 = parse_or(&lookup, "QBERT_REQUEST_TIMEOUT_SECS", || {
            Ok(DEFAULT_REQUEST_TIMEOUT_SECS)
        })?;
        if request_timeout_secs == 0 {
            return Err(anyhow!("QBERT_REQUEST_TIMEOUT_SECS must be greater than zero"));
        }

        let max_attempts: u32 =
            parse_or(&lookup, "QBERT_CONFLICT_RETRIES", || Ok(DEFAULT_CONFLICT_ATTEMPTS))?;
        if max_attempts == 0 {
            return Err(anyhow!("QBERT_CONFLICT_RETRIES must be at least 1"));
        }

        let backoff_ms: u64 = parse_or(&lookup, "QBERT_CONFLICT_BACKOFF_MS", || {
            Ok(DEFAULT_CONFLICT_BACKOFF.as_millis() as u64)
        })?;

        let kube_connect_timeout_secs: u64 =
            parse_or(&lookup, "QBERT_KUBE_CONNECT_TIMEOUT_SECS", || {
                Ok(DEFAULT_KUBE_CONNECT_TIMEOUT_SECS)
            })?;

        let log_dir = lookup("QBERT_LOG_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            request_timeout: Duration::from_secs(request_timeout_secs),
            conflict_retry: ConflictRetryPolicy::new(
                max_attempts,
                Duration::from_millis(backoff_ms),
            ),
            kube_connect_timeout: Duration::from_secs(kube_connect_timeout_secs),
            log_dir,
        })
    }
}

fn parse_or<T, F, D>(lookup: &F, key: &str, default: D) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
    D: FnOnce() -> Result<T>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("invalid value '{}' for {}: {}", raw, key, e)),
        _ => default(),
    }
}
