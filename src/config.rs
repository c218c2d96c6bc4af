use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Startup configuration. Read once, then handed to the components that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_base_url: String,
    pub tmdb_api_key: String,
    pub bind_addr: SocketAddr,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("Missing required environment variable: {}", key))
        };

        let tmdb_base_url = required("TMDB_BASE_URL")?;
        if !tmdb_base_url.starts_with("http://") && !tmdb_base_url.starts_with("https://") {
            bail!("TMDB_BASE_URL must be an http(s) URL, got '{}'", tmdb_base_url);
        }
        let tmdb_api_key = required("TMDB_API_KEY")?;

        let bind_addr = lookup("BIND_ADDR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .trim()
            .parse()
            .with_context(|| format!("BIND_ADDR is not a valid socket address: '{}'", bind_addr))?;

        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().with_context(|| {
                    format!("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds, got '{}'", raw)
                })?;
                if secs == 0 {
                    bail!("UPSTREAM_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        Ok(Self {
            tmdb_base_url,
            tmdb_api_key,
            bind_addr,
            upstream_timeout,
        })
    }
}
