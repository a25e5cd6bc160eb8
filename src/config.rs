use crate::error::{GestionaleError, GestionaleResult};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8001";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Config {
    pub fn from_env() -> GestionaleResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> GestionaleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("GESTIONALE_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                tracing::debug!("GESTIONALE_API_URL not set, using {}", DEFAULT_API_URL);
                DEFAULT_API_URL.to_string()
            });
        let api_url = api_url.trim().trim_end_matches('/').to_string();

        let session_file = lookup("GESTIONALE_SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_session_file);

        let timeout = parse_secs(
            &lookup,
            "GESTIONALE_HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?;
        let connect_timeout = parse_secs(
            &lookup,
            "GESTIONALE_HTTP_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;

        Ok(Config {
            api_url,
            session_file,
            timeout,
            connect_timeout,
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> GestionaleResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| GestionaleError::Config(format!("{} must be a number of seconds: {}", key, e))),
        None => Ok(Duration::from_secs(default)),
    }
}

pub fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("com.gestionale").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("./data/config/session.json"))
}
