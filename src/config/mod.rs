use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::time::Duration;

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8989/login";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_LOG_FILE: &str = "/tmp/melodot.log";
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub redis_url: String,
    pub cache_ttl: Duration,
    pub log_file: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok(); // .env is optional, plain env vars work too

        let cache_ttl_secs = match std::env::var("MELODOT_CACHE_TTL_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("MELODOT_CACHE_TTL_SECS is not a number: {raw:?}"))?,
            Err(_) => DEFAULT_CACHE_TTL_SECS,
        };

        Ok(Config {
            client_id: std::env::var("SPOTIFY_CLIENT_ID")
                .context("SPOTIFY_CLIENT_ID is missing from .env or environment")?,
            client_secret: std::env::var("SPOTIFY_CLIENT_SECRET")
                .context("SPOTIFY_CLIENT_SECRET is missing from .env or environment")?,
            redirect_uri: std::env::var("SPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string()),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            log_file: std::env::var("MELODOT_LOG_FILE")
                .unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string()),
        })
    }

    /// Address the OAuth redirect listener binds, taken from the redirect URI.
    pub fn redirect_bind_addr(&self) -> String {
        let without_scheme = self
            .redirect_uri
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.redirect_uri);
        let authority = without_scheme.split('/').next().unwrap_or(without_scheme);
        if authority.contains(':') {
            authority.to_string()
        } else {
            format!("{authority}:80")
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
