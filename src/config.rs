use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub media_root: PathBuf,
    pub secret_key: Option<String>,
    /// Zero keeps cached entries until the version tag changes.
    pub top_movies_cache_ttl_secs: i64,
    pub max_upload_bytes: usize,
    pub fixtures_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movies.db?mode=rwc".to_string());

        let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()).into();

        let secret_key = std::env::var("SECRET_KEY").ok().filter(|s| !s.is_empty());

        let top_movies_cache_ttl_secs: i64 = std::env::var("TOP_MOVIES_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024);

        let fixtures_path = std::env::var("FIXTURES_PATH").ok().filter(|s| !s.is_empty()).map(Into::into);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            media_root,
            secret_key,
            top_movies_cache_ttl_secs,
            max_upload_bytes,
            fixtures_path,
        })
    }
}
