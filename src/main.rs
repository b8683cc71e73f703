mod auth;
mod cache;
mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod fixtures;
mod images;
mod models;
mod routes;
mod slug;
mod templates;
#[cfg(test)]
mod testing;
mod votes;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use sea_orm::DatabaseConnection;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    auth::Accounts, cache::CacheManager, catalog::Catalog, config::Config, images::ImageStore,
    votes::VoteStore,
};

/// Multipart framing on top of the file itself.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

pub struct AppState {
    pub catalog: Catalog,
    pub votes: VoteStore,
    pub images: ImageStore,
    pub cache: CacheManager,
    pub accounts: Accounts,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: &Config, db: DatabaseConnection) -> anyhow::Result<Self> {
        let cookie_key = match &config.secret_key {
            Some(secret) => Key::try_from(secret.as_bytes())
                .context("SECRET_KEY must be at least 64 bytes long")?,
            None => {
                tracing::warn!("SECRET_KEY not set, sessions will not survive a restart");
                Key::generate()
            }
        };

        Ok(Self {
            catalog: Catalog::new(db.clone()),
            votes: VoteStore::new(db.clone()),
            images: ImageStore::new(db.clone(), &config.media_root, config.max_upload_bytes),
            cache: CacheManager::new(db.clone(), config.top_movies_cache_ttl_secs),
            accounts: Accounts::new(db),
            cookie_key,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let media = ServeDir::new(state.images.root());
    let upload_limit = DefaultBodyLimit::max(state.images.max_bytes() + UPLOAD_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(routes::index))
        .route("/movies/", get(routes::movie_list))
        .route("/movies/top", get(routes::top_movies))
        .route("/movie/{id}/", get(routes::movie_detail))
        .route("/movie/{movie_id}/vote/", post(routes::create_vote))
        .route("/movie/{movie_id}/vote/{id}/", post(routes::update_vote))
        .route("/movie/{movie_id}/image/upload", post(routes::upload_image).layer(upload_limit))
        .route("/person/{id}/", get(routes::person_detail))
        .route("/accounts/login", get(routes::login_form).post(routes::login))
        .route("/accounts/logout", post(routes::logout))
        .route("/accounts/register", get(routes::register_form).post(routes::register))
        .nest_service("/media", media)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,movies=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let state = Arc::new(AppState::new(&config, db)?);

    if let Some(path) = &config.fixtures_path {
        fixtures::load_file(&state.catalog, path).await?;
    }

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, media = %config.media_root.display(), "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
