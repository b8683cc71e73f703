use std::{path::Path, sync::Arc};

use axum::{http::header::SET_COOKIE, response::IntoResponse};
use axum_extra::extract::cookie::SignedCookieJar;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::{
    AppState, auth,
    catalog::Catalog,
    config::Config,
    entities::{person, user, vote},
    models::{MovieInput, PersonInput, Rating},
};

pub async fn test_db() -> DatabaseConnection {
    crate::db::connect_and_migrate("sqlite::memory:").await.unwrap()
}

pub fn test_config(media_root: &Path) -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        media_root: media_root.to_path_buf(),
        secret_key: None,
        top_movies_cache_ttl_secs: 0,
        max_upload_bytes: 64 * 1024,
        fixtures_path: None,
    }
}

pub async fn test_state(media_root: &Path) -> (Arc<AppState>, DatabaseConnection) {
    let db = test_db().await;
    let state = AppState::new(&test_config(media_root), db.clone()).unwrap();
    (Arc::new(state), db)
}

/// `Cookie` header value of a logged-in session for `user_id`.
pub fn session_cookie(state: &AppState, user_id: i32) -> String {
    let jar = auth::login_session(SignedCookieJar::new(state.cookie_key.clone()), user_id);
    let resp = (jar, ()).into_response();
    let set_cookie = resp.headers()[SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub fn movie_input(title: &str, year: i32) -> MovieInput {
    MovieInput {
        title: title.to_string(),
        plot: String::new(),
        year,
        rating: Rating::NotRated,
        runtime: 100,
        website: None,
        director_id: None,
    }
}

pub async fn person(catalog: &Catalog, first_name: &str, last_name: &str) -> person::Model {
    let input = PersonInput {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        born: jiff::civil::date(1950, 1, 1),
        died: None,
    };
    catalog.create_person(&input).await.unwrap()
}

/// Inserts a user without hashing a real password.
pub async fn user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        id: Default::default(),
        username: Set(username.to_string()),
        password_hash: Set("!".to_string()),
        joined: Set(0),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn vote(db: &DatabaseConnection, user_id: i32, movie_id: i32, value: i16) -> vote::Model {
    vote::ActiveModel {
        id: Default::default(),
        value: Set(value),
        user_id: Set(user_id),
        movie_id: Set(movie_id),
        voted_on: Set(0),
    }
    .insert(db)
    .await
    .unwrap()
}

/// A valid 2x2 PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 30, 30]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
