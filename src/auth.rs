use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::{
    AppState,
    entities::user,
    error::{AppError, AppResult},
};

pub const SESSION_COOKIE: &str = "movies_session";
const SESSION_DAYS: i64 = 14;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 150;

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

fn validate_username(username: &str) -> AppResult<()> {
    let len = username.chars().count();
    if !(3..=MAX_USERNAME_LEN).contains(&len) {
        return Err(AppError::Validation(format!(
            "username must be between 3 and {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
        return Err(AppError::Validation(
            "username may contain only letters, digits and @/./+/-/_".into(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct Accounts {
    db: DatabaseConnection,
}

impl Accounts {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: i32) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    pub async fn register(&self, username: &str, password: &str, confirm: &str) -> AppResult<user::Model> {
        let username = username.trim();
        validate_username(username)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must have at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if password != confirm {
            return Err(AppError::Validation("passwords do not match".into()));
        }
        if self.find_by_username(username).await?.is_some() {
            return Err(AppError::Validation(format!("username {username} is already taken")));
        }

        let model = user::ActiveModel {
            id: Default::default(),
            username: Set(username.to_string()),
            password_hash: Set(hash_password(password)?),
            joined: Set(jiff::Timestamp::now().as_second()),
        };
        let user = model.insert(&self.db).await?;
        tracing::info!(user = user.id, username = %user.username, "registered user");
        Ok(user)
    }

    /// The user with these credentials, if they match.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<user::Model>> {
        let user = self.find_by_username(username.trim()).await?;
        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }
}

pub fn login_session(jar: SignedCookieJar, user_id: i32) -> SignedCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, user_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_DAYS));
    jar.add(cookie)
}

pub fn logout_session(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub fn session_jar(headers: &HeaderMap, key: &Key) -> SignedCookieJar {
    SignedCookieJar::from_headers(headers, key.clone())
}

/// Only local absolute paths are accepted as a post-login target.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n.to_string(),
        _ => "/movies/".to_string(),
    }
}

/// Login redirect for a protected request; protected pages live under a movie,
/// so the user comes back to that movie's page.
fn login_redirect(path: &str) -> Redirect {
    let mut segments = path.trim_start_matches('/').split('/');
    let next = match (segments.next(), segments.next()) {
        (Some("movie"), Some(id)) if !id.is_empty() => format!("/movie/{id}/"),
        _ => "/movies/".to_string(),
    };
    Redirect::to(&format!("/accounts/login?next={}", urlencoding::encode(&next)))
}

async fn session_user(parts: &Parts, state: &AppState) -> AppResult<Option<user::Model>> {
    let jar = session_jar(&parts.headers, &state.cookie_key);
    let Some(user_id) = jar.get(SESSION_COOKIE).and_then(|c| c.value().parse::<i32>().ok()) else {
        return Ok(None);
    };
    state.accounts.get(user_id).await
}

/// The logged-in user, if any.
pub struct CurrentUser(pub Option<user::Model>);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(session_user(parts, state).await?))
    }
}

/// Rejects anonymous requests with a redirect to the login page.
pub struct RequireUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Ok(Some(user)) => Ok(RequireUser(user)),
            Ok(None) => Err(login_redirect(parts.uri.path()).into_response()),
            Err(err) => Err(err.into_response()),
        }
    }
}
