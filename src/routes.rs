use std::sync::Arc;

use axum::{
    extract::{Form, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    AppState,
    auth::{self, CurrentUser, RequireUser},
    error::{AppError, AppResult},
    models::{PageNumber, VoteValue},
    templates,
};

fn movie_url(movie_id: i32) -> String {
    format!("/movie/{movie_id}/")
}

pub async fn index() -> Redirect {
    Redirect::to("/movies/")
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

pub async fn movie_list(
    State(state): State<Arc<AppState>>,
    CurrentUser(viewer): CurrentUser,
    Query(q): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let page = PageNumber::parse(q.page.as_deref())
        .ok_or_else(|| AppError::not_found(format!("page {}", q.page.as_deref().unwrap_or_default())))?;
    let page = state.catalog.list_movies(page).await?;
    Ok(Html(templates::movie_list_page(&page, viewer.as_ref())))
}

pub async fn top_movies(
    State(state): State<Arc<AppState>>,
    CurrentUser(viewer): CurrentUser,
) -> AppResult<Html<String>> {
    let top = state.cache.top_movies(&state.catalog).await?;
    Ok(Html(templates::top_movies_page(&top, viewer.as_ref())))
}

pub async fn movie_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    CurrentUser(viewer): CurrentUser,
) -> AppResult<Html<String>> {
    let detail = state.catalog.movie_detail(id).await?;
    let vote = match &viewer {
        Some(user) => Some(state.votes.vote_or_blank(id, user.id).await?),
        None => None,
    };
    Ok(Html(templates::movie_detail_page(&detail, viewer.as_ref(), vote.as_ref())))
}

pub async fn person_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    CurrentUser(viewer): CurrentUser,
) -> AppResult<Html<String>> {
    let detail = state.catalog.person_detail(id).await?;
    Ok(Html(templates::person_detail_page(&detail, viewer.as_ref())))
}

#[derive(Debug, Deserialize)]
pub struct VoteForm {
    #[serde(default)]
    value: String,
}

pub async fn create_vote(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i32>,
    RequireUser(user): RequireUser,
    Form(form): Form<VoteForm>,
) -> AppResult<Redirect> {
    state.catalog.get_movie(movie_id).await?;
    match VoteValue::parse_form(&form.value) {
        Some(value) => {
            state.votes.create(user.id, movie_id, value).await?;
        }
        None => tracing::warn!(movie_id, user = user.id, value = %form.value, "invalid vote value"),
    }
    Ok(Redirect::to(&movie_url(movie_id)))
}

pub async fn update_vote(
    State(state): State<Arc<AppState>>,
    Path((movie_id, vote_id)): Path<(i32, i32)>,
    RequireUser(user): RequireUser,
    Form(form): Form<VoteForm>,
) -> AppResult<Redirect> {
    let vote = state.votes.get_owned(vote_id, movie_id, user.id).await?;
    match VoteValue::parse_form(&form.value) {
        Some(value) => {
            state.votes.set_value(vote, value).await?;
        }
        None => tracing::warn!(movie_id, vote_id, user = user.id, value = %form.value, "invalid vote value"),
    }
    Ok(Redirect::to(&movie_url(movie_id)))
}

pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i32>,
    RequireUser(user): RequireUser,
    mut multipart: Multipart,
) -> AppResult<Redirect> {
    state.catalog.get_movie(movie_id).await?;

    let upload = async {
        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some("image") {
                continue;
            }
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            return Ok(Some((file_name, data)));
        }
        Ok::<_, axum::extract::multipart::MultipartError>(None)
    }
    .await;

    match upload {
        Ok(Some((file_name, data))) => {
            match state.images.store(movie_id, user.id, &file_name, &data).await {
                Ok(_) => {}
                Err(AppError::Validation(reason)) => {
                    tracing::warn!(movie_id, user = user.id, %reason, "rejected image upload")
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None) => tracing::warn!(movie_id, user = user.id, "upload without image field"),
        Err(err) => tracing::warn!(movie_id, user = user.id, error = %err, "unreadable upload"),
    }

    Ok(Redirect::to(&movie_url(movie_id)))
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

pub async fn login_form(Query(q): Query<NextQuery>) -> Html<String> {
    let next = auth::safe_next(q.next.as_deref());
    Html(templates::login_page(&next, None))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let next = auth::safe_next(q.next.as_deref());
    let Some(user) = state.accounts.authenticate(&form.username, &form.password).await? else {
        tracing::info!(username = %form.username, "failed login");
        let body = templates::login_page(&next, Some("Invalid username or password."));
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response());
    };

    let jar = auth::login_session(auth::session_jar(&headers, &state.cookie_key), user.id);
    tracing::info!(user = user.id, "logged in");
    Ok((jar, Redirect::to(&next)).into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let jar = auth::logout_session(auth::session_jar(&headers, &state.cookie_key));
    (jar, Redirect::to("/movies/"))
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    username: String,
    password: String,
    confirm: String,
}

pub async fn register_form() -> Html<String> {
    Html(templates::register_page(None))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    match state.accounts.register(&form.username, &form.password, &form.confirm).await {
        Ok(user) => {
            let jar = auth::login_session(auth::session_jar(&headers, &state.cookie_key), user.id);
            Ok((jar, Redirect::to("/movies/")).into_response())
        }
        Err(err @ AppError::Validation(_)) => {
            let body = templates::register_page(Some(&err.to_string()));
            Ok((err.status(), Html(body)).into_response())
        }
        Err(err) => Err(err),
    }
}
