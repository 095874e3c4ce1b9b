use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use quill_db::models::PostRow;
use quill_db::queries;
use quill_types::api::{CreatePostRequest, PostResponse, UpdatePostRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::SessionUser;
use crate::run_blocking;
use crate::scope::{RequestScope, require_ownership};

/// Public: the post index needs no identity.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let rows = run_blocking(move || {
        let scope = RequestScope::begin(&state.db, session)?;
        Ok(queries::list_posts(&scope.conn)?)
    })
    .await?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<PostResponse>, ApiError> {
    let row = run_blocking(move || {
        let scope = RequestScope::begin(&state.db, session)?;
        queries::get_post(&scope.conn, id)?.ok_or(ApiError::NotFound)
    })
    .await?;

    Ok(Json(to_response(row)))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }

    let row = run_blocking(move || {
        let mut scope = RequestScope::begin(&state.db, session)?;
        let author_id = scope.identity.require()?.id;

        let id = queries::create_post(&mut scope.conn, author_id, &req.title, &req.body)?;
        queries::get_post(&scope.conn, id)?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("post {} missing after insert", id)))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(session): Extension<SessionUser>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    if req.title.is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }

    let row = run_blocking(move || {
        let mut scope = RequestScope::begin(&state.db, session)?;
        let user = scope.identity.require()?;

        let post = queries::get_post(&scope.conn, id)?.ok_or(ApiError::NotFound)?;
        require_ownership(post.author_id, user)?;

        queries::update_post(&mut scope.conn, id, &req.title, &req.body)?;
        queries::get_post(&scope.conn, id)?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("post {} missing after update", id)))
    })
    .await?;

    Ok(Json(to_response(row)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(session): Extension<SessionUser>,
) -> Result<StatusCode, ApiError> {
    run_blocking(move || {
        let mut scope = RequestScope::begin(&state.db, session)?;
        let user = scope.identity.require()?;

        let post = queries::get_post(&scope.conn, id)?.ok_or(ApiError::NotFound)?;
        require_ownership(post.author_id, user)?;

        queries::delete_post(&mut scope.conn, id)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_response(row: PostRow) -> PostResponse {
    let created = parse_created(&row.created_at, row.id);
    PostResponse {
        id: row.id,
        author_id: row.author_id,
        author_username: row.author_username,
        title: row.title,
        body: row.body,
        created,
    }
}

fn parse_created(raw: &str, post_id: i64) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("corrupt created_at '{}' on post {}: {}", raw, post_id, e);
            chrono::DateTime::default()
        })
}
