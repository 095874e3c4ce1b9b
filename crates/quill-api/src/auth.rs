use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use tracing::info;

use quill_db::{Database, StoreError, queries};
use quill_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::middleware::SessionUser;
use crate::password;
use crate::run_blocking;
use crate::scope::RequestScope;
use crate::session;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("password is required".into()));
    }

    let username = req.username.clone();
    let user_id = run_blocking(move || {
        let mut scope = RequestScope::begin(&state.db, session)?;

        let password_hash = password::hash(&req.password)?;

        // Uniqueness rides on the storage constraint; no lookup-then-insert.
        match queries::create_user(&mut scope.conn, &req.username, &password_hash) {
            Ok(id) => Ok(id),
            Err(StoreError::Conflict) => Err(ApiError::Conflict(format!(
                "username {} is already taken",
                req.username
            ))),
            Err(other) => Err(other.into()),
        }
    })
    .await?;

    info!(user_id, "registered user {}", username);
    Ok((StatusCode::CREATED, Json(RegisterResponse { id: user_id })))
}

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (token, body) = run_blocking(move || {
        let scope = RequestScope::begin(&state.db, session)?;

        let user = queries::find_user_by_username(&scope.conn, &req.username)?
            .ok_or(ApiError::InvalidCredentials)?;

        if !password::verify(&req.password, &user.password) {
            return Err(ApiError::InvalidCredentials);
        }

        let token = session::create_token(&state.jwt_secret, user.id)?;
        let body = LoginResponse {
            id: user.id,
            username: user.username,
        };
        Ok((token, body))
    })
    .await?;

    info!(user_id = body.id, "user {} logged in", body.username);
    Ok((jar.add(session::session_cookie(token)), Json(body)))
}

/// Logout carries no server-side state to tear down; the response simply
/// instructs the client to drop its session cookie.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(session::removal_cookie()), StatusCode::NO_CONTENT)
}
