use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::auth::AppState;
use crate::session;

/// The user id carried by the request's session token, if any. Inserted into
/// request extensions by [`load_session`]; `None` is an anonymous request.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser(pub Option<i64>);

/// Read and verify the session cookie on every request. Never rejects:
/// a missing, malformed or tampered token simply reads as anonymous.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let user_id = jar
        .get(session::SESSION_COOKIE)
        .and_then(|cookie| session::read_token(&state.jwt_secret, cookie.value()));

    req.extensions_mut().insert(SessionUser(user_id));
    next.run(req).await
}
