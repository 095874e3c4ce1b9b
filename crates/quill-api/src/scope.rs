use quill_db::{Database, DbConn, queries};
use quill_db::models::UserRow;

use crate::error::ApiError;
use crate::middleware::SessionUser;

/// The identity resolved for the current request: either a loaded user row
/// or anonymous. Bound once per request by [`RequestScope::begin`].
pub enum Identity {
    Anonymous,
    User(UserRow),
}

impl Identity {
    /// Authorization guard for operations that need a logged-in user.
    pub fn require(&self) -> Result<&UserRow, ApiError> {
        match self {
            Identity::User(user) => Ok(user),
            Identity::Anonymous => Err(ApiError::Unauthenticated),
        }
    }
}

/// Ownership guard: only a resource's owner may mutate it.
pub fn require_ownership(owner_id: i64, user: &UserRow) -> Result<(), ApiError> {
    if owner_id != user.id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// Per-request context: one storage connection plus the identity resolved
/// from the session token. Built at the top of every handler and threaded
/// through the operations; the connection returns to the pool when the scope
/// drops, whichever way the request ends.
pub struct RequestScope {
    pub conn: DbConn,
    pub identity: Identity,
}

impl RequestScope {
    pub fn begin(db: &Database, session: SessionUser) -> Result<Self, ApiError> {
        let conn = db.acquire()?;

        let identity = match session.0 {
            Some(user_id) => match queries::find_user_by_id(&conn, user_id)? {
                Some(user) => Identity::User(user),
                // The token outlived its account; treat as never logged in.
                None => Identity::Anonymous,
            },
            None => Identity::Anonymous,
        };

        Ok(Self { conn, identity })
    }
}
