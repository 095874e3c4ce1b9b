use rusqlite::{Connection, OptionalExtension};

use crate::StoreError;
use crate::models::{PostRow, UserRow};

// -- Users --

/// Insert a new user and return its storage-assigned id.
///
/// Uniqueness of `username` is enforced by the UNIQUE constraint rather than
/// a lookup before the insert, so two concurrent registrations cannot race
/// past each other: exactly one commits, the other observes `Conflict`.
pub fn create_user(
    conn: &mut Connection,
    username: &str,
    password_hash: &str,
) -> Result<i64, StoreError> {
    let tx = conn.transaction()?;
    match tx.execute(
        "INSERT INTO users (username, password) VALUES (?1, ?2)",
        (username, password_hash),
    ) {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => return Err(StoreError::Conflict),
        Err(err) => return Err(err.into()),
    }
    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(id)
}

pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserRow>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

pub fn find_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

// -- Posts --

/// List all posts, newest first. JOIN users to fetch the author's username
/// in a single query (eliminates N+1).
pub fn list_posts(conn: &Connection) -> Result<Vec<PostRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.author_id, u.username, p.title, p.body, p.created_at
         FROM posts p
         JOIN users u ON p.author_id = u.id
         ORDER BY p.created_at DESC, p.id DESC",
    )?;

    let rows = stmt
        .query_map([], map_post_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn get_post(conn: &Connection, id: i64) -> Result<Option<PostRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.author_id, u.username, p.title, p.body, p.created_at
         FROM posts p
         JOIN users u ON p.author_id = u.id
         WHERE p.id = ?1",
    )?;

    let row = stmt.query_row([id], map_post_row).optional()?;

    Ok(row)
}

pub fn create_post(
    conn: &mut Connection,
    author_id: i64,
    title: &str,
    body: &str,
) -> Result<i64, StoreError> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO posts (author_id, title, body) VALUES (?1, ?2, ?3)",
        (author_id, title, body),
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(id)
}

pub fn update_post(
    conn: &mut Connection,
    id: i64,
    title: &str,
    body: &str,
) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    let changed = tx.execute(
        "UPDATE posts SET title = ?1, body = ?2 WHERE id = ?3",
        (title, body, id),
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound);
    }
    tx.commit()?;
    Ok(())
}

pub fn delete_post(conn: &mut Connection, id: i64) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    let changed = tx.execute("DELETE FROM posts WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(StoreError::NotFound);
    }
    tx.commit()?;
    Ok(())
}

fn map_post_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
