use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use quill_types::api::Claims;

pub const SESSION_COOKIE: &str = "session";

const SESSION_TTL_DAYS: i64 = 30;

/// Mint a signed session token binding the given user id.
pub fn create_token(secret: &str, user_id: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify a session token and extract its user id. Missing, malformed,
/// expired and tampered tokens all read as `None`, never an error.
pub fn read_token(secret: &str, token: &str) -> Option<i64> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.sub)
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// The logout instruction: a cookie matching the session cookie's name and
/// path, used to tell the client to drop its token.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_roundtrip() {
        let token = create_token(SECRET, 7).unwrap();
        assert_eq!(read_token(SECRET, &token), Some(7));
    }

    #[test]
    fn tampered_signature_reads_as_none() {
        let token = create_token(SECRET, 7).unwrap();

        // Flip the first character of the signature segment.
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.clone().into_bytes();
        bytes[sig_start] = if bytes[sig_start] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_ne!(token, tampered);
        assert_eq!(read_token(SECRET, &tampered), None);
    }

    #[test]
    fn wrong_secret_reads_as_none() {
        let token = create_token(SECRET, 7).unwrap();
        assert_eq!(read_token("other-secret", &token), None);
    }

    #[test]
    fn garbage_reads_as_none() {
        assert_eq!(read_token(SECRET, ""), None);
        assert_eq!(read_token(SECRET, "not.a.jwt"), None);
    }
}
