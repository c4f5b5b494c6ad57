//! Client-held session record.
//!
//! The whole session lives in one private cookie: the typed [`Session`] record
//! is wrapped with its issue time, serialized as JSON and encrypted with the
//! server key. A cookie that fails decryption, decoding or the age check is
//! treated as an empty session.

use crate::error::SessionError;
use crate::oidc::{IdentityClaims, PendingLogin};
use axum::{extract::FromRef, extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use time::{Duration, OffsetDateTime};

pub const SESSION_COOKIE: &str = "session";

/// The signed-in visitor, taken from the provider claims at callback time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<IdentityClaims> for IdentityRecord {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<IdentityRecord>,
    /// Question id to chosen option, exactly as submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_answers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_login: Option<PendingLogin>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        *self == Session::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Serialize)]
struct OutgoingToken<'a> {
    issued_at: i64,
    session: &'a Session,
}

#[derive(Deserialize)]
struct IncomingToken {
    issued_at: i64,
    session: Session,
}

/// Serialize a session into the cookie payload, stamped with `now`.
pub fn encode(session: &Session, now: OffsetDateTime) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutgoingToken {
        issued_at: now.unix_timestamp(),
        session,
    })
}

/// Parse a cookie payload, rejecting it once it is older than `max_age`.
pub fn decode(raw: &str, now: OffsetDateTime, max_age: Duration) -> Result<Session, SessionError> {
    let token: IncomingToken = serde_json::from_str(raw)?;
    if now.unix_timestamp() - token.issued_at > max_age.whole_seconds() {
        return Err(SessionError::Expired);
    }
    Ok(token.session)
}

/// Cookie attributes shared by every session write.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub max_age: Duration,
    pub secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_age: Duration::days(14),
            secure: false,
        }
    }
}

/// Request-scoped access to the session cookie.
///
/// Reads never fail; writes return the cookie jar to be sent with the response.
pub struct SessionJar {
    jar: PrivateCookieJar,
    settings: SessionSettings,
}

impl SessionJar {
    pub fn new(jar: PrivateCookieJar, settings: SessionSettings) -> Self {
        Self { jar, settings }
    }

    /// Build from raw request headers, e.g. to inspect a response cookie.
    pub fn from_headers(headers: &HeaderMap, key: Key, settings: SessionSettings) -> Self {
        Self::new(PrivateCookieJar::from_headers(headers, key), settings)
    }

    pub fn get(&self) -> Session {
        let Some(cookie) = self.jar.get(SESSION_COOKIE) else {
            return Session::default();
        };
        match decode(cookie.value(), OffsetDateTime::now_utc(), self.settings.max_age) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unusable session cookie");
                Session::default()
            }
        }
    }

    /// Replace the stored session. An empty record removes the cookie.
    pub fn set(self, session: &Session) -> PrivateCookieJar {
        if session.is_empty() {
            return self.clear();
        }
        match encode(session, OffsetDateTime::now_utc()) {
            Ok(value) => self.jar.add(
                Cookie::build((SESSION_COOKIE, value))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .secure(self.settings.secure)
                    .max_age(self.settings.max_age),
            ),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode session");
                self.jar
            }
        }
    }

    pub fn clear(self) -> PrivateCookieJar {
        self.jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }
}

impl<S> FromRequestParts<S> for SessionJar
where
    S: Send + Sync,
    Key: FromRef<S>,
    SessionSettings: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state).await?;
        Ok(Self::new(jar, SessionSettings::from_ref(state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in() -> Session {
        Session {
            user: Some(IdentityRecord {
                id: "123".into(),
                email: "a@b.com".into(),
                name: "A".into(),
            }),
            selected_subject: Some("math".into()),
            ..Session::default()
        }
    }

    fn test_key() -> Key {
        Key::derive_from(b"an-unit-test-secret-that-is-long-enough")
    }

    #[test]
    fn decode_reads_back_encoded_session() {
        let now = OffsetDateTime::now_utc();
        let raw = encode(&signed_in(), now).unwrap();
        let session = decode(&raw, now, Duration::days(1)).unwrap();
        assert_eq!(session, signed_in());
    }

    #[test]
    fn empty_fields_are_omitted_from_payload() {
        let raw = encode(&signed_in(), OffsetDateTime::now_utc()).unwrap();
        assert!(!raw.contains("selected_topic"));
        assert!(!raw.contains("pending_login"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = OffsetDateTime::now_utc() - Duration::days(3);
        let raw = encode(&signed_in(), issued).unwrap();
        let result = decode(&raw, OffsetDateTime::now_utc(), Duration::days(2));
        assert!(matches!(result, Err(SessionError::Expired)));
    }

    #[test]
    fn malformed_token_is_rejected() {
        let result = decode("{\"user\":", OffsetDateTime::now_utc(), Duration::days(1));
        assert!(matches!(result, Err(SessionError::Malformed(_))));
    }

    #[test]
    fn jar_round_trips_through_private_cookie() {
        let settings = SessionSettings::default();
        let jar = SessionJar::new(PrivateCookieJar::new(test_key()), settings.clone());
        let jar = jar.set(&signed_in());

        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(settings.max_age));
        assert_eq!(cookie.secure(), Some(false));

        let reader = SessionJar::new(jar, settings);
        assert_eq!(reader.get(), signed_in());
    }

    #[test]
    fn secure_setting_marks_cookie_secure() {
        let settings = SessionSettings {
            secure: true,
            max_age: Duration::hours(1),
        };
        let jar = SessionJar::new(PrivateCookieJar::new(test_key()), settings).set(&signed_in());

        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::hours(1)));
    }

    fn request_headers_from(jar: PrivateCookieJar) -> HeaderMap {
        use axum::response::IntoResponse;
        let response = jar.into_response();
        let set_cookie = response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        let cookie = Cookie::parse(set_cookie.to_string()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            format!("{}={}", cookie.name(), cookie.value()).parse().unwrap(),
        );
        headers
    }

    #[test]
    fn encrypted_cookie_is_readable_with_same_key_only() {
        let settings = SessionSettings::default();
        let written = SessionJar::new(PrivateCookieJar::new(test_key()), settings.clone())
            .set(&signed_in());
        let headers = request_headers_from(written);

        let reader = SessionJar::from_headers(&headers, test_key(), settings.clone());
        assert_eq!(reader.get(), signed_in());

        let other = Key::derive_from(b"a-completely-different-secret-value!!");
        let reader = SessionJar::from_headers(&headers, other, settings);
        assert!(reader.get().is_empty());
    }

    #[test]
    fn tampered_cookie_reads_as_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            format!("{SESSION_COOKIE}=bm90LWVuY3J5cHRlZA").parse().unwrap(),
        );
        let reader = SessionJar::from_headers(&headers, test_key(), SessionSettings::default());
        assert!(reader.get().is_empty());
    }

    #[test]
    fn setting_empty_session_removes_cookie() {
        let jar = SessionJar::new(PrivateCookieJar::new(test_key()), SessionSettings::default())
            .set(&Session::default());
        assert!(jar.get(SESSION_COOKIE).is_none());
    }
}
