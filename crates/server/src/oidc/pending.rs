//! Correlation data carried in the session between the provider redirect and
//! the callback.

use crate::error::AuthError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

/// How long a visitor may take at the provider before the callback is refused.
pub const PENDING_LOGIN_TTL: Duration = Duration::minutes(10);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub state: String,
    pub nonce: String,
    /// PKCE verifier; only its S256 challenge leaves the server.
    pub code_verifier: String,
    pub created_at: i64,
}

impl PendingLogin {
    pub fn generate(now: OffsetDateTime) -> Result<Self, AuthError> {
        Ok(Self {
            state: generate_token()?,
            nonce: generate_token()?,
            code_verifier: generate_token()?,
            created_at: now.unix_timestamp(),
        })
    }

    /// `BASE64URL(SHA256(code_verifier))`, RFC 7636 section 4.2.
    pub fn code_challenge(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(self.code_verifier.as_bytes()))
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now.unix_timestamp() - self.created_at > PENDING_LOGIN_TTL.whole_seconds()
    }
}

/// 256 random bits, URL-safe base64 without padding (43 characters).
pub fn generate_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes).map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn challenge_matches_rfc7636_example() {
        let pending = PendingLogin {
            state: "s".into(),
            nonce: "n".into(),
            code_verifier: "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".into(),
            created_at: 0,
        };
        assert_eq!(
            pending.code_challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn pending_login_expires_after_ttl() {
        let now = OffsetDateTime::now_utc();
        let pending = PendingLogin::generate(now).unwrap();
        assert!(!pending.is_expired(now + Duration::minutes(9)));
        assert!(pending.is_expired(now + Duration::minutes(11)));
    }
}
