//! OpenID Connect client side of the login flow.
//!
//! The handshake is split in two halves around the browser round trip to the
//! provider:
//!
//! - [`begin_login`] builds the authorization URL and the [`PendingLogin`]
//!   that the caller stores in the session.
//! - [`complete_login`] consumes that pending login, checks the callback
//!   parameters and asks the provider to exchange the code for claims.
//!
//! [`IdentityProvider`] is the seam between the two halves and the network.

mod pending;
mod provider;

pub use pending::{PENDING_LOGIN_TTL, PendingLogin, generate_token};
pub use provider::{OidcProvider, ProviderMetadata};

use crate::error::AuthError;
use serde::Deserialize;
use std::future::Future;
use time::OffsetDateTime;
use url::Url;
use utoipa::IntoParams;

/// Scopes requested from the provider.
pub const SCOPES: &str = "openid email profile";

/// Claims the application keeps from a validated ID token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
}

/// Everything needed to build the provider authorization URL.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest<'a> {
    pub redirect_uri: &'a str,
    pub state: &'a str,
    pub nonce: &'a str,
    pub code_challenge: &'a str,
}

/// Everything needed to redeem an authorization code.
#[derive(Clone, Debug)]
pub struct CodeExchange<'a> {
    pub code: &'a str,
    pub redirect_uri: &'a str,
    pub code_verifier: &'a str,
    pub nonce: &'a str,
}

/// Query parameters of the provider callback.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CallbackParams {
    /// Authorization code issued by the provider.
    pub code: Option<String>,
    /// Echo of the state sent with the authorization request.
    pub state: Option<String>,
    /// Error code when the provider refused the request.
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub trait IdentityProvider: Send + Sync + 'static {
    fn authorization_url(
        &self,
        request: &AuthorizationRequest<'_>,
    ) -> impl Future<Output = Result<Url, AuthError>> + Send;

    /// Redeem the code and return claims from a fully validated ID token.
    fn exchange_code(
        &self,
        exchange: &CodeExchange<'_>,
    ) -> impl Future<Output = Result<IdentityClaims, AuthError>> + Send;
}

/// Start a login: returns the URL to send the visitor to and the pending
/// login to store in their session.
#[tracing::instrument(skip(provider))]
pub async fn begin_login<P: IdentityProvider>(
    provider: &P,
    redirect_uri: &str,
    now: OffsetDateTime,
) -> Result<(Url, PendingLogin), AuthError> {
    let pending = PendingLogin::generate(now)?;
    let challenge = pending.code_challenge();
    let url = provider
        .authorization_url(&AuthorizationRequest {
            redirect_uri,
            state: &pending.state,
            nonce: &pending.nonce,
            code_challenge: &challenge,
        })
        .await?;
    Ok((url, pending))
}

/// Finish a login. `pending` must already be removed from the session so it
/// cannot be replayed, whatever the outcome.
#[tracing::instrument(skip(provider, pending, params))]
pub async fn complete_login<P: IdentityProvider>(
    provider: &P,
    pending: Option<PendingLogin>,
    params: &CallbackParams,
    redirect_uri: &str,
    now: OffsetDateTime,
) -> Result<IdentityClaims, AuthError> {
    if let Some(error) = &params.error {
        return Err(AuthError::Provider {
            error: error.clone(),
            description: params.error_description.clone(),
        });
    }
    let pending = pending.ok_or(AuthError::NoPendingLogin)?;
    if pending.is_expired(now) {
        return Err(AuthError::LoginExpired);
    }
    if params.state.as_deref() != Some(pending.state.as_str()) {
        return Err(AuthError::StateMismatch);
    }
    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(AuthError::MissingCode)?;

    provider
        .exchange_code(&CodeExchange {
            code,
            redirect_uri,
            code_verifier: &pending.code_verifier,
            nonce: &pending.nonce,
        })
        .await
}
