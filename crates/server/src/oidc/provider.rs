//! Network-backed [`IdentityProvider`] for a standard OIDC issuer (Google).

use super::{AuthorizationRequest, CodeExchange, IdentityClaims, IdentityProvider, SCOPES};
use crate::config::AppConfig;
use crate::error::{AuthError, FetchError};
use crate::http_client::{HttpsClient, build_https_client, get_json, post_form};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio::time::Duration;
use url::Url;

/// The subset of the discovery document this client uses.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    nonce: Option<String>,
}

pub struct OidcProvider {
    client_id: String,
    client_secret: String,
    metadata_url: String,
    timeout: Duration,
    http: HttpsClient,
    /// Fetched on first use, read-only afterwards.
    metadata: OnceCell<ProviderMetadata>,
}

impl OidcProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        metadata_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            metadata_url: metadata_url.into(),
            timeout,
            http: build_https_client(),
            metadata: OnceCell::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_server_metadata_url.clone(),
            Duration::from_secs(config.provider_timeout_secs),
        )
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub async fn metadata(&self) -> Result<&ProviderMetadata, AuthError> {
        self.metadata
            .get_or_try_init(|| async {
                tracing::info!(url = %self.metadata_url, "Loading provider discovery document");
                get_json::<ProviderMetadata>(&self.http, &self.metadata_url, self.timeout)
                    .await
                    .map_err(|e| AuthError::Discovery(e.to_string()))
            })
            .await
    }

    async fn fetch_jwks(&self, metadata: &ProviderMetadata) -> Result<JwkSet, AuthError> {
        Ok(get_json::<JwkSet>(&self.http, &metadata.jwks_uri, self.timeout).await?)
    }

    /// Verify signature, issuer, audience, expiry and nonce of an ID token.
    pub fn validate_id_token(
        &self,
        id_token: &str,
        jwks: &JwkSet,
        issuer: &str,
        expected_nonce: &str,
    ) -> Result<IdentityClaims, AuthError> {
        let header = decode_header(id_token)?;
        if matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::InvalidIdToken(format!(
                "symmetric algorithm {:?} is not accepted",
                header.alg
            )));
        }

        let jwk = match header.kid.as_deref() {
            Some(kid) => jwks.find(kid),
            None => jwks.keys.first(),
        }
        .ok_or_else(|| AuthError::InvalidIdToken("no matching signing key".into()))?;
        let key = DecodingKey::from_jwk(jwk)?;

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[self.client_id.as_str()]);
        // Google issues tokens with and without the scheme in `iss`.
        validation.set_issuer(&[issuer, issuer.trim_start_matches("https://")]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<IdTokenClaims>(id_token, &key, &validation)?.claims;
        if claims.nonce.as_deref() != Some(expected_nonce) {
            return Err(AuthError::NonceMismatch);
        }
        let email = claims
            .email
            .ok_or_else(|| AuthError::InvalidIdToken("missing email claim".into()))?;

        Ok(IdentityClaims {
            sub: claims.sub,
            email,
            name: claims.name.unwrap_or_default(),
        })
    }
}

impl IdentityProvider for OidcProvider {
    async fn authorization_url(&self, request: &AuthorizationRequest<'_>) -> Result<Url, AuthError> {
        let metadata = self.metadata().await?;
        let mut url = Url::parse(&metadata.authorization_endpoint)
            .map_err(|e| AuthError::Discovery(format!("bad authorization_endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", request.redirect_uri)
            .append_pair("scope", SCOPES)
            .append_pair("state", request.state)
            .append_pair("nonce", request.nonce)
            .append_pair("code_challenge", request.code_challenge)
            .append_pair("code_challenge_method", "S256");
        Ok(url)
    }

    async fn exchange_code(&self, exchange: &CodeExchange<'_>) -> Result<IdentityClaims, AuthError> {
        let metadata = self.metadata().await?;
        let response = post_form(
            &self.http,
            &metadata.token_endpoint,
            &[
                ("grant_type", "authorization_code"),
                ("code", exchange.code),
                ("redirect_uri", exchange.redirect_uri),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("code_verifier", exchange.code_verifier),
            ],
            self.timeout,
        )
        .await?;

        if !response.status.is_success() {
            return Err(match response.json::<TokenErrorResponse>() {
                Ok(body) => AuthError::TokenExchange(match body.error_description {
                    Some(description) => format!("{}: {description}", body.error),
                    None => body.error,
                }),
                Err(_) => AuthError::Fetch(FetchError::Http {
                    status: response.status,
                    context: metadata.token_endpoint.clone(),
                }),
            });
        }

        let id_token = response
            .json::<TokenResponse>()?
            .id_token
            .ok_or_else(|| AuthError::TokenExchange("response has no id_token".into()))?;

        let jwks = self.fetch_jwks(metadata).await?;
        self.validate_id_token(&id_token, &jwks, &metadata.issuer, exchange.nonce)
    }
}
