//! Sign-in endpoints.
//!
//! `/auth` is the login entry point every gated page falls back to. The
//! Google handshake runs through `/auth/google` and `/auth/google/callback`;
//! any failure lands the visitor back on `/auth` without a user in their
//! session.

use crate::{
    AppState,
    error::{AppError, AuthError},
    navigation::paths,
    oidc::{self, CallbackParams, IdentityProvider},
    session::{IdentityRecord, SessionJar},
    templates::{AuthTemplate, render},
};
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Redirect, Response},
};
use time::OffsetDateTime;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const AUTH_TAG: &str = "Authentication";

pub fn router<P: IdentityProvider>() -> OpenApiRouter<AppState<P>> {
    OpenApiRouter::new()
        .routes(routes!(auth_entry))
        .routes(routes!(google_login))
        .routes(routes!(google_callback))
}

#[tracing::instrument(skip(session))]
#[utoipa::path(
    get,
    path = "/auth",
    tag = AUTH_TAG,
    operation_id = "Login Entry",
    summary = "Login choice, or straight to the profile when already signed in",
    responses(
        (status = 200, description = "Login choice HTML", content_type = "text/html"),
        (status = 303, description = "Already signed in; redirect to `/profile`"),
    )
)]
async fn auth_entry(session: SessionJar) -> Result<Response, AppError> {
    if session.get().is_authenticated() {
        return Ok(Redirect::to(paths::PROFILE).into_response());
    }
    Ok(render(&AuthTemplate {
        login_url: paths::GOOGLE_LOGIN,
    })?
    .into_response())
}

#[tracing::instrument(skip(state, session))]
#[utoipa::path(
    get,
    path = "/auth/google",
    tag = AUTH_TAG,
    operation_id = "Begin Google Login",
    description = "Stores a fresh state, nonce and PKCE verifier in the session and redirects to the \
                   provider's authorization endpoint with scopes `openid email profile`.",
    responses(
        (status = 303, description = "Redirect to the identity provider, or back to `/auth` if it is unreachable"),
    )
)]
async fn google_login<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    session: SessionJar,
) -> Response {
    let callback_url = state.config.callback_url();
    match oidc::begin_login(state.provider.as_ref(), &callback_url, OffsetDateTime::now_utc()).await
    {
        Ok((url, pending)) => {
            let mut current = session.get();
            current.pending_login = Some(pending);
            (session.set(&current), Redirect::to(url.as_str())).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not start login");
            Redirect::to(paths::AUTH).into_response()
        }
    }
}

#[tracing::instrument(skip(state, session, params))]
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    tag = AUTH_TAG,
    operation_id = "Google Login Callback",
    params(CallbackParams),
    description = "Consumes the pending login, exchanges the code and validates the ID token. \
                   On success the user is stored in the session.",
    responses(
        (status = 303, description = "Redirect to `/profile` on success, `/auth` on any failure"),
    )
)]
async fn google_callback<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    session: SessionJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let mut current = session.get();
    let pending = current.pending_login.take();
    let outcome = match params {
        Ok(Query(params)) => {
            oidc::complete_login(
                state.provider.as_ref(),
                pending,
                &params,
                &state.config.callback_url(),
                OffsetDateTime::now_utc(),
            )
            .await
        }
        Err(rejection) => Err(AuthError::MalformedCallback(rejection.body_text())),
    };

    match outcome {
        Ok(claims) => {
            tracing::info!(user_id = %claims.sub, "User signed in");
            current.user = Some(IdentityRecord::from(claims));
            (session.set(&current), Redirect::to(paths::PROFILE)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "OAuth error");
            (session.set(&current), Redirect::to(paths::AUTH)).into_response()
        }
    }
}
