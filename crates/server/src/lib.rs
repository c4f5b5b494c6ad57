//! A session-driven quiz and study-topic picker behind Google sign-in.
//!
//! Visitors take a short quiz, sign in through an OpenID Connect provider and
//! then pick a subject and a topic. All per-visitor state lives in one
//! encrypted cookie; everything shared between requests is read-only.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use time::Duration;

use crate::catalog::Catalog;
use crate::config::{AppConfig, ConfigError, MIN_SESSION_SECRET_LEN};
use crate::oidc::IdentityProvider;
use crate::quiz::Quiz;
use crate::session::SessionSettings;

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http_client;
pub mod navigation;
pub mod oidc;
pub mod quiz;
pub mod session;
pub mod templates;

/// Shared, read-only state handed to every handler.
pub struct AppState<P> {
    pub config: Arc<AppConfig>,
    pub quiz: Arc<Quiz>,
    pub catalog: Arc<Catalog>,
    pub provider: Arc<P>,
    cookie_key: Key,
    session_settings: SessionSettings,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            quiz: self.quiz.clone(),
            catalog: self.catalog.clone(),
            provider: self.provider.clone(),
            cookie_key: self.cookie_key.clone(),
            session_settings: self.session_settings.clone(),
        }
    }
}

impl<P: IdentityProvider> AppState<P> {
    pub fn new(config: AppConfig, provider: P) -> Result<Self, ConfigError> {
        Self::with_content(config, provider, Quiz::general_knowledge(), Catalog::default())
    }

    pub fn with_content(
        config: AppConfig,
        provider: P,
        quiz: Quiz,
        catalog: Catalog,
    ) -> Result<Self, ConfigError> {
        if config.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Validation(format!(
                "session_secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
            )));
        }
        let cookie_key = Key::derive_from(config.session_secret.as_bytes());
        let session_settings = SessionSettings {
            max_age: Duration::seconds(config.session_max_age_secs),
            secure: config.session_cookie_secure,
        };
        Ok(Self {
            config: Arc::new(config),
            quiz: Arc::new(quiz),
            catalog: Arc::new(catalog),
            provider: Arc::new(provider),
            cookie_key,
            session_settings,
        })
    }

    pub fn cookie_key(&self) -> Key {
        self.cookie_key.clone()
    }

    pub fn session_settings(&self) -> SessionSettings {
        self.session_settings.clone()
    }
}

impl<P> FromRef<AppState<P>> for Key {
    fn from_ref(state: &AppState<P>) -> Self {
        state.cookie_key.clone()
    }
}

impl<P> FromRef<AppState<P>> for SessionSettings {
    fn from_ref(state: &AppState<P>) -> Self {
        state.session_settings.clone()
    }
}
