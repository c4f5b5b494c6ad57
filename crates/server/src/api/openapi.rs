//! OpenAPI/Utoipa configuration.

use crate::api::{auth::AUTH_TAG, health::MISC_TAG, pages::PAGES_TAG};
use crate::session::SESSION_COOKIE;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

/// Documents the encrypted session cookie gated pages rely on.
pub struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "SessionCookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    SESSION_COOKIE,
                    "Encrypted session set by the sign-in callback.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SessionCookieAddon),
    info(
        title = "Quiz Portal",
        version = "1.0.0",
        description = "Quiz, Google sign-in and subject/topic selection pages."
    ),
    tags(
        (name = PAGES_TAG, description = "Quiz and study-selection pages"),
        (name = AUTH_TAG, description = "Sign-in through the identity provider"),
        (name = MISC_TAG, description = "Miscellaneous endpoints")
    )
)]
pub struct ApiDoc;
