use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;
use url::Url;

/// Minimum length of the secret the session cookie key is derived from.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub google_client_id: String,
    pub google_client_secret: String,
    /// Master secret for the session cookie key. Must be at least 32 bytes.
    pub session_secret: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    /// Externally visible base URL, used to build the provider callback URL.
    /// Defaults to `http://localhost:{port}`.
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default = "default_server_metadata_url")]
    pub google_server_metadata_url: String,
    #[serde(default = "default_session_max_age_secs")]
    pub session_max_age_secs: i64,
    #[serde(default)]
    pub session_cookie_secure: bool,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,
}

impl AppConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    pub fn callback_url(&self) -> String {
        format!("{}/auth/google/callback", self.base_url())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Validation(format!(
                "session_secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
            )));
        }
        if self.google_client_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "google_client_id must not be empty".into(),
            ));
        }
        if self.google_client_secret.trim().is_empty() {
            return Err(ConfigError::Validation(
                "google_client_secret must not be empty".into(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::Validation("port must be > 0".into()));
        }
        if self.session_max_age_secs <= 0 {
            return Err(ConfigError::Validation(
                "session_max_age_secs must be > 0".into(),
            ));
        }
        if let Some(url) = &self.public_url {
            Url::parse(url)
                .map_err(|e| ConfigError::Validation(format!("public_url is invalid: {e}")))?;
        }
        Url::parse(&self.google_server_metadata_url).map_err(|e| {
            ConfigError::Validation(format!("google_server_metadata_url is invalid: {e}"))
        })?;
        Ok(())
    }
}

fn default_port() -> u16 {
    8000
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_server_metadata_url() -> String {
    "https://accounts.google.com/.well-known/openid-configuration".to_string()
}

fn default_session_max_age_secs() -> i64 {
    14 * 24 * 60 * 60
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    10
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// The file is optional. Every key can be set from an environment variable of
/// the same name in upper case (e.g. `GOOGLE_CLIENT_ID`, `SESSION_SECRET`,
/// `PORT`). Call `dotenvy::dotenv()` first to pick up a `.env` file.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from("config.yaml")
}

pub fn load_config_from(path: &str) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(Environment::default().try_parsing(true))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig {
            google_client_id: "client".into(),
            google_client_secret: "secret".into(),
            session_secret: "0123456789abcdef0123456789abcdef".into(),
            port: 8000,
            bind_address: default_bind_address(),
            public_url: None,
            google_server_metadata_url: default_server_metadata_url(),
            session_max_age_secs: default_session_max_age_secs(),
            session_cookie_secure: false,
            static_dir: default_static_dir(),
            provider_timeout_secs: 10,
        }
    }

    #[test]
    fn callback_url_defaults_to_localhost_port() {
        let cfg = base();
        assert_eq!(cfg.callback_url(), "http://localhost:8000/auth/google/callback");
    }

    #[test]
    fn callback_url_trims_trailing_slash() {
        let mut cfg = base();
        cfg.public_url = Some("https://quiz.example.org/".into());
        assert_eq!(
            cfg.callback_url(),
            "https://quiz.example.org/auth/google/callback"
        );
    }

    #[test]
    fn short_session_secret_is_rejected() {
        let mut cfg = base();
        cfg.session_secret = "too-short".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_client_id_is_rejected() {
        let mut cfg = base();
        cfg.google_client_id = "  ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_public_url_is_rejected() {
        let mut cfg = base();
        cfg.public_url = Some("not a url".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn listen_addr_uses_bind_address_and_port() {
        let cfg = base();
        assert_eq!(cfg.listen_addr().to_string(), "0.0.0.0:8000");
    }
}
