use quiz_portal::AppState;
use quiz_portal::api::start_webserver;
use quiz_portal::config::load_config;
use quiz_portal::oidc::OidcProvider;
use rustls::crypto;
use rustls::crypto::CryptoProvider;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "quiz_portal=info,tower_http=info,hyper=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    // A missing .env is fine; the environment may already be populated.
    let dotenv = dotenvy::dotenv();

    initialize_tracing();
    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    let config = load_config()?;

    CryptoProvider::install_default(crypto::aws_lc_rs::default_provider())
        .map_err(|_| color_eyre::eyre::eyre!("Failed to install crypto provider"))?;

    let provider = OidcProvider::from_config(&config);
    tracing::info!(
        port = config.port,
        public_url = %config.base_url(),
        secure_cookies = config.session_cookie_secure,
        "Starting server"
    );
    let state = AppState::new(config, provider)?;

    start_webserver(state).await?;
    Ok(())
}
