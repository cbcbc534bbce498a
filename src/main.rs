use clap::Parser;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

use markezard::{
    auth::FirebaseTokenVerifier,
    config::Config,
    db::Database,
    services::{
        ads::{AdsRegistry, MetaAdsClient},
        gemini::GeminiClient,
        website::WebsiteService,
    },
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "markezard", version, about = "MarkezardAI API server")]
struct Args {
    /// Address to listen on, overrides SERVER_ADDRESS
    #[arg(long)]
    address: Option<String>,

    /// Database URL, overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(address) = args.address {
        config.server_address = address;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    config.validate()?;

    let db = Database::new(&config.database_url).await?;
    db.migrate().await?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .user_agent(concat!("markezard/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let verifier = FirebaseTokenVerifier::from_config(&config, http_client.clone());
    let gemini = GeminiClient::from_config(&config, http_client.clone());
    let meta = MetaAdsClient::from_config(&config, http_client.clone());
    let website = WebsiteService::from_config(&config, http_client);

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        verifier: Arc::new(verifier),
        gemini: Arc::new(gemini),
        ads: Arc::new(AdsRegistry::new(Arc::new(meta))),
        website: Arc::new(website),
    });

    let app = markezard::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    info!("Server starting on {}", config.server_address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
