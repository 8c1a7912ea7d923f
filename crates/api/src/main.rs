//! Zephyr - OAuth2 session front-end
//!
//! `zephyr` serves the login flow; `zephyr write-template [PATH]` writes the
//! default location configuration and exits.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};
use zephyr_infra::config::write_template;
use zephyr_web::utils::logging::init_tracing;
use zephyr_web::{router, AppState, WebSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    init_tracing()?;

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => warn!(error = %e, "Could not load .env file"),
    }

    let settings = WebSettings::from_env()?;

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("write-template") {
        let path = args.next().map_or_else(|| settings.config_path.clone(), PathBuf::from);
        write_template(&path)?;
        info!(path = %path.display(), "Configuration template written");
        return Ok(());
    }

    let bind_addr = settings.bind_addr;
    let app = router(AppState::new(settings)?);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "Zephyr listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
