use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use registration_core::{
    CachedCatalog, CatalogConfig, CatalogError, InMemoryPaymentLedger, InMemoryRegistrationStore,
    PayPalConfig, PayPalGateway, RazorpayConfig, RazorpayGateway, ReconciliationCoordinator,
    SandboxGateway,
};
use registration_server::config::ServerConfig;
use registration_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let catalog = Arc::new(CachedCatalog::new(
        catalog_source(config.catalog_path.clone()),
        config.catalog_ttl,
    ));
    // Fail fast on an invalid catalog instead of at the first request.
    catalog
        .get()
        .context("initial catalog load failed")?;

    let mut coordinator = ReconciliationCoordinator::new(
        Arc::new(InMemoryRegistrationStore::new()),
        Arc::new(InMemoryPaymentLedger::new()),
    )
    .with_gateway(Arc::new(SandboxGateway::new()));

    if let Some(creds) = &config.paypal {
        let mut gw = PayPalConfig::new(&creds.id, &creds.secret);
        if let Some(url) = &creds.base_url {
            gw = gw.with_base_url(url);
        }
        coordinator = coordinator.with_gateway(Arc::new(
            PayPalGateway::new(gw).context("building PayPal client")?,
        ));
        info!("paypal gateway registered");
    }
    if let Some(creds) = &config.razorpay {
        let mut gw = RazorpayConfig::new(&creds.id, &creds.secret);
        if let Some(url) = &creds.base_url {
            gw = gw.with_base_url(url);
        }
        coordinator = coordinator.with_gateway(Arc::new(
            RazorpayGateway::new(gw).context("building Razorpay client")?,
        ));
        info!("razorpay gateway registered");
    }

    let state = AppState {
        coordinator: Arc::new(coordinator),
        catalog,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "registration server listening");

    axum::serve(listener, registration_server::app(state))
        .await
        .context("server exited")?;
    Ok(())
}

fn catalog_source(path: String) -> Box<dyn registration_core::CatalogSource> {
    Box::new(move || {
        let raw = fs::read_to_string(&path)
            .map_err(|e| CatalogError::Source(format!("reading {path}: {e}")))?;
        let config: CatalogConfig = serde_json::from_str(&raw)
            .map_err(|e| CatalogError::Source(format!("parsing {path}: {e}")))?;
        config.build()
    })
}
