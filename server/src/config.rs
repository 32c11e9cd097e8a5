//! Environment-driven server configuration.
//!
//! The catalog file is required; gateway credentials are optional and
//! each gateway is registered only when its pair is present. The
//! sandbox gateway is always registered so local runs can exercise the
//! full flow without credentials.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct GatewayCredentials {
    pub id: String,
    pub secret: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub catalog_path: String,
    pub catalog_ttl: Duration,
    pub paypal: Option<GatewayCredentials>,
    pub razorpay: Option<GatewayCredentials>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let catalog_path =
            env::var("CATALOG_PATH").context("CATALOG_PATH must point at a catalog JSON file")?;

        let catalog_ttl = match env::var("CATALOG_TTL_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .context("CATALOG_TTL_SECS must be a number of seconds")?,
            ),
            Err(_) => Duration::from_secs(DEFAULT_CATALOG_TTL_SECS),
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            catalog_path,
            catalog_ttl,
            paypal: credentials("PAYPAL_CLIENT_ID", "PAYPAL_CLIENT_SECRET", "PAYPAL_BASE_URL"),
            razorpay: credentials("RAZORPAY_KEY_ID", "RAZORPAY_KEY_SECRET", "RAZORPAY_BASE_URL"),
        })
    }
}

fn credentials(id_var: &str, secret_var: &str, url_var: &str) -> Option<GatewayCredentials> {
    match (env::var(id_var), env::var(secret_var)) {
        (Ok(id), Ok(secret)) => Some(GatewayCredentials {
            id,
            secret,
            base_url: env::var(url_var).ok(),
        }),
        _ => None,
    }
}
