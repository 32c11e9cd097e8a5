//! PayPal Orders API adapter.
//!
//! Two-step flow: fetch an OAuth2 access token with client
//! credentials, then POST to `/v2/checkout/orders` with intent
//! CAPTURE. The order receipt doubles as the `PayPal-Request-Id`
//! idempotency header, so a retried request returns the original
//! order instead of creating a duplicate.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::core::money::Currency;
use crate::models::registration::PaymentMethod;

use super::{check_currency, order_receipt, GatewayError, GatewayOrder, OrderRequest, PaymentGateway};

const GATEWAY_NAME: &str = "paypal";
const SUPPORTED: &[Currency] = &[Currency::USD, Currency::EUR, Currency::GBP];
const DEFAULT_BASE_URL: &str = "https://api-m.paypal.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl PayPalConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point at the sandbox environment instead of live.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct PayPalGateway {
    config: PayPalConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
}

impl PayPalGateway {
    pub fn new(config: PayPalConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatewayError::from)?;
        Ok(Self { config, client })
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.config.base_url))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let token: TokenResponse = response.json().await?;
                Ok(token.access_token)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(GatewayError::InvalidCredentials)
            }
            status if status.is_server_error() => Err(GatewayError::Unavailable(format!(
                "token endpoint returned {status}"
            ))),
            status => Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// PayPal wants decimal-string amounts ("399.50").
    fn decimal_amount(minor: i64) -> String {
        format!("{}.{:02}", minor / 100, (minor % 100).abs())
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Paypal
    }

    fn supported_currencies(&self) -> &'static [Currency] {
        SUPPORTED
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        request.validate()?;
        check_currency(GATEWAY_NAME, SUPPORTED, request.currency)?;

        let token = self.access_token().await?;
        let now = Utc::now();
        let receipt = order_receipt(&request.registration_id, now);

        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": request.registration_id,
                "amount": {
                    "currency_code": request.currency.code(),
                    "value": Self::decimal_amount(request.amount.minor_units()),
                },
            }],
        });

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.config.base_url))
            .bearer_auth(token)
            .header("PayPal-Request-Id", &receipt)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let order: OrderResponse = response.json().await?;
                Ok(GatewayOrder {
                    id: order.id,
                    amount_minor: request.amount.minor_units(),
                    currency: request.currency,
                    status: order.status,
                    created_at: now,
                    receipt,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(GatewayError::InvalidCredentials)
            }
            status if status.is_server_error() => Err(GatewayError::Unavailable(format!(
                "orders endpoint returned {status}"
            ))),
            status => Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
