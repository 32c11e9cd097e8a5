//! Razorpay Orders API adapter.
//!
//! Single call with HTTP basic auth: POST `/v1/orders` with the amount
//! already in minor units (paise/cents), `payment_capture: 1` for
//! automatic capture, and the registration context in `notes` so the
//! Razorpay dashboard can be reconciled against the store by hand.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::core::money::Currency;
use crate::models::registration::PaymentMethod;

use super::{check_currency, order_receipt, GatewayError, GatewayOrder, OrderRequest, PaymentGateway};

const GATEWAY_NAME: &str = "razorpay";
const SUPPORTED: &[Currency] = &[
    Currency::USD,
    Currency::EUR,
    Currency::GBP,
    Currency::INR,
];
const DEFAULT_BASE_URL: &str = "https://api.razorpay.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl RazorpayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
    status: String,
    created_at: i64,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatewayError::from)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Razorpay
    }

    fn supported_currencies(&self) -> &'static [Currency] {
        SUPPORTED
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        request.validate()?;
        check_currency(GATEWAY_NAME, SUPPORTED, request.currency)?;

        let now = Utc::now();
        let receipt = order_receipt(&request.registration_id, now);

        let body = json!({
            "amount": request.amount.minor_units(),
            "currency": request.currency.code(),
            "receipt": receipt,
            "payment_capture": 1,
            "notes": {
                "registrationId": request.registration_id,
                "customerEmail": request.customer_email,
                "customerName": request.customer_name.as_deref().unwrap_or(""),
            },
        });

        let response = self
            .client
            .post(format!("{}/v1/orders", self.config.base_url))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let order: OrderResponse = response.json().await?;
                let currency = order
                    .currency
                    .parse::<Currency>()
                    .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
                let created_at = Utc
                    .timestamp_opt(order.created_at, 0)
                    .single()
                    .unwrap_or(now);
                Ok(GatewayOrder {
                    id: order.id,
                    amount_minor: order.amount,
                    currency,
                    status: order.status,
                    created_at,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::Money;

    #[tokio::test]
    async fn test_zero_amount_rejected_locally() {
        let gateway =
            RazorpayGateway::new(RazorpayConfig::new("rzp_test_key", "secret")).unwrap();
        let err = gateway
            .create_order(&OrderRequest {
                amount: Money::ZERO,
                currency: Currency::INR,
                registration_id: "TEMP-REG-x".to_string(),
                customer_email: "a@b.c".to_string(),
                customer_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAmount(_)));
    }

    #[test]
    fn test_all_four_currencies_supported() {
        let gateway =
            RazorpayGateway::new(RazorpayConfig::new("rzp_test_key", "secret")).unwrap();
        for currency in [Currency::USD, Currency::EUR, Currency::GBP, Currency::INR] {
            assert!(gateway.supported_currencies().contains(&currency));
        }
    }
}
