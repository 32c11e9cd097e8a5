//! Deterministic in-process gateway for tests and local development.
//!
//! Never touches the network. Order IDs are sequential so test
//! assertions can predict them.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::money::Currency;
use crate::models::registration::PaymentMethod;

use super::{check_currency, order_receipt, GatewayError, GatewayOrder, OrderRequest, PaymentGateway};

const GATEWAY_NAME: &str = "sandbox";
const SUPPORTED: &[Currency] = &[
    Currency::USD,
    Currency::EUR,
    Currency::GBP,
    Currency::INR,
];

#[derive(Default)]
pub struct SandboxGateway {
    counter: AtomicU64,
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Test
    }

    fn supported_currencies(&self) -> &'static [Currency] {
        SUPPORTED
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        request.validate()?;
        check_currency(GATEWAY_NAME, SUPPORTED, request.currency)?;

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        Ok(GatewayOrder {
            id: format!("order_TEST{n:010}"),
            amount_minor: request.amount.minor_units(),
            currency: request.currency,
            status: "created".to_string(),
            created_at: now,
            receipt: order_receipt(&request.registration_id, now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::Money;

    fn request() -> OrderRequest {
        OrderRequest {
            amount: Money::from_minor(59800),
            currency: Currency::USD,
            registration_id: "TEMP-REG-abc".to_string(),
            customer_email: "a@b.c".to_string(),
            customer_name: None,
        }
    }

    #[tokio::test]
    async fn test_sequential_order_ids() {
        let gateway = SandboxGateway::new();
        let first = gateway.create_order(&request()).await.unwrap();
        let second = gateway.create_order(&request()).await.unwrap();
        assert_eq!(first.id, "order_TEST0000000001");
        assert_eq!(second.id, "order_TEST0000000002");
        assert_eq!(first.status, "created");
        assert_eq!(first.amount_minor, 59800);
    }
}
