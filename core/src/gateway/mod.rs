//! Payment gateway adapters.
//!
//! Each gateway (PayPal, Razorpay, and a deterministic sandbox for
//! tests) implements [`PaymentGateway`]: validate the request locally,
//! create an order remotely, hand back a normalized [`GatewayOrder`].
//!
//! Amounts cross this boundary as i64 minor units; each adapter owns
//! the translation to its wire format (Razorpay takes minor units
//! directly, PayPal wants a decimal string).
//!
//! Errors distinguish retryable infrastructure failures from terminal
//! rejections so the coordinator can decide whether a retry is safe.

pub mod paypal;
pub mod razorpay;
pub mod sandbox;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::money::{Currency, Money};
use crate::models::registration::PaymentMethod;

pub use paypal::{PayPalConfig, PayPalGateway};
pub use razorpay::{RazorpayConfig, RazorpayGateway};
pub use sandbox::SandboxGateway;

/// Errors from gateway order creation.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway rejected the configured credentials")]
    InvalidCredentials,

    #[error("invalid order amount: {0}")]
    InvalidAmount(String),

    #[error("{gateway} does not support {currency}")]
    UnsupportedCurrency {
        gateway: &'static str,
        currency: Currency,
    },

    /// Transient: network failure, timeout, or a gateway 5xx.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// Terminal: the gateway understood the request and said no.
    #[error("gateway rejected order (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unparseable gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether a retry of the same request could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            GatewayError::Unavailable(err.to_string())
        } else if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Unavailable(err.to_string())
        }
    }
}

/// A normalized order-creation request.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub amount: Money,
    pub currency: Currency,
    pub registration_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
}

impl OrderRequest {
    /// Local validation, run before any network traffic.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if !self.amount.is_positive() {
            return Err(GatewayError::InvalidAmount(format!(
                "amount must be positive, got {} minor units",
                self.amount.minor_units()
            )));
        }
        Ok(())
    }
}

/// A gateway order as the rest of the system sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayOrder {
    /// Gateway-assigned order ID (e.g. `order_M9zX...` for Razorpay).
    pub id: String,
    pub amount_minor: i64,
    pub currency: Currency,
    /// Gateway-reported status string, passed through for diagnostics.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub receipt: String,
}

/// The adapter seam every gateway implements.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Which payment method this adapter serves.
    fn method(&self) -> PaymentMethod;

    /// Currencies this gateway accepts. Checked locally before any
    /// order-creation call.
    fn supported_currencies(&self) -> &'static [Currency];

    /// Create an order at the gateway.
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;
}

/// Build the receipt reference attached to every gateway order:
/// `receipt_<id-tail>_<unix-ts>`. Razorpay caps receipts at 40
/// characters, so only the tail of the registration ID is used.
pub(crate) fn order_receipt(registration_id: &str, at: DateTime<Utc>) -> String {
    let tail: String = registration_id
        .chars()
        .rev()
        .take(12)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("receipt_{}_{}", tail, at.timestamp())
}

/// Reject unsupported currencies before building a request body.
pub(crate) fn check_currency(
    gateway: &'static str,
    supported: &'static [Currency],
    currency: Currency,
) -> Result<(), GatewayError> {
    if supported.contains(&currency) {
        Ok(())
    } else {
        Err(GatewayError::UnsupportedCurrency { gateway, currency })
    }
}
