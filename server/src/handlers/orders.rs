//! Gateway order creation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use registration_core::coordinator::OrderIntent;
use registration_core::{Currency, CustomerDetails, Money, PaymentMethod};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Major-unit decimal amount, e.g. `598.0`. Must match the stored
    /// total when `registrationId` is given.
    pub amount: f64,
    pub currency: String,
    pub registration_id: Option<String>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub registration_id: String,
    /// Major-unit decimal, mirroring the request shape.
    pub amount: f64,
    pub currency: String,
    pub status: String,
}

fn parse_method(raw: &str) -> Result<PaymentMethod, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "paypal" => Ok(PaymentMethod::Paypal),
        "razorpay" => Ok(PaymentMethod::Razorpay),
        "test" => Ok(PaymentMethod::Test),
        other => Err(AppError::bad_request(
            "UNSUPPORTED_PAYMENT_METHOD",
            format!("unknown payment method: {other}"),
        )),
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    if body.customer_email.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_REQUEST",
            "customerEmail is required",
        ));
    }

    let currency: Currency = body
        .currency
        .parse()
        .map_err(|_| AppError::bad_request("UNSUPPORTED_CURRENCY", "unsupported currency"))?;

    let amount = Money::from_major(body.amount)
        .map_err(|e| AppError::bad_request("INVALID_AMOUNT", e.to_string()))?;
    if !amount.is_positive() {
        return Err(AppError::bad_request(
            "INVALID_AMOUNT",
            "amount must be positive",
        ));
    }

    let method = parse_method(&body.payment_method)?;

    let order = state
        .coordinator
        .create_order(OrderIntent {
            registration_id: body.registration_id,
            amount,
            currency,
            customer: CustomerDetails {
                email: body.customer_email,
                name: body.customer_name,
            },
            method,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_id: order.order_id,
            registration_id: order.registration_id,
            amount: order.amount.to_major(),
            currency: order.currency.code().to_string(),
            status: order.status,
        }),
    ))
}
