//! Payment confirmation.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use registration_core::coordinator::ConfirmationStatus;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub gateway_order_id: String,
    pub transaction_id: String,
    /// `completed` or `failed`.
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub registration_id: String,
    pub payment_status: String,
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(body): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, AppError> {
    if body.gateway_order_id.trim().is_empty() || body.transaction_id.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_REQUEST",
            "gatewayOrderId and transactionId are required",
        ));
    }

    let status = match body.status.to_ascii_lowercase().as_str() {
        "completed" => ConfirmationStatus::Completed,
        "failed" => ConfirmationStatus::Failed,
        other => {
            return Err(AppError::bad_request(
                "INVALID_REQUEST",
                format!("status must be completed or failed, got {other}"),
            ))
        }
    };

    let confirmation = state
        .coordinator
        .confirm(&body.gateway_order_id, &body.transaction_id, status)
        .await?;

    Ok(Json(ConfirmResponse {
        registration_id: confirmation.registration_id,
        payment_status: confirmation.payment_status.to_string(),
    }))
}
