//! HTTP error envelope.
//!
//! Every failure leaving the API is an `AppError`: a status code, a
//! machine-readable code, and a client-safe message. Gateway and
//! store internals are logged, never echoed to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use registration_core::coordinator::CoordinatorError;
use registration_core::{CatalogError, GatewayError, PricingError, RegistrationError, StoreError};

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "request failed");
        } else {
            warn!(status = %self.status, code = self.code, message = %self.message, "request rejected");
        }
        (
            self.status,
            Json(json!({
                "error": { "code": self.code, "message": self.message }
            })),
        )
            .into_response()
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match &err {
            PricingError::InvalidNights(_)
            | PricingError::MalformedAccommodationKey(_)
            | PricingError::InvalidParticipantCount => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.to_string())
            }
            PricingError::UnknownRegistrationType(_)
            | PricingError::UnknownHotelOrRoomType { .. } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNKNOWN_SELECTION",
                err.to_string(),
            ),
            // Configuration gaps are the operator's problem, not the
            // client's.
            PricingError::NoActivePricingPeriod { .. }
            | PricingError::MissingPriceEntry { .. }
            | PricingError::AmountOverflow => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "PRICING_UNAVAILABLE",
                "pricing is not available for this selection",
            ),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        error!(error = %err, "catalog load failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "CATALOG_UNAVAILABLE",
            "pricing catalog is unavailable",
        )
    }
}

impl From<CoordinatorError> for AppError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::UnknownOrder(_) | CoordinatorError::UnknownRegistration(_) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            CoordinatorError::UnsupportedPaymentMethod(_) => {
                Self::bad_request("UNSUPPORTED_PAYMENT_METHOD", err.to_string())
            }
            CoordinatorError::AmountMismatch { .. } => {
                Self::new(StatusCode::CONFLICT, "AMOUNT_MISMATCH", err.to_string())
            }
            CoordinatorError::CurrencyMismatch { .. } => {
                Self::new(StatusCode::CONFLICT, "CURRENCY_MISMATCH", err.to_string())
            }
            CoordinatorError::Pricing(inner) => inner.into(),
            CoordinatorError::Registration(inner) => match inner {
                RegistrationError::ConflictingTransaction { .. }
                | RegistrationError::AlreadyLinked { .. }
                | RegistrationError::InvalidTransition { .. } => Self::new(
                    StatusCode::CONFLICT,
                    "PAYMENT_STATE_CONFLICT",
                    inner.to_string(),
                ),
            },
            CoordinatorError::Gateway(inner) => match inner {
                GatewayError::InvalidAmount(_) | GatewayError::UnsupportedCurrency { .. } => {
                    Self::bad_request("INVALID_ORDER", inner.to_string())
                }
                // Gateway internals stay out of client responses.
                other => {
                    error!(error = %other, retryable = other.is_retryable(), "gateway call failed");
                    Self::new(
                        StatusCode::BAD_GATEWAY,
                        "GATEWAY_ERROR",
                        "payment could not be processed",
                    )
                }
            },
            CoordinatorError::Store(inner) => match inner {
                StoreError::Conflict { .. } => Self::new(
                    StatusCode::CONFLICT,
                    "CONCURRENT_UPDATE",
                    "registration was updated concurrently, retry",
                ),
                StoreError::NotFound(id) => Self::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("registration {id} not found"),
                ),
                other => {
                    error!(error = %other, "store operation failed");
                    Self::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_ERROR",
                        "registration storage is unavailable",
                    )
                }
            },
        }
    }
}
