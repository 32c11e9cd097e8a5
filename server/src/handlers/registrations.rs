//! Draft creation and registration lookup.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use registration_core::{
    AccommodationSelection, CustomerDetails, Currency, RegistrationKind, RegistrationRecord,
    RegistrationSelection, SponsorTier,
};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationRequest {
    #[serde(rename = "type")]
    pub registration_type: String,
    pub type_id: Option<String>,
    pub sponsor_tier: Option<String>,
    pub currency: String,
    #[serde(default = "default_participant_count")]
    pub participant_count: u32,
    /// Composite accommodation key, e.g. `grand-palace-double-3`.
    pub accommodation: Option<String>,
    pub customer_email: String,
    pub customer_name: Option<String>,
}

fn default_participant_count() -> u32 {
    1
}

/// Records serialize with camelCase keys and their full pricing
/// block, so the stored shape is the response shape. Money fields in
/// the pricing block are minor-unit integers.
pub type RegistrationResponse = RegistrationRecord;

pub async fn create_registration(
    State(state): State<AppState>,
    Json(body): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), AppError> {
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

    let kind = match body.registration_type.as_str() {
        "regular" => {
            let type_id = body.type_id.clone().ok_or_else(|| {
                AppError::bad_request("INVALID_REQUEST", "typeId is required for regular type")
            })?;
            RegistrationKind::Regular { type_id }
        }
        "sponsorship" => {
            let raw = body.sponsor_tier.clone().ok_or_else(|| {
                AppError::bad_request(
                    "INVALID_REQUEST",
                    "sponsorTier is required for sponsorship type",
                )
            })?;
            let tier: SponsorTier = raw.parse().map_err(|_| {
                AppError::bad_request("INVALID_REQUEST", format!("unknown sponsor tier: {raw}"))
            })?;
            RegistrationKind::Sponsorship { tier }
        }
        other => {
            return Err(AppError::bad_request(
                "INVALID_REQUEST",
                format!("unknown registration type: {other}"),
            ))
        }
    };

    let accommodation = body
        .accommodation
        .as_deref()
        .map(AccommodationSelection::parse_composite)
        .transpose()?;

    let catalog = state.catalog.get()?;
    let record = state
        .coordinator
        .create_draft(
            &catalog,
            RegistrationSelection {
                kind,
                currency,
                as_of: Utc::now(),
                accommodation,
                participant_count: body.participant_count,
            },
            CustomerDetails {
                email: body.customer_email,
                name: body.customer_name,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<String>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let record = state.coordinator.get_registration(&registration_id).await?;
    Ok(Json(record))
}
