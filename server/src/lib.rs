//! HTTP surface for the registration core.
//!
//! Routes:
//! - `POST /registration` — price a selection and persist a draft
//! - `POST /registration/order` — create and link a gateway order
//! - `POST /registration/confirm` — apply a gateway outcome
//! - `GET /registration/:id` — fetch a registration
//! - `GET /health`
//!
//! # Amount conventions
//! Request and order-response bodies carry major-unit decimals
//! (`598.0`), matching what gateways and customers see. Registration
//! records serialize money as minor-unit integers (`59800`), the
//! core's storage representation; `pricing.totalPrice` divided by 100
//! is the decimal to send when creating an order.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/registration", post(handlers::registrations::create_registration))
        .route("/registration/order", post(handlers::orders::create_order))
        .route("/registration/confirm", post(handlers::confirm::confirm_payment))
        .route("/registration/:id", get(handlers::registrations::get_registration))
        .route("/health", get(handlers::health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
