use std::sync::Arc;

use registration_core::{CachedCatalog, ReconciliationCoordinator};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ReconciliationCoordinator>,
    pub catalog: Arc<CachedCatalog>,
}
