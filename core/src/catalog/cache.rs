//! TTL cache in front of the catalog source.
//!
//! The pricing catalog lives in an external CMS-shaped document; every
//! quote consults it, so reads go through a time-bounded cache. A
//! stale-but-valid catalog is acceptable within the TTL; a load error
//! is surfaced, never papered over with an expired snapshot.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::{CatalogError, PricingCatalog};

/// Where catalogs come from (a file, an HTTP endpoint, a fixture).
pub trait CatalogSource: Send + Sync {
    fn load(&self) -> Result<PricingCatalog, CatalogError>;
}

impl<F> CatalogSource for F
where
    F: Fn() -> Result<PricingCatalog, CatalogError> + Send + Sync,
{
    fn load(&self) -> Result<PricingCatalog, CatalogError> {
        self()
    }
}

/// A catalog handle with time-to-live refresh.
///
/// `get` returns the cached snapshot while it is fresh and reloads
/// from the source once the TTL elapses. Concurrent readers share the
/// snapshot via `Arc`.
pub struct CachedCatalog {
    source: Box<dyn CatalogSource>,
    ttl: Duration,
    slot: RwLock<Option<(Instant, Arc<PricingCatalog>)>>,
}

impl CachedCatalog {
    pub fn new(source: Box<dyn CatalogSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Current catalog snapshot, reloading if the cached one expired.
    pub fn get(&self) -> Result<Arc<PricingCatalog>, CatalogError> {
        {
            let slot = self
                .slot
                .read()
                .map_err(|_| CatalogError::Source("catalog cache lock poisoned".to_string()))?;
            if let Some((loaded_at, catalog)) = slot.as_ref() {
                if loaded_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(catalog));
                }
            }
        }

        let mut slot = self
            .slot
            .write()
            .map_err(|_| CatalogError::Source("catalog cache lock poisoned".to_string()))?;
        // Another writer may have refreshed while we waited.
        if let Some((loaded_at, catalog)) = slot.as_ref() {
            if loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(catalog));
            }
        }

        let catalog = Arc::new(self.source.load()?);
        *slot = Some((Instant::now(), Arc::clone(&catalog)));
        Ok(catalog)
    }

    /// Drop the cached snapshot; the next `get` reloads.
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = None;
        }
    }
}
