//! In-memory caching using moka
//!
//! Opening hours change rarely and are read on every availability check, so
//! they get a long TTL. Sub-fields carry a status that owners flip for
//! maintenance, so they expire quickly. Bookings are never cached.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::models::{OpeningHours, SubField};
use crate::availability::queries;

/// Application cache holding per-field opening hours and sub-fields
#[derive(Clone)]
pub struct AppCache {
    /// Opening hours (field_id -> all weekday rows)
    pub opening_hours: Cache<Uuid, Arc<Vec<OpeningHours>>>,
    /// Sub-fields (subfield_id -> SubField)
    pub subfields: Cache<Uuid, Arc<SubField>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Opening hours: 1000 fields, 30 min TTL, 10 min idle
            opening_hours: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(Duration::from_secs(30 * 60))
                .time_to_idle(Duration::from_secs(10 * 60))
                .build(),

            // Sub-fields: 5000 entries, 1 min TTL
            subfields: Cache::builder()
                .max_capacity(5_000)
                .time_to_live(Duration::from_secs(60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            opening_hours_size: self.opening_hours.entry_count(),
            subfields_size: self.subfields.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.opening_hours.invalidate_all();
        self.subfields.invalidate_all();
        info!("All caches invalidated");
    }

    /// Invalidate the opening hours of one field
    pub async fn invalidate_field(&self, field_id: Uuid) {
        self.opening_hours.invalidate(&field_id).await;
        info!("Opening hours cache invalidated for field: {}", field_id);
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub opening_hours_size: u64,
    pub subfields_size: u64,
}

/// Group opening hour rows by field
pub fn group_by_field(rows: Vec<OpeningHours>) -> HashMap<Uuid, Vec<OpeningHours>> {
    let mut grouped: HashMap<Uuid, Vec<OpeningHours>> = HashMap::new();
    for row in rows {
        grouped.entry(row.field_id).or_default().push(row);
    }
    grouped
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Warm the cache with every field's opening hours
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    match queries::get_all_opening_hours(db).await {
        Ok(rows) => {
            for (field_id, hours) in group_by_field(rows) {
                cache.opening_hours.insert(field_id, Arc::new(hours)).await;
            }
        }
        Err(e) => warn!("Failed to warm opening hours cache: {}", e),
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}
