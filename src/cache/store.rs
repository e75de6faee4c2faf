//! Content-keyed memo caches for MU density and gamma results.
//!
//! Keys are hashes of input values, never addresses, so two equal records
//! built independently share an entry. Values are `Arc`-shared and the
//! underlying moka caches are safe to use from several threads at once.
use std::sync::Arc;

use log::debug;
use moka::sync::Cache;
use serde::Deserialize;

use super::key::{grid_key, ContentKey};
use crate::delivery::DeliveryRecord;
use crate::error::QaResult;
use crate::fluence::mudensity;
use crate::gamma::{GammaComparator, GammaResult};
use crate::grid::{DensityGrid, GridSpace};

/// (record, grid space)
type MuDensityKey = (ContentKey, ContentKey);
/// (reference grid, evaluation grid, options, grid space)
type GammaKey = (ContentKey, ContentKey, ContentKey, ContentKey);

/// Entry limits of the two caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub mudensity_capacity: u64,
    pub gamma_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mudensity_capacity: 256,
            gamma_capacity: 64,
        }
    }
}

/// Memoised [`mudensity`] results.
#[derive(Clone)]
pub struct MuDensityCache {
    inner: Cache<MuDensityKey, Arc<DensityGrid>>,
}

impl MuDensityCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    /// MU density of `record` on `space`, computed at most once per content.
    pub fn mudensity(
        &self,
        record: &DeliveryRecord,
        space: &GridSpace,
    ) -> QaResult<Arc<DensityGrid>> {
        let key = (record.content_key(), space.content_key());
        if let Some(hit) = self.inner.get(&key) {
            debug!("MuDensityCache: hit record={}", key.0);
            return Ok(hit);
        }
        self.inner
            .try_get_with(key, || mudensity(record, space).map(Arc::new))
            .map_err(|e| (*e).clone())
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for MuDensityCache {
    fn default() -> Self {
        Self::new(CacheConfig::default().mudensity_capacity)
    }
}

/// Memoised gamma results.
#[derive(Clone)]
pub struct GammaCache {
    inner: Cache<GammaKey, Arc<GammaResult>>,
}

impl GammaCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    pub fn gamma(
        &self,
        comparator: &GammaComparator<'_>,
        reference: &DensityGrid,
        evaluation: &DensityGrid,
    ) -> QaResult<Arc<GammaResult>> {
        let key = (
            grid_key(reference),
            grid_key(evaluation),
            comparator.options().content_key(),
            comparator.space().content_key(),
        );
        if let Some(hit) = self.inner.get(&key) {
            debug!("GammaCache: hit reference={} evaluation={}", key.0, key.1);
            return Ok(hit);
        }
        self.inner
            .try_get_with(key, || comparator.compare(reference, evaluation).map(Arc::new))
            .map_err(|e| (*e).clone())
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for GammaCache {
    fn default() -> Self {
        Self::new(CacheConfig::default().gamma_capacity)
    }
}

/// Both caches, shareable across comparisons.
#[derive(Clone, Default)]
pub struct QaCache {
    pub mudensity: MuDensityCache,
    pub gamma: GammaCache,
}

impl QaCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            mudensity: MuDensityCache::new(config.mudensity_capacity),
            gamma: GammaCache::new(config.gamma_capacity),
        }
    }
}
