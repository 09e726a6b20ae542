use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;
use xxhash_rust::xxh3::xxh3_64;

use crate::layout::waterfall::{ColumnGeometry, PackedLayout, WaterfallLayout};
use crate::models::MediaItem;

/// Maximum number of cached layouts to keep in memory.
const MAX_CACHE_ENTRIES: usize = 8;

/// Key for the layout cache: resolved column geometry plus list hash.
///
/// Packing depends only on the item list and the geometry, so container widths
/// that resolve to the same columns share one entry.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct CacheKey {
    columns: usize,
    item_width_bits: u64,
    gap_bits: u64,
    fallback_bits: u64,
    list_hash: u64,
}

impl CacheKey {
    fn new(layout: &WaterfallLayout, geometry: ColumnGeometry, list_hash: u64) -> Self {
        Self {
            columns: geometry.columns,
            item_width_bits: geometry.item_width.to_bits(),
            gap_bits: layout.gap.to_bits(),
            fallback_bits: layout.fallback_aspect_ratio.to_bits(),
            list_hash,
        }
    }
}

/// LRU cache of packed layouts.
pub struct LayoutCache {
    cache: Mutex<LruCache<CacheKey, Arc<PackedLayout>>>,
}

impl LayoutCache {
    /// Creates a new empty layout cache.
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Computes a fast hash of the media item list.
    /// The hash covers identifiers and aspect ratios in order, so any change to
    /// the listing or its order produces a new key.
    pub fn compute_list_hash(items: &[MediaItem]) -> u64 {
        let mut hasher_input = Vec::with_capacity(items.len() * 64);

        for item in items {
            hasher_input.extend_from_slice(item.identifier.as_bytes());
            hasher_input.push(0xff);
            let ratio_bits = item.aspect_ratio.map(f64::to_bits).unwrap_or(0);
            hasher_input.extend_from_slice(&ratio_bits.to_le_bytes());
        }

        xxh3_64(&hasher_input)
    }

    fn get(&self, key: &CacheKey, item_count: usize) -> Option<Arc<PackedLayout>> {
        let mut cache = self.cache.lock();
        let entry = cache.get(key)?;
        // Guard against hash collisions between lists of different lengths.
        if entry.positions.len() != item_count {
            return None;
        }
        Some(Arc::clone(entry))
    }

    fn insert(&self, key: CacheKey, layout: Arc<PackedLayout>) {
        self.cache.lock().put(key, layout);
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Returns the number of cached layouts.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Layout computation with automatic cache management.
pub struct CachedLayoutComputer {
    pub layout: WaterfallLayout,
    pub cache: LayoutCache,
}

impl CachedLayoutComputer {
    /// Creates a new cached layout computer with default settings.
    pub fn new() -> Self {
        Self::with_layout(WaterfallLayout::default())
    }

    /// Creates a new cached layout computer with custom layout settings.
    pub fn with_layout(layout: WaterfallLayout) -> Self {
        Self {
            layout,
            cache: LayoutCache::new(),
        }
    }

    /// Computes the layout, using a cached result when the geometry and list match.
    pub fn compute(&self, items: &[MediaItem], container_width: f64) -> Arc<PackedLayout> {
        let Some(geometry) = self.layout.geometry(container_width) else {
            return Arc::new(PackedLayout::default());
        };
        if items.is_empty() {
            return Arc::new(self.layout.compute(items, container_width));
        }

        let list_hash = LayoutCache::compute_list_hash(items);
        let key = CacheKey::new(&self.layout, geometry, list_hash);

        if let Some(hit) = self.cache.get(&key, items.len()) {
            trace!(columns = geometry.columns, "Layout cache hit");
            return hit;
        }

        let packed = Arc::new(self.layout.pack(items, geometry));
        self.cache.insert(key, Arc::clone(&packed));
        packed
    }

    /// Invalidates the cache, forcing recomputation on next call.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

impl Default for CachedLayoutComputer {
    fn default() -> Self {
        Self::new()
    }
}
