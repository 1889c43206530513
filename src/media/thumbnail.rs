// SPDX-License-Identifier: MPL-2.0
//! Square thumbnail cache for the photo grid.
//!
//! # Design
//!
//! - **LRU eviction**: Least recently used thumbnails are evicted first
//! - **Count-bounded**: Capacity is a number of thumbnails, not bytes
//! - **Request de-duplication**: Concurrent requests for one key share a
//!   single decode; every requester is called back exactly once
//! - **Injected executor**: Decoding runs on the [`PixelWorker`] passed in

use crate::config::ThumbnailConfig;
use crate::error::{Error, Result};
use crate::media::PixelWorker;
use image_rs::imageops::{self, FilterType};
use image_rs::RgbaImage;
use lru::LruCache;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Waiter = Box<dyn FnOnce(Result<Arc<RgbaImage>>) + Send>;

/// Statistics about thumbnail cache performance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThumbnailStats {
    /// Requests answered from the cache.
    pub hits: u64,
    /// Requests that started a decode.
    pub misses: u64,
    /// Requests attached to an already running decode.
    pub coalesced: u64,
    /// Thumbnails dropped to stay within capacity.
    pub evictions: u64,
    /// Decodes that failed.
    pub failures: u64,
}

struct Inner<K: Hash + Eq> {
    cache: LruCache<K, Arc<RgbaImage>>,
    pending: HashMap<K, Vec<Waiter>>,
    stats: ThumbnailStats,
}

/// Shared handle; clones refer to the same cache.
pub struct ThumbnailCache<K: Hash + Eq> {
    inner: Arc<Mutex<Inner<K>>>,
    worker: PixelWorker,
    edge_px: u32,
}

impl<K: Hash + Eq> Clone for ThumbnailCache<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            worker: self.worker.clone(),
            edge_px: self.edge_px,
        }
    }
}

impl<K> ThumbnailCache<K>
where
    K: Hash + Eq + Clone + Send + 'static,
{
    #[must_use]
    pub fn new(config: &ThumbnailConfig, worker: PixelWorker) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                cache: LruCache::new(capacity),
                pending: HashMap::new(),
                stats: ThumbnailStats::default(),
            })),
            worker,
            edge_px: config.edge_px,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K>> {
        lock(&self.inner)
    }

    /// Returns a cached thumbnail and marks it recently used.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Arc<RgbaImage>> {
        self.lock().cache.get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> ThumbnailStats {
        self.lock().stats
    }

    /// Drops all cached thumbnails. Running decodes still call back.
    pub fn clear(&self) {
        self.lock().cache.clear();
    }

    /// Requests the thumbnail for `key`.
    ///
    /// A cached thumbnail is delivered before this returns. Otherwise `load`
    /// decodes the full image on the worker, unless a decode for `key` is
    /// already running, in which case `callback` joins it and `load` is
    /// dropped unused.
    pub fn request<L, C>(&self, key: K, load: L, callback: C)
    where
        L: FnOnce() -> Result<RgbaImage> + Send + 'static,
        C: FnOnce(Result<Arc<RgbaImage>>) + Send + 'static,
    {
        let mut inner = self.lock();
        let cached = inner.cache.get(&key).cloned();
        if let Some(hit) = cached {
            inner.stats.hits += 1;
            drop(inner);
            callback(Ok(hit));
            return;
        }
        if let Some(waiters) = inner.pending.get_mut(&key) {
            waiters.push(Box::new(callback));
            inner.stats.coalesced += 1;
            return;
        }
        inner.stats.misses += 1;
        inner.pending.insert(key.clone(), vec![Box::new(callback)]);
        drop(inner);

        let edge = self.edge_px;
        let shared = Arc::clone(&self.inner);
        self.worker.submit_with_callback(
            move || load().and_then(|full| make_thumbnail(&full, edge)),
            move |result| complete(&shared, key, result),
        );
    }
}

fn lock<K: Hash + Eq>(inner: &Mutex<Inner<K>>) -> MutexGuard<'_, Inner<K>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn complete<K>(shared: &Mutex<Inner<K>>, key: K, result: Result<RgbaImage>)
where
    K: Hash + Eq + Clone,
{
    let result = result.map(Arc::new);
    let waiters = {
        let mut inner = lock(shared);
        let waiters = inner.pending.remove(&key).unwrap_or_default();
        match &result {
            Ok(thumbnail) => {
                if let Some((evicted, _)) = inner.cache.push(key.clone(), Arc::clone(thumbnail)) {
                    if evicted != key {
                        inner.stats.evictions += 1;
                    }
                }
            }
            Err(err) => {
                inner.stats.failures += 1;
                log::warn!("thumbnail decode failed: {}", err);
            }
        }
        waiters
    };
    for waiter in waiters {
        waiter(result.clone());
    }
}

/// Centre-crops `image` to a square and resamples it to `edge` pixels.
pub fn make_thumbnail(image: &RgbaImage, edge: u32) -> Result<RgbaImage> {
    let (w, h) = image.dimensions();
    let side = w.min(h);
    if side == 0 || edge == 0 {
        return Err(Error::InvalidGeometry(format!(
            "cannot thumbnail {}x{} to {}px",
            w, h, edge
        )));
    }
    // Resampled straight from the view; the square is never copied out.
    let square = imageops::crop_imm(image, (w - side) / 2, (h - side) / 2, side, side);
    Ok(imageops::resize(&*square, edge, edge, FilterType::Triangle))
}
