//! Asset cache with request coalescing
//!
//! `acquire(id)` returns the decoded buffer for a sound. The first request for
//! an id spawns one load task (fetch + decode on the blocking pool); every
//! request that arrives while that task runs waits on the same result through
//! a `watch` channel. Successful loads stay cached for the whole session.
//! Failed loads are removed so a later request can retry.
//!
//! ```text
//!  acquire(rain) ─┐
//!  acquire(rain) ─┼──► slots[rain] = Loading(rx) ──► load task ──► Ready(buf)
//!  acquire(rain) ─┘          ▲ all wait on rx          (1 fetch + 1 decode)
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::catalog::SoundId;

use super::decode::{decode_audio, AudioBuffer};
use super::error::{AssetError, AssetResult};
use super::source::AssetSource;

type LoadOutcome = Option<AssetResult<Arc<AudioBuffer>>>;

enum Slot {
    /// Decoded and retained for the session
    Ready(Arc<AudioBuffer>),
    /// A load task is running; clone the receiver to wait for it
    Loading(watch::Receiver<LoadOutcome>),
}

struct CacheInner {
    source: Arc<dyn AssetSource>,
    /// Sample rate buffers are decoded/resampled to (the device rate)
    target_rate: u32,
    slots: Mutex<HashMap<SoundId, Slot>>,
}

/// Shared, cloneable handle to the decoded-buffer cache
#[derive(Clone)]
pub struct AssetCache {
    inner: Arc<CacheInner>,
}

impl AssetCache {
    pub fn new(source: Arc<dyn AssetSource>, target_rate: u32) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                target_rate,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn target_rate(&self) -> u32 {
        self.inner.target_rate
    }

    /// Get the decoded buffer for `id`, loading it if needed
    ///
    /// Must be called from within a tokio runtime.
    pub async fn acquire(&self, id: SoundId) -> AssetResult<Arc<AudioBuffer>> {
        let mut rx = match self.begin_or_join(id) {
            Ok(buffer) => return Ok(buffer),
            Err(rx) => rx,
        };

        let outcome = match rx.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };

        match outcome {
            Some(result) => result,
            None => {
                // Load task went away without reporting (panicked or runtime shut down)
                self.clear_stale(id);
                Err(AssetError::Fetch {
                    id,
                    reason: "load task aborted".to_string(),
                })
            }
        }
    }

    /// Start loading `id` in the background without waiting for it
    pub fn prefetch(&self, id: SoundId) {
        let _ = self.begin_or_join(id);
    }

    /// Whether `id` is decoded and ready
    pub fn is_cached(&self, id: SoundId) -> bool {
        matches!(self.inner.slots.lock().unwrap().get(&id), Some(Slot::Ready(_)))
    }

    /// Whether a load for `id` is in flight
    pub fn is_loading(&self, id: SoundId) -> bool {
        matches!(self.inner.slots.lock().unwrap().get(&id), Some(Slot::Loading(_)))
    }

    /// Return the cached buffer, or a receiver for the in-flight load
    ///
    /// Spawns the load task when neither exists. The slot map lock is only
    /// held for the lookup/insert, never across an await.
    fn begin_or_join(&self, id: SoundId) -> Result<Arc<AudioBuffer>, watch::Receiver<LoadOutcome>> {
        let mut slots = self.inner.slots.lock().unwrap();
        match slots.get(&id) {
            Some(Slot::Ready(buffer)) => Ok(Arc::clone(buffer)),
            Some(Slot::Loading(rx)) => Err(rx.clone()),
            None => {
                let (tx, rx) = watch::channel(None);
                slots.insert(id, Slot::Loading(rx.clone()));
                drop(slots);
                self.spawn_load(id, tx);
                Err(rx)
            }
        }
    }

    fn spawn_load(&self, id: SoundId, tx: watch::Sender<LoadOutcome>) {
        log::debug!("AssetCache: loading '{}'", id);
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let worker = Arc::clone(&inner);
            let result = tokio::task::spawn_blocking(move || worker.fetch_and_decode(id))
                .await
                .unwrap_or_else(|e| {
                    Err(AssetError::Decode {
                        id,
                        reason: format!("decoder task failed: {}", e),
                    })
                });

            {
                let mut slots = inner.slots.lock().unwrap();
                match &result {
                    Ok(buffer) => {
                        slots.insert(id, Slot::Ready(Arc::clone(buffer)));
                    }
                    Err(e) => {
                        log::warn!("AssetCache: load of '{}' failed: {}", id, e);
                        slots.remove(&id);
                    }
                }
            }

            let _ = tx.send(Some(result));
        });
    }

    fn clear_stale(&self, id: SoundId) {
        let mut slots = self.inner.slots.lock().unwrap();
        if let Some(Slot::Loading(rx)) = slots.get(&id) {
            if rx.has_changed().is_err() {
                slots.remove(&id);
            }
        }
    }
}

impl CacheInner {
    fn fetch_and_decode(&self, id: SoundId) -> AssetResult<Arc<AudioBuffer>> {
        let descriptor = id.descriptor();
        let bytes = self.source.fetch(descriptor)?;
        let buffer = decode_audio(id, bytes, descriptor.asset_path, self.target_rate)?;
        Ok(Arc::new(buffer))
    }
}
