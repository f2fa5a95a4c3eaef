//! Flash write cache flushed by `sync()`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Write-back cache in front of the serial flash.
pub trait DiskCache: Send + Sync {
    /// Record a write that landed in the cache.
    fn mark_dirty(&self);

    /// Commit any cached sector to the flash.
    fn flush(&self);
}

/// Tracks whether a cached sector is pending and how often it was committed.
#[derive(Debug, Default)]
pub struct FlashCache {
    dirty: AtomicBool,
    writebacks: AtomicU64,
}

impl FlashCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Number of sector write-backs performed by `flush`.
    pub fn writebacks(&self) -> u64 {
        self.writebacks.load(Ordering::SeqCst)
    }
}

impl DiskCache for FlashCache {
    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn flush(&self) {
        if self.dirty.swap(false, Ordering::SeqCst) {
            self.writebacks.fetch_add(1, Ordering::SeqCst);
            log::debug!("flash cache written back");
        }
    }
}
