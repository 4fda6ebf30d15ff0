//! Read-through table cache.
//!
//! The loader takes its cache as a trait object so callers (and tests) choose
//! the policy explicitly:
//!
//! - [`NoCache`]: never stores anything
//! - [`ModTimeCache`]: keyed by path, validated against the file's modification
//!   time and length, with an optional TTL as an upper bound on staleness

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::io::loader::LoadedTable;

/// Identity of a file's contents as far as the cache is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl FileStamp {
    pub fn of(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

pub trait TableCache {
    /// Return a cached table if it is still valid for `stamp` at time `now`.
    fn get(&mut self, path: &Path, stamp: &FileStamp, now: Instant) -> Option<Arc<LoadedTable>>;

    fn put(&mut self, path: &Path, stamp: FileStamp, table: Arc<LoadedTable>, now: Instant);

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache that never stores.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl TableCache for NoCache {
    fn get(&mut self, _path: &Path, _stamp: &FileStamp, _now: Instant) -> Option<Arc<LoadedTable>> {
        None
    }

    fn put(&mut self, _path: &Path, _stamp: FileStamp, _table: Arc<LoadedTable>, _now: Instant) {}

    fn clear(&mut self) {}

    fn len(&self) -> usize {
        0
    }
}

struct CacheEntry {
    stamp: FileStamp,
    inserted: Instant,
    table: Arc<LoadedTable>,
}

/// Cache invalidated by modification time/length, with an optional TTL.
pub struct ModTimeCache {
    ttl: Option<Duration>,
    entries: HashMap<PathBuf, CacheEntry>,
}

impl ModTimeCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, stamp: &FileStamp, now: Instant) -> bool {
        if entry.stamp != *stamp {
            return false;
        }
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(entry.inserted) < ttl,
            None => true,
        }
    }
}

impl TableCache for ModTimeCache {
    fn get(&mut self, path: &Path, stamp: &FileStamp, now: Instant) -> Option<Arc<LoadedTable>> {
        let entry = self.entries.get(path)?;
        if self.is_fresh(entry, stamp, now) {
            return Some(Arc::clone(&entry.table));
        }
        self.entries.remove(path);
        None
    }

    fn put(&mut self, path: &Path, stamp: FileStamp, table: Arc<LoadedTable>, now: Instant) {
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                stamp,
                inserted: now,
                table,
            },
        );
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
