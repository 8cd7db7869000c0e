use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::config::CacheOptions;
use crate::normalize::normalize;

/// Entry of an identity-scoped cache: the value plus a weak handle on its owner
struct OwnedEntry<O, V> {
    owner: Weak<O>,
    value: V,
}

/// Associates a derived value with an owning object for that object's lifetime.
///
/// The side-table is keyed by the owner's allocation address and only ever
/// holds a [`Weak`] to it, so entries never keep an owner alive. While an
/// entry exists its weak handle pins the allocation, which means the address
/// cannot be reused by another owner until the entry is purged.
pub struct IdentityCache<O, V> {
    entries: DashMap<usize, OwnedEntry<O, V>>,
}

impl<O, V> Default for IdentityCache<O, V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<O, V: Clone> IdentityCache<O, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(owner: &Arc<O>) -> usize {
        Arc::as_ptr(owner) as *const () as usize
    }

    /// Value stored for `owner`, if any
    pub fn get(&self, owner: &Arc<O>) -> Option<V> {
        let entry = self.entries.get(&Self::key(owner))?;
        if entry.owner.strong_count() > 0 && Weak::ptr_eq(&entry.owner, &Arc::downgrade(owner)) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn has(&self, owner: &Arc<O>) -> bool {
        self.get(owner).is_some()
    }

    /// Store `value` for `owner`, dropping entries whose owners are gone
    pub fn set(&self, owner: &Arc<O>, value: V) {
        self.purge();
        self.entries.insert(
            Self::key(owner),
            OwnedEntry {
                owner: Arc::downgrade(owner),
                value,
            },
        );
    }

    /// Cached value for `owner`, computing and storing it on a miss
    pub fn get_or_insert_with(&self, owner: &Arc<O>, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(owner) {
            return value;
        }
        let value = compute();
        self.set(owner, value.clone());
        value
    }

    /// Drop every entry whose owner has been released
    pub fn purge(&self) {
        self.entries.retain(|_, entry| entry.owner.strong_count() > 0);
    }

    /// Number of stored entries, including not yet purged dead ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bounded least-recently-used cache.
///
/// Entries are kept in recency order: index 0 is the least recently used.
#[derive(Debug)]
pub struct LruCache<K, V> {
    entries: IndexMap<K, V>,
    capacity: usize,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: IndexMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Look up `key`, marking it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let (key, value) = self.entries.shift_remove_entry(key)?;
        self.entries.insert(key, value);
        self.entries.last().map(|(_, v)| v)
    }

    /// Insert `value`, evicting the least recently used entry when full
    pub fn set(&mut self, key: K, value: V) {
        if self.entries.shift_remove(&key).is_none() && self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(key, value);
    }

    /// Membership test that does not touch recency
    pub fn has(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Key of a compiled skip pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub pattern: String,
    pub flags: String,
}

/// Process-wide caches shared by every file of a run.
///
/// Each cache sits behind its own lock so files analyzed on different
/// threads serialize their eviction bookkeeping.
pub struct SharedCaches {
    /// `None` marks a pattern that failed to compile
    patterns: Mutex<LruCache<PatternKey, Option<Arc<Regex>>>>,
    normalized: Mutex<LruCache<String, Arc<str>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for SharedCaches {
    fn default() -> Self {
        Self::new(&CacheOptions::default())
    }
}

impl SharedCaches {
    pub fn new(options: &CacheOptions) -> Self {
        Self {
            patterns: Mutex::new(LruCache::new(options.pattern_capacity)),
            normalized: Mutex::new(LruCache::new(options.text_capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Compiled regex for `key`, compiling on a miss.
    ///
    /// A pattern that fails to compile is remembered as `None`, so the
    /// warning fires once per cache lifetime instead of once per file.
    pub fn pattern(&self, key: &PatternKey) -> Option<Arc<Regex>> {
        // held across compile so concurrent misses on one key compile it once
        let mut patterns = self.patterns.lock();
        if let Some(cached) = patterns.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached.clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let compiled = match compile_pattern(key) {
            Ok(regex) => Some(Arc::new(regex)),
            Err(err) => {
                tracing::warn!(pattern = %key.pattern, flags = %key.flags, "ignoring invalid skip pattern: {err}");
                None
            }
        };
        patterns.set(key.clone(), compiled.clone());
        compiled
    }

    /// Normalized form of `text`, memoized
    pub fn normalized(&self, text: &str) -> Arc<str> {
        let key = text.to_string();
        if let Some(cached) = self.normalized.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached.clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let value: Arc<str> = normalize(text).into();
        self.normalized.lock().set(key, value.clone());
        value
    }

    /// Clear all caches
    pub fn clear(&self) {
        self.patterns.lock().clear();
        self.normalized.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            pattern_entries: self.patterns.lock().len(),
            text_entries: self.normalized.lock().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn compile_pattern(key: &PatternKey) -> Result<Regex, regex::Error> {
    let mut builder = regex::RegexBuilder::new(&key.pattern);
    for flag in key.flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'u' => builder.unicode(true),
            _ => &mut builder,
        };
    }
    builder.build()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub pattern_entries: usize,
    pub text_entries: usize,
    pub hits: u64,
    pub misses: u64,
}
