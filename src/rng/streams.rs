//! Named generator streams derived from one master seed.

use std::collections::{hash_map::Entry, HashMap, VecDeque};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Generator, Mulberry32};

/// Streams every manager starts with, in creation order.
pub const DEFAULT_STREAMS: [&str; 5] = ["traits", "physics", "formation", "visual", "mutations"];

/// 32-bit shift-multiply-add string hash over UTF-16 code units.
pub fn hash_name(name: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in name.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }
    hash as u32
}

pub fn derive_stream_seed(seed: u32, name: &str) -> u32 {
    seed ^ hash_name(name)
}

fn default_cache_streams() -> bool {
    true
}

fn default_max_cached() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamOptions {
    #[serde(default)]
    pub initial_seed: u32,
    #[serde(default = "default_cache_streams")]
    pub cache_streams: bool,
    #[serde(default = "default_max_cached")]
    pub max_cached: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            initial_seed: 0,
            cache_streams: default_cache_streams(),
            max_cached: default_max_cached(),
        }
    }
}

/// Generator handed out by [`StreamManager`]. Cached streams keep their
/// progress between calls; detached ones start fresh every time.
#[derive(Debug)]
pub enum StreamRng<'a> {
    Cached(&'a mut Mulberry32),
    Detached(Mulberry32),
}

impl StreamRng<'_> {
    fn inner(&mut self) -> &mut Mulberry32 {
        match self {
            StreamRng::Cached(rng) => rng,
            StreamRng::Detached(rng) => rng,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, StreamRng::Cached(_))
    }
}

impl Generator for StreamRng<'_> {
    fn next_f64(&mut self) -> f64 {
        self.inner().next_f64()
    }
}

impl RngCore for StreamRng<'_> {
    fn next_u32(&mut self) -> u32 {
        self.inner().next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        RngCore::next_u64(self.inner())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner().fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner().try_fill_bytes(dest)
    }
}

/// LRU-bounded cache of named streams. Not synchronised; wrap it in a mutex
/// or keep a single owner when sharing across threads.
pub struct StreamManager {
    master_seed: u32,
    cache_streams: bool,
    max_cached: usize,
    streams: HashMap<String, Mulberry32>,
    access_order: VecDeque<String>,
}

impl StreamManager {
    pub fn new(options: StreamOptions) -> Self {
        let mut manager = Self {
            master_seed: options.initial_seed,
            cache_streams: options.cache_streams,
            max_cached: options.max_cached.max(1),
            streams: HashMap::new(),
            access_order: VecDeque::new(),
        };
        for name in DEFAULT_STREAMS {
            manager.create_stream(name, manager.master_seed);
        }
        manager
    }

    pub fn with_seed(seed: u32) -> Self {
        Self::new(StreamOptions {
            initial_seed: seed,
            ..StreamOptions::default()
        })
    }

    pub fn master_seed(&self) -> u32 {
        self.master_seed
    }

    /// Get the stream for `name`, deriving it from the master seed on first use.
    pub fn stream(&mut self, name: &str) -> StreamRng<'_> {
        let seed = self.master_seed;
        self.get_or_create_stream(name, seed)
    }

    /// Get the cached stream for `name`, or derive one from `seed`.
    pub fn get_or_create_stream(&mut self, name: &str, seed: u32) -> StreamRng<'_> {
        if !self.cache_streams {
            return StreamRng::Detached(Mulberry32::new(derive_stream_seed(seed, name)));
        }
        self.touch(name);
        let rng = self.streams.entry(name.to_string()).or_insert_with(|| {
            debug!(stream = name, seed, "creating rng stream");
            Mulberry32::new(derive_stream_seed(seed, name))
        });
        StreamRng::Cached(rng)
    }

    /// Derive a fresh stream from `seed ^ hash_name(name)`, replacing any
    /// cached stream of the same name.
    pub fn create_stream(&mut self, name: &str, seed: u32) -> StreamRng<'_> {
        let rng = Mulberry32::new(derive_stream_seed(seed, name));
        if !self.cache_streams {
            return StreamRng::Detached(rng);
        }

        debug!(stream = name, seed, "creating rng stream");
        self.touch(name);
        let cached = match self.streams.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                *slot = rng;
                slot
            }
            Entry::Vacant(entry) => entry.insert(rng),
        };
        StreamRng::Cached(cached)
    }

    pub fn remove_stream(&mut self, name: &str) -> bool {
        self.access_order.retain(|existing| existing != name);
        self.streams.remove(name).is_some()
    }

    pub fn clear_streams(&mut self) {
        self.streams.clear();
        self.access_order.clear();
    }

    /// Recreate every cached stream from `seed`. Prior progress is discarded.
    pub fn set_master_seed(&mut self, seed: u32) {
        self.master_seed = seed;
        let names: Vec<String> = self.access_order.drain(..).collect();
        self.streams.clear();
        for name in names {
            self.create_stream(&name, seed);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    /// Cached stream names, least recently used first.
    pub fn stream_names(&self) -> Vec<String> {
        self.access_order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    fn touch(&mut self, name: &str) {
        self.access_order.retain(|existing| existing != name);
        self.access_order.push_back(name.to_string());
        while self.access_order.len() > self.max_cached {
            if let Some(evicted) = self.access_order.pop_front() {
                debug!(stream = %evicted, "evicting least recently used rng stream");
                self.streams.remove(&evicted);
            }
        }
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new(StreamOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_name() {
        assert_eq!(hash_name(""), 0);
        assert_eq!(hash_name("a"), 97);
        assert_eq!(hash_name("traits"), 3_429_257_253);
        assert_eq!(hash_name("physics"), 3_708_872_263);
    }

    #[test]
    fn test_default_streams_created() {
        let manager = StreamManager::with_seed(42);
        assert_eq!(manager.len(), 5);
        assert_eq!(manager.stream_names(), DEFAULT_STREAMS.map(String::from).to_vec());
    }

    #[test]
    fn test_stream_seed_derivation() {
        let mut manager = StreamManager::with_seed(42);
        let value = manager.stream("physics").next_f64();
        let mut expected = Mulberry32::new(42 ^ 3_708_872_263);
        assert_eq!(value, expected.next_f64());
    }

    #[test]
    fn test_stream_keeps_progress() {
        let mut manager = StreamManager::with_seed(7);
        let first = manager.stream("custom").next_f64();
        let second = manager.stream("custom").next_f64();

        let mut reference = Mulberry32::new(derive_stream_seed(7, "custom"));
        assert_eq!(first, reference.next_f64());
        assert_eq!(second, reference.next_f64());
    }

    #[test]
    fn test_different_names_different_values() {
        let mut manager = StreamManager::with_seed(7);
        let a = manager.stream("traits").next_f64();
        let b = manager.stream("visual").next_f64();
        assert_ne!(a, b);
    }

    #[test]
    fn test_lru_eviction() {
        let mut manager = StreamManager::new(StreamOptions {
            initial_seed: 1,
            cache_streams: true,
            max_cached: 5,
        });
        // touching "traits" makes "physics" the least recently used
        manager.stream("traits");
        manager.stream("extra");
        assert_eq!(manager.len(), 5);
        assert!(manager.contains("traits"));
        assert!(manager.contains("extra"));
        assert!(!manager.contains("physics"));
    }

    #[test]
    fn test_uncached_streams_restart() {
        let mut manager = StreamManager::new(StreamOptions {
            initial_seed: 3,
            cache_streams: false,
            max_cached: 20,
        });
        assert!(manager.is_empty());
        let first = manager.stream("traits");
        assert!(!first.is_cached());
        drop(first);
        let a = manager.stream("traits").next_f64();
        let b = manager.stream("traits").next_f64();
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_master_seed_recreates_streams() {
        let mut manager = StreamManager::with_seed(1);
        manager.stream("custom").next_f64();
        manager.set_master_seed(99);

        assert_eq!(manager.master_seed(), 99);
        assert_eq!(manager.len(), 6);
        let value = manager.stream("custom").next_f64();
        let mut expected = Mulberry32::new(derive_stream_seed(99, "custom"));
        assert_eq!(value, expected.next_f64());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut manager = StreamManager::with_seed(1);
        assert!(manager.remove_stream("visual"));
        assert!(!manager.remove_stream("visual"));
        assert_eq!(manager.len(), 4);
        assert!(!manager.stream_names().contains(&"visual".to_string()));

        manager.clear_streams();
        assert!(manager.is_empty());
        assert!(manager.stream_names().is_empty());
    }

    #[test]
    fn test_explicit_seed_stream() {
        let mut manager = StreamManager::with_seed(1);
        let value = manager.get_or_create_stream("block", 500).next_f64();
        let mut expected = Mulberry32::new(derive_stream_seed(500, "block"));
        assert_eq!(value, expected.next_f64());
        // cached: the seed argument is ignored once the stream exists
        let next = manager.get_or_create_stream("block", 1).next_f64();
        assert_eq!(next, expected.next_f64());
    }

    #[test]
    fn test_create_stream_replaces_progress() {
        let mut manager = StreamManager::with_seed(1);
        let first = manager.stream("traits").next_f64();
        manager.stream("traits").next_f64();

        let mut replaced = manager.create_stream("traits", 1);
        assert!(replaced.is_cached());
        assert_eq!(replaced.next_f64(), first);
        assert_eq!(manager.len(), 5);
        assert_eq!(manager.stream_names().last().map(String::as_str), Some("traits"));
    }
}
