//! Decoded image arena.
//!
//! Entities hold only an [`ImageKey`]; the pixels live here. Sources are
//! decoded on first use and evicted least-recently-used when the arena
//! grows past its limits. Failed sources are remembered so a broken photo
//! warns once instead of every frame.

use std::collections::{HashMap, HashSet};

use journal_core::{ImageKey, ImageSource, Size};

use crate::image::{load_source, DecodedImage};

#[derive(Debug)]
struct ArenaEntry {
    image: DecodedImage,
    last_used: u64,
}

/// Limits for the image arena.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Maximum decoded bytes held.
    pub max_bytes: usize,
    /// Maximum number of images held.
    pub max_entries: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_bytes: 256 * 1024 * 1024,
            max_entries: 256,
        }
    }
}

/// Arena statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Lookups served from the arena.
    pub hits: u64,
    /// Lookups that had to decode.
    pub misses: u64,
    /// Entries dropped to stay within limits.
    pub evictions: u64,
    /// Sources that could not be decoded.
    pub failures: u64,
}

/// Decoded images keyed by [`ImageKey`].
#[derive(Debug, Default)]
pub struct ImageArena {
    entries: HashMap<ImageKey, ArenaEntry>,
    failed: HashSet<ImageKey>,
    config: ArenaConfig,
    current_bytes: usize,
    tick: u64,
    stats: ArenaStats,
}

impl ImageArena {
    /// Create an arena with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Create an arena with custom limits.
    #[must_use]
    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            entries: HashMap::new(),
            failed: HashSet::new(),
            config,
            current_bytes: 0,
            tick: 0,
            stats: ArenaStats::default(),
        }
    }

    /// Look up `source`, decoding it on a miss.
    ///
    /// Returns `None` (after a single warning) if the source cannot be
    /// decoded.
    pub fn resolve(&mut self, source: &ImageSource) -> Option<&DecodedImage> {
        let key = source.key();
        if self.failed.contains(&key) {
            return None;
        }
        if self.entries.contains_key(&key) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            match load_source(source) {
                Ok(image) => self.insert(key, image),
                Err(err) => {
                    tracing::warn!(%key, %err, "image unavailable, skipping");
                    self.stats.failures += 1;
                    self.failed.insert(key);
                    return None;
                }
            }
        }
        self.touch(key)
    }

    /// Natural pixel size of `source`, decoding it if needed.
    pub fn natural_size(&mut self, source: &ImageSource) -> Option<Size> {
        self.resolve(source).map(DecodedImage::natural_size)
    }

    /// Store an already decoded image, replacing any previous entry.
    pub fn insert(&mut self, key: ImageKey, image: DecodedImage) {
        if let Some(old) = self.entries.remove(&key) {
            self.current_bytes -= old.image.size_bytes();
        }
        self.failed.remove(&key);
        let size = image.size_bytes();
        self.evict_for(size);
        self.current_bytes += size;
        self.tick += 1;
        self.entries.insert(
            key,
            ArenaEntry {
                image,
                last_used: self.tick,
            },
        );
        tracing::trace!(%key, size, "image stored");
    }

    /// Cached image without decoding.
    #[must_use]
    pub fn peek(&self, key: ImageKey) -> Option<&DecodedImage> {
        self.entries.get(&key).map(|entry| &entry.image)
    }

    /// Drop one image.
    pub fn remove(&mut self, key: ImageKey) -> Option<DecodedImage> {
        self.failed.remove(&key);
        let entry = self.entries.remove(&key)?;
        self.current_bytes -= entry.image.size_bytes();
        Some(entry.image)
    }

    /// Whether `key` is decoded and held.
    #[must_use]
    pub fn contains(&self, key: ImageKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Drop everything, including remembered failures.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.failed.clear();
        self.current_bytes = 0;
    }

    /// Number of held images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decoded bytes currently held.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.current_bytes
    }

    /// Lookup statistics.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }

    fn touch(&mut self, key: ImageKey) -> Option<&DecodedImage> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(&key).map(|entry| {
            entry.last_used = tick;
            &entry.image
        })
    }

    fn evict_for(&mut self, needed: usize) {
        while !self.entries.is_empty()
            && (self.current_bytes + needed > self.config.max_bytes
                || self.entries.len() >= self.config.max_entries)
        {
            self.evict_lru();
        }
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| *key);
        if let Some(key) = oldest {
            if let Some(entry) = self.entries.remove(&key) {
                self.current_bytes -= entry.image.size_bytes();
                self.stats.evictions += 1;
                tracing::trace!(%key, "image evicted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{encode_data_uri, encode_png, ImageFormat};

    fn solid(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            width,
            height,
            rgba: [10u8, 120, 200, 255].repeat((width * height) as usize),
            format: ImageFormat::Png,
        }
    }

    fn data_uri(width: u32, height: u32) -> ImageSource {
        let image = solid(width, height);
        let buffer = image::RgbaImage::from_raw(width, height, image.rgba).expect("buffer");
        ImageSource::new(encode_data_uri(&encode_png(&buffer).expect("png")))
    }

    #[test]
    fn test_resolve_decodes_once() {
        let mut arena = ImageArena::new();
        let source = data_uri(4, 3);
        assert_eq!(arena.natural_size(&source), Some(Size::new(4.0, 3.0)));
        assert!(arena.resolve(&source).is_some());
        assert_eq!(arena.stats().misses, 1);
        assert_eq!(arena.stats().hits, 1);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.size_bytes(), 4 * 3 * 4);
    }

    #[test]
    fn test_failure_is_remembered() {
        let mut arena = ImageArena::new();
        let source = ImageSource::new("file:///missing/photo.png");
        assert!(arena.resolve(&source).is_none());
        assert!(arena.resolve(&source).is_none());
        assert_eq!(arena.stats().failures, 1);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_insert_clears_failure() {
        let mut arena = ImageArena::new();
        let source = ImageSource::new("file:///missing/photo.png");
        assert!(arena.resolve(&source).is_none());
        arena.insert(source.key(), solid(2, 2));
        assert!(arena.resolve(&source).is_some());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut arena = ImageArena::with_config(ArenaConfig {
            max_bytes: 1024 * 1024,
            max_entries: 2,
        });
        let a = ImageKey::for_source("a");
        let b = ImageKey::for_source("b");
        let c = ImageKey::for_source("c");
        arena.insert(a, solid(2, 2));
        arena.insert(b, solid(2, 2));
        let _ = arena.touch(a);
        arena.insert(c, solid(2, 2));

        assert!(arena.contains(a));
        assert!(!arena.contains(b));
        assert!(arena.contains(c));
        assert_eq!(arena.stats().evictions, 1);
    }

    #[test]
    fn test_oversized_image_still_stored() {
        let mut arena = ImageArena::with_config(ArenaConfig {
            max_bytes: 16,
            max_entries: 8,
        });
        let key = ImageKey::for_source("big");
        arena.insert(key, solid(10, 10));
        assert!(arena.contains(key));
        assert!(arena.remove(key).is_some());
        assert_eq!(arena.size_bytes(), 0);
    }
}
