//! Watermark persistence

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::Watermark;

/// Config key holding the push watermark
pub const LAST_MODIFIED_KEY: &str = "PB_LASTMODIFIED";

/// Storage for the sync watermark
///
/// Read once when a sync starts and written at most once when it succeeds.
/// Implementations do not guard against concurrent writers.
pub trait WatermarkStore {
    /// Current watermark; `Watermark::ZERO` if none was ever saved
    fn load(&self) -> Result<Watermark>;

    /// Replace the stored watermark
    fn save(&self, watermark: Watermark) -> Result<()>;
}

impl<S: WatermarkStore + ?Sized> WatermarkStore for &S {
    fn load(&self) -> Result<Watermark> {
        (**self).load()
    }

    fn save(&self, watermark: Watermark) -> Result<()> {
        (**self).save(watermark)
    }
}

/// Watermark kept in the `KEY=value` config file
pub struct ConfigWatermarkStore {
    path: PathBuf,
}

impl ConfigWatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by the default config file
    pub fn open_default() -> Result<Self> {
        let path = config::config_file().context("Could not determine config directory")?;
        Ok(Self::new(path))
    }
}

impl WatermarkStore for ConfigWatermarkStore {
    fn load(&self) -> Result<Watermark> {
        let file = config::KeyValueFile::open(&self.path)?;
        match file.get(LAST_MODIFIED_KEY) {
            Some(value) => value
                .parse()
                .with_context(|| format!("Invalid {} in {}", LAST_MODIFIED_KEY, self.path.display())),
            None => Ok(Watermark::ZERO),
        }
    }

    fn save(&self, watermark: Watermark) -> Result<()> {
        // Re-read so keys written since startup survive the rewrite
        let mut file = config::KeyValueFile::open(&self.path)?;
        file.set(LAST_MODIFIED_KEY, watermark.to_string());
        file.save()
    }
}

/// In-memory watermark store, used in tests
#[derive(Default)]
pub struct InMemoryWatermarkStore {
    watermark: RwLock<Watermark>,
    saves: AtomicUsize,
}

impl InMemoryWatermarkStore {
    pub fn new(watermark: Watermark) -> Self {
        Self {
            watermark: RwLock::new(watermark),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of times `save` was called
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl WatermarkStore for InMemoryWatermarkStore {
    fn load(&self) -> Result<Watermark> {
        Ok(*self.watermark.read().unwrap())
    }

    fn save(&self, watermark: Watermark) -> Result<()> {
        *self.watermark.write().unwrap() = watermark;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_store_defaults_to_zero() {
        let dir = TempDir::new().unwrap();
        let store = ConfigWatermarkStore::new(dir.path().join("config"));
        assert_eq!(store.load().unwrap(), Watermark::ZERO);
    }

    #[test]
    fn test_config_store_rewrites_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "PB_API_KEY=o.key\nPB_LASTMODIFIED=1000\n").unwrap();

        let store = ConfigWatermarkStore::new(&path);
        assert_eq!(store.load().unwrap(), Watermark::new(1000));

        store.save(Watermark::new(1010)).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "PB_API_KEY=o.key\nPB_LASTMODIFIED=1010\n"
        );
    }

    #[test]
    fn test_config_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "PB_LASTMODIFIED=soon\n").unwrap();
        assert!(ConfigWatermarkStore::new(&path).load().is_err());
    }

    #[test]
    fn test_in_memory_store_counts_saves() {
        let store = InMemoryWatermarkStore::new(Watermark::new(5));
        assert_eq!(store.load().unwrap(), Watermark::new(5));
        store.save(Watermark::new(9)).unwrap();
        assert_eq!(store.load().unwrap(), Watermark::new(9));
        assert_eq!(store.save_count(), 1);
    }
}
