//! Isolated store fixtures for tests.
//!
//! # Usage
//!
//! ```ignore
//! use fschurn_store::testing::TestStore;
//!
//! let env = TestStore::new().unwrap();
//! let entries = env.populate(10, 4096).unwrap();
//! // env.root is a fresh store with ten verified entries
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use crate::{ContentStore, RandomReader, Result, StoreEntry, StoreOptions};

/// Atomic counter so every fixture gets distinct generated content
static FIXTURE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary store root that is removed on drop
pub struct TestStore {
    _temp_dir: TempDir,
    /// Store root directory
    pub root: PathBuf,
    pub store: ContentStore,
    seed: u64,
}

impl TestStore {
    /// Create an empty store with a staging directory.
    pub fn new() -> Result<Self> {
        Self::with_options(StoreOptions::default())
    }

    pub fn with_options(options: StoreOptions) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("store");
        std::fs::create_dir_all(&root)?;

        let store = ContentStore::new(&root, options);
        store.prepare()?;

        Ok(Self {
            _temp_dir: temp_dir,
            root,
            store,
            seed: FIXTURE_COUNTER.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Write `count` entries of `size` random bytes each.
    pub fn populate(&self, count: usize, size: u64) -> Result<Vec<StoreEntry>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..count)
            .map(|_| self.store.write(0, RandomReader::new(&mut rng), size))
            .collect()
    }

    /// Create a plain (non-entry) file under the root.
    pub fn create_file(&self, relative_path: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Flip one byte of a file in place without renaming it.
    pub fn corrupt(&self, path: &Path, offset: usize) -> Result<()> {
        let mut bytes = std::fs::read(path)?;
        if let Some(b) = bytes.get_mut(offset) {
            *b ^= 0xff;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Files currently sitting in the staging directory.
    pub fn staged_files(&self) -> Result<usize> {
        Ok(std::fs::read_dir(self.store.staging_dir())?.count())
    }

    /// Every committed entry path (`<shard>/<digest>`), sorted.
    pub fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for shard in std::fs::read_dir(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() || shard.file_name() == crate::STAGING_DIR {
                continue;
            }
            for entry in std::fs::read_dir(shard.path())? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    paths.push(entry.path());
                }
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_starts_empty() {
        let env = TestStore::new().unwrap();
        assert!(env.root.exists());
        assert_eq!(env.staged_files().unwrap(), 0);
        assert!(env.entry_paths().unwrap().is_empty());
    }

    #[test]
    fn test_populate_writes_distinct_entries() {
        let env = TestStore::new().unwrap();
        let entries = env.populate(5, 256).unwrap();
        assert_eq!(env.entry_paths().unwrap().len(), 5);
        for entry in &entries {
            assert!(env.store.verify(&entry.path).unwrap().is_intact());
        }
    }

    #[test]
    fn test_corrupt_breaks_verification() {
        let env = TestStore::new().unwrap();
        let entry = env.populate(1, 64).unwrap().remove(0);
        env.corrupt(&entry.path, 10).unwrap();
        assert!(!env.store.verify(&entry.path).unwrap().is_intact());
    }
}
