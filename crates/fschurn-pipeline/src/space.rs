//! Free-space queries for the fill generator.

use std::io;
use std::path::Path;

use nix::sys::statvfs::statvfs;

/// Reports how many bytes an unprivileged writer can still place under a path.
pub trait SpaceProbe {
    fn available_bytes(&self, path: &Path) -> io::Result<u64>;
}

/// Asks the filesystem via `statvfs(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsProbe;

impl SpaceProbe for StatvfsProbe {
    #[allow(clippy::unnecessary_cast)]
    fn available_bytes(&self, path: &Path) -> io::Result<u64> {
        let stat = statvfs(path).map_err(io::Error::from)?;
        Ok((stat.fragment_size() as u64).saturating_mul(stat.blocks_available() as u64))
    }
}

/// A fixed answer, for tests and dry runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedSpace(pub u64);

impl SpaceProbe for FixedSpace {
    fn available_bytes(&self, _path: &Path) -> io::Result<u64> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_statvfs_reports_space() {
        let temp = TempDir::new().unwrap();
        // Any writable temp filesystem has at least a little room left
        assert!(StatvfsProbe.available_bytes(temp.path()).unwrap() > 0);
    }

    #[test]
    fn test_statvfs_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = StatvfsProbe
            .available_bytes(&temp.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
