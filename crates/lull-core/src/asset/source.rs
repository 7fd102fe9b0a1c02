//! Asset sources - where ambience loop bytes come from

use std::path::{Path, PathBuf};

use crate::catalog::SoundDescriptor;

use super::error::{AssetError, AssetResult};

/// Provides the raw (still encoded) bytes of a catalog sound
///
/// Called from the blocking pool, never from the audio thread.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, descriptor: &SoundDescriptor) -> AssetResult<Vec<u8>>;
}

/// Reads assets from a directory on disk: `<root>/<asset_path>`
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsAssetSource {
    fn fetch(&self, descriptor: &SoundDescriptor) -> AssetResult<Vec<u8>> {
        let path = self.root.join(descriptor.asset_path);
        log::debug!("FsAssetSource: reading {:?}", path);
        std::fs::read(&path).map_err(|e| AssetError::Fetch {
            id: descriptor.id,
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SoundId;

    #[test]
    fn test_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsAssetSource::new(dir.path());
        let err = source.fetch(SoundId::Wind.descriptor()).unwrap_err();
        assert!(matches!(err, AssetError::Fetch { id: SoundId::Wind, .. }));
    }

    #[test]
    fn test_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fire.flac"), b"not really flac").unwrap();
        let source = FsAssetSource::new(dir.path());
        let bytes = source.fetch(SoundId::Fire.descriptor()).unwrap();
        assert_eq!(bytes, b"not really flac");
    }
}
