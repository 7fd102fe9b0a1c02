//! Asset loading error types

use thiserror::Error;

use crate::catalog::SoundId;

/// Errors that can occur while fetching or decoding an ambience loop
///
/// Cloneable because one failed load is reported to every caller that was
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Asset bytes could not be read (missing file, I/O failure)
    #[error("Failed to fetch '{id}': {reason}")]
    Fetch { id: SoundId, reason: String },

    /// Asset bytes are not decodable audio
    #[error("Failed to decode '{id}': {reason}")]
    Decode { id: SoundId, reason: String },
}

impl AssetError {
    /// Sound the failure belongs to
    pub fn id(&self) -> SoundId {
        match self {
            AssetError::Fetch { id, .. } | AssetError::Decode { id, .. } => *id,
        }
    }
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;
