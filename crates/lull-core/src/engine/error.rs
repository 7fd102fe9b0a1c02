//! Engine error types

use thiserror::Error;

use crate::asset::AssetError;
use crate::audio::DeviceError;
use crate::graph::GraphError;

/// Errors returned by engine operations
///
/// None of these are fatal: a failed channel leaves the others playing and a
/// failed device resume leaves the mix paused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A sound could not be loaded
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// The output device refused to resume
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// The audio thread did not accept a command
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
