//! Ambience loop assets
//!
//! - [`AssetSource`]: where the encoded bytes come from (filesystem by default)
//! - [`decode_audio`]: symphonia decode to stereo frames at the device rate
//! - [`AssetCache`]: session-lifetime buffer cache with request coalescing

mod cache;
mod decode;
mod error;
mod source;

pub use cache::AssetCache;
pub use decode::{decode_audio, AudioBuffer};
pub use error::{AssetError, AssetResult};
pub use source::{AssetSource, FsAssetSource};

#[cfg(test)]
pub(crate) use cache::tests::TestSource;
