//! Sound catalog - the fixed set of ambience loops
//!
//! Every sound the engine can play is a [`SoundId`] variant with one static
//! [`SoundDescriptor`]. Ids are lowercase ASCII letters only, which keeps them
//! compatible with the share-link token grammar (`<letters><digits>`).

use std::fmt;
use std::str::FromStr;

/// Number of sounds in the catalog
pub const NUM_SOUNDS: usize = 10;

/// Volume a channel starts at when nothing has been persisted for it
pub const DEFAULT_CHANNEL_VOLUME: f32 = 50.0;

/// Master volume used when nothing has been persisted
pub const DEFAULT_MASTER_VOLUME: f32 = 100.0;

/// Sound identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum SoundId {
    Rain = 0,
    Downpour = 1,
    Storm = 2,
    Wind = 3,
    Waves = 4,
    Fire = 5,
    Birds = 6,
    Cat = 7,
    People = 8,
    Crowd = 9,
}

impl SoundId {
    /// All sounds in catalog order (also the share-link encoding order)
    pub const ALL: [SoundId; NUM_SOUNDS] = [
        SoundId::Rain,
        SoundId::Downpour,
        SoundId::Storm,
        SoundId::Wind,
        SoundId::Waves,
        SoundId::Fire,
        SoundId::Birds,
        SoundId::Cat,
        SoundId::People,
        SoundId::Crowd,
    ];

    /// Stable textual id (used in share links and the persisted state)
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundId::Rain => "rain",
            SoundId::Downpour => "downpour",
            SoundId::Storm => "storm",
            SoundId::Wind => "wind",
            SoundId::Waves => "waves",
            SoundId::Fire => "fire",
            SoundId::Birds => "birds",
            SoundId::Cat => "cat",
            SoundId::People => "people",
            SoundId::Crowd => "crowd",
        }
    }

    /// Position in [`SoundId::ALL`]
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Static descriptor for this sound
    pub fn descriptor(&self) -> &'static SoundDescriptor {
        &CATALOG[self.index()]
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a catalog id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sound id: {0}")]
pub struct UnknownSoundId(pub String);

impl FromStr for SoundId {
    type Err = UnknownSoundId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoundId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownSoundId(s.to_string()))
    }
}

/// Static description of one ambience loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundDescriptor {
    pub id: SoundId,
    /// Human-readable name for the UI
    pub display_name: &'static str,
    /// File name relative to the sounds directory
    pub asset_path: &'static str,
}

/// The catalog, indexed by `SoundId as usize`
pub static CATALOG: [SoundDescriptor; NUM_SOUNDS] = [
    SoundDescriptor { id: SoundId::Rain, display_name: "Calm Rain", asset_path: "rain.flac" },
    SoundDescriptor { id: SoundId::Downpour, display_name: "Rain", asset_path: "rain2.ogg" },
    SoundDescriptor { id: SoundId::Storm, display_name: "Storm", asset_path: "storm.wav" },
    SoundDescriptor { id: SoundId::Wind, display_name: "Wind", asset_path: "wind.wav" },
    SoundDescriptor { id: SoundId::Waves, display_name: "Waves", asset_path: "waves.wav" },
    SoundDescriptor { id: SoundId::Fire, display_name: "Fire", asset_path: "fire.flac" },
    SoundDescriptor { id: SoundId::Birds, display_name: "Birds", asset_path: "birds.wav" },
    SoundDescriptor { id: SoundId::Cat, display_name: "Cat Purring", asset_path: "cat.wav" },
    SoundDescriptor { id: SoundId::People, display_name: "Talking", asset_path: "people.wav" },
    SoundDescriptor { id: SoundId::Crowd, display_name: "Talking II", asset_path: "people2.wav" },
];
