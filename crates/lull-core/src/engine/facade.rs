//! Engine facade
//!
//! [`Engine`] is the one handle a front-end holds. It wires the asset cache,
//! the channel engine and the master bus to an output device and a state
//! store, and keeps the persisted mix in step with user changes.
//!
//! ```ignore
//! let engine = Engine::init(EngineSetup {
//!     device,
//!     source: Arc::new(FsAssetSource::new(&config.sounds_dir)),
//!     store: Arc::new(YamlStateStore::new(&config.state_path)),
//!     share_origin: config.share_origin.clone(),
//!     launch_link: None,
//! });
//!
//! engine.set_channel_volume(SoundId::Rain, 70.0).await?;
//! engine.play_all().await?;
//! println!("{}", engine.share_link());
//! ```

use std::sync::Arc;

use crossbeam::channel::Receiver;

use super::channel::{ChannelEngine, PlayReport};
use super::error::EngineResult;
use super::events::{EngineEvent, EventBus};
use super::master::MasterBus;
use crate::asset::{AssetCache, AssetSource};
use crate::audio::OutputDevice;
use crate::catalog::SoundId;
use crate::mix::Mix;
use crate::persist::{MixLevels, PersistedState, StateStore};

/// Everything [`Engine::init`] needs
pub struct EngineSetup {
    pub device: Arc<dyn OutputDevice>,
    pub source: Arc<dyn AssetSource>,
    pub store: Arc<dyn StateStore>,
    /// Prefix of generated share links
    pub share_origin: String,
    /// Share link the session was opened with; overrides persisted volumes
    pub launch_link: Option<String>,
}

/// One channel as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSnapshot {
    pub id: SoundId,
    pub display_name: &'static str,
    pub volume: f32,
    pub is_playing: bool,
    /// A start or prefetch is waiting on the asset
    pub is_loading: bool,
}

/// Read-only view of the whole mixer
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub master_volume: f32,
    pub is_master_playing: bool,
    pub channels: Vec<ChannelSnapshot>,
}

struct EngineInner {
    device: Arc<dyn OutputDevice>,
    cache: AssetCache,
    channels: Arc<ChannelEngine>,
    master: MasterBus,
    store: Arc<dyn StateStore>,
    events: EventBus,
    share_origin: String,
}

/// Session handle to the mixer
///
/// Cheap to clone; every clone drives the same engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Build the engine and restore the persisted mix
    ///
    /// Volumes come from the catalog defaults, overlaid with the stored state,
    /// overlaid with the launch link. The link override is not saved until a
    /// later change saves the whole mix. Playback starts paused.
    pub fn init(setup: EngineSetup) -> Self {
        let EngineSetup {
            device,
            source,
            store,
            share_origin,
            launch_link,
        } = setup;

        let events = EventBus::default();
        let cache = AssetCache::new(source, device.sample_rate());
        let channels = Arc::new(ChannelEngine::new(
            Arc::clone(&device),
            cache.clone(),
            events.clone(),
        ));
        let master = MasterBus::new(Arc::clone(&device), Arc::clone(&channels), events.clone());

        let mut levels = match store.load() {
            Ok(Some(state)) => state.merge(),
            Ok(None) => MixLevels::default(),
            Err(e) => {
                log::warn!("Engine::init: failed to load saved mix: {:#}, using defaults", e);
                MixLevels::default()
            }
        };

        if let Some(link) = launch_link.as_deref() {
            let mix = Mix::parse(link);
            if mix.is_empty() {
                log::warn!("Engine::init: share link '{}' has no known sounds", link);
            } else {
                log::info!("Engine::init: applying shared mix '{}'", mix);
                levels.apply_mix(&mix);
            }
        }

        master.set_master_volume(levels.master_volume);
        for id in SoundId::ALL {
            channels.set_volume(id, levels.channel(id));
        }

        log::info!(
            "Engine::init: ready on '{}' at {}Hz",
            device.name(),
            device.sample_rate()
        );

        Self {
            inner: Arc::new(EngineInner {
                device,
                cache,
                channels,
                master,
                store,
                events,
                share_origin,
            }),
        }
    }

    /// Resume output and start every channel with volume above zero
    pub async fn play_all(&self) -> EngineResult<PlayReport> {
        self.inner.master.play().await
    }

    /// Stop every channel, keeping positions
    pub fn pause_all(&self) {
        self.inner.master.pause();
    }

    /// Flip the master gate, returning whether the mix is now playing
    pub async fn toggle(&self) -> EngineResult<bool> {
        if self.is_playing() {
            self.pause_all();
            Ok(false)
        } else {
            self.play_all().await?;
            Ok(true)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.inner.master.is_playing()
    }

    pub fn set_master_volume(&self, volume: f32) -> f32 {
        let volume = self.inner.master.set_master_volume(volume);
        self.save();
        volume
    }

    /// Set one channel's volume (clamped to `0..=100`) and persist the mix
    ///
    /// A positive volume starts the channel when the mix is playing, or
    /// warms the asset cache when it is paused. While a `play_all` is still
    /// waiting on the device the channel is left to that call. Zero stops
    /// the channel, keeping its position for later.
    pub async fn set_channel_volume(&self, id: SoundId, volume: f32) -> EngineResult<()> {
        let inner = &self.inner;
        let level = inner.channels.set_volume(id, volume);
        self.save();

        if level == 0.0 {
            inner.channels.stop(id)?;
        } else if inner.master.is_live() {
            inner.channels.start(id).await?;
        } else {
            inner.cache.prefetch(id);
        }
        Ok(())
    }

    /// Silence and stop every channel; the master gate stays as it is
    pub fn mute_all(&self) {
        for id in SoundId::ALL {
            self.inner.channels.set_volume(id, 0.0);
        }
        self.inner.channels.pause_all();
        self.save();
    }

    /// Link to the current mix: `<origin>?rain50,fire30`
    pub fn share_link(&self) -> String {
        self.current_mix().share_link(&self.inner.share_origin)
    }

    /// The audible channels and their rounded volumes
    pub fn current_mix(&self) -> Mix {
        Mix::from_levels(SoundId::ALL.map(|id| (id, self.inner.channels.level(id))))
    }

    /// Apply a share link as volume overrides
    ///
    /// Only listed sounds change. While playing, listed sounds are started or
    /// stopped to match their new volume.
    pub async fn apply_share_link(&self, link: &str) -> PlayReport {
        let inner = &self.inner;
        let mix = Mix::parse(link);
        if mix.is_empty() {
            log::warn!("Engine: share link '{}' has no known sounds", link);
            return PlayReport::default();
        }

        let mut audible = Vec::new();
        for &(id, volume) in mix.entries() {
            if inner.channels.set_volume(id, volume as f32) > 0.0 {
                audible.push(id);
            } else if let Err(e) = inner.channels.stop(id) {
                log::error!("Engine: failed to stop '{}': {}", id, e);
            }
        }
        log::info!("Engine: applied shared mix '{}'", mix);

        if inner.master.is_live() {
            inner.channels.start_many(&audible).await
        } else {
            for id in audible {
                inner.cache.prefetch(id);
            }
            PlayReport::default()
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let inner = &self.inner;
        EngineSnapshot {
            master_volume: inner.master.volume(),
            is_master_playing: inner.master.is_playing(),
            channels: SoundId::ALL
                .into_iter()
                .map(|id| ChannelSnapshot {
                    id,
                    display_name: id.descriptor().display_name,
                    volume: inner.channels.level(id),
                    is_playing: inner.channels.is_playing(id),
                    is_loading: inner.channels.is_pending(id) || inner.cache.is_loading(id),
                })
                .collect(),
        }
    }

    /// Receive playback events
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    pub fn device(&self) -> &dyn OutputDevice {
        self.inner.device.as_ref()
    }

    fn levels(&self) -> MixLevels {
        let mut levels = MixLevels::default();
        levels.master_volume = self.inner.master.volume();
        for id in SoundId::ALL {
            levels.set_channel(id, self.inner.channels.level(id));
        }
        levels
    }

    fn save(&self) {
        let state = PersistedState::from_levels(&self.levels());
        if let Err(e) = self.inner.store.save(&state) {
            log::warn!("Engine: failed to save mix: {:#}", e);
        }
    }
}
