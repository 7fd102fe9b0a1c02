//! Text rendering of the engine state

use std::fmt::Write;

use lull_core::audio::DeviceInfo;
use lull_core::{EngineEvent, EngineSnapshot, CATALOG};

/// Master line followed by one line per sound
pub fn format_snapshot(snapshot: &EngineSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Master {:>3.0}  [{}]",
        snapshot.master_volume,
        if snapshot.is_master_playing { "playing" } else { "paused" }
    );
    for channel in &snapshot.channels {
        let state = if channel.is_playing {
            "playing"
        } else if channel.is_loading {
            "loading"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {:<9} {:<12} {:>3.0}  {}",
            channel.id.as_str(),
            channel.display_name,
            channel.volume,
            state
        );
    }
    out
}

pub fn format_sounds() -> String {
    CATALOG
        .iter()
        .map(|sound| format!("  {:<9} {}", sound.id.as_str(), sound.display_name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_devices(devices: &[DeviceInfo]) -> String {
    devices
        .iter()
        .map(|device| format!("  {}", device))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line for events worth telling the user about
pub fn format_event(event: &EngineEvent) -> Option<String> {
    match event {
        EngineEvent::ChannelFailed { id, error } => Some(format!("! {} unavailable: {}", id, error)),
        EngineEvent::ChannelStarted { .. }
        | EngineEvent::ChannelStopped { .. }
        | EngineEvent::MasterChanged { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lull_core::asset::AssetError;
    use lull_core::engine::{ChannelSnapshot, EngineError};
    use lull_core::SoundId;

    #[test]
    fn test_snapshot_lists_every_channel() {
        let snapshot = EngineSnapshot {
            master_volume: 80.0,
            is_master_playing: true,
            channels: vec![
                ChannelSnapshot {
                    id: SoundId::Rain,
                    display_name: "Calm Rain",
                    volume: 50.0,
                    is_playing: true,
                    is_loading: false,
                },
                ChannelSnapshot {
                    id: SoundId::Fire,
                    display_name: "Fire",
                    volume: 20.0,
                    is_playing: false,
                    is_loading: true,
                },
            ],
        };

        let text = format_snapshot(&snapshot);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("80") && lines[0].contains("playing"));
        assert!(lines[1].contains("rain") && lines[1].contains("Calm Rain"));
        assert!(lines[2].contains("loading"));
    }

    #[test]
    fn test_sounds_lists_catalog() {
        assert_eq!(format_sounds().lines().count(), SoundId::ALL.len());
    }

    #[test]
    fn test_only_failures_are_shown() {
        let failed = EngineEvent::ChannelFailed {
            id: SoundId::Cat,
            error: EngineError::Asset(AssetError::Fetch {
                id: SoundId::Cat,
                reason: "missing".to_string(),
            }),
        };
        assert!(format_event(&failed).unwrap().contains("cat"));
        assert!(format_event(&EngineEvent::MasterChanged { playing: true }).is_none());
    }
}
