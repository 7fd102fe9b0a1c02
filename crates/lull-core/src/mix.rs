//! Share-link mix format
//!
//! A mix is the list of audible channels and their volumes, written as
//! comma-separated `<id><volume>` tokens after a `?`:
//!
//! ```text
//! https://lull.app?rain50,fire30,cat12
//! ```
//!
//! Parsing is lenient. Malformed tokens and unknown ids are dropped, so a
//! link from a newer catalog still opens with whatever this build knows.

use std::fmt;

use crate::catalog::SoundId;

/// An ordered set of `(sound, volume)` pairs
///
/// Volumes are kept as parsed (they may exceed 100); the engine clamps when
/// applying them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mix {
    entries: Vec<(SoundId, u32)>,
}

impl Mix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mix from channel levels, keeping only audible channels
    ///
    /// Volumes are rounded to the nearest integer. An audible level below
    /// one is written as 1 so the link never silences it.
    pub fn from_levels<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = (SoundId, f32)>,
    {
        let mut mix = Self::new();
        for (id, level) in levels {
            if level > 0.0 {
                mix.set(id, level.round().max(1.0) as u32);
            }
        }
        mix
    }

    /// Set the volume of `id`, replacing an earlier entry in place
    pub fn set(&mut self, id: SoundId, volume: u32) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = volume,
            None => self.entries.push((id, volume)),
        }
    }

    pub fn get(&self, id: SoundId) -> Option<u32> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, volume)| *volume)
    }

    pub fn entries(&self) -> &[(SoundId, u32)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The token list, e.g. `rain50,fire30`
    pub fn encode(&self) -> String {
        self.entries
            .iter()
            .map(|(id, volume)| format!("{}{}", id, volume))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Full share link: `<origin>?<tokens>`
    pub fn share_link(&self, origin: &str) -> String {
        format!("{}?{}", origin, self.encode())
    }

    /// Parse a share link or a bare token list
    ///
    /// Only the part after the first `?` is read when there is one. Never
    /// fails: anything that doesn't parse is skipped.
    pub fn parse(input: &str) -> Self {
        let query = match input.split_once('?') {
            Some((_, query)) => query,
            None => input,
        };

        let mut mix = Self::new();
        for token in query.trim().split(',') {
            let Some((name, volume)) = split_token(token) else {
                if !token.is_empty() {
                    log::debug!("Mix::parse: dropping malformed token '{}'", token);
                }
                continue;
            };
            match name.parse::<SoundId>() {
                Ok(id) => mix.set(id, volume),
                Err(e) => log::debug!("Mix::parse: {}", e),
            }
        }
        mix
    }
}

impl fmt::Display for Mix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Split `<letters><digits>` into its parts
///
/// Both parts must be non-empty and nothing else may appear. Digit runs
/// too large for `u32` saturate.
fn split_token(token: &str) -> Option<(&str, u32)> {
    let digits_at = token.find(|c: char| !c.is_ascii_alphabetic())?;
    let (name, digits) = token.split_at(digits_at);
    if name.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let volume = digits.bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    });
    Some((name, volume))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_skips_silent_channels() {
        let mix = Mix::from_levels([
            (SoundId::Rain, 50.0),
            (SoundId::Wind, 0.0),
            (SoundId::Fire, 29.6),
        ]);
        assert_eq!(mix.encode(), "rain50,fire30");
        assert_eq!(mix.share_link("https://lull.app"), "https://lull.app?rain50,fire30");
    }

    #[test]
    fn test_faint_channel_stays_audible() {
        let mix = Mix::from_levels([(SoundId::Rain, 0.4), (SoundId::Fire, 30.0)]);
        assert_eq!(mix.encode(), "rain1,fire30");
        assert_eq!(Mix::parse(&mix.encode()).get(SoundId::Rain), Some(1));
    }

    #[test]
    fn test_link_survives_a_round_trip() {
        let mix = Mix::from_levels([(SoundId::Rain, 50.0), (SoundId::Fire, 30.0)]);
        let parsed = Mix::parse(&mix.share_link("http://localhost:3000"));
        assert_eq!(parsed, mix);
        assert_eq!(parsed.get(SoundId::Rain), Some(50));
        assert_eq!(parsed.get(SoundId::Fire), Some(30));
        assert_eq!(parsed.get(SoundId::Wind), None);
    }

    #[test]
    fn test_malformed_and_unknown_tokens_are_dropped() {
        let mix = Mix::parse("rain50,bogus,fire");
        assert_eq!(mix.entries(), &[(SoundId::Rain, 50)]);

        assert!(Mix::parse("xyz999999").is_empty());
        assert!(Mix::parse("Rain50,50rain,ra1n5,wind 10,").is_empty());
        assert!(Mix::parse("").is_empty());
        assert!(Mix::parse("https://lull.app?").is_empty());
    }

    #[test]
    fn test_only_query_after_first_question_mark_is_read() {
        let mix = Mix::parse("wind20?rain5");
        assert_eq!(mix.entries(), &[(SoundId::Rain, 5)]);
    }

    #[test]
    fn test_duplicates_overwrite_in_place() {
        let mix = Mix::parse("rain10,fire20,rain30");
        assert_eq!(mix.entries(), &[(SoundId::Rain, 30), (SoundId::Fire, 20)]);
    }

    #[test]
    fn test_huge_volume_saturates() {
        let mix = Mix::parse("cat99999999999999");
        assert_eq!(mix.get(SoundId::Cat), Some(u32::MAX));
    }
}
