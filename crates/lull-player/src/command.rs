//! Interactive commands read from stdin

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use lull_core::SoundId;

pub const HELP: &str = "\
Commands:
  play              Start the mix
  pause             Pause the mix (positions are kept)
  toggle            Play or pause
  master <0-100>    Set the master volume
  vol <sound> <0-100>
                    Set a sound's volume (0 stops it)
  mute              Set every sound to 0
  share             Print a link to the current mix
  open <link>       Apply a shared mix
  status            Show volumes and what is playing
  sounds            List sound ids
  help              Show this help
  quit              Exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Master(f32),
    Volume(SoundId, f32),
    Mute,
    Share,
    Open(String),
    Status,
    Sounds,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("empty command");
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "play" => Command::Play,
            "pause" => Command::Pause,
            "toggle" | "t" => Command::Toggle,
            "master" | "m" => Command::Master(volume_arg(words.next())?),
            "vol" | "v" => {
                let id = words
                    .next()
                    .context("usage: vol <sound> <0-100>")?
                    .parse::<SoundId>()
                    .map_err(|e| anyhow!("{} (try 'sounds')", e))?;
                Command::Volume(id, volume_arg(words.next())?)
            }
            "mute" => Command::Mute,
            "share" => Command::Share,
            "open" => Command::Open(words.next().context("usage: open <link>")?.to_string()),
            "status" | "s" => Command::Status,
            "sounds" => Command::Sounds,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command '{}' (try 'help')", other),
        };

        if let Some(extra) = words.next() {
            bail!("unexpected argument '{}'", extra);
        }
        Ok(command)
    }
}

/// Volumes outside 0-100 are accepted here and clamped by the engine
fn volume_arg(word: Option<&str>) -> Result<f32> {
    let word = word.context("missing volume")?;
    let volume: f32 = word
        .parse()
        .with_context(|| format!("'{}' is not a volume", word))?;
    if !volume.is_finite() {
        bail!("'{}' is not a volume", word);
    }
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command> {
        line.parse()
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("play").unwrap(), Command::Play);
        assert_eq!(parse("  PAUSE ").unwrap(), Command::Pause);
        assert_eq!(parse("t").unwrap(), Command::Toggle);
        assert_eq!(parse("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_volume_commands() {
        assert_eq!(parse("master 40").unwrap(), Command::Master(40.0));
        assert_eq!(parse("vol rain 75.5").unwrap(), Command::Volume(SoundId::Rain, 75.5));
        assert_eq!(parse("v fire 250").unwrap(), Command::Volume(SoundId::Fire, 250.0));
    }

    #[test]
    fn test_open_keeps_link_verbatim() {
        assert_eq!(
            parse("open https://lull.app?rain50,fire30").unwrap(),
            Command::Open("https://lull.app?rain50,fire30".to_string())
        );
    }

    #[test]
    fn test_bad_input() {
        assert!(parse("").is_err());
        assert!(parse("dance").is_err());
        assert!(parse("vol thunder 20").is_err());
        assert!(parse("vol rain").is_err());
        assert!(parse("master loud").is_err());
        assert!(parse("master NaN").is_err());
        assert!(parse("play now").is_err());
    }
}
