//! Command line flags

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser, Clone, PartialEq)]
#[command(name = "lull")]
#[command(about = "Terminal ambient sound mixer")]
pub struct Cli {
    /// Config file (default: <config dir>/lull/config.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Open a shared mix, e.g. 'https://lull.app?rain50,fire30'.
    #[arg(long)]
    pub link: Option<String>,

    /// List audio output devices and exit.
    #[arg(long)]
    pub list_devices: bool,

    /// Run without audio output.
    #[arg(long)]
    pub offline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("lull").chain(args.iter().copied()))
    }

    #[test]
    fn test_no_args() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(cli.link, None);
        assert!(!cli.list_devices);
        assert!(!cli.offline);
    }

    #[test]
    fn test_all_flags() {
        let cli = parse(&["--config", "/tmp/lull.yaml", "--link", "?rain50", "--offline", "--list-devices"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/lull.yaml")));
        assert_eq!(cli.link.as_deref(), Some("?rain50"));
        assert!(cli.offline);
        assert!(cli.list_devices);
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--link"]).is_err());
        assert!(parse(&["--loud"]).is_err());
    }

    #[test]
    fn test_command_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
