//! Lull - terminal ambient sound mixer
//!
//! Opens the audio output, restores the saved mix and reads commands from
//! stdin (`help` lists them).
//!
//! ## Command line flags
//!
//! - `--config <path>`: use another config file
//! - `--link <link>`: open a shared mix on top of the saved one
//! - `--list-devices`: print output devices and exit
//! - `--offline`: run without audio output

mod args;
mod audio;
mod command;
mod config;
mod view;

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use args::Cli;
use clap::Parser;
use command::{Command, HELP};
use lull_core::asset::FsAssetSource;
use lull_core::audio::list_output_devices;
use lull_core::config::MixerConfig;
use lull_core::engine::EngineError;
use lull_core::persist::YamlStateStore;
use lull_core::{Engine, EngineEvent, EngineSetup};

/// Everything the main loop reacts to
enum Input {
    Line(String),
    Event(EngineEvent),
    /// stdin reached EOF
    Closed,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if args.list_devices {
        let devices = list_output_devices()?;
        println!("{}", view::format_devices(&devices));
        return Ok(());
    }

    log::info!("lull starting up");
    let (config, config_path) = config::load(args.config.as_deref());
    log::info!("Using config {:?}, sounds from {:?}", config_path, config.sounds_dir);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("lull-worker")
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(run(args, config))
}

async fn run(args: Cli, config: MixerConfig) -> Result<()> {
    let output = audio::Output::open(&config.audio, args.offline);

    let engine = Engine::init(EngineSetup {
        device: Arc::clone(&output.device),
        source: Arc::new(FsAssetSource::new(&config.sounds_dir)),
        store: Arc::new(YamlStateStore::new(&config.state_path)),
        share_origin: config.share_origin.clone(),
        launch_link: args.link.clone(),
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_stdin_reader(tx.clone());
    spawn_event_forwarder(&engine, tx);

    println!("Lull - ambient mixer on '{}' (type 'help')", engine.device().name());
    print!("{}", view::format_snapshot(&engine.snapshot()));

    while let Some(input) = rx.recv().await {
        match input {
            Input::Line(line) if line.trim().is_empty() => {}
            Input::Line(line) => match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => execute(&engine, command),
                Err(e) => println!("{:#}", e),
            },
            Input::Event(event) => {
                if let Some(text) = view::format_event(&event) {
                    println!("{}", text);
                }
            }
            Input::Closed => break,
        }
    }

    engine.pause_all();
    drop(output);
    log::info!("lull stopped");
    Ok(())
}

/// Run one command
///
/// Anything that may wait on assets runs as its own task so pause and volume
/// changes stay responsive while sounds load.
fn execute(engine: &Engine, command: Command) {
    match command {
        Command::Play => {
            let engine = engine.clone();
            tokio::spawn(async move {
                if let Err(e) = engine.play_all().await {
                    println!("! could not start playback: {}", e);
                }
            });
        }
        Command::Pause => engine.pause_all(),
        Command::Toggle => {
            let engine = engine.clone();
            tokio::spawn(async move {
                match engine.toggle().await {
                    Ok(playing) => println!("{}", if playing { "playing" } else { "paused" }),
                    Err(e) => println!("! could not start playback: {}", e),
                }
            });
        }
        Command::Master(volume) => {
            let volume = engine.set_master_volume(volume);
            println!("master {:.0}", volume);
        }
        Command::Volume(id, volume) => {
            let engine = engine.clone();
            tokio::spawn(async move {
                match engine.set_channel_volume(id, volume).await {
                    Ok(()) => {}
                    // Start failures arrive as ChannelFailed events
                    Err(EngineError::Asset(_)) => {}
                    Err(e) => println!("! {}: {}", id, e),
                }
            });
        }
        Command::Mute => engine.mute_all(),
        Command::Share => println!("{}", engine.share_link()),
        Command::Open(link) => {
            let engine = engine.clone();
            tokio::spawn(async move {
                let report = engine.apply_share_link(&link).await;
                log::debug!("Applied link: {} started", report.started.len());
                print!("{}", view::format_snapshot(&engine.snapshot()));
            });
        }
        Command::Status => print!("{}", view::format_snapshot(&engine.snapshot())),
        Command::Sounds => println!("{}", view::format_sounds()),
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

fn spawn_stdin_reader(tx: mpsc::UnboundedSender<Input>) {
    std::thread::Builder::new()
        .name("lull-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(Input::Line(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(Input::Closed);
        })
        .map(|_| ())
        .unwrap_or_else(|e| log::error!("Failed to spawn stdin reader: {}", e));
}

fn spawn_event_forwarder(engine: &Engine, tx: mpsc::UnboundedSender<Input>) {
    let events = engine.subscribe();
    std::thread::Builder::new()
        .name("lull-events".to_string())
        .spawn(move || {
            for event in events.iter() {
                if tx.send(Input::Event(event)).is_err() {
                    break;
                }
            }
        })
        .map(|_| ())
        .unwrap_or_else(|e| log::error!("Failed to spawn event forwarder: {}", e));
}
