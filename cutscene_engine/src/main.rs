use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use cutscene_engine::ScenePlayer;
use cutscene_script::Script;

/// Headless driver: plays a beat script on a simulated clock, advancing
/// like a patient viewer, and prints the resulting event trace.
#[derive(Parser, Debug)]
#[command(about = "Play a cutscene beat script headlessly", version)]
struct Args {
    /// Path to a script JSON file (defaults to the built-in demo)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Sequence to play
    #[arg(long, default_value = "intro")]
    sequence: String,

    /// Simulated frame length in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Seconds to wait before the dialogue box fades in
    #[arg(long, default_value_t = 2.0)]
    fade_delay: f32,

    /// Seconds to hold after the fade before the script starts
    #[arg(long, default_value_t = 1.0)]
    text_delay: f32,

    /// Seconds the simulated viewer waits before tapping to advance
    #[arg(long, default_value_t = 0.5)]
    read_delay: f32,

    /// Safety cap on simulated time
    #[arg(long, default_value_t = 120.0)]
    max_seconds: f32,

    /// Path to write the audio/event trace as JSON
    #[arg(long)]
    event_log_json: Option<PathBuf>,
}

#[derive(Serialize)]
struct EventTrace<'a> {
    sequence: &'a str,
    simulated_seconds: f32,
    lines: &'a [String],
    audio_events: &'a [String],
}

const DEMO_SCRIPT: &str = include_str!("../../demos/gift_intro.json");

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let raw = match args.script.as_ref() {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading script from {}", path.display()))?,
        None => DEMO_SCRIPT.to_string(),
    };
    let script = Script::from_json(&raw).context("parsing script JSON")?;

    let mut player = ScenePlayer::from_script(&script).context("building scene player")?;
    player
        .intro(&args.sequence, args.fade_delay, args.text_delay)
        .context("starting intro fade")?;

    let mut lines: Vec<String> = Vec::new();
    let mut elapsed = 0.0f32;
    let mut settle = 0.0f32;

    while elapsed < args.max_seconds {
        player.tick(args.dt);
        elapsed += args.dt;

        if player.dialog().prompt_visible() {
            settle += args.dt;
            if settle >= args.read_delay {
                let line = player.dialog().visible_text();
                if !line.is_empty() {
                    println!("line: {line}");
                    lines.push(line);
                }
                player.advance_input();
                settle = 0.0;
            }
        } else {
            settle = 0.0;
        }

        if player.is_idle() {
            break;
        }
    }

    println!("simulated {elapsed:.2}s, {} audio events", player.audio().history().len());
    for event in player.audio().history() {
        println!("audio: {event}");
    }

    if let Some(path) = args.event_log_json.as_ref() {
        let trace = EventTrace {
            sequence: &args.sequence,
            simulated_seconds: elapsed,
            lines: &lines,
            audio_events: player.audio().history(),
        };
        let json = serde_json::to_string_pretty(&trace).context("serializing event trace")?;
        fs::write(path, json)
            .with_context(|| format!("writing event trace to {}", path.display()))?;
        println!("Saved event trace to {}", path.display());
    }

    Ok(())
}
