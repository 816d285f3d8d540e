//! Headless runner for the safety loop.
//!
//! Steps the loop at a fixed frame rate, feeds it scripted bridge messages
//! and reports the presentation snapshot once per simulated second.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Error};
use argh::FromArgs;
use bevy_log::{info, warn, Level, LogPlugin};
use bridge::{dispatch, load_script};
use simulation::prelude::*;

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help", "help"))]
/// V2X longitudinal safety loop
struct Args {
    #[argh(description = "frames per simulated second")]
    #[argh(option, default = "60")]
    fps: u32,

    #[argh(description = "simulated seconds to run")]
    #[argh(option, short = 'd', default = "30")]
    duration: u32,

    #[argh(description = "JSON-lines script of timed bridge messages")]
    #[argh(option, short = 's')]
    script: Option<PathBuf>,

    #[argh(description = "decision mode: geometry or risk")]
    #[argh(option, short = 'm')]
    mode: Option<ControlMode>,

    #[argh(description = "scenery seed")]
    #[argh(option)]
    seed: Option<u64>,

    #[argh(description = "print one JSON snapshot per second")]
    #[argh(switch)]
    json: bool,

    #[argh(description = "log level")]
    #[argh(option, short = 'l')]
    log_level: Option<Level>,
}

fn main() -> Result<(), Error> {
    let Args {
        fps,
        duration,
        script,
        mode,
        seed,
        json,
        log_level,
    } = argh::from_env();

    if fps == 0 {
        bail!("--fps must be at least 1");
    }

    let mut config = SimulationConfig::default().with_mode(mode.unwrap_or_default());
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let script = match script {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            load_script(&text).with_context(|| format!("invalid script {}", path.display()))?
        }
        None => Vec::new(),
    };

    let mut sim = Simulation::new(config);
    sim.app_mut().add_plugins(LogPlugin {
        level: log_level.unwrap_or(Level::INFO),
        ..Default::default()
    });

    info!(
        "running {duration}s at {fps} fps with {} scripted messages",
        script.len()
    );

    let dt = Duration::from_secs_f64(1.0 / f64::from(fps));
    let mut pending = script.into_iter().peekable();

    for frame in 0..u64::from(duration) * u64::from(fps) {
        let elapsed = frame as f32 / fps as f32;
        while let Some(entry) = pending.next_if(|entry| entry.at <= elapsed) {
            if let Err(err) = dispatch(&mut sim, &entry.message) {
                warn!("t={elapsed:.2}s: {err}");
            }
        }

        sim.step(dt);

        if (frame + 1) % u64::from(fps) == 0 {
            report(&sim.snapshot(), json)?;
        }
    }

    if pending.peek().is_some() {
        warn!("{} scripted messages fall after the run", pending.count());
    }
    Ok(())
}

fn report(snapshot: &Snapshot, json: bool) -> Result<(), Error> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }

    let lead = snapshot
        .z_of(ActorKind::Lead)
        .map_or_else(|| "-".to_string(), |z| format!("{:.1}", -z));
    info!(
        "{:>5.1} -> {:>5.1} | {} | {:?} {}s | lead {lead} | {}",
        snapshot.speed,
        snapshot.target_speed,
        snapshot.label,
        snapshot.signal.phase,
        snapshot.signal.seconds_remaining,
        snapshot.ticker,
    );
    Ok(())
}
