//! Headless driver for the backdrop engines: runs a fixed number of ticks
//! with a scripted pointer and reports frames or a run summary.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use backdrop_core::{Field, Flock, Simulation, Vector2D};
use backdrop_shared::{merge_config, to_json_line, BoidFrame, EngineStatus, FieldFrame};
use clap::ValueEnum;
use serde::{de::DeserializeOwned, Serialize};

/// Synthetic pointer movement fed to the engine each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PointerScript {
    /// Pointer never enters the surface.
    None,
    /// Resting at the centre.
    Centre,
    /// Circling the centre at a third of the smaller extent.
    Orbit,
    /// Left-to-right passes along the middle, leaving between passes.
    Sweep,
}

impl PointerScript {
    pub fn position(self, tick: u64, width: f32, height: f32) -> Option<Vector2D> {
        let centre = Vector2D::new(width / 2.0, height / 2.0);
        match self {
            PointerScript::None => None,
            PointerScript::Centre => Some(centre),
            PointerScript::Orbit => {
                let radius = width.min(height) / 3.0;
                Some(centre + Vector2D::from_angle(tick as f32 * 0.02) * radius)
            }
            PointerScript::Sweep => {
                const PASS: u64 = 240;
                if (tick / PASS) % 2 == 1 || width <= 0.0 {
                    return None;
                }
                let x = (tick % PASS) as f32 / PASS as f32 * width;
                Some(Vector2D::new(x, centre.y))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// One JSON summary once the run finishes.
    Summary,
    /// A JSON line per emitted frame.
    Frames,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub ticks: u64,
    pub pointer: PointerScript,
    pub output: OutputMode,
    /// Emit every n-th frame in `Frames` mode.
    pub every: u64,
}

/// What gets printed at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub pointer_ticks: u64,
    pub elapsed_ms: f64,
    pub ticks_per_second: f64,
    pub status: EngineStatus,
}

/// An engine the CLI knows how to serialise.
pub trait Recordable: Simulation {
    fn frame_json(&self, tick: u64) -> serde_json::Result<String>;
    fn status(&self) -> EngineStatus;
    fn surface(&self) -> (f32, f32);
}

impl Recordable for Flock {
    fn frame_json(&self, tick: u64) -> serde_json::Result<String> {
        to_json_line(&BoidFrame::capture(tick, self))
    }

    fn status(&self) -> EngineStatus {
        EngineStatus::of_flock(self)
    }

    fn surface(&self) -> (f32, f32) {
        (self.width(), self.height())
    }
}

impl Recordable for Field {
    fn frame_json(&self, tick: u64) -> serde_json::Result<String> {
        to_json_line(&FieldFrame::capture(tick, self))
    }

    fn status(&self) -> EngineStatus {
        EngineStatus::of_field(self)
    }

    fn surface(&self) -> (f32, f32) {
        (self.width(), self.height())
    }
}

/// Load a partial JSON config from `path` and overlay it on `base`.
pub fn load_config<T>(path: &Path, base: &T) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    merge_config(base, &text)
        .with_context(|| format!("Invalid config in {}", path.display()))
}

/// Drive `engine` for `options.ticks` ticks, writing frames to `out` in
/// `Frames` mode. The summary is returned rather than printed.
pub fn run<S: Recordable>(engine: &mut S, options: &RunOptions, out: &mut impl Write) -> Result<RunSummary> {
    let every = options.every.max(1);
    let started = Instant::now();
    let mut pointer_ticks = 0;

    for tick in 0..options.ticks {
        let (width, height) = engine.surface();
        let pointer = options.pointer.position(tick, width, height);
        if pointer.is_some() {
            pointer_ticks += 1;
        }
        engine.tick(pointer);

        if options.output == OutputMode::Frames && tick % every == 0 {
            let line = engine
                .frame_json(tick)
                .with_context(|| format!("Failed to serialise frame {tick}"))?;
            writeln!(out, "{line}").context("Failed to write frame")?;
        }
        if tick > 0 && tick % 1000 == 0 {
            log::debug!("tick {}: population {}", tick, engine.population());
        }
    }

    let elapsed = started.elapsed().as_secs_f64();
    let summary = RunSummary {
        ticks: options.ticks,
        pointer_ticks,
        elapsed_ms: elapsed * 1000.0,
        ticks_per_second: if elapsed > 0.0 {
            options.ticks as f64 / elapsed
        } else {
            0.0
        },
        status: engine.status(),
    };
    log::info!(
        "Ran {} ticks in {:.1} ms ({:.0} ticks/s)",
        summary.ticks,
        summary.elapsed_ms,
        summary.ticks_per_second
    );
    Ok(summary)
}
