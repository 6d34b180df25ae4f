use std::path::PathBuf;

use anyhow::Result;
use backdrop_cli::{load_config, run, OutputMode, PointerScript, RunOptions};
use backdrop_core::{BoidConfig, Field, FieldConfig, Flock};
use backdrop_shared::{BoidFrame, EngineKind, FieldFrame};

fn options(ticks: u64, pointer: PointerScript, output: OutputMode, every: u64) -> RunOptions {
    RunOptions {
        ticks,
        pointer,
        output,
        every,
    }
}

/// Writes `contents` to a file unique to this test process.
fn temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("backdrop-{}-{}.json", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_frames_mode_emits_json_lines() -> Result<()> {
    let mut flock = Flock::new(640.0, 480.0, BoidConfig::default(), 5)?;
    let mut out = Vec::new();

    let summary = run(
        &mut flock,
        &options(10, PointerScript::Orbit, OutputMode::Frames, 3),
        &mut out,
    )?;

    let text = String::from_utf8(out)?;
    let frames: Vec<BoidFrame> = text
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    // ticks 0, 3, 6, 9
    assert_eq!(frames.iter().map(|f| f.tick).collect::<Vec<_>>(), vec![0, 3, 6, 9]);
    assert!(frames.iter().all(|f| f.boids.len() == flock.boids().len()));

    assert_eq!(summary.ticks, 10);
    assert_eq!(summary.pointer_ticks, 10);
    assert_eq!(summary.status.engine, EngineKind::Boids);
    Ok(())
}

#[test]
fn test_summary_mode_writes_nothing() -> Result<()> {
    let mut field = Field::new(500.0, 400.0, FieldConfig::interactive(), 2)?;
    let mut out = Vec::new();

    let summary = run(
        &mut field,
        &options(20, PointerScript::Sweep, OutputMode::Summary, 1),
        &mut out,
    )?;

    assert!(out.is_empty());
    assert_eq!(summary.status.engine, EngineKind::Field);
    assert_eq!(summary.status.population, summary.status.target_population);
    assert_eq!(summary.status.connections, Some(field.connections().len()));
    Ok(())
}

#[test]
fn test_field_frames_reference_points() -> Result<()> {
    let mut field = Field::new(500.0, 400.0, FieldConfig::default(), 2)?;
    let mut out = Vec::new();
    run(
        &mut field,
        &options(2, PointerScript::Centre, OutputMode::Frames, 1),
        &mut out,
    )?;

    for line in String::from_utf8(out)?.lines() {
        let frame: FieldFrame = serde_json::from_str(line)?;
        let n = frame.points.len();
        assert!(frame.triangles.iter().flatten().all(|&i| i < n));
    }
    Ok(())
}

#[test]
fn test_load_config_overlays_preset() -> Result<()> {
    let path = temp_config("overlay", r#"{"density": 2.5, "distortion": true}"#);
    let config = load_config(&path, &FieldConfig::dense())?;
    std::fs::remove_file(&path)?;

    assert_eq!(config.density, 2.5);
    assert!(config.distortion);
    assert_eq!(config.max_speed, FieldConfig::dense().max_speed);
    Ok(())
}

#[test]
fn test_load_config_reports_bad_files() {
    let missing = std::env::temp_dir().join("backdrop-does-not-exist.json");
    let err = load_config(&missing, &BoidConfig::default()).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));

    let path = temp_config("broken", "{ density: ");
    let err = load_config(&path, &BoidConfig::default()).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(err.to_string().contains("Invalid config"));
}
