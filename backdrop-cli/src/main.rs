use std::path::PathBuf;

use anyhow::{Context, Result};
use backdrop_cli::{load_config, run, OutputMode, PointerScript, Recordable, RunOptions};
use backdrop_core::{BoidConfig, Field, FieldConfig, Flock, MeshStrategy};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the backdrop engines headless", long_about = None)]
struct Args {
    #[command(subcommand)]
    engine: Engine,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Engine {
    /// Boid flock on a wrapping surface
    Boids {
        #[arg(long, value_enum, default_value_t = BoidPreset::Default)]
        preset: BoidPreset,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Floating points with connection lines and mesh
    Field {
        #[arg(long, value_enum, default_value_t = FieldPreset::Default)]
        preset: FieldPreset,

        /// Mesh from filtered Delaunay triangles instead of connection cycles
        #[arg(long)]
        delaunay: bool,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BoidPreset {
    Default,
    Swift,
    Calm,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FieldPreset {
    Default,
    Dense,
    Interactive,
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// Surface width in pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 720.0)]
    height: f32,

    /// Number of ticks to simulate
    #[arg(short = 'n', long, default_value_t = 600)]
    ticks: u64,

    /// RNG seed (entropy when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file overriding any subset of the preset's tunables
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = PointerScript::None)]
    pointer: PointerScript,

    #[arg(short, long, value_enum, default_value_t = OutputMode::Summary)]
    output: OutputMode,

    /// Emit every n-th frame
    #[arg(long, default_value_t = 1)]
    every: u64,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            ticks: self.ticks,
            pointer: self.pointer,
            output: self.output,
            every: self.every,
        }
    }
}

fn boid_engine(preset: BoidPreset, args: &RunArgs) -> Result<Flock> {
    let mut config = match preset {
        BoidPreset::Default => BoidConfig::default(),
        BoidPreset::Swift => BoidConfig::swift(),
        BoidPreset::Calm => BoidConfig::calm(),
    };
    if let Some(path) = &args.config {
        config = load_config(path, &config)?;
    }
    let flock = match args.seed {
        Some(seed) => Flock::new(args.width, args.height, config, seed),
        None => Flock::from_entropy(args.width, args.height, config),
    };
    flock.context("Invalid boid configuration")
}

fn field_engine(preset: FieldPreset, delaunay: bool, args: &RunArgs) -> Result<Field> {
    let mut config = match preset {
        FieldPreset::Default => FieldConfig::default(),
        FieldPreset::Dense => FieldConfig::dense(),
        FieldPreset::Interactive => FieldConfig::interactive(),
    };
    if let Some(path) = &args.config {
        config = load_config(path, &config)?;
    }
    if delaunay {
        config.mesh_strategy = MeshStrategy::Delaunay;
    }
    let field = match args.seed {
        Some(seed) => Field::new(args.width, args.height, config, seed),
        None => Field::from_entropy(args.width, args.height, config),
    };
    field.context("Invalid field configuration")
}

fn drive<S: Recordable>(engine: &mut S, args: &RunArgs) -> Result<()> {
    let summary = run(engine, &args.options(), &mut std::io::stdout().lock())?;
    if args.output == OutputMode::Summary {
        let text = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{text}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match &args.engine {
        Engine::Boids { preset, run } => {
            log::info!("Boid flock on {}x{}, {:?} preset", run.width, run.height, preset);
            let mut flock = boid_engine(*preset, run)?;
            drive(&mut flock, run)
        }
        Engine::Field {
            preset,
            delaunay,
            run,
        } => {
            log::info!("Point field on {}x{}, {:?} preset", run.width, run.height, preset);
            let mut field = field_engine(*preset, *delaunay, run)?;
            drive(&mut field, run)
        }
    }
}
