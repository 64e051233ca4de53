#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host that streams an Ascent course ahead of a simulated camera.

mod tally;

use std::{cell::Cell, path::PathBuf, rc::Rc, time::Duration};

use anyhow::{ensure, Context, Result};
use ascent_core::{Event, SpawnBoundaries};
use ascent_system_platform_spawning::VariantPlatformSpawner;
use ascent_world::{query, Catalog, LevelGenerator};
use clap::{ArgAction, Parser};
use tracing::Level;

use crate::tally::Tally;

/// Streams an endless platform course ahead of a rising camera.
#[derive(Debug, Parser)]
#[command(name = "ascent", version)]
struct Cli {
    /// Catalog file to load instead of the built-in catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Overrides the catalog seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Height the camera climbs to before the run ends.
    #[arg(long, default_value_t = 200.0)]
    height: f32,
    /// Camera climb speed in units per second.
    #[arg(long, default_value_t = 6.0)]
    speed: f32,
    /// Simulated frame length in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Left edge of the spawn area.
    #[arg(long, default_value_t = -8.0, allow_hyphen_values = true)]
    left: f32,
    /// Right edge of the spawn area.
    #[arg(long, default_value_t = 8.0, allow_hyphen_values = true)]
    right: f32,
    /// Prints every generator event instead of one line per chunk.
    #[arg(long)]
    events: bool,
    /// Raises log verbosity; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Entry point for the Ascent command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    install_logging(cli.verbose);

    ensure!(cli.speed > 0.0, "--speed must be positive");
    ensure!(cli.frame_ms > 0, "--frame-ms must be positive");

    let mut catalog = match &cli.catalog {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => Catalog::builtin().context("built-in catalog is broken")?,
    };
    if let Some(seed) = cli.seed {
        catalog.generator.seed = seed;
    }

    run(&cli, catalog)
}

fn install_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli, catalog: Catalog) -> Result<()> {
    let camera = Rc::new(Cell::new(0.0_f32));
    let follow = Rc::clone(&camera);
    let boundaries = SpawnBoundaries::new(cli.left, cli.right);
    let spawner = VariantPlatformSpawner::new(boundaries, catalog.generator.seed);
    let mut generator = LevelGenerator::from_catalog(catalog, spawner, move || follow.get());

    let mut tally = Tally::default();
    let mut events = Vec::new();
    generator
        .init(&mut tally, &mut events)
        .context("level generator failed to start")?;
    report(cli, &generator, &mut events);

    let frame = Duration::from_millis(cli.frame_ms);
    let climb = cli.speed * frame.as_secs_f32();
    while camera.get() < cli.height {
        camera.set((camera.get() + climb).min(cli.height));
        let _ = generator.tick(frame, &mut tally, &mut events);
        report(cli, &generator, &mut events);
    }

    println!(
        "camera {:.1}, generated up to {:.1}, {} live chunks holding {} platforms",
        camera.get(),
        query::highest_generated_y(&generator),
        query::chunks(&generator).len(),
        query::platform_count(&generator),
    );
    println!("{tally}");
    Ok(())
}

fn report<S, C>(cli: &Cli, generator: &LevelGenerator<S, C>, events: &mut Vec<Event>) {
    for event in events.drain(..) {
        if cli.events {
            println!("{event:?}");
            continue;
        }

        match event {
            Event::ChunkGenerated {
                chunk,
                start_y,
                end_y,
                platforms,
            } => {
                println!(
                    "chunk {:>4} {start_y:>8.1}..{end_y:<8.1} {platforms:>3} platforms",
                    chunk.get()
                );
                let live = query::chunks(generator)
                    .iter()
                    .find(|candidate| candidate.id() == chunk);
                for line in live.into_iter().flat_map(|found| found.content_log()) {
                    println!("    {line}");
                }
            }
            Event::PartStarted {
                name,
                start_y,
                platforms_needed,
                ..
            } => println!("part `{name}` from y={start_y:.1}, {platforms_needed} platforms"),
            Event::GeneratorDisabled { reason } => println!("generator disabled: {reason}"),
            _ => {}
        }
    }
}
