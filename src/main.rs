//! Mask Engine CLI - Generate a demo terrain from JSON configuration.

use std::path::PathBuf;
use std::time::Instant;

use mask_engine::{
    brush::RadialBrushes,
    mask::{BooleanMask, FloatMask, MaskError, NormalMask},
    pipeline::PipelineContext,
    schema::GenerationConfig,
};

/// Masks produced by one generation run.
struct Terrain {
    land: BooleanMask,
    heights: FloatMask,
    normals: NormalMask,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Generate a symmetric demo terrain from a JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to generation configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let config = GenerationConfig::from_json_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    println!("Mask Engine");
    println!("===========");
    println!("Grid: {0}x{0}", config.size);
    println!(
        "Symmetry: terrain={:?} team={:?} spawn={:?}",
        config.symmetry.terrain, config.symmetry.team, config.symmetry.spawn
    );
    println!(
        "Mode: {}",
        if config.parallel {
            format!("pipeline ({} workers)", config.workers)
        } else {
            "inline".to_string()
        }
    );
    println!();

    let start = Instant::now();
    let pipeline = config.parallel.then(|| PipelineContext::new(config.workers));
    let terrain = build_terrain(&config, pipeline.as_ref()).and_then(|terrain| {
        if let Some(pipeline) = &pipeline {
            pipeline.start()?;
            pipeline.join()?;
        }
        Ok(terrain)
    });
    let terrain = terrain.unwrap_or_else(|e| {
        eprintln!("Generation failed: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    if let Err(e) = report(&terrain) {
        eprintln!("Generation failed: {}", e);
        std::process::exit(1);
    }
    println!();
    println!("Time: {:.2}s", elapsed.as_secs_f32());
}

/// Random land, cleaned up, raised by distance from the coast, roughened
/// with noise and brushes, then eroded.
fn build_terrain(
    config: &GenerationConfig,
    pipeline: Option<&PipelineContext>,
) -> Result<Terrain, MaskError> {
    let size = config.size;
    let mut land = BooleanMask::new(size, Some(config.seed), config.symmetry, "land");
    if let Some(pipeline) = pipeline {
        land = land.in_pipeline(pipeline);
    }

    land.randomize(0.5)?
        .blur((size / 64).max(1))
        .remove_areas_smaller_than(size * size / 256)
        .invert()
        .remove_areas_smaller_than(size * size / 256)
        .invert();

    let mut water = land.copy_named("water");
    water.invert();

    let mut heights = water.distance_field();
    heights
        .clamp_max(size as f32 / 8.0)
        .add_perlin_noise((size / 8).max(1), 2.0)?
        .use_named_brush_within_area(&land, &RadialBrushes, "dome", (size / 16).max(1), 8, 4.0, false)?
        .water_erosion(&config.erosion)?
        .set_to_value(&water, 0.0)?;

    let normals = heights.normals(4.0);

    Ok(Terrain {
        land,
        heights,
        normals,
    })
}

fn report(terrain: &Terrain) -> Result<(), MaskError> {
    println!("Results:");
    println!("  Land cells: {}", terrain.land.count()?);
    println!(
        "  Height range: [{:.3}, {:.3}]",
        terrain.heights.min()?,
        terrain.heights.max()?
    );
    println!("  land    {}", terrain.land.to_hash()?);
    println!("  heights {}", terrain.heights.to_hash()?);
    println!("  normals {}", terrain.normals.to_hash()?);
    Ok(())
}

fn print_example_config() {
    let config = GenerationConfig::default();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            std::process::exit(1);
        }
    }
}
