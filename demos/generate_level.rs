//! Example: Generate a puzzle level
//!
//! Demonstrates the basic usage of the generation pipeline.

use rust_voronoi_puzzle::*;

fn main() {
    println!("Voronoi Puzzle Generation Example");
    println!("=================================\n");

    let config = LevelConfigBuilder::new()
        .seed(42)
        .shape_count(6)
        .unwrap()
        .build()
        .unwrap();

    println!("Configuration:");
    println!("  Seed: {}", config.seed);
    println!("  Shapes: {}", config.shape_count);
    println!("  Grid Size: {}", config.grid_size());
    println!();

    println!("Generating level...");
    let level = GeneratedLevel::generate(config).expect("Failed to generate level");
    println!("Generated {} pieces in {} attempt(s)\n", level.shape_count(), level.attempts());

    let total_triangles: usize = level.polygons().iter().map(|p| p.triangle_count()).sum();
    println!("Statistics:");
    println!("  Total area: {:.2}", level.total_area());
    println!("  Triangles: {}", total_triangles);
    println!();

    println!("Pieces:");
    for (site, piece) in level.sites().iter().zip(level.polygons()) {
        println!(
            "  Site ({}, {}): bounds=({}, {}, {}x{}), area={:.1}, triangles={}",
            site.x,
            site.y,
            piece.bounds.x,
            piece.bounds.y,
            piece.bounds.width,
            piece.bounds.height,
            piece.area,
            piece.triangle_count()
        );
    }

    let json = level
        .to_level_file(current_timestamp_millis())
        .to_json()
        .expect("Failed to serialize level");
    println!("\n{json}");
}
