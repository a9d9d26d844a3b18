//! End-to-end properties of generated levels

use proptest::prelude::*;
use rust_voronoi_puzzle::collision::triangles_overlap;
use rust_voronoi_puzzle::*;

fn build(seed: u64, shapes: usize) -> LevelConfig {
    LevelConfigBuilder::new()
        .seed(seed)
        .shape_count(shapes)
        .unwrap()
        .max_attempts(500)
        .unwrap()
        .build()
        .unwrap()
}

fn assert_partition(level: &GeneratedLevel) {
    let n = level.grid_size() as f64;
    assert!(
        (level.total_area() - n * n).abs() < 1e-6,
        "areas sum to {}, expected {}",
        level.total_area(),
        n * n
    );

    for (index, mesh) in level.polygons().iter().enumerate() {
        assert!(!mesh.is_empty(), "polygon {index} has no triangles");
        assert!(
            (mesh.covered_area() - mesh.area).abs() < 1e-6,
            "polygon {index}: triangles cover {}, area {}",
            mesh.covered_area(),
            mesh.area
        );
        for t in &mesh.triangles {
            for p in t.vertices() {
                assert_eq!(p.x.fract(), 0.0);
                assert_eq!(p.y.fract(), 0.0);
                assert!(p.x >= 0.0 && p.x <= n && p.y >= 0.0 && p.y <= n);
            }
        }
    }

    let meshes = level.polygons();
    for i in 0..meshes.len() {
        for j in (i + 1)..meshes.len() {
            for t1 in &meshes[i].triangles {
                for t2 in &meshes[j].triangles {
                    assert!(!triangles_overlap(t1, t2), "pieces {i} and {j} overlap");
                }
            }
        }
    }
}

#[test]
fn test_two_shapes_on_three_grid() {
    let level = GeneratedLevel::generate(build(2024, 2)).unwrap();
    assert_eq!(level.grid_size(), 3);
    assert_eq!(level.shape_count(), 2);
    assert!((level.total_area() - 9.0).abs() < 1e-6);
    assert!(level.polygons().iter().all(|p| p.triangle_count() > 0));
}

#[test]
fn test_uncapped_generation_finishes() {
    for seed in [0, 7, 99] {
        let config = LevelConfigBuilder::new()
            .seed(seed)
            .shape_count(6)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.max_attempts, None);

        let level = GeneratedLevel::generate(config).unwrap();
        assert_eq!(level.shape_count(), 6);
        assert_partition(&level);
    }
}

#[test]
fn test_every_interior_point_used() {
    let config = LevelConfigBuilder::new()
        .seed(8)
        .shape_count(4)
        .unwrap()
        .grid_size(3)
        .unwrap()
        .max_attempts(500)
        .unwrap()
        .build()
        .unwrap();
    let level = GeneratedLevel::generate(config).unwrap();

    let mut used: Vec<(i32, i32)> = level.sites().iter().map(|s| (s.x, s.y)).collect();
    used.sort_unstable();
    assert_eq!(used, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    assert_partition(&level);
}

#[test]
fn test_too_many_shapes_fails_immediately() {
    let config = LevelConfigBuilder::new()
        .seed(1)
        .shape_count(5)
        .unwrap()
        .grid_size(3)
        .unwrap()
        .build()
        .unwrap();
    assert!(matches!(
        GeneratedLevel::generate(config),
        Err(PuzzleError::TooManyShapes { requested: 5, available: 4 })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_levels_partition_the_grid(seed in any::<u64>(), shapes in 2usize..=7) {
        let level = GeneratedLevel::generate(build(seed, shapes)).unwrap();
        prop_assert_eq!(level.shape_count(), shapes);
        assert_partition(&level);
    }

    #[test]
    fn test_same_seed_same_bytes(seed in any::<u64>(), shapes in 2usize..=5) {
        let first = GeneratedLevel::generate(build(seed, shapes)).unwrap();
        let second = GeneratedLevel::generate(build(seed, shapes)).unwrap();
        prop_assert_eq!(
            first.to_level_file(0).to_json().unwrap(),
            second.to_level_file(0).to_json().unwrap()
        );
    }

    #[test]
    fn test_document_round_trip(seed in any::<u64>(), shapes in 2usize..=5) {
        let level = GeneratedLevel::generate(build(seed, shapes)).unwrap();
        let file = level.to_level_file(1_700_000_000_000);
        let restored = LevelFile::from_json(&file.to_json().unwrap()).unwrap();
        prop_assert_eq!(&restored, &file);

        let pieces = restored.pieces().unwrap();
        prop_assert_eq!(pieces.len(), shapes);
        for (piece, mesh) in pieces.iter().zip(level.polygons()) {
            prop_assert_eq!(piece.bounds, mesh.bounds);
            let home = piece.bounds.min();
            let rebuilt: Vec<Triangle> = piece.triangles.iter().map(|t| t.translated(home)).collect();
            prop_assert_eq!(&rebuilt, &mesh.triangles);
        }
    }
}
