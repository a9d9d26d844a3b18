//! The JSON level document and loading it back into pieces
//!
//! ```json
//! {
//!   "timestamp": 1700000000000,
//!   "grid_size": 3,
//!   "polygons": [
//!     { "bounds": [0.0, 0.0, 2.0, 3.0],
//!       "triangle_points": [0.0, 0.0, 2.0, 0.0, 0.0, 3.0] }
//!   ]
//! }
//! ```
//!
//! Triangle points are relative to the polygon's bounds origin, six floats
//! per triangle.

use std::path::{Path, PathBuf};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, Result};
use crate::geometry::{points_coincide, Rect, Triangle};

/// Floats per serialized triangle
const TRIANGLE_STRIDE: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFile {
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: u64,
    pub grid_size: u32,
    pub polygons: Vec<PolygonRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRecord {
    /// `[min_x, min_y, width, height]` in grid coordinates
    pub bounds: [f64; 4],
    pub triangle_points: Vec<f64>,
}

/// A loaded piece in its own local coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct PieceShape {
    /// Where the piece sits in the solved grid, and its size
    pub bounds: Rect,
    pub triangles: Vec<Triangle>,
    /// Distinct triangle corners
    pub vertices: Vec<DVec2>,
}

impl PolygonRecord {
    fn to_piece(&self, index: usize) -> Result<PieceShape> {
        let [x, y, width, height] = self.bounds;
        if !self.bounds.iter().all(|v| v.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(PuzzleError::InvalidLevel(format!(
                "polygon {index} has invalid bounds {:?}",
                self.bounds
            )));
        }
        let points = &self.triangle_points;
        if points.is_empty() || points.len() % TRIANGLE_STRIDE != 0 {
            return Err(PuzzleError::InvalidLevel(format!(
                "polygon {index} has {} triangle coordinates, expected a positive multiple of {TRIANGLE_STRIDE}",
                points.len()
            )));
        }
        if !points.iter().all(|v| v.is_finite()) {
            return Err(PuzzleError::InvalidLevel(format!(
                "polygon {index} has non-finite triangle coordinates"
            )));
        }

        let triangles: Vec<Triangle> = points
            .chunks_exact(TRIANGLE_STRIDE)
            .map(|c| {
                Triangle::new(
                    DVec2::new(c[0], c[1]),
                    DVec2::new(c[2], c[3]),
                    DVec2::new(c[4], c[5]),
                )
            })
            .collect();

        let mut vertices: Vec<DVec2> = Vec::new();
        for p in triangles.iter().flat_map(Triangle::vertices) {
            if !vertices.iter().any(|&q| points_coincide(p, q)) {
                vertices.push(p);
            }
        }

        Ok(PieceShape {
            bounds: Rect::new(x, y, width, height),
            triangles,
            vertices,
        })
    }
}

impl LevelFile {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild the runtime pieces
    ///
    /// # Errors
    ///
    /// Returns `InvalidLevel` for a zero grid size or a malformed polygon record
    pub fn pieces(&self) -> Result<Vec<PieceShape>> {
        if self.grid_size == 0 {
            return Err(PuzzleError::InvalidLevel("grid size is zero".to_string()));
        }
        self.polygons
            .iter()
            .enumerate()
            .map(|(index, record)| record.to_piece(index))
            .collect()
    }
}

/// File name of level `index`: `prefix.json` for the first, `prefix_{index}.json` after
pub fn level_filename(prefix: &str, index: usize) -> String {
    if index == 0 {
        format!("{prefix}.json")
    } else {
        format!("{prefix}_{index}.json")
    }
}

/// Path to write level `index` to
///
/// Without `overwrite` the index is bumped until the name is unused in `dir`.
pub fn level_path(dir: &Path, prefix: &str, index: usize, overwrite: bool) -> PathBuf {
    let mut index = index;
    let mut path = dir.join(level_filename(prefix, index));
    while !overwrite && path.exists() {
        index += 1;
        path = dir.join(level_filename(prefix, index));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LevelFile {
        LevelFile {
            timestamp: 1_700_000_000_000,
            grid_size: 3,
            polygons: vec![
                PolygonRecord {
                    bounds: [0.0, 0.0, 2.0, 3.0],
                    triangle_points: vec![0.0, 0.0, 2.0, 0.0, 0.0, 3.0],
                },
                PolygonRecord {
                    bounds: [0.0, 0.0, 3.0, 3.0],
                    triangle_points: vec![
                        2.0, 0.0, 3.0, 0.0, 3.0, 3.0, //
                        2.0, 0.0, 3.0, 3.0, 0.0, 3.0,
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_json_field_names() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"timestamp\""));
        assert!(json.contains("\"grid_size\""));
        assert!(json.contains("\"triangle_points\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["polygons"][0]["bounds"][3], 3.0);
    }

    #[test]
    fn test_round_trip_keeps_bounds_and_triangles() {
        let file = sample();
        let restored = LevelFile::from_json(&file.to_json().unwrap()).unwrap();
        assert_eq!(restored, file);
        assert_eq!(restored.pieces().unwrap(), file.pieces().unwrap());
    }

    #[test]
    fn test_pieces() {
        let pieces = sample().pieces().unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].triangles.len(), 1);
        assert_eq!(pieces[0].bounds, Rect::new(0.0, 0.0, 2.0, 3.0));
        assert_eq!(pieces[1].triangles.len(), 2);
        // The two triangles share an edge
        assert_eq!(pieces[1].vertices.len(), 4);
    }

    #[test]
    fn test_malformed_records() {
        let mut file = sample();
        file.polygons[0].triangle_points.pop();
        assert!(matches!(file.pieces(), Err(PuzzleError::InvalidLevel(_))));

        let mut file = sample();
        file.polygons[1].bounds[2] = -1.0;
        assert!(matches!(file.pieces(), Err(PuzzleError::InvalidLevel(_))));

        let mut file = sample();
        file.grid_size = 0;
        assert!(file.pieces().is_err());

        assert!(matches!(
            LevelFile::from_json("{\"timestamp\": 1}"),
            Err(PuzzleError::Serialization(_))
        ));
    }

    #[test]
    fn test_filenames() {
        assert_eq!(level_filename("level", 0), "level.json");
        assert_eq!(level_filename("level", 3), "level_3.json");
    }

    #[test]
    fn test_level_path_skips_existing_files() {
        let dir = std::env::temp_dir().join(format!("voronoi_puzzle_paths_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("taken.json"), "{}").unwrap();
        std::fs::write(dir.join("taken_1.json"), "{}").unwrap();

        assert_eq!(level_path(&dir, "taken", 0, false), dir.join("taken_2.json"));
        assert_eq!(level_path(&dir, "taken", 0, true), dir.join("taken.json"));
        assert_eq!(level_path(&dir, "free", 4, false), dir.join("free_4.json"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
