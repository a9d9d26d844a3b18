//! Voronoi-based polygon puzzle level generation
//!
//! Cuts an `N × N` square into irregular polygon pieces grown from random
//! interior grid points, snaps every corner onto the integer grid and
//! triangulates the pieces for rendering and collision.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rust_voronoi_puzzle::*;
//!
//! // Generate a level
//! let config = LevelConfigBuilder::new()
//!     .seed(42)
//!     .shape_count(6).unwrap()
//!     .build().unwrap();
//!
//! let level = GeneratedLevel::generate(config).unwrap();
//! println!("{} pieces on a {}x{} grid", level.shape_count(), level.grid_size(), level.grid_size());
//!
//! // Serialize it, load it back and place the pieces
//! let json = level.to_level_file(current_timestamp_millis()).to_json().unwrap();
//! let file = LevelFile::from_json(&json).unwrap();
//! let mut board = PlacementBoard::new(file.grid_size, file.pieces().unwrap());
//! let home = board.pieces()[0].bounds.min();
//! assert!(board.place(0, home));
//! ```

// Modules
pub mod error;
pub mod config;
pub mod geometry;
pub mod collision;
pub mod puzzle;
pub mod generation;
pub mod mesh;
pub mod level;
pub mod level_file;
pub mod placement;
pub mod batch;

// Re-export core types for convenience
pub use error::{PuzzleError, Result};
pub use config::{BatchConfig, BatchConfigBuilder, LevelConfig, LevelConfigBuilder};
pub use geometry::{Rect, Triangle};
pub use generation::{RetryReason, Site};
pub use mesh::PolygonMesh;
pub use level::{current_timestamp_millis, GeneratedLevel};
pub use level_file::{LevelFile, PieceShape, PolygonRecord};
pub use placement::{pieces_overlap, PlacementBoard};
pub use batch::{run_batch, BatchHandle, BatchProgress, BatchSummary};

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
