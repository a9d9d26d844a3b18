//! Drag-and-drop placement checks for loaded pieces
//!
//! Pieces are placed by the position of their bounds origin. Two placed
//! pieces may touch along edges and at corners but never overlap.

use glam::DVec2;

use crate::collision::{rectangles_overlap, triangles_overlap};
use crate::level_file::PieceShape;

/// Whether piece `a` at `a_at` overlaps piece `b` at `b_at`
pub fn pieces_overlap(a: &PieceShape, a_at: DVec2, b: &PieceShape, b_at: DVec2) -> bool {
    if !rectangles_overlap(&a.bounds.at(a_at), &b.bounds.at(b_at)) {
        return false;
    }

    a.triangles.iter().any(|ta| {
        let ta = ta.translated(a_at);
        b.triangles
            .iter()
            .any(|tb| triangles_overlap(&ta, &tb.translated(b_at)))
    })
}

/// The play area and the pieces currently placed on it
#[derive(Debug, Clone)]
pub struct PlacementBoard {
    grid_size: f64,
    pieces: Vec<PieceShape>,
    positions: Vec<Option<DVec2>>,
}

impl PlacementBoard {
    pub fn new(grid_size: u32, pieces: Vec<PieceShape>) -> Self {
        let positions = vec![None; pieces.len()];
        Self {
            grid_size: grid_size as f64,
            pieces,
            positions,
        }
    }

    pub fn pieces(&self) -> &[PieceShape] {
        &self.pieces
    }

    pub fn position(&self, index: usize) -> Option<DVec2> {
        self.positions.get(index).copied().flatten()
    }

    /// Every piece is on the board
    pub fn is_complete(&self) -> bool {
        self.positions.iter().all(Option::is_some)
    }

    /// Whether piece `index` fits inside the board at `at` without
    /// overlapping any other placed piece
    pub fn can_place(&self, index: usize, at: DVec2) -> bool {
        let Some(piece) = self.pieces.get(index) else {
            return false;
        };
        let bounds = piece.bounds.at(at);
        let (min, max) = (bounds.min(), bounds.max());
        if min.x < 0.0 || min.y < 0.0 || max.x > self.grid_size || max.y > self.grid_size {
            return false;
        }

        self.positions
            .iter()
            .enumerate()
            .filter(|&(other, _)| other != index)
            .filter_map(|(other, placed)| placed.map(|p| (other, p)))
            .all(|(other, placed_at)| !pieces_overlap(piece, at, &self.pieces[other], placed_at))
    }

    /// Place piece `index` at `at` if allowed; returns whether it was placed
    pub fn place(&mut self, index: usize, at: DVec2) -> bool {
        if !self.can_place(index, at) {
            return false;
        }
        self.positions[index] = Some(at);
        true
    }

    /// Take piece `index` off the board, returning where it was
    pub fn lift(&mut self, index: usize) -> Option<DVec2> {
        self.positions.get_mut(index)?.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Triangle};

    /// Unit square split along its diagonal
    fn unit_square() -> PieceShape {
        let (a, b, c, d) = (
            DVec2::ZERO,
            DVec2::X,
            DVec2::ONE,
            DVec2::Y,
        );
        PieceShape {
            bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
            triangles: vec![Triangle::new(a, b, c), Triangle::new(a, c, d)],
            vertices: vec![a, b, c, d],
        }
    }

    #[test]
    fn test_adjacent_pieces_do_not_overlap() {
        let square = unit_square();
        assert!(!pieces_overlap(&square, DVec2::ZERO, &square, DVec2::X));
        assert!(!pieces_overlap(&square, DVec2::ZERO, &square, DVec2::ONE));
    }

    #[test]
    fn test_shifted_pieces_overlap() {
        let square = unit_square();
        assert!(pieces_overlap(&square, DVec2::ZERO, &square, DVec2::new(0.5, 0.25)));
    }

    #[test]
    fn test_board_placement() {
        let mut board = PlacementBoard::new(2, vec![unit_square(), unit_square()]);

        assert!(board.place(0, DVec2::ZERO));
        assert!(!board.can_place(1, DVec2::new(0.5, 0.5)));
        assert!(!board.can_place(1, DVec2::new(1.5, 0.0)), "outside the board");
        assert!(board.place(1, DVec2::X));
        assert!(board.is_complete());

        // A piece never collides with its own old position
        assert!(board.can_place(0, DVec2::new(0.0, 0.5)));

        assert_eq!(board.lift(1), Some(DVec2::X));
        assert_eq!(board.position(1), None);
        assert!(!board.is_complete());
        assert!(!board.can_place(7, DVec2::ZERO));
    }
}
