//! Site sampling on the integer grid interior

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MAX_GRID_SIZE;
use crate::error::{PuzzleError, Result};

/// A diagram seed point at integer grid coordinates
///
/// Ids are assigned in pick order and double as polygon keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Site {
    pub id: usize,
    pub x: i32,
    pub y: i32,
}

impl Site {
    #[inline]
    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64)
    }
}

/// All interior lattice points `[1, grid_size - 1]²`, x-major
fn interior_points(grid_size: i32) -> Vec<(i32, i32)> {
    let last = grid_size - 1;
    (1..=last)
        .flat_map(|x| (1..=last).map(move |y| (x, y)))
        .collect()
}

/// Pick `count` distinct interior grid points uniformly without replacement
///
/// # Errors
///
/// Returns [`PuzzleError::TooManyShapes`] when the grid interior has fewer
/// than `count` points. This is a configuration problem and is never retried.
/// Grids larger than [`MAX_GRID_SIZE`] are rejected with `InvalidConfig`.
pub fn sample_sites<R: Rng + ?Sized>(count: usize, grid_size: u32, rng: &mut R) -> Result<Vec<Site>> {
    let side = i32::try_from(grid_size)
        .ok()
        .filter(|_| grid_size <= MAX_GRID_SIZE)
        .ok_or_else(|| {
            PuzzleError::InvalidConfig(format!(
                "grid size must be at most {MAX_GRID_SIZE} (got {grid_size})"
            ))
        })?;
    let candidates = interior_points(side);
    if count > candidates.len() {
        return Err(PuzzleError::TooManyShapes {
            requested: count,
            available: candidates.len(),
        });
    }

    let picks = rand::seq::index::sample(rng, candidates.len(), count);
    Ok(picks
        .iter()
        .enumerate()
        .map(|(id, index)| {
            let (x, y) = candidates[index];
            Site { id, x, y }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn test_sites_are_distinct_and_interior() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let sites = sample_sites(12, 13, &mut rng).unwrap();

        assert_eq!(sites.len(), 12);
        let unique: HashSet<_> = sites.iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(unique.len(), 12);
        for (i, site) in sites.iter().enumerate() {
            assert_eq!(site.id, i);
            assert!((1..=12).contains(&site.x));
            assert!((1..=12).contains(&site.y));
        }
    }

    #[test]
    fn test_full_interior_uses_every_point() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let sites = sample_sites(4, 3, &mut rng).unwrap();
        let picked: HashSet<_> = sites.iter().map(|s| (s.x, s.y)).collect();
        let expected: HashSet<_> = interior_points(3).into_iter().collect();
        assert_eq!(picked, expected);
    }

    #[test]
    fn test_too_many_sites() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = sample_sites(5, 3, &mut rng).unwrap_err();
        assert!(matches!(err, PuzzleError::TooManyShapes { requested: 5, available: 4 }));
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for size in [MAX_GRID_SIZE + 1, u32::MAX] {
            assert!(matches!(
                sample_sites(2, size, &mut rng),
                Err(PuzzleError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_same_seed_same_sites() {
        let a = sample_sites(6, 7, &mut ChaCha8Rng::seed_from_u64(99)).unwrap();
        let b = sample_sites(6, 7, &mut ChaCha8Rng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }
}
