//! # Survival/Birth Rule (B3/S23)
//!
//! Each cell's next value depends only on the previous generation: the cell
//! itself and its eight Moore neighbours. Nothing reads a sibling's output,
//! which is what lets a backend evaluate every cell of a layer in parallel.

use serde::{Deserialize, Serialize};

use crate::cell::{is_alive, ALIVE, DEAD};
use crate::grid::GridShape;

/// How neighbours beyond the grid edge are read
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    /// Off-grid neighbours are dead
    #[default]
    Clamp,
    /// Toroidal wrap-around
    Wrap,
}

/// Parameters a backend needs to evaluate one step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleParams {
    pub threshold: u8,
    pub edge_mode: EdgeMode,
}

/// Moore neighbourhood offsets
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Transition for one cell given its alive-neighbour count
#[inline]
pub fn next_state(alive: bool, neighbors: u32) -> u8 {
    let lives = if alive {
        neighbors == 2 || neighbors == 3
    } else {
        neighbors == 3
    };
    if lives { ALIVE } else { DEAD }
}

/// Count alive neighbours of `(x, y)` in a single `W*H` layer
pub fn alive_neighbors(
    layer: &[u8],
    shape: &GridShape,
    x: u32,
    y: u32,
    params: &RuleParams,
) -> u32 {
    let w = shape.width as i32;
    let h = shape.height as i32;
    let mut count = 0;
    for (dx, dy) in NEIGHBOR_OFFSETS {
        let mut nx = x as i32 + dx;
        let mut ny = y as i32 + dy;
        match params.edge_mode {
            EdgeMode::Clamp => {
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
            }
            EdgeMode::Wrap => {
                nx = nx.rem_euclid(w);
                ny = ny.rem_euclid(h);
            }
        }
        let value = layer[ny as usize * shape.width as usize + nx as usize];
        if is_alive(value, params.threshold) {
            count += 1;
        }
    }
    count
}

/// Next value of `(x, y)` computed from the previous layer
#[inline]
pub fn evolve_cell(layer: &[u8], shape: &GridShape, x: u32, y: u32, params: &RuleParams) -> u8 {
    let alive = is_alive(layer[shape.index(x, y)], params.threshold);
    next_state(alive, alive_neighbors(layer, shape, x, y, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::DEFAULT_THRESHOLD;

    fn clamp() -> RuleParams {
        RuleParams {
            threshold: DEFAULT_THRESHOLD,
            edge_mode: EdgeMode::Clamp,
        }
    }

    #[test]
    fn test_transition_table() {
        for n in 0..=8 {
            let survive = next_state(true, n);
            let birth = next_state(false, n);
            assert_eq!(survive == ALIVE, n == 2 || n == 3, "survival with {}", n);
            assert_eq!(birth == ALIVE, n == 3, "birth with {}", n);
        }
    }

    #[test]
    fn test_clamped_corner_sees_three_neighbors() {
        let shape = GridShape::new(3, 3, 1).unwrap();
        let layer = [ALIVE; 9];
        assert_eq!(alive_neighbors(&layer, &shape, 0, 0, &clamp()), 3);
        assert_eq!(alive_neighbors(&layer, &shape, 1, 1, &clamp()), 8);
    }

    #[test]
    fn test_wrapped_corner_sees_all_neighbors() {
        let shape = GridShape::new(3, 3, 1).unwrap();
        let layer = [ALIVE; 9];
        let wrap = RuleParams {
            edge_mode: EdgeMode::Wrap,
            ..clamp()
        };
        assert_eq!(alive_neighbors(&layer, &shape, 0, 0, &wrap), 8);
    }

    #[test]
    fn test_below_threshold_counts_as_dead() {
        let shape = GridShape::new(3, 1, 1).unwrap();
        let layer = [127, 0, 128];
        assert_eq!(alive_neighbors(&layer, &shape, 1, 0, &clamp()), 1);
    }
}
