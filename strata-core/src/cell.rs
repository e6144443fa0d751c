//! # Cell - One Byte of Automaton State
//!
//! Cells are stored as raw `u8` rather than `bool` so the same bytes can live
//! in GPU storage buffers and be sampled by the step and composite passes.
//!
//! - `0` is dead
//! - any value `>= threshold` is alive (threshold defaults to 128)
//! - step outputs and brush writes are always the canonical [`ALIVE`]

/// Canonical dead value
pub const DEAD: u8 = 0;

/// Canonical alive value
pub const ALIVE: u8 = 255;

/// Default alive threshold
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Whether a stored byte counts as alive for the rule evaluator
#[inline]
pub fn is_alive(value: u8, threshold: u8) -> bool {
    value >= threshold
}

/// Normalize seeded input: any nonzero byte becomes [`ALIVE`]
#[inline]
pub fn canonical(value: u8) -> u8 {
    if value == DEAD { DEAD } else { ALIVE }
}

/// Greyscale intensity in `[0, 1]` for a stored byte
#[inline]
pub fn intensity(value: u8) -> f32 {
    value as f32 / 255.0
}

/// Count alive cells in a slice
pub fn population(cells: &[u8], threshold: u8) -> usize {
    cells.iter().filter(|&&v| is_alive(v, threshold)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(is_alive(128, DEFAULT_THRESHOLD));
        assert!(!is_alive(127, DEFAULT_THRESHOLD));
        assert!(is_alive(ALIVE, DEFAULT_THRESHOLD));
        assert!(!is_alive(DEAD, DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_canonical_and_intensity() {
        assert_eq!(canonical(0), DEAD);
        assert_eq!(canonical(3), ALIVE);
        assert_eq!(intensity(ALIVE), 1.0);
        assert_eq!(intensity(DEAD), 0.0);
    }

    #[test]
    fn test_population() {
        assert_eq!(population(&[0, 255, 128, 127, 1], DEFAULT_THRESHOLD), 2);
    }
}
