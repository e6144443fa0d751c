//! # Run State
//!
//! The only mutable simulation bookkeeping of a run. `current_generation`
//! moves forward one step at a time and never back; `viewed_generation` is a
//! display cursor the user may move anywhere in `[0, current_generation]`.

use crate::brush::check_radius;
use crate::error::{StrataError, StrataResult};

#[derive(Clone, Debug, PartialEq)]
pub struct RunState {
    current_generation: u32,
    viewed_generation: u32,
    brush_radius: f32,
    last_pointer: Option<(f32, f32)>,
}

impl RunState {
    pub fn new(brush_radius: f32) -> StrataResult<Self> {
        check_radius(brush_radius)?;
        Ok(Self {
            current_generation: 0,
            viewed_generation: 0,
            brush_radius,
            last_pointer: None,
        })
    }

    pub fn current_generation(&self) -> u32 {
        self.current_generation
    }

    pub fn viewed_generation(&self) -> u32 {
        self.viewed_generation
    }

    pub fn brush_radius(&self) -> f32 {
        self.brush_radius
    }

    pub fn last_pointer(&self) -> Option<(f32, f32)> {
        self.last_pointer
    }

    /// Commit one step. A cursor parked on the head follows it.
    pub fn advance(&mut self) {
        let following = self.viewed_generation == self.current_generation;
        self.current_generation += 1;
        if following {
            self.viewed_generation = self.current_generation;
        }
    }

    /// Move the display cursor
    pub fn set_viewed_generation(&mut self, generation: u32) -> StrataResult<()> {
        self.check_generation(generation)?;
        self.viewed_generation = generation;
        Ok(())
    }

    /// Fail with `OutOfRangeGeneration` for anything not yet computed
    pub fn check_generation(&self, generation: u32) -> StrataResult<()> {
        if generation > self.current_generation {
            return Err(StrataError::OutOfRangeGeneration {
                requested: generation,
                current: self.current_generation,
            });
        }
        Ok(())
    }

    pub fn set_brush_radius(&mut self, radius: f32) -> StrataResult<()> {
        check_radius(radius)?;
        self.brush_radius = radius;
        Ok(())
    }

    pub fn set_last_pointer(&mut self, pointer: Option<(f32, f32)>) {
        self.last_pointer = pointer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewed_follows_head_only_when_parked_on_it() {
        let mut state = RunState::new(1.0).unwrap();
        state.advance();
        assert_eq!(state.viewed_generation(), 1);

        state.set_viewed_generation(0).unwrap();
        state.advance();
        assert_eq!(state.current_generation(), 2);
        assert_eq!(state.viewed_generation(), 0);
    }

    #[test]
    fn test_out_of_range_view() {
        let mut state = RunState::new(1.0).unwrap();
        let err = state.set_viewed_generation(1).unwrap_err();
        assert!(matches!(
            err,
            StrataError::OutOfRangeGeneration { requested: 1, current: 0 }
        ));
        assert_eq!(state.viewed_generation(), 0);
    }

    #[test]
    fn test_radius_validation() {
        assert!(RunState::new(-0.5).is_err());
        let mut state = RunState::new(0.0).unwrap();
        assert!(state.set_brush_radius(f32::INFINITY).is_err());
        state.set_brush_radius(3.0).unwrap();
        assert_eq!(state.brush_radius(), 3.0);
    }
}
