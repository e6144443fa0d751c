//! # Brush Rasterizer
//!
//! Turns a pointer position in normalized display space into a circular
//! stamp over grid cells. Painting is additive: covered cells become alive,
//! everything else is left alone. There is no eraser.
//!
//! Normalized coordinates map `x` to columns and `y` to rows, with `(0, 0)` at
//! the first cell of the first row. Front ends whose origin sits elsewhere flip
//! before calling in. Positions outside `[0, 1]` are clamped onto the grid.

use crate::error::{StrataError, StrataResult};
use crate::grid::GridShape;

/// A resolved stamp in grid units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushStamp {
    pub center_x: u32,
    pub center_y: u32,
    pub radius: f32,
}

/// Validate a brush radius. Zero is allowed (and paints nothing).
pub fn check_radius(radius: f32) -> StrataResult<()> {
    if !radius.is_finite() {
        return Err(StrataError::brush(format!("radius must be finite, got {}", radius)));
    }
    if radius < 0.0 {
        return Err(StrataError::brush(format!("radius must not be negative, got {}", radius)));
    }
    Ok(())
}

/// Map a normalized pointer position to the cell under it, clamping to the grid
pub fn to_cell(shape: &GridShape, x: f32, y: f32) -> StrataResult<(u32, u32)> {
    if x.is_nan() || y.is_nan() {
        return Err(StrataError::brush("pointer position is NaN"));
    }
    let cx = (x.clamp(0.0, 1.0) * shape.width as f32).floor() as u32;
    let cy = (y.clamp(0.0, 1.0) * shape.height as f32).floor() as u32;
    Ok((cx.min(shape.width - 1), cy.min(shape.height - 1)))
}

impl BrushStamp {
    /// Resolve a pointer event. `Ok(None)` means the stamp would paint nothing.
    pub fn from_normalized(
        shape: &GridShape,
        x: f32,
        y: f32,
        radius: f32,
    ) -> StrataResult<Option<Self>> {
        check_radius(radius)?;
        let (center_x, center_y) = to_cell(shape, x, y)?;
        if radius == 0.0 {
            return Ok(None);
        }
        Ok(Some(Self {
            center_x,
            center_y,
            radius,
        }))
    }

    /// Squared radius in cell units.
    ///
    /// Both backends compare `dx*dx + dy*dy` in `f32` against this value.
    /// Sums stay exact below 2^24, so host and device agree on the covered set.
    pub fn radius_sq(&self) -> f32 {
        self.radius * self.radius
    }

    /// Whether the stamp covers cell `(x, y)`
    #[inline]
    pub fn covers(&self, x: u32, y: u32) -> bool {
        let dx = (x as i64 - self.center_x as i64) as f32;
        let dy = (y as i64 - self.center_y as i64) as f32;
        dx * dx + dy * dy <= self.radius_sq()
    }

    /// Inclusive row range touched by the stamp, clamped to the grid
    pub fn row_span(&self, shape: &GridShape) -> (u32, u32) {
        let r = self.radius.floor() as i64;
        let lo = (self.center_y as i64 - r).max(0) as u32;
        let hi = (self.center_y as i64 + r).min(shape.height as i64 - 1) as u32;
        (lo, hi)
    }

    /// Inclusive column range touched by the stamp, clamped to the grid
    pub fn column_span(&self, shape: &GridShape) -> (u32, u32) {
        let r = self.radius.floor() as i64;
        let lo = (self.center_x as i64 - r).max(0) as u32;
        let hi = (self.center_x as i64 + r).min(shape.width as i64 - 1) as u32;
        (lo, hi)
    }
}

/// Points to stamp when the pointer moves from `from` to `to`.
///
/// Spacing is half the radius (but never under half a cell) so a fast drag
/// leaves a continuous line. The start point is excluded; it was stamped by
/// the previous event.
pub fn stroke_points(
    shape: &GridShape,
    from: (f32, f32),
    to: (f32, f32),
    radius: f32,
) -> Vec<(f32, f32)> {
    let from = (from.0.clamp(0.0, 1.0), from.1.clamp(0.0, 1.0));
    let to = (to.0.clamp(0.0, 1.0), to.1.clamp(0.0, 1.0));
    let dx = (to.0 - from.0) * shape.width as f32;
    let dy = (to.1 - from.1) * shape.height as f32;
    let distance = (dx * dx + dy * dy).sqrt();
    let spacing = (radius * 0.5).max(0.5);
    let steps = (distance / spacing).ceil().max(1.0) as u32;

    (1..=steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> GridShape {
        GridShape::new(10, 10, 2).unwrap()
    }

    #[test]
    fn test_negative_radius_rejected() {
        let err = BrushStamp::from_normalized(&shape(), 0.5, 0.5, -1.0).unwrap_err();
        assert!(matches!(err, StrataError::InvalidBrushParameters(_)));
    }

    #[test]
    fn test_zero_radius_is_noop() {
        assert_eq!(BrushStamp::from_normalized(&shape(), 0.5, 0.5, 0.0).unwrap(), None);
    }

    #[test]
    fn test_positions_are_clamped() {
        assert_eq!(to_cell(&shape(), -3.0, 7.0).unwrap(), (0, 9));
        assert_eq!(to_cell(&shape(), 1.0, 1.0).unwrap(), (9, 9));
        assert_eq!(to_cell(&shape(), 0.55, 0.05).unwrap(), (5, 0));
        assert!(to_cell(&shape(), f32::NAN, 0.0).is_err());
    }

    #[test]
    fn test_radius_one_covers_plus_shape() {
        let stamp = BrushStamp::from_normalized(&shape(), 0.55, 0.55, 1.0)
            .unwrap()
            .unwrap();
        let covered: Vec<(u32, u32)> = (0..10)
            .flat_map(|y| (0..10).map(move |x| (x, y)))
            .filter(|&(x, y)| stamp.covers(x, y))
            .collect();
        assert_eq!(covered, vec![(5, 4), (4, 5), (5, 5), (6, 5), (5, 6)]);
    }

    #[test]
    fn test_spans_are_clamped() {
        let stamp = BrushStamp {
            center_x: 0,
            center_y: 9,
            radius: 2.5,
        };
        assert_eq!(stamp.column_span(&shape()), (0, 2));
        assert_eq!(stamp.row_span(&shape()), (7, 9));
    }

    #[test]
    fn test_stroke_points_end_at_target() {
        let points = stroke_points(&shape(), (0.0, 0.0), (1.0, 0.0), 1.0);
        assert_eq!(points.len(), 20);
        assert_eq!(*points.last().unwrap(), (1.0, 0.0));
    }
}
