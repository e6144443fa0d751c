//! GPU parameter blocks
//!
//! Uniform structs uploaded before each pass. Field order and padding match
//! the WGSL declarations in `crate::shaders`.

use bytemuck::{Pod, Zeroable};

use strata_core::brush::BrushStamp;
use strata_core::grid::{GridShape, Slot};
use strata_core::rule::{EdgeMode, RuleParams};

/// Matches `StepParams` in the step shader
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct StepParams {
    pub width: u32,
    pub height: u32,
    pub layer_words: u32,
    pub src_layer: u32,
    pub dst_layer: u32,
    pub threshold: u32,
    pub wrap_edges: u32,
    pub _pad: u32,
}

impl StepParams {
    pub fn new(shape: &GridShape, from: Slot, to: Slot, rule: &RuleParams) -> Self {
        Self {
            width: shape.width,
            height: shape.height,
            layer_words: shape.layer_words() as u32,
            src_layer: from.layer,
            dst_layer: to.layer,
            threshold: rule.threshold as u32,
            wrap_edges: (rule.edge_mode == EdgeMode::Wrap) as u32,
            _pad: 0,
        }
    }
}

/// Matches `BrushParams` in the brush shader
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct BrushParams {
    pub width: u32,
    pub height: u32,
    pub layer_words: u32,
    pub layer: u32,
    pub center_x: i32,
    pub center_y: i32,
    pub radius_sq: f32,
    pub _pad: u32,
}

impl BrushParams {
    pub fn new(shape: &GridShape, slot: Slot, stamp: &BrushStamp) -> Self {
        Self {
            width: shape.width,
            height: shape.height,
            layer_words: shape.layer_words() as u32,
            layer: slot.layer,
            center_x: stamp.center_x as i32,
            center_y: stamp.center_y as i32,
            radius_sq: stamp.radius_sq(),
            _pad: 0,
        }
    }
}

/// Matches `ViewParams` in the composite shader
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct ViewParams {
    pub width: u32,
    pub height: u32,
    pub layer_words: u32,
    pub layer: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub origin_x: u32,
    pub origin_y: u32,
}

impl ViewParams {
    /// Draw of `slot` into the tile at `origin` of a `frame`-sized surface
    pub fn new(shape: &GridShape, slot: Slot, frame: (u32, u32), origin: (u32, u32)) -> Self {
        Self {
            width: shape.width,
            height: shape.height,
            layer_words: shape.layer_words() as u32,
            layer: slot.layer,
            frame_width: frame.0,
            frame_height: frame.1,
            origin_x: origin.0,
            origin_y: origin.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::grid::BufferId;

    #[test]
    fn test_step_params_size() {
        // 8 u32 values
        assert_eq!(std::mem::size_of::<StepParams>(), 32);
    }

    #[test]
    fn test_brush_params_size() {
        assert_eq!(std::mem::size_of::<BrushParams>(), 32);
    }

    #[test]
    fn test_view_params_size() {
        assert_eq!(std::mem::size_of::<ViewParams>(), 32);
    }

    #[test]
    fn test_step_params_from_rule() {
        let shape = GridShape::new(5, 5, 3).unwrap();
        let from = Slot { buffer: BufferId::A, layer: 1 };
        let to = Slot { buffer: BufferId::B, layer: 1 };
        let rule = RuleParams {
            threshold: 128,
            edge_mode: EdgeMode::Wrap,
        };
        let params = StepParams::new(&shape, from, to, &rule);
        assert_eq!(params.layer_words, 7);
        assert_eq!(params.threshold, 128);
        assert_eq!(params.wrap_edges, 1);
    }
}
