//! Brush shader - Circular stamp into the current generation's layer

/// Read-modify-write of one packed word per invocation. Covered cells become
/// 255; uncovered bytes are written back unchanged.
pub const BRUSH_TEMPLATE: &str = r#"
struct BrushParams {
    width: u32,
    height: u32,
    layer_words: u32,
    layer: u32,
    center_x: i32,
    center_y: i32,
    radius_sq: f32,
    _pad: u32,
}

@group(0) @binding(0) var<storage, read_write> cells: array<u32>;
@group(0) @binding(1) var<uniform> params: BrushParams;

@compute @workgroup_size({{WORKGROUP_SIZE}})
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let word_idx = id.x;
    if word_idx >= params.layer_words { return; }

    let cell_count = params.width * params.height;
    let addr = params.layer * params.layer_words + word_idx;
    var packed = cells[addr];
    for (var k = 0u; k < 4u; k++) {
        let i = word_idx * 4u + k;
        if i >= cell_count { break; }

        let dx = f32(i32(i % params.width) - params.center_x);
        let dy = f32(i32(i / params.width) - params.center_y);
        if dx * dx + dy * dy <= params.radius_sq {
            packed = packed | (0xFFu << (k * 8u));
        }
    }
    cells[addr] = packed;
}
"#;
