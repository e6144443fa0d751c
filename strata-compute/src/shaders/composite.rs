//! Composite shader - Full-screen greyscale view of one stored generation

/// Full-screen triangle; the fragment stage samples the packed storage buffer
/// nearest-neighbour, so the target may have any resolution.
///
/// The target may be one tile of a larger frame: `origin_*` places the tile
/// and `frame_*` is the size of the whole frame. Pixel centres map to
/// `(p + 0.5) / frame_size`, the same sample point the host compositor uses.
pub const COMPOSITE_SHADER: &str = r#"
struct ViewParams {
    width: u32,
    height: u32,
    layer_words: u32,
    layer: u32,
    frame_width: u32,
    frame_height: u32,
    origin_x: u32,
    origin_y: u32,
}

@group(0) @binding(0) var<storage, read> cells: array<u32>;
@group(0) @binding(1) var<uniform> params: ViewParams;

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> @builtin(position) vec4<f32> {
    var p = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -3.0),
        vec2<f32>( 3.0,  1.0),
        vec2<f32>(-1.0,  1.0)
    );
    return vec4<f32>(p[vi], 0.0, 1.0);
}

fn sample_cell(p: f32, pixels: u32, cells: u32) -> u32 {
    let uv = p / f32(pixels);
    return min(u32(uv * f32(cells)), cells - 1u);
}

@fragment
fn fs_main(@builtin(position) pos: vec4<f32>) -> @location(0) vec4<f32> {
    // pos.xy sits on the pixel centre (p + 0.5) within the tile
    let x = sample_cell(pos.x + f32(params.origin_x), params.frame_width, params.width);
    let y = sample_cell(pos.y + f32(params.origin_y), params.frame_height, params.height);
    let i = y * params.width + x;
    let word = cells[params.layer * params.layer_words + (i >> 2u)];
    let v = f32((word >> ((i & 3u) * 8u)) & 0xFFu) / 255.0;
    return vec4<f32>(v, v, v, 1.0);
}
"#;
