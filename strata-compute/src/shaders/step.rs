//! Step shader - One B3/S23 generation from the opposite-parity buffer

/// Reads layer `src_layer` of `src`, writes layer `dst_layer` of `dst`.
///
/// `src` and `dst` are always different buffers (A/B ping-pong), and each
/// invocation owns exactly one packed `u32` word of the output, so no two
/// invocations ever write the same memory.
pub const STEP_TEMPLATE: &str = r#"
struct StepParams {
    width: u32,
    height: u32,
    layer_words: u32,
    src_layer: u32,
    dst_layer: u32,
    threshold: u32,
    wrap_edges: u32,
    _pad: u32,
}

@group(0) @binding(0) var<storage, read> src: array<u32>;
@group(0) @binding(1) var<storage, read_write> dst: array<u32>;
@group(0) @binding(2) var<uniform> params: StepParams;

fn cell_byte(i: u32) -> u32 {
    let word = src[params.src_layer * params.layer_words + (i >> 2u)];
    return (word >> ((i & 3u) * 8u)) & 0xFFu;
}

fn alive_at(x: i32, y: i32) -> u32 {
    let w = i32(params.width);
    let h = i32(params.height);
    var cx = x;
    var cy = y;
    if params.wrap_edges != 0u {
        cx = (cx + w) % w;
        cy = (cy + h) % h;
    } else if cx < 0 || cy < 0 || cx >= w || cy >= h {
        return 0u;
    }
    let v = cell_byte(u32(cy) * params.width + u32(cx));
    return select(0u, 1u, v >= params.threshold);
}

@compute @workgroup_size({{WORKGROUP_SIZE}})
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let word_idx = id.x;
    if word_idx >= params.layer_words { return; }

    let cell_count = params.width * params.height;
    var packed = 0u;
    for (var k = 0u; k < 4u; k++) {
        let i = word_idx * 4u + k;
        if i >= cell_count { break; }

        let x = i32(i % params.width);
        let y = i32(i / params.width);
        var neighbors = 0u;
        for (var dy = -1; dy <= 1; dy++) {
            for (var dx = -1; dx <= 1; dx++) {
                if dx == 0 && dy == 0 { continue; }
                neighbors += alive_at(x + dx, y + dy);
            }
        }

        let alive = cell_byte(i) >= params.threshold;
        var lives = neighbors == 3u;
        if alive {
            lives = neighbors == 2u || neighbors == 3u;
        }
        if lives {
            packed = packed | (0xFFu << (k * 8u));
        }
    }

    dst[params.dst_layer * params.layer_words + word_idx] = packed;
}
"#;
