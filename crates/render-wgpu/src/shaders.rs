use cascadeview_network::NetworkSpec;

/// Appearance program. `{{HIDDEN_DIM}}` and `{{HIDDEN_GROUPS}}` are
/// substituted per network shape.
///
/// Weight texture `k` is fetched at `(0, k)`. Layer 0 packs inputs
/// `[dir, feat.r]` at texels `0..HIDDEN_DIM` and `[feat.g, feat.b, 0, 0]` at
/// texels `HIDDEN_DIM..2 * HIDDEN_DIM`; layer 1 packs hidden group `g` for
/// output `i` at texel `3g + i`.
const APPEARANCE_TEMPLATE: &str = r#"
const HIDDEN_DIM: i32 = {{HIDDEN_DIM}};
const HIDDEN_GROUPS: i32 = {{HIDDEN_GROUPS}};

struct FrameUniforms {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
};

struct DrawUniforms {
    model: mat4x4<f32>,
    mode: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var<uniform> per_draw: DrawUniforms;
@group(1) @binding(1)
var t_diffuse: texture_2d<f32>;
@group(1) @binding(2)
var t_specular: texture_2d<f32>;
@group(1) @binding(3)
var weights_zero: texture_2d<f32>;
@group(1) @binding(4)
var weights_one: texture_2d<f32>;
@group(1) @binding(5)
var s_nearest: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) ray_direction: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = per_draw.model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.uv = vec2<f32>(vertex.uv.x, 1.0 - vertex.uv.y);
    out.ray_direction = world_pos.xyz - frame.camera_position.xyz;
    return out;
}

fn layer_zero(v: vec4<f32>, base: i32) -> vec4<f32> {
    let m = mat4x4<f32>(
        textureLoad(weights_zero, vec2<i32>(0, base), 0),
        textureLoad(weights_zero, vec2<i32>(0, base + 1), 0),
        textureLoad(weights_zero, vec2<i32>(0, base + 2), 0),
        textureLoad(weights_zero, vec2<i32>(0, base + 3), 0),
    );
    return v * m;
}

fn layer_one(h: vec4<f32>, g: i32) -> vec4<f32> {
    let base = 3 * g;
    let m = mat4x4<f32>(
        textureLoad(weights_one, vec2<i32>(0, base), 0),
        textureLoad(weights_one, vec2<i32>(0, base + 1), 0),
        textureLoad(weights_one, vec2<i32>(0, base + 2), 0),
        vec4<f32>(0.0),
    );
    return h * m;
}

fn evaluate_network(features: vec3<f32>, dir: vec3<f32>) -> vec3<f32> {
    let v0 = vec4<f32>(dir, features.r);
    let v1 = vec4<f32>(features.g, features.b, 0.0, 0.0);

    var acc = vec4<f32>(0.0);
    for (var g: i32 = 0; g < HIDDEN_GROUPS; g = g + 1) {
        let i = 4 * g;
        let pre = layer_zero(v0, i) + layer_zero(v1, HIDDEN_DIM + i);
        let h = max(pre, vec4<f32>(0.0));
        acc = acc + layer_one(h, g);
    }
    return vec3<f32>(1.0) / (vec3<f32>(1.0) + exp(-acc.xyz));
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = textureSample(t_diffuse, s_nearest, input.uv);
    let specular = textureSample(t_specular, s_nearest, input.uv);

    var dir = vec3<f32>(0.0);
    let len = length(input.ray_direction);
    if (len > 0.0) {
        dir = input.ray_direction / len;
    }

    var color: vec3<f32>;
    if (per_draw.mode == 1u) {
        color = diffuse.rgb;
    } else if (per_draw.mode == 2u) {
        color = evaluate_network(specular.rgb, dir);
    } else {
        color = clamp(diffuse.rgb + evaluate_network(specular.rgb, dir), vec3<f32>(0.0), vec3<f32>(1.0));
    }
    return vec4<f32>(color, 1.0);
}
"#;

/// WGSL source of the appearance program for one network shape.
pub fn appearance_shader(spec: &NetworkSpec) -> String {
    APPEARANCE_TEMPLATE
        .replace("{{HIDDEN_DIM}}", &spec.hidden_dim.to_string())
        .replace("{{HIDDEN_GROUPS}}", &(spec.hidden_dim / 4).to_string())
}
