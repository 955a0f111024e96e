// ============================================================================
// GPU SHADERS - WGSL for the two primitive programs
// ============================================================================
//
// Both programs share one uniform block and one texture binding so a single
// pipeline layout serves them.  The vertex layout mirrors `render::Vertex`.

// ============================================================================
// PRIMITIVE SHADER - line (normal/miter offset) and sprite vertex stages
// ============================================================================
//
// `vs_line` pushes each vertex out along its normal by half the stroke
// thickness scaled by the miter factor, in model space, before applying the
// model-view-projection matrix.  `vs_sprite` transforms positions unchanged.
// `fs_main` outputs the solid colour, or the nearest texel when textured.
pub const PRIMITIVE_SHADER: &str = r#"
struct DrawUniforms {
    mvp: mat4x4<f32>,
    colour: vec4<f32>,
    thickness: f32,
    textured: u32,
    _pad0: u32,
    _pad1: u32,
};

@group(0) @binding(0) var<uniform> u: DrawUniforms;
@group(1) @binding(0) var tex: texture_2d<f32>;
@group(1) @binding(1) var samp: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) normal: vec2<f32>,
    @location(2) miter: f32,
    @location(3) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_line(v: VertexInput) -> VertexOutput {
    let local = v.position + v.normal * (u.thickness * 0.5) * v.miter;
    var out: VertexOutput;
    out.position = u.mvp * vec4<f32>(local, 0.0, 1.0);
    out.uv = v.uv;
    return out;
}

@vertex
fn vs_sprite(v: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = u.mvp * vec4<f32>(v.position, 0.0, 1.0);
    out.uv = v.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // Sampled unconditionally: textureSampleLevel keeps control flow uniform.
    let texel = textureSampleLevel(tex, samp, in.uv, 0.0);
    return select(u.colour, texel, u.textured != 0u);
}
"#;
