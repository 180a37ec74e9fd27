/// WGSL for every [`Program`](super::Program).
///
/// Entry points: `vs_lit`/`fs_lit`, `vs_shadow` (depth only) and
/// `vs_emissive`/`fs_emissive`. Group 0 holds the per-draw uniforms, group 1
/// the shadow map sampled by the lit program.
pub(crate) const SHADER: &str = r#"
struct DrawUniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    light_mvp: mat4x4<f32>,
    normal: mat3x4<f32>,
    camera_position: vec4<f32>,
    light_position: vec4<f32>,
    // rgb color, w intensity
    light_color: vec4<f32>,
    base_color: vec4<f32>,
    specular: vec4<f32>,
    emissive: vec4<f32>,
    // x technique (0 hard, 1 pcf, 2 pcss), y has shadow map
    shadow: vec4<i32>,
}

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct LitOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) light_clip: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> draw: DrawUniforms;

@group(1) @binding(0)
var shadow_map: texture_depth_2d;

const AMBIENT: f32 = 0.04;
const SHININESS: f32 = 32.0;
const DEPTH_BIAS: f32 = 0.0015;
const PCF_RADIUS_TEXELS: f32 = 2.5;
const BLOCKER_SEARCH_TEXELS: f32 = 12.0;
const LIGHT_SIZE_TEXELS: f32 = 40.0;
const MAX_PENUMBRA_TEXELS: f32 = 24.0;

var<private> POISSON_DISK: array<vec2<f32>, 16> = array<vec2<f32>, 16>(
    vec2<f32>(-0.94201624, -0.39906216),
    vec2<f32>(0.94558609, -0.76890725),
    vec2<f32>(-0.09418410, -0.92938870),
    vec2<f32>(0.34495938, 0.29387760),
    vec2<f32>(-0.91588581, 0.45771432),
    vec2<f32>(-0.81544232, -0.87912464),
    vec2<f32>(-0.38277543, 0.27676845),
    vec2<f32>(0.97484398, 0.75648379),
    vec2<f32>(0.44323325, -0.97511554),
    vec2<f32>(0.53742981, -0.47373420),
    vec2<f32>(-0.26496911, -0.41893023),
    vec2<f32>(0.79197514, 0.19090188),
    vec2<f32>(-0.24188840, 0.99706507),
    vec2<f32>(-0.81409955, 0.91437590),
    vec2<f32>(0.19984126, 0.78641367),
    vec2<f32>(0.14383161, -0.14100790),
);

fn load_depth(uv: vec2<f32>, offset: vec2<f32>) -> f32 {
    let size = vec2<f32>(textureDimensions(shadow_map));
    let texel = clamp(
        vec2<i32>(uv * size + offset),
        vec2<i32>(0, 0),
        vec2<i32>(size) - vec2<i32>(1, 1),
    );
    return textureLoad(shadow_map, texel, 0);
}

fn hard_shadow(uv: vec2<f32>, depth: f32) -> f32 {
    return select(0.0, 1.0, depth - DEPTH_BIAS <= load_depth(uv, vec2<f32>(0.0, 0.0)));
}

fn pcf(uv: vec2<f32>, depth: f32, radius: f32) -> f32 {
    var lit = 0.0;
    for (var i = 0; i < 16; i = i + 1) {
        let stored = load_depth(uv, POISSON_DISK[i] * radius);
        lit = lit + select(0.0, 1.0, depth - DEPTH_BIAS <= stored);
    }
    return lit / 16.0;
}

fn pcss(uv: vec2<f32>, depth: f32) -> f32 {
    var blocker_sum = 0.0;
    var blockers = 0.0;
    for (var i = 0; i < 16; i = i + 1) {
        let stored = load_depth(uv, POISSON_DISK[i] * BLOCKER_SEARCH_TEXELS);
        if (stored < depth - DEPTH_BIAS) {
            blocker_sum = blocker_sum + stored;
            blockers = blockers + 1.0;
        }
    }
    if (blockers < 1.0) {
        return 1.0;
    }
    let blocker_depth = blocker_sum / blockers;
    let penumbra = (depth - blocker_depth) / max(blocker_depth, 0.0001) * LIGHT_SIZE_TEXELS;
    return pcf(uv, depth, clamp(penumbra, 1.0, MAX_PENUMBRA_TEXELS));
}

fn visibility(light_clip: vec4<f32>) -> f32 {
    if (draw.shadow.y == 0) {
        return 1.0;
    }
    let ndc = light_clip.xyz / light_clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    if (any(uv < vec2<f32>(0.0, 0.0)) || any(uv > vec2<f32>(1.0, 1.0)) || ndc.z > 1.0) {
        return 1.0;
    }
    var lit = 1.0;
    switch draw.shadow.x {
        case 0: {
            lit = hard_shadow(uv, ndc.z);
        }
        case 1: {
            lit = pcf(uv, ndc.z, PCF_RADIUS_TEXELS);
        }
        default: {
            lit = pcss(uv, ndc.z);
        }
    }
    return lit;
}

@vertex
fn vs_lit(input: VertexInput) -> LitOutput {
    var out: LitOutput;
    let world_position = draw.model * vec4<f32>(input.position, 1.0);
    out.position = draw.projection * draw.view * world_position;
    out.world_pos = world_position.xyz;
    out.normal = mat3x3<f32>(
        draw.normal[0].xyz,
        draw.normal[1].xyz,
        draw.normal[2].xyz
    ) * input.normal;
    out.light_clip = draw.light_mvp * vec4<f32>(input.position, 1.0);
    return out;
}

@fragment
fn fs_lit(input: LitOutput) -> @location(0) vec4<f32> {
    let to_light = draw.light_position.xyz - input.world_pos;
    let distance_sq = max(dot(to_light, to_light), 0.0001);
    let light_dir = normalize(to_light);
    let normal = normalize(input.normal);
    let view_dir = normalize(draw.camera_position.xyz - input.world_pos);
    let half_dir = normalize(light_dir + view_dir);

    let radiance = draw.light_color.rgb * draw.light_color.w / distance_sq;
    let diffuse = draw.base_color.rgb * max(dot(normal, light_dir), 0.0);
    let specular = draw.specular.rgb * pow(max(dot(normal, half_dir), 0.0), SHININESS);
    let shade = visibility(input.light_clip);

    let color = AMBIENT * draw.base_color.rgb + (diffuse + specular) * radiance * shade;
    return vec4<f32>(color, 1.0);
}

@vertex
fn vs_shadow(input: VertexInput) -> @builtin(position) vec4<f32> {
    return draw.light_mvp * vec4<f32>(input.position, 1.0);
}

@vertex
fn vs_emissive(input: VertexInput) -> @builtin(position) vec4<f32> {
    return draw.projection * draw.view * draw.model * vec4<f32>(input.position, 1.0);
}

@fragment
fn fs_emissive() -> @location(0) vec4<f32> {
    return vec4<f32>(draw.emissive.rgb, 1.0);
}
"#;
