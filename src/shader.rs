//! Procedural noise background.
//!
//! The GPU path renders a full-screen triangle pair with [`FRAGMENT_SRC`]. The
//! same field is mirrored on the CPU by [`shade`], which takes nothing but the
//! per-frame inputs and therefore gives identical output for identical inputs.
//! GPU `sin` precision differs between drivers, so the two agree in shape, not
//! to the last bit.

use glam::Vec2;

use crate::config::ShaderConfig;

pub const VERTEX_SRC: &str = r#"#version 300 es
in vec2 a_position;
void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

pub const FRAGMENT_SRC: &str = r#"#version 300 es
precision highp float;

uniform vec2 u_resolution;
uniform float u_time;
uniform vec2 u_pointer;
uniform vec3 u_color0;
uniform vec3 u_color1;
uniform vec3 u_color2;

out vec4 frag_color;

vec2 hash2(vec2 p) {
    p = vec2(dot(p, vec2(127.1, 311.7)), dot(p, vec2(269.5, 183.3)));
    return -1.0 + 2.0 * fract(sin(p) * 43758.5453123);
}

float noise(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);
    vec2 u = f * f * (3.0 - 2.0 * f);
    float a = dot(hash2(i + vec2(0.0, 0.0)), f - vec2(0.0, 0.0));
    float b = dot(hash2(i + vec2(1.0, 0.0)), f - vec2(1.0, 0.0));
    float c = dot(hash2(i + vec2(0.0, 1.0)), f - vec2(0.0, 1.0));
    float d = dot(hash2(i + vec2(1.0, 1.0)), f - vec2(1.0, 1.0));
    return mix(mix(a, b, u.x), mix(c, d, u.x), u.y);
}

void main() {
    vec2 uv = gl_FragCoord.xy / u_resolution;
    vec2 aspect = vec2(u_resolution.x / u_resolution.y, 1.0);
    vec2 p = uv * aspect * 3.0;

    float n1 = noise(p + vec2(u_time * 0.10, u_time * 0.07));
    float n2 = noise(p * 2.5 - vec2(u_time * 0.05, u_time * 0.12));
    float n = clamp(0.5 + 0.5 * (n1 * 0.65 + n2 * 0.35), 0.0, 1.0);

    vec3 color = mix(u_color0, u_color1, smoothstep(0.2, 0.6, n));
    color = mix(color, u_color2, smoothstep(0.5, 0.9, n));

    float d = distance(uv * aspect, u_pointer * aspect);
    color += (1.0 - smoothstep(0.0, 0.25, d)) * 0.25;

    frag_color = vec4(clamp(color, 0.0, 1.0), 1.0);
}
"#;

/// Pointer uniform used when no pointer is over the page; far enough that
/// the glow term is zero everywhere.
pub const POINTER_OFFSCREEN: Vec2 = Vec2::new(-10.0, -10.0);

pub const GLOW_RADIUS: f32 = 0.25;

/// Two clip-space triangles covering the viewport.
pub const QUAD: [f32; 12] = [
    -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, //
    -1.0, 1.0, 1.0, -1.0, 1.0, 1.0,
];

/// Everything one frame of the field depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInputs {
    /// Drawing buffer size in pixels.
    pub resolution: Vec2,
    /// Elapsed seconds, already divided by the configured time scale.
    pub time: f32,
    /// Pointer in `0..1` with the origin at the bottom-left, like `gl_FragCoord`.
    pub pointer: Option<Vec2>,
    pub colors: [[f32; 3]; 3],
}

impl FrameInputs {
    pub fn new(config: &ShaderConfig, resolution: Vec2, elapsed: f32, pointer: Option<Vec2>) -> Self {
        let scale = if config.time_scale > 0.0 { config.time_scale } else { 1.0 };
        Self {
            resolution,
            time: elapsed / scale,
            pointer,
            colors: config.colors.map(|c| c.to_unit()),
        }
    }

    pub fn pointer_uniform(&self) -> Vec2 {
        self.pointer.unwrap_or(POINTER_OFFSCREEN)
    }
}

/// Convert a CSS-pixel pointer position (origin top-left) to shader space.
pub fn normalize_pointer(x: f32, y: f32, width: f32, height: f32) -> Option<Vec2> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Vec2::new(x / width, 1.0 - y / height))
}

fn fract(v: Vec2) -> Vec2 {
    v - v.floor()
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn hash2(p: Vec2) -> Vec2 {
    let p = Vec2::new(p.dot(Vec2::new(127.1, 311.7)), p.dot(Vec2::new(269.5, 183.3)));
    let s = Vec2::new(p.x.sin(), p.y.sin()) * 43758.547;
    Vec2::splat(-1.0) + 2.0 * fract(s)
}

/// 2D gradient noise in roughly `-0.7..0.7`.
pub fn noise(p: Vec2) -> f32 {
    let i = p.floor();
    let f = fract(p);
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);
    let corner = |o: Vec2| hash2(i + o).dot(f - o);
    let a = corner(Vec2::new(0.0, 0.0));
    let b = corner(Vec2::new(1.0, 0.0));
    let c = corner(Vec2::new(0.0, 1.0));
    let d = corner(Vec2::new(1.0, 1.0));
    let ab = a + (b - a) * u.x;
    let cd = c + (d - c) * u.x;
    ab + (cd - ab) * u.y
}

/// Color of the pixel at `frag` (pixel coordinates, origin bottom-left).
pub fn shade(frag: Vec2, inputs: &FrameInputs) -> [f32; 3] {
    let res = inputs.resolution;
    if res.x <= 0.0 || res.y <= 0.0 {
        return [0.0; 3];
    }
    let t = inputs.time;
    let uv = frag / res;
    let aspect = Vec2::new(res.x / res.y, 1.0);
    let p = uv * aspect * 3.0;

    let n1 = noise(p + Vec2::new(t * 0.10, t * 0.07));
    let n2 = noise(p * 2.5 - Vec2::new(t * 0.05, t * 0.12));
    let n = (0.5 + 0.5 * (n1 * 0.65 + n2 * 0.35)).clamp(0.0, 1.0);

    let [c0, c1, c2] = inputs.colors;
    let mut color = mix3(c0, c1, smoothstep(0.2, 0.6, n));
    color = mix3(color, c2, smoothstep(0.5, 0.9, n));

    let d = (uv * aspect).distance(inputs.pointer_uniform() * aspect);
    let glow = (1.0 - smoothstep(0.0, GLOW_RADIUS, d)) * 0.25;
    color.map(|c| (c + glow).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pointer: Option<Vec2>) -> FrameInputs {
        FrameInputs::new(&ShaderConfig::default(), Vec2::new(800.0, 600.0), 2.5, pointer)
    }

    #[test]
    fn same_inputs_same_pixels() {
        let a = inputs(Some(Vec2::new(0.3, 0.7)));
        let b = inputs(Some(Vec2::new(0.3, 0.7)));
        for &(x, y) in &[(0.5, 0.5), (123.0, 456.0), (799.5, 10.0)] {
            assert_eq!(shade(Vec2::new(x, y), &a), shade(Vec2::new(x, y), &b));
        }
    }

    #[test]
    fn noise_vanishes_on_lattice_points() {
        for &(x, y) in &[(0.0, 0.0), (3.0, -2.0), (17.0, 5.0)] {
            assert!(noise(Vec2::new(x, y)).abs() < 1e-6);
        }
    }

    #[test]
    fn pointer_brightens_nearby_pixels() {
        let frag = Vec2::new(400.0, 300.0);
        let lit = shade(frag, &inputs(Some(Vec2::new(0.5, 0.5))));
        let dark = shade(frag, &inputs(None));
        for ch in 0..3 {
            assert!(lit[ch] >= dark[ch]);
        }
        assert!(lit.iter().sum::<f32>() > dark.iter().sum::<f32>());
    }

    #[test]
    fn output_stays_in_unit_range() {
        let inp = inputs(Some(Vec2::new(0.1, 0.1)));
        for x in (0..800).step_by(97) {
            for y in (0..600).step_by(89) {
                let c = shade(Vec2::new(x as f32, y as f32), &inp);
                assert!(c.iter().all(|v| (0.0..=1.0).contains(v)));
            }
        }
    }

    #[test]
    fn zero_viewport_is_black() {
        let mut inp = inputs(None);
        inp.resolution = Vec2::ZERO;
        assert_eq!(shade(Vec2::ZERO, &inp), [0.0; 3]);
    }

    #[test]
    fn pointer_is_flipped_to_gl_space() {
        assert_eq!(
            normalize_pointer(200.0, 150.0, 800.0, 600.0),
            Some(Vec2::new(0.25, 0.75))
        );
        assert_eq!(normalize_pointer(1.0, 1.0, 0.0, 600.0), None);
    }
}
