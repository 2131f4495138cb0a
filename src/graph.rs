//! 3D node graph: particles bouncing in a cube, edges rebuilt every frame,
//! and a camera that drifts after the pointer.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::color::Rgb;
use crate::config::GraphConfig;
use crate::field::{Bounds, Link, ParticleField};

/// Exponentially smoothed camera that always looks at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub smoothing: f32,
    pub fov_y: f32,
}

impl Camera {
    pub fn new(distance: f32, smoothing: f32) -> Self {
        let home = Vec3::new(0.0, 0.0, distance);
        Self {
            position: home,
            target: home,
            smoothing: smoothing.clamp(0.0, 1.0),
            fov_y: 75f32.to_radians(),
        }
    }

    /// `position += (target - position) * smoothing`
    pub fn ease(&mut self) {
        self.position += (self.target - self.position) * self.smoothing;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh(self.fov_y, aspect, 0.1, 1000.0) * self.view()
    }
}

/// Speed and color multipliers held while a remote call is in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActivityBoost {
    color_gain: f32,
    speed_gain: f32,
    engaged: bool,
}

impl ActivityBoost {
    pub fn new(color_gain: f32, speed_gain: f32) -> Self {
        Self {
            color_gain,
            speed_gain,
            engaged: false,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn color_gain(&self) -> f32 {
        if self.engaged {
            self.color_gain
        } else {
            1.0
        }
    }
}

/// A node projected to canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub screen: Vec2,
    /// Depth in `0..1` for nodes between the clip planes; larger is farther.
    pub depth: f32,
    /// Pixels per world unit at this node's distance.
    pub scale: f32,
    pub visible: bool,
}

pub struct NodeGraph {
    field: ParticleField<Vec3>,
    spins: Vec<f32>,
    edges: Vec<Link>,
    camera: Camera,
    boost: ActivityBoost,
    config: GraphConfig,
}

impl NodeGraph {
    pub fn new(config: GraphConfig, seed: u64) -> Self {
        let mut field = ParticleField::new(config.field.clone(), seed);
        field.resize(Bounds::cube(config.bounds));
        let count = field.particles().len();
        Self {
            field,
            spins: vec![0.0; count],
            edges: Vec::new(),
            camera: Camera::new(config.camera_distance, config.smoothing),
            boost: ActivityBoost::new(config.color_gain, config.speed_gain),
            config,
        }
    }

    pub fn field(&self) -> &ParticleField<Vec3> {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ParticleField<Vec3> {
        &mut self.field
    }

    pub fn edges(&self) -> &[Link] {
        &self.edges
    }

    pub fn spins(&self) -> &[f32] {
        &self.spins
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn boost(&self) -> &ActivityBoost {
        &self.boost
    }

    /// Pointer offset in `-1..1` on both axes, `+y` up the screen.
    pub fn set_pointer_offset(&mut self, offset: Vec2) {
        let pan = self.config.camera_pan;
        self.camera.target = Vec3::new(offset.x * pan, offset.y * pan, self.config.camera_distance);
    }

    pub fn clear_pointer_offset(&mut self) {
        self.camera.target = Vec3::new(0.0, 0.0, self.config.camera_distance);
    }

    pub fn step(&mut self) {
        self.field.step();
        for spin in &mut self.spins {
            *spin = (*spin + self.config.spin) % std::f32::consts::TAU;
        }
        self.edges.clear();
        self.edges.extend(self.field.connections());
        self.camera.ease();
    }

    /// Start the boost; a second call while engaged does nothing.
    pub fn engage_boost(&mut self) {
        if self.boost.engaged {
            return;
        }
        self.boost.engaged = true;
        self.field.scale_speed(self.boost.speed_gain);
    }

    /// Undo the boost by the inverse factors.
    pub fn release_boost(&mut self) {
        if !self.boost.engaged {
            return;
        }
        self.boost.engaged = false;
        if self.boost.speed_gain != 0.0 {
            self.field.scale_speed(1.0 / self.boost.speed_gain);
        }
    }

    pub fn node_color(&self) -> Rgb {
        self.config.node_color.scaled(self.boost.color_gain())
    }

    pub fn edge_color(&self) -> Rgb {
        self.config.edge_color.scaled(self.boost.color_gain())
    }

    /// Project every node into a `width` x `height` pixel canvas.
    pub fn project(&self, width: f32, height: f32) -> Vec<Projected> {
        let vp = self.camera.view_projection(width / height);
        let focal = 0.5 * height / (0.5 * self.camera.fov_y).tan();
        self.field
            .particles()
            .iter()
            .map(|p| {
                let clip = vp * p.position.extend(1.0);
                if clip.w <= 0.0 {
                    return Projected {
                        screen: Vec2::ZERO,
                        depth: 1.0,
                        scale: 0.0,
                        visible: false,
                    };
                }
                let ndc = clip.xyz() / clip.w;
                Projected {
                    screen: Vec2::new((ndc.x + 1.0) * 0.5 * width, (1.0 - ndc.y) * 0.5 * height),
                    depth: ndc.z,
                    scale: focal / clip.w,
                    visible: (0.0..=1.0).contains(&ndc.z),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> NodeGraph {
        NodeGraph::new(GraphConfig::default(), 11)
    }

    #[test]
    fn seeds_inside_cube() {
        let g = graph();
        assert_eq!(g.field().particles().len(), 60);
        let cube = Bounds::cube(40.0);
        assert!(g.field().particles().iter().all(|p| cube.contains(p.position)));
    }

    #[test]
    fn edges_are_rebuilt_not_accumulated() {
        let mut g = graph();
        for p in g.field_mut().particles_mut() {
            p.position = Vec3::ZERO;
            p.velocity = Vec3::ZERO;
        }
        g.step();
        let n = 60;
        assert_eq!(g.edges().len(), n * (n - 1) / 2);
        g.step();
        assert_eq!(g.edges().len(), n * (n - 1) / 2);

        for (i, p) in g.field_mut().particles_mut().iter_mut().enumerate() {
            p.position = Vec3::new(i as f32 * 100.0, 0.0, 0.0);
        }
        g.step();
        assert!(g.edges().is_empty());
    }

    #[test]
    fn camera_eases_toward_target() {
        let mut g = graph();
        g.set_pointer_offset(Vec2::new(1.0, 0.0));
        g.step();
        assert!((g.camera().position.x - 20.0 * 0.05).abs() < 1e-5);
        for _ in 0..500 {
            g.step();
        }
        assert!((g.camera().position.x - 20.0).abs() < 1e-3);
        g.clear_pointer_offset();
        g.step();
        assert!(g.camera().position.x < 20.0);
    }

    #[test]
    fn boost_round_trips_speed() {
        let mut g = graph();
        let before: Vec<Vec3> = g.field().particles().iter().map(|p| p.velocity).collect();
        g.engage_boost();
        g.engage_boost();
        assert!(g.boost().is_engaged());
        for (p, v) in g.field().particles().iter().zip(&before) {
            assert!((p.velocity - *v * 3.0).length() < 1e-5);
        }
        assert_eq!(g.node_color(), GraphConfig::default().node_color.scaled(1.5));
        g.release_boost();
        g.release_boost();
        for (p, v) in g.field().particles().iter().zip(&before) {
            assert!((p.velocity - *v).length() < 1e-5);
        }
        assert_eq!(g.node_color(), GraphConfig::default().node_color);
    }

    #[test]
    fn origin_projects_to_canvas_center() {
        let mut g = graph();
        g.field_mut().particles_mut()[0].position = Vec3::ZERO;
        let projected = g.project(800.0, 600.0);
        assert!(projected[0].visible);
        assert!((projected[0].screen - Vec2::new(400.0, 300.0)).length() < 1e-3);
        let expected = 300.0 / (0.5 * 75f32.to_radians()).tan() / 80.0;
        assert!((projected[0].scale - expected).abs() < 1e-3);
    }

    #[test]
    fn spin_is_cosmetic() {
        let mut g = graph();
        let before: Vec<Vec3> = g.field().particles().iter().map(|p| p.velocity).collect();
        g.step();
        assert!(g.spins().iter().all(|s| *s > 0.0));
        let after: Vec<Vec3> = g.field().particles().iter().map(|p| p.velocity).collect();
        let bounced = before.iter().zip(&after).all(|(b, a)| {
            (0..3).all(|i| a[i] == b[i] || a[i] == -b[i])
        });
        assert!(bounced);
    }
}
