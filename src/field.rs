//! Particle field simulation shared by the 2D canvas and the 3D graph.
//!
//! A field starts empty and is seeded on its first [`ParticleField::resize`].
//! Every later resize discards the population and reseeds it inside the new
//! bounds, so the particle count never changes. Each call to
//! [`ParticleField::step`] advances all particles by one frame; link queries
//! ([`ParticleField::connections`], [`ParticleField::pointer_links`]) read the
//! state the last step left behind and never mutate it.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Sub};

use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::color::Rgb;
use crate::config::{FieldConfig, Repulsion};

/// Vector types the field can simulate in.
pub trait Space:
    Copy
    + Default
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f32, Output = Self>
    + Div<f32, Output = Self>
    + AddAssign
    + MulAssign<f32>
    + Index<usize, Output = f32>
    + IndexMut<usize>
{
    const DIM: usize;

    fn norm(self) -> f32;
}

impl Space for Vec2 {
    const DIM: usize = 2;

    fn norm(self) -> f32 {
        self.length()
    }
}

impl Space for Vec3 {
    const DIM: usize = 3;

    fn norm(self) -> f32 {
        self.length()
    }
}

/// Axis-aligned box particles bounce inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<V> {
    pub min: V,
    pub max: V,
}

impl Bounds<Vec2> {
    /// Canvas pixel space: origin top-left.
    pub fn viewport(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width.max(0.0), height.max(0.0)),
        }
    }
}

impl Bounds<Vec3> {
    pub fn cube(half: f32) -> Self {
        Self {
            min: Vec3::splat(-half),
            max: Vec3::splat(half),
        }
    }
}

impl<V: Space> Bounds<V> {
    pub fn contains(&self, p: V) -> bool {
        (0..V::DIM).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle<V> {
    pub position: V,
    pub velocity: V,
    pub radius: f32,
    pub color: Rgb,
}

/// A pair of particles closer than the connection distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    /// `1 - distance / threshold`, in `(0, 1]`.
    pub strength: f32,
}

/// `1 - distance / radius` for distances inside the radius, `None` otherwise.
///
/// Used both for link opacity and for the pointer force factor
/// (`(radius - distance) / radius` is the same value).
pub fn linear_falloff(distance: f32, radius: f32) -> Option<f32> {
    if radius <= 0.0 || !(distance < radius) {
        return None;
    }
    Some(1.0 - distance.max(0.0) / radius)
}

/// Push on a particle at `position` from a pointer at `pointer`.
///
/// Points from the pointer towards the particle, with magnitude
/// `linear_falloff(distance, radius)`. A particle exactly under the pointer has
/// no defined direction and receives no push.
pub fn repulsion<V: Space>(pointer: V, position: V, radius: f32) -> Option<V> {
    let offset = position - pointer;
    let distance = offset.norm();
    if distance <= f32::EPSILON {
        return None;
    }
    let factor = linear_falloff(distance, radius)?;
    Some(offset / distance * factor)
}

pub struct ParticleField<V> {
    config: FieldConfig,
    bounds: Option<Bounds<V>>,
    particles: Vec<Particle<V>>,
    pointer: Option<V>,
    rng: SmallRng,
}

impl<V: Space> ParticleField<V> {
    pub fn new(config: FieldConfig, seed: u64) -> Self {
        let seed = config.seed.unwrap_or(seed);
        Self {
            config,
            bounds: None,
            particles: Vec::new(),
            pointer: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn bounds(&self) -> Option<Bounds<V>> {
        self.bounds
    }

    pub fn is_running(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn particles(&self) -> &[Particle<V>] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle<V>] {
        &mut self.particles
    }

    pub fn pointer(&self) -> Option<V> {
        self.pointer
    }

    pub fn set_pointer(&mut self, at: V) {
        self.pointer = Some(at);
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    /// Adopt new bounds and replace the whole population inside them.
    pub fn resize(&mut self, bounds: Bounds<V>) {
        self.bounds = Some(bounds);
        let count = self.config.count;
        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            particles.push(self.spawn(&bounds));
        }
        self.particles = particles;
        log::debug!(
            "reseeded {} particles in {:?}..{:?}",
            count,
            bounds.min,
            bounds.max
        );
    }

    fn spawn(&mut self, bounds: &Bounds<V>) -> Particle<V> {
        let mut position = V::default();
        let mut velocity = V::default();
        for axis in 0..V::DIM {
            let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
            position[axis] = if lo < hi { self.rng.gen_range(lo..hi) } else { lo };
            velocity[axis] = (self.rng.gen::<f32>() - 0.5) * self.config.max_speed;
        }
        let [r_lo, r_hi] = self.config.radius_range;
        let radius = if r_lo < r_hi {
            self.rng.gen_range(r_lo..r_hi)
        } else {
            r_lo
        };
        let color = self.config.palette[self.rng.gen_range(0..self.config.palette.len())];
        Particle {
            position,
            velocity,
            radius,
            color,
        }
    }

    /// Advance every particle by one frame.
    pub fn step(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let radius = self.config.pointer_radius;
        let scale = self.config.force_scale;
        let policy = self.config.repulsion;
        let pointer = self.pointer;

        for p in &mut self.particles {
            p.position += p.velocity;

            // Reflect without clamping; a fast particle may sit outside for a frame.
            for axis in 0..V::DIM {
                if p.position[axis] < bounds.min[axis] || p.position[axis] > bounds.max[axis] {
                    p.velocity[axis] = -p.velocity[axis];
                }
            }

            let Some(push) = pointer.and_then(|at| repulsion(at, p.position, radius)) else {
                continue;
            };
            match policy {
                Repulsion::Velocity => p.velocity += push * scale,
                Repulsion::Position => p.position += push * scale,
            }
        }
    }

    /// Multiply every velocity by `factor`.
    pub fn scale_speed(&mut self, factor: f32) {
        for p in &mut self.particles {
            p.velocity *= factor;
        }
    }

    /// Unordered pairs closer than the connection distance. O(n²).
    pub fn connections(&self) -> impl Iterator<Item = Link> + '_ {
        let threshold = self.config.connection_distance;
        let ps = &self.particles;
        (0..ps.len()).flat_map(move |a| {
            (a + 1..ps.len()).filter_map(move |b| {
                let distance = (ps[a].position - ps[b].position).norm();
                linear_falloff(distance, threshold).map(|strength| Link { a, b, strength })
            })
        })
    }

    /// Particles within the pointer radius, with their falloff strength.
    pub fn pointer_links(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        let radius = self.config.pointer_radius;
        let pointer = self.pointer;
        self.particles
            .iter()
            .enumerate()
            .filter_map(move |(i, p)| {
                let at = pointer?;
                linear_falloff((p.position - at).norm(), radius).map(|s| (i, s))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(count: usize) -> ParticleField<Vec2> {
        let config = FieldConfig {
            count,
            ..FieldConfig::default()
        };
        ParticleField::new(config, 7)
    }

    fn place(f: &mut ParticleField<Vec2>, positions: &[Vec2]) {
        for (p, &at) in f.particles_mut().iter_mut().zip(positions) {
            p.position = at;
            p.velocity = Vec2::ZERO;
        }
    }

    #[test]
    fn uninitialized_field_is_inert() {
        let mut f = field(10);
        assert!(!f.is_running());
        f.step();
        assert!(f.particles().is_empty());
        assert_eq!(f.connections().count(), 0);
    }

    #[test]
    fn first_resize_seeds_inside_bounds() {
        let mut f = field(80);
        let bounds = Bounds::viewport(800.0, 600.0);
        f.resize(bounds);
        assert!(f.is_running());
        assert_eq!(f.particles().len(), 80);
        for p in f.particles() {
            assert!(bounds.contains(p.position));
            assert!(p.velocity.x.abs() <= 0.75 && p.velocity.y.abs() <= 0.75);
            assert!((1.0..=3.0).contains(&p.radius));
            assert!(f.config().palette.contains(&p.color));
        }
    }

    #[test]
    fn zero_sized_viewport_degrades() {
        let mut f = field(5);
        f.resize(Bounds::viewport(0.0, 0.0));
        assert!(f.particles().iter().all(|p| p.position == Vec2::ZERO));
        f.step();
    }

    #[test]
    fn falloff_edges() {
        assert_eq!(linear_falloff(0.0, 150.0), Some(1.0));
        assert_eq!(linear_falloff(150.0, 150.0), None);
        assert_eq!(linear_falloff(151.0, 150.0), None);
        assert_eq!(linear_falloff(10.0, 0.0), None);
        assert_eq!(linear_falloff(f32::NAN, 150.0), None);
    }

    #[test]
    fn repulsion_points_away_from_pointer() {
        let push = repulsion(Vec2::new(400.0, 300.0), Vec2::new(450.0, 300.0), 200.0).unwrap();
        assert!((push.x - 0.75).abs() < 1e-6);
        assert_eq!(push.y, 0.0);
        assert!(repulsion(Vec2::ZERO, Vec2::ZERO, 200.0).is_none());
    }

    #[test]
    fn position_policy_displaces_without_touching_velocity() {
        let config = FieldConfig {
            count: 1,
            repulsion: Repulsion::Position,
            force_scale: 10.0,
            ..FieldConfig::default()
        };
        let mut f = ParticleField::new(config, 1);
        f.resize(Bounds::viewport(800.0, 600.0));
        place(&mut f, &[Vec2::new(450.0, 300.0)]);
        f.set_pointer(Vec2::new(400.0, 300.0));
        f.step();
        let p = f.particles()[0];
        assert_eq!(p.velocity, Vec2::ZERO);
        assert!((p.position.x - 457.5).abs() < 1e-4);
    }

    #[test]
    fn velocity_policy_accumulates() {
        let mut f = field(1);
        f.resize(Bounds::viewport(800.0, 600.0));
        place(&mut f, &[Vec2::new(450.0, 300.0)]);
        f.set_pointer(Vec2::new(400.0, 300.0));
        f.step();
        let first = f.particles()[0].velocity.x;
        assert!((first - 0.45).abs() < 1e-6);
        f.step();
        assert!(f.particles()[0].velocity.x > first);
    }

    #[test]
    fn cleared_pointer_applies_no_force() {
        let mut f = field(1);
        f.resize(Bounds::viewport(800.0, 600.0));
        place(&mut f, &[Vec2::new(450.0, 300.0)]);
        f.set_pointer(Vec2::new(400.0, 300.0));
        f.clear_pointer();
        f.step();
        assert_eq!(f.particles()[0].velocity, Vec2::ZERO);
        assert_eq!(f.pointer_links().count(), 0);
    }

    #[test]
    fn pointer_links_use_pointer_radius() {
        let mut f = field(2);
        f.resize(Bounds::viewport(800.0, 600.0));
        place(&mut f, &[Vec2::new(450.0, 300.0), Vec2::new(700.0, 300.0)]);
        f.set_pointer(Vec2::new(400.0, 300.0));
        let links: Vec<_> = f.pointer_links().collect();
        assert_eq!(links, vec![(0, 0.75)]);
    }
}
