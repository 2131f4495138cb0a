use glam::{Vec2, Vec3};
use qpgen_web::config::FieldConfig;
use qpgen_web::field::{linear_falloff, repulsion, Bounds, ParticleField};

fn field_with(positions: &[Vec2], velocities: &[Vec2]) -> ParticleField<Vec2> {
    let config = FieldConfig {
        count: positions.len(),
        connection_distance: 150.0,
        pointer_radius: 200.0,
        ..FieldConfig::default()
    };
    let mut field = ParticleField::new(config, 3);
    field.resize(Bounds::viewport(800.0, 600.0));
    for ((p, &at), &v) in field.particles_mut().iter_mut().zip(positions).zip(velocities) {
        p.position = at;
        p.velocity = v;
    }
    field
}

#[test]
fn crossing_a_bound_inverts_only_that_axis() {
    let mut field = field_with(
        &[Vec2::new(799.0, 300.0), Vec2::new(100.0, 1.0)],
        &[Vec2::new(2.5, 0.5), Vec2::new(-0.25, -3.0)],
    );
    field.step();
    let ps = field.particles();
    assert_eq!(ps[0].velocity, Vec2::new(-2.5, 0.5));
    assert_eq!(ps[1].velocity, Vec2::new(-0.25, 3.0));
    // Position is not clamped.
    assert_eq!(ps[0].position.x, 801.5);
    assert_eq!(ps[1].position.y, -2.0);
}

#[test]
fn bounce_generalizes_to_three_axes() {
    let config = FieldConfig {
        count: 1,
        ..FieldConfig::default()
    };
    let mut field = ParticleField::<Vec3>::new(config, 5);
    field.resize(Bounds::cube(10.0));
    let p = &mut field.particles_mut()[0];
    p.position = Vec3::new(9.5, -9.5, 0.0);
    p.velocity = Vec3::new(1.0, -1.0, 0.25);
    field.step();
    assert_eq!(field.particles()[0].velocity, Vec3::new(-1.0, 1.0, 0.25));
}

#[test]
fn connection_example_from_two_particles() {
    let mut field = field_with(&[Vec2::ZERO, Vec2::new(100.0, 0.0)], &[Vec2::ZERO; 2]);
    let links: Vec<_> = field.connections().collect();
    assert_eq!(links.len(), 1);
    assert_eq!((links[0].a, links[0].b), (0, 1));
    assert!((links[0].strength - (1.0 - 100.0 / 150.0)).abs() < 1e-6);

    field.particles_mut()[1].position = Vec2::new(200.0, 0.0);
    assert_eq!(field.connections().count(), 0);
}

#[test]
fn link_strength_falls_monotonically() {
    let mut last = f32::INFINITY;
    for d in (0..150).step_by(5) {
        let s = linear_falloff(d as f32, 150.0).unwrap();
        assert!(s < last && s > 0.0);
        last = s;
    }
    assert_eq!(linear_falloff(0.0, 150.0), Some(1.0));
    assert_eq!(linear_falloff(150.0, 150.0), None);
}

#[test]
fn repulsion_example_and_falloff() {
    let push = repulsion(Vec2::new(400.0, 300.0), Vec2::new(450.0, 300.0), 200.0).unwrap();
    assert!((push - Vec2::new(0.75, 0.0)).length() < 1e-6);

    let mut last = f32::INFINITY;
    for d in [1.0, 50.0, 100.0, 150.0, 199.0] {
        let m = repulsion(Vec2::ZERO, Vec2::new(d, 0.0), 200.0).unwrap().length();
        assert!(m < last);
        last = m;
    }
    assert!(repulsion(Vec2::ZERO, Vec2::new(200.0, 0.0), 200.0).is_none());
    assert!(repulsion(Vec2::ZERO, Vec2::new(0.0, 250.0), 200.0).is_none());
}

#[test]
fn resize_replaces_population_with_same_count() {
    let mut field = ParticleField::<Vec2>::new(FieldConfig::default(), 9);
    field.resize(Bounds::viewport(800.0, 600.0));
    let before: Vec<Vec2> = field.particles().iter().map(|p| p.position).collect();

    let small = Bounds::viewport(320.0, 240.0);
    field.resize(small);
    assert_eq!(field.particles().len(), before.len());
    assert!(field.particles().iter().all(|p| small.contains(p.position)));
    let after: Vec<Vec2> = field.particles().iter().map(|p| p.position).collect();
    assert_ne!(before, after);
}

#[test]
fn same_seed_same_population() {
    let mut a = ParticleField::<Vec2>::new(FieldConfig::default(), 42);
    let mut b = ParticleField::<Vec2>::new(FieldConfig::default(), 42);
    a.resize(Bounds::viewport(640.0, 480.0));
    b.resize(Bounds::viewport(640.0, 480.0));
    assert_eq!(a.particles(), b.particles());
}
