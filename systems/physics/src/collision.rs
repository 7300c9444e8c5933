//! Pairwise contact detection and response between two circular bodies.

use circlefall_core::{Particle, PhysicsConfig, ResolverMode};

/// Outcome of a single pairwise resolution attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The bodies do not touch; nothing changed.
    Apart,
    /// The centres coincide so no contact normal exists; nothing changed.
    Degenerate,
    /// The bodies were pushed apart (and their velocities corrected in impulse mode).
    Resolved,
}

/// Separates overlapping bodies and corrects their velocities along the contact normal.
///
/// Radius doubles as the mass proxy: the larger body of a pair is treated as
/// heavier and is displaced and deflected less. Every push and velocity
/// correction is clamped per axis rather than by vector magnitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionResolver {
    mode: ResolverMode,
    max_push_distance: f32,
    max_acceleration: f32,
    epsilon: f32,
}

impl CollisionResolver {
    /// Creates a resolver with explicit clamps and degeneracy threshold.
    #[must_use]
    pub const fn new(
        mode: ResolverMode,
        max_push_distance: f32,
        max_acceleration: f32,
        epsilon: f32,
    ) -> Self {
        Self {
            mode,
            max_push_distance,
            max_acceleration,
            epsilon,
        }
    }

    /// Creates a resolver from the physics section of the configuration.
    #[must_use]
    pub const fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(
            config.resolver,
            config.max_push_distance,
            config.max_acceleration,
            config.epsilon,
        )
    }

    /// Fidelity this resolver applies.
    #[must_use]
    pub const fn mode(&self) -> ResolverMode {
        self.mode
    }

    /// Reports whether the two bodies touch or overlap.
    #[must_use]
    pub fn colliding(&self, a: &Particle, b: &Particle) -> bool {
        a.distance_to(b) <= a.radius() + b.radius()
    }

    /// Resolves contact between `a` and `b`, mutating both in place.
    pub fn resolve(&self, a: &mut Particle, b: &mut Particle) -> Resolution {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let distance = dx.hypot(dy);
        let reach = a.radius() + b.radius();

        if distance > reach {
            return Resolution::Apart;
        }
        if distance <= self.epsilon {
            return Resolution::Degenerate;
        }

        let nx = dx / distance;
        let ny = dy / distance;

        let depth = reach - distance;
        let mass_ratio = b.radius() / a.radius();
        let share_a = mass_ratio / (1.0 + mass_ratio);
        let share_b = 1.0 / (1.0 + mass_ratio);

        a.x -= clamp_axis(depth * share_a * nx, self.max_push_distance);
        a.y -= clamp_axis(depth * share_a * ny, self.max_push_distance);
        b.x += clamp_axis(depth * share_b * nx, self.max_push_distance);
        b.y += clamp_axis(depth * share_b * ny, self.max_push_distance);

        if self.mode == ResolverMode::Impulse {
            self.apply_impulse(a, b, nx, ny, reach);
        }

        Resolution::Resolved
    }

    fn apply_impulse(&self, a: &mut Particle, b: &mut Particle, nx: f32, ny: f32, reach: f32) {
        let normal_speed = (a.dx - b.dx) * nx + (a.dy - b.dy) * ny;
        let impulse = 2.0 * normal_speed / reach;
        let mass_ratio = b.radius() / a.radius();
        let towards_a = impulse * mass_ratio;
        let towards_b = impulse / mass_ratio;

        a.dx -= clamp_axis(towards_a * nx, self.max_acceleration);
        a.dy -= clamp_axis(towards_a * ny, self.max_acceleration);
        b.dx += clamp_axis(towards_b * nx, self.max_acceleration);
        b.dy += clamp_axis(towards_b * ny, self.max_acceleration);
    }
}

fn clamp_axis(value: f32, limit: f32) -> f32 {
    value.clamp(-limit, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use circlefall_core::{ParticleColor, ParticleId, ParticleSeed};

    const LOOSE: CollisionResolver =
        CollisionResolver::new(ResolverMode::Impulse, 100.0, 100.0, 1e-4);

    fn particle(id: u64, x: f32, y: f32, radius: f32, dx: f32, dy: f32) -> Particle {
        Particle::from_seed(
            ParticleId::new(id),
            ParticleSeed {
                x,
                y,
                radius,
                dx,
                dy,
                color: ParticleColor::from_rgb(0, 0, 0),
            },
        )
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn coincident_centres_are_left_untouched() {
        let mut a = particle(0, 50.0, 50.0, 10.0, 0.0, 0.5);
        let mut b = particle(1, 50.0, 50.0, 10.0, 0.0, 0.5);
        let (before_a, before_b) = (a.clone(), b.clone());

        assert_eq!(LOOSE.resolve(&mut a, &mut b), Resolution::Degenerate);
        assert_eq!(a, before_a);
        assert_eq!(b, before_b);
    }

    #[test]
    fn separated_bodies_are_left_untouched() {
        let mut a = particle(0, 0.0, 0.0, 10.0, 1.0, 0.0);
        let mut b = particle(1, 30.0, 0.0, 10.0, -1.0, 0.0);

        assert!(!LOOSE.colliding(&a, &b));
        assert_eq!(LOOSE.resolve(&mut a, &mut b), Resolution::Apart);
        assert_eq!(a.x, 0.0);
        assert_eq!(b.dx, -1.0);
    }

    #[test]
    fn touching_bodies_count_as_colliding() {
        let a = particle(0, 0.0, 0.0, 10.0, 0.0, 0.0);
        let b = particle(1, 20.0, 0.0, 10.0, 0.0, 0.0);

        assert!(LOOSE.colliding(&a, &b));
    }

    #[test]
    fn equal_bodies_split_the_overlap_evenly() {
        let mut a = particle(0, 0.0, 0.0, 10.0, 0.0, 0.0);
        let mut b = particle(1, 16.0, 0.0, 10.0, 0.0, 0.0);

        assert_eq!(LOOSE.resolve(&mut a, &mut b), Resolution::Resolved);
        assert_close(a.x, -2.0);
        assert_close(b.x, 18.0);
        assert_close(a.distance_to(&b), 20.0);
    }

    #[test]
    fn larger_body_is_displaced_less() {
        let mut small = particle(0, 0.0, 0.0, 10.0, 0.0, 0.0);
        let mut large = particle(1, 30.0, 0.0, 30.0, 0.0, 0.0);

        let _ = LOOSE.resolve(&mut small, &mut large);

        assert_close(small.x, -7.5);
        assert_close(large.x, 32.5);
    }

    #[test]
    fn push_is_clamped_per_axis() {
        let resolver = CollisionResolver::new(ResolverMode::SeparationOnly, 1.0, 100.0, 1e-4);
        let mut a = particle(0, 0.0, 0.0, 20.0, 0.0, 0.0);
        let mut b = particle(1, 3.0, 4.0, 20.0, 0.0, 0.0);

        let _ = resolver.resolve(&mut a, &mut b);

        assert_close(a.x, -1.0);
        assert_close(a.y, -1.0);
        assert_close(b.x, 4.0);
        assert_close(b.y, 5.0);
    }

    #[test]
    fn head_on_equal_bodies_share_the_impulse() {
        let mut a = particle(0, 0.0, 0.0, 10.0, 2.0, 0.0);
        let mut b = particle(1, 19.0, 0.0, 10.0, 0.0, 0.0);

        let _ = LOOSE.resolve(&mut a, &mut b);

        assert_close(a.dx, 1.8);
        assert_close(b.dx, 0.2);
        assert_close(a.dy, 0.0);
        assert_close(b.dy, 0.0);
    }

    #[test]
    fn velocity_change_scales_with_mass_ratio_and_is_clamped() {
        let resolver = CollisionResolver::new(ResolverMode::Impulse, 100.0, 0.5, 1e-4);
        let mut small = particle(0, 0.0, 0.0, 10.0, 4.0, 0.0);
        let mut large = particle(1, 39.0, 0.0, 30.0, 0.0, 0.0);

        let _ = resolver.resolve(&mut small, &mut large);

        assert_close(small.dx, 3.5);
        assert_close(large.dx, 0.2 / 3.0);
    }

    #[test]
    fn receding_bodies_are_corrected_along_the_normal() {
        let mut a = particle(0, 0.0, 0.0, 10.0, -1.0, 0.0);
        let mut b = particle(1, 19.0, 0.0, 10.0, 1.0, 0.0);

        let _ = LOOSE.resolve(&mut a, &mut b);

        assert_close(a.dx, -0.8);
        assert_close(b.dx, 0.8);
    }

    #[test]
    fn separation_only_mode_never_touches_velocity() {
        let resolver = CollisionResolver::new(ResolverMode::SeparationOnly, 100.0, 100.0, 1e-4);
        let mut a = particle(0, 0.0, 0.0, 10.0, 2.0, 0.5);
        let mut b = particle(1, 15.0, 5.0, 12.0, -1.0, 0.5);

        assert_eq!(resolver.resolve(&mut a, &mut b), Resolution::Resolved);
        assert_eq!((a.dx, a.dy), (2.0, 0.5));
        assert_eq!((b.dx, b.dy), (-1.0, 0.5));
        assert!(a.distance_to(&b) > 15.0_f32.hypot(5.0));
    }

    #[test]
    fn resolution_never_brings_centres_closer() {
        let tight = CollisionResolver::new(ResolverMode::Impulse, 0.75, 0.25, 1e-4);
        for resolver in [LOOSE, tight] {
            for step in 0..72 {
                let angle = (step as f32) * std::f32::consts::TAU / 72.0;
                let pairs = [(8.0, 8.0, 1.0), (8.0, 64.0, 30.0), (40.0, 9.0, 45.0)];
                for (radius_a, radius_b, depth) in pairs {
                    let distance = radius_a + radius_b - depth;
                    let mut a = particle(0, 400.0, 300.0, radius_a, 0.3, -0.2);
                    let mut b = particle(
                        1,
                        400.0 + distance * angle.cos(),
                        300.0 + distance * angle.sin(),
                        radius_b,
                        -0.4,
                        0.5,
                    );
                    let before = a.distance_to(&b);

                    let _ = resolver.resolve(&mut a, &mut b);

                    assert!(
                        a.distance_to(&b) >= before - 1e-3,
                        "distance shrank from {before} to {} at angle {angle}",
                        a.distance_to(&b)
                    );
                }
            }
        }
    }
}
