//! Vector and angle math for the toroidal simulation.
//!
//! All arithmetic is `f32`, matching the wire format's `f32` fields and the
//! original C implementation's `float` precision, so replayed tick
//! sequences stay reproducible across builds (see `examples/original_source
//! /src/vec2f.h`).

use shared::SPEED_LIMIT;

/// A position, velocity, or displacement in the plane. The y axis points
/// downward (screen convention), so a positive heading rotates
/// counterclockwise in math terms but clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Builds a vector of length `r` pointing in direction `theta`, using
    /// the mathematical angle convention on a y-down plane: `(cos θ · r,
    /// −sin θ · r)`.
    pub fn from_polar(theta: f32, r: f32) -> Self {
        Vec2::new(theta.cos() * r, -theta.sin() * r)
    }

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        Vec2::new(self.x - other.x, self.y - other.y).length()
    }

    /// Pseudo-relativistic velocity addition: applies impulse `v` to
    /// current velocity `self`, softly capping the result near
    /// `SPEED_LIMIT` instead of clamping it. Impulses opposing the current
    /// velocity (negative dot product) pass through unscaled; impulses
    /// along it see diminishing returns as speed grows.
    pub fn velocity_add(self, v: Vec2) -> Vec2 {
        let l_squared = SPEED_LIMIT * SPEED_LIMIT;
        let d = self.dot(v).max(0.0);
        self.add(v).scale(l_squared / (l_squared + d))
    }

    /// Single-step toroidal wrap: valid because per-tick displacement is
    /// far smaller than the level's extent (see DESIGN.md's "single-step
    /// wrap" note).
    pub fn wrap(self, extent: (i32, i32)) -> Vec2 {
        Vec2::new(wrap_component(self.x, extent.0 as f32), wrap_component(self.y, extent.1 as f32))
    }
}

fn wrap_component(v: f32, extent: f32) -> f32 {
    if v < 0.0 {
        v + extent
    } else if v > extent {
        v - extent
    } else {
        v
    }
}

/// Normalizes an angle to `[0, 2π)`.
pub fn normalize_angle(theta: f32) -> f32 {
    let two_pi = std::f32::consts::TAU;
    ((theta % two_pi) + two_pi) % two_pi
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn from_polar_matches_y_down_convention() {
        let v = Vec2::from_polar(0.0, 10.0);
        assert_approx_eq!(v.x, 10.0, 1e-5);
        assert_approx_eq!(v.y, 0.0, 1e-5);

        let v = Vec2::from_polar(std::f32::consts::FRAC_PI_2, 10.0);
        assert_approx_eq!(v.x, 0.0, 1e-4);
        assert_approx_eq!(v.y, -10.0, 1e-4);
    }

    #[test]
    fn normalize_angle_wraps_into_range() {
        assert_approx_eq!(normalize_angle(-std::f32::consts::FRAC_PI_2), 1.5 * std::f32::consts::PI, 1e-5);
        assert_approx_eq!(normalize_angle(3.0 * std::f32::consts::PI), std::f32::consts::PI, 1e-4);
    }

    #[test]
    fn velocity_add_brakes_without_limit() {
        let current = Vec2::new(SPEED_LIMIT * 4.0, 0.0);
        let braking = Vec2::new(-100.0, 0.0);
        let result = current.velocity_add(braking);
        assert_approx_eq!(result.x, current.x - 100.0, 1e-3);
    }

    #[test]
    fn velocity_add_approaches_speed_limit_asymptotically() {
        let mut v = Vec2::ZERO;
        for _ in 0..100_000 {
            v = v.velocity_add(Vec2::new(1.0, 0.0));
        }
        assert!(v.length() < SPEED_LIMIT * 1.001);
        assert!(v.length() > SPEED_LIMIT * 0.9);
    }

    #[test]
    fn wrap_corrects_single_step_overshoot() {
        let wrapped = Vec2::new(-5.0, 605.0).wrap((800, 600));
        assert_approx_eq!(wrapped.x, 795.0, 1e-5);
        assert_approx_eq!(wrapped.y, 5.0, 1e-5);
    }
}
