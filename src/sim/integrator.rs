//! Per-frame motion integrator
//!
//! Velocity is continuous but the hardware only takes whole pixels, so each
//! frame adds the velocity to a fractional accumulator, moves by the integer
//! part (truncated toward zero) and keeps the remainder for the next frame.
//! Non-integer speeds therefore average out to the right long-run distance.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{away_from, axis_collision, clamp_axis};
use super::fast_math::approx_inv_sqrt;
use super::state::{Bounds, Circle, Direction, Motion};

/// Owns the ball between frames
///
/// There is no "uninitialized" integrator: the only constructors either run
/// [`Integrator::initialize`] or restore a previously initialized snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integrator {
    circle: Circle,
    motion: Motion,
    bounds: Bounds,
}

impl Integrator {
    /// Place the ball and normalize its launch velocity to `dir.speed`
    pub fn initialize(bounds: Bounds, circle: Circle, dir: Direction) -> Self {
        let mut integrator = Self {
            circle,
            motion: Motion::at_rest(dir.speed),
            bounds,
        };
        integrator.reinitialize(circle, dir);
        integrator
    }

    /// Restore a ball mid-flight (e.g. from a serialized snapshot)
    pub fn from_parts(bounds: Bounds, circle: Circle, motion: Motion) -> Self {
        Self {
            circle,
            motion,
            bounds,
        }
    }

    /// Reset position and velocity, keeping the bounds
    pub fn reinitialize(&mut self, circle: Circle, dir: Direction) {
        let mut vel = Vec2::new(dir.vx, dir.vy);

        let (x, hit_x) = clamp_axis(circle.x, circle.radius, self.bounds.width);
        if let Some(hit) = hit_x {
            vel.x = away_from(hit, vel.x);
        }
        let (y, hit_y) = clamp_axis(circle.y, circle.radius, self.bounds.height);
        if let Some(hit) = hit_y {
            vel.y = away_from(hit, vel.y);
        }
        if hit_x.is_some() || hit_y.is_some() {
            log::debug!(
                "Start ({}, {}) clamped to ({}, {})",
                circle.x,
                circle.y,
                x,
                y
            );
        }

        // A zero vector stays zero: the huge estimate is multiplied by 0
        let scale = approx_inv_sqrt(vel.length_squared()) * dir.speed;

        self.circle = Circle::new(x, y, circle.radius);
        self.motion = Motion {
            vel: vel * scale,
            frac: Vec2::ZERO,
            speed: dir.speed,
            dx: 0,
            dy: 0,
        };
    }

    /// Advance one frame and return the position to send to the device
    ///
    /// The wall test looks at where this frame's step lands, but only the
    /// velocity is reflected: the step itself is still applied. A bouncing
    /// frame can therefore leave the ball up to one step past the wall, and
    /// the following frames bring it back. Recorded trajectories depend on
    /// that overshoot.
    pub fn advance_frame(&mut self) -> Circle {
        let m = &mut self.motion;
        let c = &mut self.circle;

        m.frac += m.vel;
        m.dx = m.frac.x as i16;
        m.dy = m.frac.y as i16;
        m.frac -= Vec2::new(f32::from(m.dx), f32::from(m.dy));

        if let Some(hit) = axis_collision(c.x, m.dx, c.radius, self.bounds.width) {
            log::trace!("Bounce {:?} on x at {}", hit, c.x);
            m.vel.x = away_from(hit, m.vel.x);
        }
        if let Some(hit) = axis_collision(c.y, m.dy, c.radius, self.bounds.height) {
            log::trace!("Bounce {:?} on y at {}", hit, c.y);
            m.vel.y = away_from(hit, m.vel.y);
        }

        c.x = c.x.saturating_add(m.dx);
        c.y = c.y.saturating_add(m.dy);
        *c
    }

    pub fn circle(&self) -> Circle {
        self.circle
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Largest whole-pixel step a ball at `speed` can take in one frame
    fn step_limit(speed: f32) -> i32 {
        (speed * 1.01).ceil() as i32
    }

    fn in_range(pos: i16, radius: u8, extent: i16, slack: i32) -> bool {
        let (pos, r, extent) = (i32::from(pos), i32::from(radius), i32::from(extent));
        pos >= r - slack && pos <= extent - r + slack
    }

    #[test]
    fn test_initialize_normalizes_speed() {
        let ball = Integrator::initialize(
            Bounds::FULL,
            Circle::new(320, 240, 16),
            Direction::new(3.0, 4.0, 5.0),
        );
        let speed = ball.motion().vel.length();
        assert!((speed - 5.0).abs() / 5.0 < 0.01, "speed {}", speed);
        // Direction preserved
        let v = ball.motion().vel;
        assert!((v.x / v.y - 0.75).abs() < 1e-4);
        assert_eq!(ball.motion().frac, Vec2::ZERO);
    }

    #[test]
    fn test_initialize_uses_approximate_inverse_sqrt() {
        let ball = Integrator::initialize(
            Bounds::FULL,
            Circle::new(320, 240, 16),
            Direction::new(1.0, 0.0, 2.0),
        );
        // approx_inv_sqrt(1.0) undershoots slightly
        let vx = ball.motion().vel.x;
        assert!(vx < 2.0 && vx > 1.99, "vx {}", vx);
    }

    #[test]
    fn test_initialize_clamps_and_points_inward() {
        let ball = Integrator::initialize(
            Bounds::FULL,
            Circle::new(2, 475, 16),
            Direction::new(-3.0, 4.0, 1.5),
        );
        assert_eq!(ball.circle(), Circle::new(16, 464, 16));
        assert!(ball.motion().vel.x > 0.0);
        assert!(ball.motion().vel.y < 0.0);
    }

    #[test]
    fn test_initialize_zero_direction_stays_still() {
        let mut ball = Integrator::initialize(
            Bounds::FULL,
            Circle::new(100, 100, 8),
            Direction::new(0.0, 0.0, 3.0),
        );
        assert_eq!(ball.motion().vel, Vec2::ZERO);
        assert_eq!(ball.advance_frame(), Circle::new(100, 100, 8));
    }

    #[test]
    fn test_fractional_steps_accumulate() {
        let mut ball = Integrator::from_parts(
            Bounds::FULL,
            Circle::new(100, 100, 8),
            Motion {
                vel: Vec2::new(0.25, -0.5),
                ..Motion::at_rest(1.0)
            },
        );
        let mut moved = Vec::new();
        for _ in 0..4 {
            ball.advance_frame();
            moved.push((ball.motion().dx, ball.motion().dy));
        }
        assert_eq!(moved, vec![(0, 0), (0, -1), (0, 0), (1, -1)]);
        assert_eq!(ball.circle(), Circle::new(101, 98, 8));
    }

    #[test]
    fn test_truncates_toward_zero() {
        let mut ball = Integrator::from_parts(
            Bounds::FULL,
            Circle::new(300, 300, 8),
            Motion {
                vel: Vec2::new(-1.75, 1.75),
                ..Motion::at_rest(2.0)
            },
        );
        ball.advance_frame();
        assert_eq!((ball.motion().dx, ball.motion().dy), (-1, 1));
        assert_eq!(ball.motion().frac, Vec2::new(-0.75, 0.75));
    }

    #[test]
    fn test_collision_overshoots_one_frame() {
        // One pixel short of the right limit, moving two per frame
        let limit = Bounds::FULL.width - 16;
        let mut ball = Integrator::from_parts(
            Bounds::FULL,
            Circle::new(limit - 1, 240, 16),
            Motion {
                vel: Vec2::new(2.0, 0.0),
                ..Motion::at_rest(2.0)
            },
        );

        let c = ball.advance_frame();
        assert_eq!(ball.motion().dx, 2);
        assert_eq!(ball.motion().vel.x, -2.0);
        // Known quirk: the bounce frame still applies its step
        assert_eq!(c.x, limit + 1);

        let c = ball.advance_frame();
        assert_eq!(ball.motion().dx, -2);
        assert_eq!(ball.motion().vel.x, -2.0);
        assert_eq!(c.x, limit - 1);
    }

    #[test]
    fn test_overshoot_does_not_pin_ball_to_wall() {
        // After the bounce the next step truncates to zero; the ball must
        // still come back instead of re-triggering the wall every frame.
        let limit = Bounds::FULL.width - 16;
        let mut ball = Integrator::from_parts(
            Bounds::FULL,
            Circle::new(limit, 240, 16),
            Motion {
                vel: Vec2::new(0.9, 0.0),
                frac: Vec2::new(0.3, 0.0),
                ..Motion::at_rest(0.9)
            },
        );
        ball.advance_frame();
        assert_eq!(ball.circle().x, limit + 1);
        for _ in 0..5 {
            ball.advance_frame();
        }
        assert!(ball.circle().x < limit);
        assert!(ball.motion().vel.x < 0.0);
    }

    #[test]
    fn test_bounce_off_low_wall() {
        let mut ball = Integrator::from_parts(
            Bounds::QUARTER,
            Circle::new(10, 9, 8),
            Motion {
                vel: Vec2::new(0.0, -3.0),
                ..Motion::at_rest(3.0)
            },
        );
        let c = ball.advance_frame();
        assert_eq!(c.y, 6);
        assert_eq!(ball.motion().vel.y, 3.0);
    }

    #[test]
    fn test_end_to_end_default_launch() {
        let mut ball = Integrator::initialize(
            Bounds::FULL,
            Circle::new(320, 240, 16),
            Direction::new(3.0, 4.0, 1.5),
        );
        let speed = ball.motion().vel.length();
        assert!((speed - 1.5).abs() / 1.5 < 0.01, "speed {}", speed);

        let slack = step_limit(1.5);
        let (mut min_x, mut max_x) = (i16::MAX, i16::MIN);
        for _ in 0..5_000 {
            let c = ball.advance_frame();
            assert!(in_range(c.x, 16, 640, slack), "x {}", c.x);
            assert!(in_range(c.y, 16, 480, slack), "y {}", c.y);
            min_x = min_x.min(c.x);
            max_x = max_x.max(c.x);
        }
        // Crossed the screen both ways
        assert!(min_x <= 16 && max_x >= 624);
    }

    #[test]
    fn test_snapshot_resumes_identically() {
        let mut a = Integrator::initialize(
            Bounds::FULL,
            Circle::new(50, 400, 12),
            Direction::new(-1.0, 2.5, 3.3),
        );
        for _ in 0..37 {
            a.advance_frame();
        }
        let json = serde_json::to_string(&a).unwrap();
        let mut b: Integrator = serde_json::from_str(&json).unwrap();
        for _ in 0..200 {
            assert_eq!(a.advance_frame(), b.advance_frame());
        }
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_every_frame(
            x in -50i16..700,
            y in -50i16..530,
            radius in 1u8..=60,
            vx in -10.0f32..10.0,
            vy in -10.0f32..10.0,
            speed in 0.05f32..8.0,
        ) {
            prop_assume!(vx.abs() + vy.abs() > 0.01);
            let bounds = Bounds::FULL;
            let mut ball = Integrator::initialize(
                bounds,
                Circle::new(x, y, radius),
                Direction::new(vx, vy, speed),
            );
            let c = ball.circle();
            prop_assert!(in_range(c.x, radius, bounds.width, 0));
            prop_assert!(in_range(c.y, radius, bounds.height, 0));

            let slack = step_limit(speed);
            for _ in 0..400 {
                let c = ball.advance_frame();
                let m = *ball.motion();
                prop_assert!(m.frac.x > -1.0 && m.frac.x < 1.0);
                prop_assert!(m.frac.y > -1.0 && m.frac.y < 1.0);
                prop_assert!(in_range(c.x, radius, bounds.width, slack));
                prop_assert!(in_range(c.y, radius, bounds.height, slack));
                prop_assert_eq!(c.radius, radius);
                // Past a wall, the ball is always heading back in
                if i32::from(c.x) > i32::from(bounds.width) - i32::from(radius) {
                    prop_assert!(m.vel.x <= 0.0);
                }
                if i32::from(c.x) < i32::from(radius) {
                    prop_assert!(m.vel.x >= 0.0);
                }
            }
        }
    }
}
