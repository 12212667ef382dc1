//! Ball motion
//!
//! Pure and single threaded: no device access, no sleeping, no logging
//! above debug level. One integrator owns one ball.

pub mod collision;
pub mod fast_math;
pub mod integrator;
pub mod state;

pub use collision::{WallHit, axis_collision, clamp_axis};
pub use fast_math::approx_inv_sqrt;
pub use integrator::Integrator;
pub use state::{Bounds, Circle, Color, Direction, Motion};
