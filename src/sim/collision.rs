//! Wall collision tests
//!
//! Walls are axis aligned, so each axis is tested on its own. The test runs
//! against the position the ball is *about* to move to; the response only
//! flips velocity, it never moves the ball back.

/// Which side of an axis the ball would cross
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallHit {
    /// Below `radius` (left or top edge)
    Low,
    /// Above `extent - radius` (right or bottom edge)
    High,
}

/// Check one axis: would `pos + step` leave `[radius, extent - radius]`?
#[inline]
pub fn axis_collision(pos: i16, step: i16, radius: u8, extent: i16) -> Option<WallHit> {
    let next = i32::from(pos) + i32::from(step);
    let r = i32::from(radius);
    if next < r {
        Some(WallHit::Low)
    } else if next > i32::from(extent) - r {
        Some(WallHit::High)
    } else {
        None
    }
}

/// Clamp a position into `[radius, extent - radius]`
///
/// Returns the clamped value and the wall it was pushed off, if any.
pub fn clamp_axis(pos: i16, radius: u8, extent: i16) -> (i16, Option<WallHit>) {
    let r = i16::from(radius);
    if pos < r {
        (r, Some(WallHit::Low))
    } else if pos > extent - r {
        (extent - r, Some(WallHit::High))
    } else {
        (pos, None)
    }
}

/// Velocity component pointing away from the wall that was hit
#[inline]
pub fn away_from(hit: WallHit, v: f32) -> f32 {
    match hit {
        WallHit::Low => v.abs(),
        WallHit::High => -v.abs(),
    }
}
