//! Ball state and screen geometry
//!
//! Everything the integrator carries from one frame to the next lives here,
//! and all of it is serializable so a loop can resume from a snapshot.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Discretized ball position and size, as the hardware sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub x: i16,
    pub y: i16,
    pub radius: u8,
}

impl Circle {
    pub const fn new(x: i16, y: i16, radius: u8) -> Self {
        Self { x, y, radius }
    }
}

/// One RGB color record
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub const BLUE: Color = Color::new(0x00, 0x00, 0xff);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Uniformly random color
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::new(rng.random(), rng.random(), rng.random())
    }
}

/// Printed as `rr gg bb`
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x} {:02x} {:02x}", self.red, self.green, self.blue)
    }
}

/// Raw launch parameters, before normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    pub vx: f32,
    pub vy: f32,
    /// Target speed in pixels per frame (> 0, checked by the caller)
    pub speed: f32,
}

impl Direction {
    pub const fn new(vx: f32, vy: f32, speed: f32) -> Self {
        Self { vx, vy, speed }
    }
}

/// Velocity plus the sub-pixel remainder carried across frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Continuous per-frame velocity
    pub vel: Vec2,
    /// Fractional accumulator, always in (-1, 1) between frames
    pub frac: Vec2,
    pub speed: f32,
    /// Whole pixels applied on the last frame
    pub dx: i16,
    pub dy: i16,
}

impl Motion {
    pub fn at_rest(speed: f32) -> Self {
        Self {
            vel: Vec2::ZERO,
            frac: Vec2::ZERO,
            speed,
            dx: 0,
            dy: 0,
        }
    }
}

/// Legal drawing area; the ball center stays within `radius` of each edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: i16,
    pub height: i16,
}

impl Bounds {
    /// 640x480 display
    pub const FULL: Bounds = Bounds {
        width: SCREEN_WIDTH,
        height: SCREEN_HEIGHT,
    };

    /// 160x120 coordinate space of the position-only hardware
    pub const QUARTER: Bounds = Bounds {
        width: H_SIZE,
        height: V_SIZE,
    };

    /// Whether a ball of this radius fits at all
    pub fn fits(&self, radius: u8) -> bool {
        let r = i16::from(radius);
        2 * r <= self.width && 2 * r <= self.height
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::FULL
    }
}
