//! VGA Ball - bouncing ball driven through a display peripheral
//!
//! Core modules:
//! - `sim`: Motion integrator (sub-pixel accumulation, wall bounces)
//! - `device`: Command protocol, device channels and the adapter over them
//! - `animation`: Frame loop driver tying the two together
//! - `settings`: Command-line configuration

pub mod animation;
pub mod device;
pub mod error;
pub mod settings;
pub mod sim;

pub use animation::{Animation, FailurePolicy, FixedDelay, NoDelay, Pacer, RunSummary};
pub use device::{Adapter, DeviceChannel, Flavor, MemoryChannel};
pub use error::{ChannelError, Error, ProtocolError};
pub use settings::{Settings, SettingsError};
pub use sim::{Bounds, Circle, Color, Direction, Integrator, Motion};

/// Display and loop constants
pub mod consts {
    /// Full display resolution
    pub const SCREEN_WIDTH: i16 = 640;
    pub const SCREEN_HEIGHT: i16 = 480;

    /// Quartered coordinate space used by the position-only hardware
    pub const H_SIZE: i16 = SCREEN_WIDTH / 4;
    pub const V_SIZE: i16 = SCREEN_HEIGHT / 4;

    /// Frames per run when not overridden
    pub const DEFAULT_FRAMES: u32 = 100;
    /// ~25 FPS
    pub const FRAME_DELAY_MS: u64 = 40;

    pub const DEVICE_PATH: &str = "/dev/vga_ball";
}
