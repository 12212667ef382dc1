//! Display peripheral access
//!
//! - `protocol`: opcodes and fixed-layout wire records
//! - `channel`: the [`DeviceChannel`] seam and an in-memory peripheral
//! - `ioctl`: the real device node (Linux)
//! - `adapter`: encodes ball state and issues commands over a channel

pub mod adapter;
pub mod channel;
#[cfg(target_os = "linux")]
pub mod ioctl;
pub mod protocol;

pub use adapter::Adapter;
pub use channel::{DeviceChannel, MemoryChannel, Registers};
#[cfg(target_os = "linux")]
pub use ioctl::IoctlChannel;
pub use protocol::{DeviceState, Flavor, Opcode};
