//! Command protocol of the vga_ball peripheral
//!
//! Every command is an opcode plus one fixed-size record. There is no
//! framing and no length prefix: the opcode alone implies the size. Records
//! are plain `#[repr(C)]` structs in native byte order, exactly what the
//! driver copies in and out of user memory.

use std::fmt;
use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::sim::{Bounds, Circle, Color};

/// ioctl "type" byte shared by every vga_ball command
pub const VGA_BALL_MAGIC: u8 = b'q';

// Linux asm-generic ioctl encoding
const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;
const IOC_SIZEMASK: usize = (1 << 14) - 1;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

/// Equivalent of the kernel's `_IOC(dir, type, nr, size)`
pub const fn ioc(dir: u32, ty: u8, nr: u8, size: usize) -> u32 {
    (dir << IOC_DIRSHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
        | (((size & IOC_SIZEMASK) as u32) << IOC_SIZESHIFT)
}

/// Commands understood by the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Write ball and/or background color
    WriteColors,
    /// Read background color and position
    ReadColors,
    /// Write position only (quartered coordinate hardware)
    SetPosition,
    /// Write position and radius
    SetCircle,
    /// Read background color and position (position-only hardware)
    ReadPosition,
}

impl Opcode {
    pub const ALL: [Opcode; 5] = [
        Opcode::WriteColors,
        Opcode::ReadColors,
        Opcode::SetPosition,
        Opcode::SetCircle,
        Opcode::ReadPosition,
    ];

    /// Driver-side name, used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::WriteColors => "VGA_BALL_WRITE_COLORS",
            Opcode::ReadColors => "VGA_BALL_READ_COLORS",
            Opcode::SetPosition => "VGA_BALL_SET_POSITION",
            Opcode::SetCircle => "VGA_BALL_SET_CIRCLE",
            Opcode::ReadPosition => "VGA_BALL_READ_POSITION",
        }
    }

    /// Command number within the magic
    pub fn number(&self) -> u8 {
        match self {
            Opcode::WriteColors => 1,
            Opcode::ReadColors => 2,
            Opcode::SetPosition => 3,
            Opcode::SetCircle => 4,
            Opcode::ReadPosition => 5,
        }
    }

    /// True for commands that carry data to the device
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Opcode::WriteColors | Opcode::SetPosition | Opcode::SetCircle
        )
    }

    /// Exact record size this opcode moves
    pub fn payload_len(&self) -> usize {
        match self {
            Opcode::WriteColors => size_of::<ColorArgs>(),
            Opcode::SetPosition => size_of::<PositionArgs>(),
            Opcode::SetCircle => size_of::<CircleArgs>(),
            Opcode::ReadColors | Opcode::ReadPosition => size_of::<StateArgs>(),
        }
    }

    /// Full ioctl request code
    ///
    /// The driver header declares every argument as a pointer type, so the
    /// size field holds the pointer width rather than the record size.
    pub fn request(&self) -> u32 {
        let dir = if self.is_write() { IOC_WRITE } else { IOC_READ };
        ioc(dir, VGA_BALL_MAGIC, self.number(), size_of::<*const u8>())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which command set a peripheral build speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Flavor {
    /// 640x480, position and radius via SET_CIRCLE
    #[default]
    Circle,
    /// 160x120, bare coordinates via SET_POSITION
    PositionOnly,
}

impl Flavor {
    pub fn bounds(&self) -> Bounds {
        match self {
            Flavor::Circle => Bounds::FULL,
            Flavor::PositionOnly => Bounds::QUARTER,
        }
    }

    /// Opcode used to push a new ball position
    pub fn update_opcode(&self) -> Opcode {
        match self {
            Flavor::Circle => Opcode::SetCircle,
            Flavor::PositionOnly => Opcode::SetPosition,
        }
    }

    /// Opcode used to read device state back
    pub fn read_opcode(&self) -> Opcode {
        match self {
            Flavor::Circle => Opcode::ReadColors,
            Flavor::PositionOnly => Opcode::ReadPosition,
        }
    }
}

/// Bits of [`ColorArgs::mask`]
pub mod color_mask {
    pub const BALL: u8 = 1 << 0;
    pub const BACKGROUND: u8 = 1 << 1;
}

/// SET_CIRCLE record
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct CircleArgs {
    pub x: i16,
    pub y: i16,
    pub radius: u8,
    _pad: u8,
}

/// WRITE_COLORS record; the driver only latches colors whose mask bit is set
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ColorArgs {
    pub ball: Color,
    pub background: Color,
    pub mask: u8,
}

/// SET_POSITION record
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct PositionArgs {
    pub x: i16,
    pub y: i16,
}

/// READ_COLORS / READ_POSITION record
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct StateArgs {
    pub background: Color,
    _pad: u8,
    pub x: i16,
    pub y: i16,
}

/// Decoded read-back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub background: Color,
    pub position: (i16, i16),
}

pub fn encode_circle_update(circle: &Circle) -> CircleArgs {
    CircleArgs {
        x: circle.x,
        y: circle.y,
        radius: circle.radius,
        _pad: 0,
    }
}

/// Pack whichever colors are given; the rest keep their device value
pub fn encode_color_update(ball: Option<Color>, background: Option<Color>) -> ColorArgs {
    let mut mask = 0;
    if ball.is_some() {
        mask |= color_mask::BALL;
    }
    if background.is_some() {
        mask |= color_mask::BACKGROUND;
    }
    ColorArgs {
        ball: ball.unwrap_or_default(),
        background: background.unwrap_or_default(),
        mask,
    }
}

pub fn encode_position_update(x: i16, y: i16) -> PositionArgs {
    PositionArgs { x, y }
}

pub fn encode_state_response(state: &DeviceState) -> StateArgs {
    StateArgs {
        background: state.background,
        _pad: 0,
        x: state.position.0,
        y: state.position.1,
    }
}

pub fn decode_state_response(raw: &[u8]) -> Result<DeviceState, ProtocolError> {
    let args: StateArgs = decode_record(raw)?;
    Ok(DeviceState {
        background: args.background,
        position: (args.x, args.y),
    })
}

/// Read one fixed-size record from the front of `raw`
///
/// Short input is an error; trailing bytes are ignored.
pub fn decode_record<T: Pod>(raw: &[u8]) -> Result<T, ProtocolError> {
    let expected = size_of::<T>();
    if raw.len() < expected {
        return Err(ProtocolError::Truncated {
            expected,
            actual: raw.len(),
        });
    }
    Ok(bytemuck::pod_read_unaligned(&raw[..expected]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(size_of::<CircleArgs>(), 6);
        assert_eq!(size_of::<ColorArgs>(), 7);
        assert_eq!(size_of::<PositionArgs>(), 4);
        assert_eq!(size_of::<StateArgs>(), 8);
    }

    #[test]
    fn test_circle_wire_layout() {
        let args = encode_circle_update(&Circle::new(0x0102, -2, 16));
        let bytes = bytemuck::bytes_of(&args);
        let x = i16::from_ne_bytes([bytes[0], bytes[1]]);
        let y = i16::from_ne_bytes([bytes[2], bytes[3]]);
        assert_eq!((x, y, bytes[4], bytes[5]), (0x0102, -2, 16, 0));
    }

    #[test]
    fn test_color_update_mask() {
        let both = encode_color_update(Some(Color::BLUE), Some(Color::WHITE));
        assert_eq!(both.mask, color_mask::BALL | color_mask::BACKGROUND);
        assert_eq!(
            bytemuck::bytes_of(&both),
            &[0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0b11]
        );

        let bg_only = encode_color_update(None, Some(Color::new(1, 2, 3)));
        assert_eq!(bg_only.mask, color_mask::BACKGROUND);
        assert_eq!(bg_only.background, Color::new(1, 2, 3));

        assert_eq!(encode_color_update(None, None).mask, 0);
    }

    #[test]
    fn test_state_response_round_trip() {
        let state = DeviceState {
            background: Color::new(0x12, 0x34, 0x56),
            position: (-300, 32_000),
        };
        let args = encode_state_response(&state);
        let decoded = decode_state_response(bytemuck::bytes_of(&args)).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_state_response_truncated() {
        let args = encode_state_response(&DeviceState {
            background: Color::WHITE,
            position: (1, 2),
        });
        let bytes = bytemuck::bytes_of(&args);
        for len in 0..bytes.len() {
            assert_eq!(
                decode_state_response(&bytes[..len]),
                Err(ProtocolError::Truncated {
                    expected: 8,
                    actual: len
                })
            );
        }
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut raw = bytemuck::bytes_of(&encode_position_update(5, 6)).to_vec();
        raw.extend_from_slice(&[0xaa; 3]);
        let args: PositionArgs = decode_record(&raw).unwrap();
        assert_eq!(args, encode_position_update(5, 6));
    }

    #[test]
    fn test_ioctl_request_codes() {
        let ptr = size_of::<*const u8>() as u32;
        // _IOW('q', 1, ptr)
        assert_eq!(
            Opcode::WriteColors.request(),
            (1 << 30) | (ptr << 16) | (0x71 << 8) | 1
        );
        // _IOR('q', 2, ptr)
        assert_eq!(
            Opcode::ReadColors.request(),
            (2 << 30) | (ptr << 16) | (0x71 << 8) | 2
        );
        let mut codes: Vec<u32> = Opcode::ALL.iter().map(Opcode::request).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), Opcode::ALL.len());
    }

    #[test]
    fn test_flavor_selects_opcodes() {
        assert_eq!(Flavor::Circle.update_opcode(), Opcode::SetCircle);
        assert_eq!(Flavor::PositionOnly.update_opcode(), Opcode::SetPosition);
        assert_eq!(Flavor::PositionOnly.read_opcode(), Opcode::ReadPosition);
        assert_eq!(Flavor::PositionOnly.bounds(), Bounds::QUARTER);
    }
}
