//! Device channel abstraction and the in-memory peripheral
//!
//! The core never touches file descriptors. It talks to a [`DeviceChannel`]:
//! one blocking `send` per write command, one blocking `receive` per read.

use std::collections::HashMap;
use std::io;

use bytemuck::bytes_of;

use super::protocol::{
    CircleArgs, ColorArgs, DeviceState, Opcode, PositionArgs, color_mask, decode_record,
    encode_state_response,
};
use crate::error::{ChannelError, ProtocolError};
use crate::sim::Color;

/// Synchronous, opcode-addressed link to the display peripheral
pub trait DeviceChannel {
    /// Issue a write command with its fixed-size record
    fn send(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), ChannelError>;

    /// Issue a read command and return the raw record
    fn receive(&mut self, opcode: Opcode) -> Result<Vec<u8>, ChannelError>;
}

impl<C: DeviceChannel + ?Sized> DeviceChannel for &mut C {
    fn send(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), ChannelError> {
        (**self).send(opcode, payload)
    }

    fn receive(&mut self, opcode: Opcode) -> Result<Vec<u8>, ChannelError> {
        (**self).receive(opcode)
    }
}

impl<C: DeviceChannel + ?Sized> DeviceChannel for Box<C> {
    fn send(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), ChannelError> {
        (**self).send(opcode, payload)
    }

    fn receive(&mut self, opcode: Opcode) -> Result<Vec<u8>, ChannelError> {
        (**self).receive(opcode)
    }
}

/// Register file of the simulated peripheral
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub background: Color,
    pub ball: Color,
    pub x: i16,
    pub y: i16,
    pub radius: u8,
}

/// Peripheral that lives in memory
///
/// Applies writes to its registers the way the hardware driver would,
/// answers reads from them, and keeps a log of every accepted command.
/// Faults can be injected per opcode.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    registers: Registers,
    sent: Vec<(Opcode, Vec<u8>)>,
    /// Remaining injected failures per opcode
    faults: HashMap<Opcode, usize>,
    /// Cut read responses to this many bytes
    truncate_reads: Option<usize>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Every accepted write, oldest first
    pub fn sent(&self) -> &[(Opcode, Vec<u8>)] {
        &self.sent
    }

    /// Make the next `count` uses of `opcode` fail with an I/O error
    pub fn fail_next(&mut self, opcode: Opcode, count: usize) {
        self.faults.insert(opcode, count);
    }

    /// Return at most `len` bytes from every read
    pub fn truncate_reads(&mut self, len: Option<usize>) {
        self.truncate_reads = len;
    }

    fn check(&mut self, opcode: Opcode, write: bool) -> Result<(), ChannelError> {
        if opcode.is_write() != write {
            return Err(ChannelError::new(
                opcode,
                io::Error::new(io::ErrorKind::InvalidInput, "wrong direction for opcode"),
            ));
        }
        if let Some(remaining) = self.faults.get_mut(&opcode) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ChannelError::new(
                    opcode,
                    io::Error::other("injected fault"),
                ));
            }
        }
        Ok(())
    }

    fn apply(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), ChannelError> {
        let invalid = |e: ProtocolError| {
            ChannelError::new(opcode, io::Error::new(io::ErrorKind::InvalidData, e))
        };
        let regs = &mut self.registers;
        match opcode {
            Opcode::SetCircle => {
                let args: CircleArgs = decode_record(payload).map_err(invalid)?;
                regs.x = args.x;
                regs.y = args.y;
                regs.radius = args.radius;
            }
            Opcode::SetPosition => {
                let args: PositionArgs = decode_record(payload).map_err(invalid)?;
                regs.x = args.x;
                regs.y = args.y;
            }
            Opcode::WriteColors => {
                let args: ColorArgs = decode_record(payload).map_err(invalid)?;
                if args.mask & color_mask::BALL != 0 {
                    regs.ball = args.ball;
                }
                if args.mask & color_mask::BACKGROUND != 0 {
                    regs.background = args.background;
                }
            }
            Opcode::ReadColors | Opcode::ReadPosition => {
                return Err(ChannelError::new(
                    opcode,
                    io::Error::new(io::ErrorKind::InvalidInput, "read opcode has no payload"),
                ));
            }
        }
        Ok(())
    }
}

impl DeviceChannel for MemoryChannel {
    fn send(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), ChannelError> {
        self.check(opcode, true)?;
        self.apply(opcode, payload)?;
        self.sent.push((opcode, payload.to_vec()));
        Ok(())
    }

    fn receive(&mut self, opcode: Opcode) -> Result<Vec<u8>, ChannelError> {
        self.check(opcode, false)?;
        let state = DeviceState {
            background: self.registers.background,
            position: (self.registers.x, self.registers.y),
        };
        let mut raw = bytes_of(&encode_state_response(&state)).to_vec();
        if let Some(len) = self.truncate_reads {
            raw.truncate(len);
        }
        Ok(raw)
    }
}
