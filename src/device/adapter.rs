//! Protocol adapter over a device channel
//!
//! Holds no ball state of its own: each call encodes one record, issues one
//! command and returns. Failures go straight back to the caller, no retry.

use bytemuck::bytes_of;

use super::channel::DeviceChannel;
use super::protocol::{
    DeviceState, Flavor, Opcode, decode_state_response, encode_circle_update,
    encode_color_update, encode_position_update,
};
use crate::error::Error;
use crate::sim::{Circle, Color};

pub struct Adapter<C> {
    channel: C,
    flavor: Flavor,
}

impl<C: DeviceChannel> Adapter<C> {
    pub fn new(channel: C, flavor: Flavor) -> Self {
        Self { channel, flavor }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// SET_CIRCLE: position and radius
    pub fn set_circle(&mut self, circle: &Circle) -> Result<(), Error> {
        let args = encode_circle_update(circle);
        self.send(Opcode::SetCircle, bytes_of(&args))
    }

    /// SET_POSITION: bare coordinates
    pub fn set_position(&mut self, x: i16, y: i16) -> Result<(), Error> {
        let args = encode_position_update(x, y);
        self.send(Opcode::SetPosition, bytes_of(&args))
    }

    /// WRITE_COLORS: any subset of ball and background
    pub fn write_colors(
        &mut self,
        ball: Option<Color>,
        background: Option<Color>,
    ) -> Result<(), Error> {
        let args = encode_color_update(ball, background);
        self.send(Opcode::WriteColors, bytes_of(&args))
    }

    /// Push a frame using whichever update command the flavor speaks
    pub fn push(&mut self, circle: &Circle) -> Result<(), Error> {
        match self.flavor {
            Flavor::Circle => self.set_circle(circle),
            Flavor::PositionOnly => self.set_position(circle.x, circle.y),
        }
    }

    /// Read background color and position back from the device
    pub fn read_state(&mut self) -> Result<DeviceState, Error> {
        let opcode = self.flavor.read_opcode();
        let raw = self.channel.receive(opcode)?;
        let state =
            decode_state_response(&raw).map_err(|source| Error::Protocol { opcode, source })?;
        log::debug!("{} -> {:?}", opcode, state);
        Ok(state)
    }

    fn send(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), Error> {
        log::trace!("{} {:02x?}", opcode, payload);
        self.channel.send(opcode, payload)?;
        Ok(())
    }
}
