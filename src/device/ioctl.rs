//! Real device node, driven with ioctl(2)

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;

use super::channel::DeviceChannel;
use super::protocol::Opcode;
use crate::error::ChannelError;

/// Open handle on `/dev/vga_ball` (or any node speaking the same ioctls)
#[derive(Debug)]
pub struct IoctlChannel {
    file: File,
}

impl IoctlChannel {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        log::info!("Opened {}", path.display());
        Ok(Self { file })
    }

    fn ioctl(&self, opcode: Opcode, arg: *mut u8) -> Result<(), ChannelError> {
        // SAFETY: `arg` points at a live buffer of exactly
        // `opcode.payload_len()` bytes, checked by both callers, and the
        // driver copies at most that many bytes in either direction.
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), opcode.request() as _, arg) };
        if ret == -1 {
            return Err(ChannelError::new(opcode, io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl DeviceChannel for IoctlChannel {
    fn send(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), ChannelError> {
        if !opcode.is_write() || payload.len() != opcode.payload_len() {
            return Err(ChannelError::new(
                opcode,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} byte payload for {}", payload.len(), opcode),
                ),
            ));
        }
        // The driver only reads through this pointer
        self.ioctl(opcode, payload.as_ptr() as *mut u8)
    }

    fn receive(&mut self, opcode: Opcode) -> Result<Vec<u8>, ChannelError> {
        if opcode.is_write() {
            return Err(ChannelError::new(
                opcode,
                io::Error::new(io::ErrorKind::InvalidInput, "not a read command"),
            ));
        }
        let mut buf = vec![0u8; opcode.payload_len()];
        self.ioctl(opcode, buf.as_mut_ptr())?;
        Ok(buf)
    }
}
