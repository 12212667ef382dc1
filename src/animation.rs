//! Frame loop driver
//!
//! Owns exactly one integrator and one adapter. Each frame is integrated,
//! pushed, and only then is the next one integrated, so a bounce decided in
//! frame N is always visible to frame N+1.

use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::device::{Adapter, DeviceChannel, DeviceState};
use crate::error::Error;
use crate::sim::{Circle, Color, Integrator};

/// Paces the loop between frames
pub trait Pacer {
    fn wait(&mut self);
}

/// Sleep a fixed time after every frame
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Pacer for FixedDelay {
    fn wait(&mut self) {
        thread::sleep(self.0);
    }
}

/// Run frames back to back
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn wait(&mut self) {}
}

/// What to do when a frame's device update fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FailurePolicy {
    /// Stop and return the error
    Abort,
    /// Log it, drop this frame's visible update, keep integrating
    #[default]
    SkipFrame,
}

/// Outcome of [`Animation::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: u32,
    /// Frames whose device update failed and was skipped
    pub dropped: u32,
    /// Last integrated position
    pub last: Option<Circle>,
}

pub struct Animation<C> {
    integrator: Integrator,
    adapter: Adapter<C>,
    frame: u64,
}

impl<C: DeviceChannel> Animation<C> {
    pub fn new(integrator: Integrator, adapter: Adapter<C>) -> Self {
        Self {
            integrator,
            adapter,
            frame: 0,
        }
    }

    /// Push the starting position, then both colors
    pub fn start(&mut self, ball: Color, background: Color) -> Result<(), Error> {
        let circle = self.integrator.circle();
        self.adapter.push(&circle)?;
        self.adapter.write_colors(Some(ball), Some(background))?;
        log::info!(
            "Ball at ({}, {}) r={} ball={} background={}",
            circle.x,
            circle.y,
            circle.radius,
            ball,
            background
        );
        Ok(())
    }

    /// Integrate one frame and push it
    ///
    /// The integrator advances even when the push fails.
    pub fn step(&mut self) -> Result<Circle, Error> {
        let circle = self.integrator.advance_frame();
        self.frame += 1;
        self.adapter.push(&circle)?;
        Ok(circle)
    }

    /// Run `frames` frames, pacing between them
    pub fn run<P: Pacer>(
        &mut self,
        frames: u32,
        pacer: &mut P,
        policy: FailurePolicy,
    ) -> Result<RunSummary, Error> {
        let mut summary = RunSummary::default();
        for _ in 0..frames {
            match self.step() {
                Ok(circle) => summary.last = Some(circle),
                Err(e) => match policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::SkipFrame => {
                        log::warn!("Frame {} not shown: {}", self.frame, e);
                        summary.dropped += 1;
                        summary.last = Some(self.integrator.circle());
                    }
                },
            }
            summary.frames += 1;
            pacer.wait();
        }
        log::debug!(
            "Ran {} frames ({} dropped)",
            summary.frames,
            summary.dropped
        );
        Ok(summary)
    }

    /// Read background color and position back from the device
    pub fn read_back(&mut self) -> Result<DeviceState, Error> {
        self.adapter.read_state()
    }

    /// Frames integrated so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    pub fn adapter(&self) -> &Adapter<C> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut Adapter<C> {
        &mut self.adapter
    }
}
