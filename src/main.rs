//! VGA ball entry point
//!
//! Parses the command line, opens the device and runs the frame loop.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use vga_ball::settings::{Invocation, USAGE};
use vga_ball::{
    Adapter, Animation, DeviceChannel, FailurePolicy, FixedDelay, Integrator, MemoryChannel,
    Settings,
};

#[derive(Debug, Error)]
enum RunError {
    #[error("could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Device(#[from] vga_ball::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    env_logger::init();

    let settings = match Settings::from_args(env::args().skip(1)) {
        Ok(Invocation::Run(settings)) => settings,
        Ok(Invocation::Help) => {
            print!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("vga-ball: {}", e);
            eprintln!("Try `vga-ball --help' for more information.");
            return ExitCode::from(64);
        }
    };

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vga-ball: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<(), RunError> {
    log::debug!("Settings: {}", serde_json::to_string(settings)?);
    println!("VGA ball Userspace program started");

    let channel: Box<dyn DeviceChannel> = if settings.dry_run {
        log::info!("Dry run: using in-memory device");
        Box::new(MemoryChannel::new())
    } else {
        open_device(&settings.device)?
    };

    let seed = settings.seed.unwrap_or_else(clock_seed);
    if settings.random_color {
        log::info!("Random ball color, seed {}", seed);
    }
    let ball = settings.ball_color(seed);

    let integrator = Integrator::initialize(
        settings.flavor.bounds(),
        settings.circle(),
        settings.direction(),
    );
    let mut animation = Animation::new(integrator, Adapter::new(channel, settings.flavor));

    // A failed initial write is reported, the loop still runs
    if let Err(e) = animation.start(ball, settings.background) {
        log::error!("{}", e);
    }
    match animation.read_back() {
        Ok(state) => println!("initial state: {}", state.background),
        Err(e) => log::error!("{}", e),
    }

    let mut pacer = FixedDelay(Duration::from_millis(settings.delay_ms));
    let summary = animation.run(settings.frames, &mut pacer, FailurePolicy::SkipFrame)?;
    if summary.dropped > 0 {
        log::warn!(
            "{} of {} frames were not shown",
            summary.dropped,
            summary.frames
        );
    }
    log::debug!("Final state: {}", serde_json::to_string(animation.integrator())?);

    println!("VGA BALL Userspace program terminating");
    Ok(())
}

#[cfg(target_os = "linux")]
fn open_device(path: &Path) -> Result<Box<dyn DeviceChannel>, RunError> {
    let channel = vga_ball::device::IoctlChannel::open(path).map_err(|source| RunError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(channel))
}

#[cfg(not(target_os = "linux"))]
fn open_device(path: &Path) -> Result<Box<dyn DeviceChannel>, RunError> {
    Err(RunError::Open {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Unsupported, "device access needs Linux"),
    })
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
