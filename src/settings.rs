//! Run settings, taken from the command line
//!
//! Defaults reproduce the classic demo: a blue ball of radius 16 launched
//! from the middle of a white 640x480 screen along (3, 4) at 1.5 px/frame.

use std::path::PathBuf;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::device::Flavor;
use crate::sim::{Circle, Color, Direction};

pub const USAGE: &str = "\
Usage: vga-ball [OPTION...]
A bouncing ball program.

  -x, --startx=STARTX        start x coordinate of circle
  -y, --starty=STARTY        start y coordinate of circle
  -u, --dx=DELTAX            start x velocity
  -v, --dy=DELTAY            start y velocity
  -r, --radius=RADIUS        circle radius
  -s, --speed=SPEED          circle speed (> 0)
  -c, --color=R,G,B          circle color
  -b, --background=R,G,B     background color
      --random-color         pick a random circle color
      --seed=N               seed for --random-color
      --frames=N             number of frames to run
      --delay-ms=N           delay between frames
      --device=PATH          device node
      --position-only        160x120 hardware without radius
      --dry-run              drive an in-memory device instead
  -h, --help                 give this help list
";

/// Rejected command line
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("unrecognized option '{0}'")]
    UnknownFlag(String),

    #[error("option '{0}' requires an argument")]
    MissingValue(String),

    #[error("invalid argument '{value}' for {flag}")]
    InvalidNumber { flag: String, value: String },

    #[error("invalid argument '{value}' for {flag}: expected R,G,B")]
    InvalidColor { flag: String, value: String },

    #[error("invalid R,G,B '{value}' for {flag}: components must be 0-255")]
    ColorOutOfRange { flag: String, value: String },

    #[error("invalid speed {0}: must be greater than 0")]
    NonPositiveSpeed(f32),

    #[error("direction (0, 0) has no heading")]
    ZeroDirection,

    #[error("direction ({vx}, {vy}) cannot be normalized")]
    UnboundedDirection { vx: f32, vy: f32 },

    #[error("radius {radius} does not fit a {width}x{height} screen")]
    RadiusTooLarge { radius: u8, width: i16, height: i16 },
}

/// What the command line asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Run(Settings),
    Help,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub x: i16,
    pub y: i16,
    pub radius: u8,
    pub vx: f32,
    pub vy: f32,
    pub speed: f32,
    pub ball: Color,
    pub background: Color,
    pub random_color: bool,
    pub seed: Option<u64>,
    pub frames: u32,
    pub delay_ms: u64,
    pub device: PathBuf,
    pub flavor: Flavor,
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            x: SCREEN_WIDTH / 2,
            y: SCREEN_HEIGHT / 2,
            radius: 16,
            vx: 3.0,
            vy: 4.0,
            speed: 1.5,
            ball: Color::BLUE,
            background: Color::WHITE,
            random_color: false,
            seed: None,
            frames: DEFAULT_FRAMES,
            delay_ms: FRAME_DELAY_MS,
            device: PathBuf::from(DEVICE_PATH),
            flavor: Flavor::Circle,
            dry_run: false,
        }
    }
}

impl Settings {
    /// Parse arguments (without the program name) and validate them
    pub fn from_args<I, S>(args: I) -> Result<Invocation, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut settings = Settings::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            let (flag, inline) = split_flag(&arg);
            let mut value = |name: &str| -> Result<String, SettingsError> {
                match &inline {
                    Some(v) => Ok(v.clone()),
                    None => args
                        .next()
                        .ok_or_else(|| SettingsError::MissingValue(name.to_string())),
                }
            };

            match flag.as_str() {
                "-x" | "--startx" => settings.x = number(&flag, &value(&flag)?)?,
                "-y" | "--starty" => settings.y = number(&flag, &value(&flag)?)?,
                "-u" | "--dx" => settings.vx = number(&flag, &value(&flag)?)?,
                "-v" | "--dy" => settings.vy = number(&flag, &value(&flag)?)?,
                "-r" | "--radius" => settings.radius = number(&flag, &value(&flag)?)?,
                "-s" | "--speed" => settings.speed = number(&flag, &value(&flag)?)?,
                "-c" | "--color" => {
                    settings.ball = parse_color(&flag, &value(&flag)?)?;
                    settings.random_color = false;
                }
                "-b" | "--background" => settings.background = parse_color(&flag, &value(&flag)?)?,
                "--random-color" => settings.random_color = true,
                "--seed" => settings.seed = Some(number(&flag, &value(&flag)?)?),
                "--frames" => settings.frames = number(&flag, &value(&flag)?)?,
                "--delay-ms" => settings.delay_ms = number(&flag, &value(&flag)?)?,
                "--device" => settings.device = PathBuf::from(value(&flag)?),
                "--position-only" => settings.flavor = Flavor::PositionOnly,
                "--dry-run" => settings.dry_run = true,
                "-h" | "--help" => return Ok(Invocation::Help),
                _ => return Err(SettingsError::UnknownFlag(arg)),
            }
        }

        settings.validate()?;
        Ok(Invocation::Run(settings))
    }

    /// Reject combinations the motion core cannot handle
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.speed > 0.0) || !self.speed.is_finite() {
            return Err(SettingsError::NonPositiveSpeed(self.speed));
        }
        // The integrator normalizes by 1/sqrt(vx² + vy²); the squared
        // length must be finite and nonzero for that to mean anything
        let len_sq = self.vx * self.vx + self.vy * self.vy;
        if !len_sq.is_finite() {
            return Err(SettingsError::UnboundedDirection {
                vx: self.vx,
                vy: self.vy,
            });
        }
        if !(len_sq > 0.0) {
            return Err(SettingsError::ZeroDirection);
        }
        let bounds = self.flavor.bounds();
        if !bounds.fits(self.radius) {
            return Err(SettingsError::RadiusTooLarge {
                radius: self.radius,
                width: bounds.width,
                height: bounds.height,
            });
        }
        Ok(())
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.x, self.y, self.radius)
    }

    pub fn direction(&self) -> Direction {
        Direction::new(self.vx, self.vy, self.speed)
    }

    /// Ball color for this run, drawing from `seed` when randomized
    pub fn ball_color(&self, seed: u64) -> Color {
        if self.random_color {
            Color::random(&mut Pcg32::seed_from_u64(seed))
        } else {
            self.ball
        }
    }
}

/// `--flag=value` and `-xVALUE` carry their value inline
fn split_flag(arg: &str) -> (String, Option<String>) {
    if let Some(long) = arg.strip_prefix("--") {
        return match long.split_once('=') {
            Some((name, v)) => (format!("--{}", name), Some(v.to_string())),
            None => (arg.to_string(), None),
        };
    }
    if arg.len() > 2 && arg.starts_with('-') && arg.is_char_boundary(2) {
        return (arg[..2].to_string(), Some(arg[2..].to_string()));
    }
    (arg.to_string(), None)
}

fn number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidNumber {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}

/// Parse `R,G,B` with each component in 0-255
pub fn parse_color(flag: &str, value: &str) -> Result<Color, SettingsError> {
    let invalid = || SettingsError::InvalidColor {
        flag: flag.to_string(),
        value: value.to_string(),
    };
    let parts: Vec<u32> = value
        .split(',')
        .map(|p| p.trim().parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;
    let [r, g, b] = parts[..] else {
        return Err(invalid());
    };
    let channel = |c: u32| {
        u8::try_from(c).map_err(|_| SettingsError::ColorOutOfRange {
            flag: flag.to_string(),
            value: value.to_string(),
        })
    };
    Ok(Color::new(channel(r)?, channel(g)?, channel(b)?))
}
