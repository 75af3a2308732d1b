use crate::peripheral::{ClockSource, SpeedMode};

/// Log target for every record emitted by this crate.
pub const TAG: &str = "BUZZER";

/// Frequency the timer is configured with before any note is set.
pub const INITIAL_FREQ_HZ: u32 = 440;

/// Duty resolution of the buzzer timer. Higher values lower the maximum
/// frequency the timer can produce.
pub const DUTY_RESOLUTION_BITS: u32 = 15;

/// Channel duty at init, half of the 15-bit range (square wave).
pub const DEFAULT_DUTY: u32 = 1 << 14;

pub const SPEED_MODE: SpeedMode = SpeedMode::LowSpeed;
pub const CLOCK: ClockSource = ClockSource::Auto;

/// Parts a pulse (one crotchet) is split into; note types are expressed in these units.
pub const BASE_PULSE_DIVISIONS: u32 = 8;

pub const MS_PER_MINUTE: u32 = 60_000;

pub const MAX_VOLUME: u8 = 100;

/// Octave of the base frequency table, also the highest playable octave.
pub const MAX_OCTAVE: u8 = 8;
