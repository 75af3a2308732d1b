//! PWM peripheral contract
//!
//! The buzzer only needs a handful of operations from the platform's PWM
//! (LEDC-style) driver: configure a timer and a channel, pause/resume the
//! timer output, change the timer frequency and change the channel duty.
//! Platforms implement [`PwmPeripheral`] over their own driver; the core never
//! touches registers directly.

use core::fmt;

/// Timer group the timer and channel live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedMode {
    LowSpeed,
    HighSpeed,
}

/// Clock feeding the PWM timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Let the driver pick a source that can reach the requested frequency
    Auto,
    Apb,
    RcFast,
    Xtal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMode {
    Disabled,
    FadeEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioNum(pub i32);

/// Timer setup passed to [`PwmPeripheral::configure_timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    pub speed_mode: SpeedMode,
    pub timer: TimerId,
    pub freq_hz: u32,
    pub duty_resolution_bits: u32,
    pub clock: ClockSource,
}

/// Channel setup passed to [`PwmPeripheral::configure_channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    pub speed_mode: SpeedMode,
    pub channel: ChannelId,
    pub gpio: GpioNum,
    pub timer: TimerId,
    pub duty: u32,
    pub hpoint: i32,
    pub interrupt: InterruptMode,
}

/// Names a peripheral call, carried by [`crate::BuzzerError::Peripheral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmOp {
    ConfigureTimer,
    ConfigureChannel,
    PauseTimer,
    ResumeTimer,
    SetFrequency,
    SetDuty,
    CommitDuty,
}

impl fmt::Display for PwmOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PwmOp::ConfigureTimer => "configure timer",
            PwmOp::ConfigureChannel => "configure channel",
            PwmOp::PauseTimer => "pause timer",
            PwmOp::ResumeTimer => "resume timer",
            PwmOp::SetFrequency => "set frequency",
            PwmOp::SetDuty => "set duty",
            PwmOp::CommitDuty => "commit duty",
        })
    }
}

/// Platform PWM driver consumed by [`crate::Buzzer`].
///
/// Every call reports success or failure; the buzzer only updates its cached
/// state after a call succeeds.
pub trait PwmPeripheral {
    type Error: fmt::Debug;

    fn configure_timer(&mut self, config: &TimerConfig) -> Result<(), Self::Error>;

    fn configure_channel(&mut self, config: &ChannelConfig) -> Result<(), Self::Error>;

    /// Stop the timer output. The channel keeps its configuration.
    fn pause_timer(&mut self, mode: SpeedMode, timer: TimerId) -> Result<(), Self::Error>;

    fn resume_timer(&mut self, mode: SpeedMode, timer: TimerId) -> Result<(), Self::Error>;

    fn set_timer_frequency(
        &mut self,
        mode: SpeedMode,
        timer: TimerId,
        freq_hz: u32,
    ) -> Result<(), Self::Error>;

    /// Stage a new duty. Takes effect after [`PwmPeripheral::commit_duty`].
    fn set_channel_duty(
        &mut self,
        mode: SpeedMode,
        channel: ChannelId,
        duty: u32,
    ) -> Result<(), Self::Error>;

    fn commit_duty(&mut self, mode: SpeedMode, channel: ChannelId) -> Result<(), Self::Error>;
}

impl<T: PwmPeripheral + ?Sized> PwmPeripheral for &mut T {
    type Error = T::Error;

    fn configure_timer(&mut self, config: &TimerConfig) -> Result<(), Self::Error> {
        T::configure_timer(self, config)
    }

    fn configure_channel(&mut self, config: &ChannelConfig) -> Result<(), Self::Error> {
        T::configure_channel(self, config)
    }

    fn pause_timer(&mut self, mode: SpeedMode, timer: TimerId) -> Result<(), Self::Error> {
        T::pause_timer(self, mode, timer)
    }

    fn resume_timer(&mut self, mode: SpeedMode, timer: TimerId) -> Result<(), Self::Error> {
        T::resume_timer(self, mode, timer)
    }

    fn set_timer_frequency(
        &mut self,
        mode: SpeedMode,
        timer: TimerId,
        freq_hz: u32,
    ) -> Result<(), Self::Error> {
        T::set_timer_frequency(self, mode, timer, freq_hz)
    }

    fn set_channel_duty(
        &mut self,
        mode: SpeedMode,
        channel: ChannelId,
        duty: u32,
    ) -> Result<(), Self::Error> {
        T::set_channel_duty(self, mode, channel, duty)
    }

    fn commit_duty(&mut self, mode: SpeedMode, channel: ChannelId) -> Result<(), Self::Error> {
        T::commit_duty(self, mode, channel)
    }
}
