//! Simulated LEDC peripheral
//!
//! Models a single LEDC timer and channel closely enough to exercise the
//! buzzer engine on a desktop: the timer has to be configured before the
//! channel, frequencies are limited by the duty resolution the same way the
//! hardware divider limits them, and duty changes only apply once committed.
//!
//! The state lives behind an `Arc<Mutex<_>>` so the control panel can show
//! it while the buzzer owns the peripheral.

use std::sync::{Arc, Mutex, MutexGuard};

use buzzer_core::peripheral::{ChannelConfig, SpeedMode, TimerConfig};
use buzzer_core::{ChannelId, PwmPeripheral, TimerId};
use thiserror::Error;

use crate::audio::Speaker;

/// Clock feeding the simulated timer (APB on an ESP32)
const SOURCE_CLOCK_HZ: u32 = 80_000_000;

/// The LEDC clock divider is 10 bits of integer part
const MAX_DIVIDER: u32 = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PwmState {
    pub timer: Option<TimerId>,
    pub channel: Option<ChannelId>,
    pub gpio: Option<i32>,
    pub freq_hz: u32,
    pub resolution_bits: u32,
    /// Duty currently on the output
    pub duty: u32,
    /// Duty written by `set_channel_duty`, applied by `commit_duty`
    pub staged_duty: u32,
    pub running: bool,
}

impl PwmState {
    pub fn max_duty(&self) -> u32 {
        1 << self.resolution_bits
    }

    /// Share of each period the output is high, 0.0 to 1.0.
    pub fn duty_fraction(&self) -> f32 {
        if self.resolution_bits == 0 {
            return 0.0;
        }
        (self.duty as f32 / self.max_duty() as f32).min(1.0)
    }

    /// True when a tone would come out of the buzzer.
    pub fn is_sounding(&self) -> bool {
        self.running && self.channel.is_some() && self.duty > 0
    }
}

pub type SharedPwmState = Arc<Mutex<PwmState>>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    #[error("only the low speed group is simulated")]
    UnsupportedSpeedMode,
    #[error("timer {0} is not configured")]
    TimerNotConfigured(u8),
    #[error("channel {0} is not configured")]
    ChannelNotConfigured(u8),
    #[error("{freq_hz} Hz is out of range for a {bits}-bit timer")]
    FrequencyOutOfRange { freq_hz: u32, bits: u32 },
    #[error("duty {duty} exceeds the {bits}-bit range")]
    DutyOutOfRange { duty: u32, bits: u32 },
}

/// Frequencies a timer with `bits` of duty resolution can produce.
fn frequency_range(bits: u32) -> (u32, u32) {
    let max = SOURCE_CLOCK_HZ >> bits;
    (max / MAX_DIVIDER + 1, max)
}

/// Widest duty resolution the LEDC timers support
const MAX_RESOLUTION_BITS: u32 = 20;

fn check_frequency(freq_hz: u32, bits: u32) -> Result<(), SimError> {
    let out_of_range = SimError::FrequencyOutOfRange { freq_hz, bits };
    if bits == 0 || bits > MAX_RESOLUTION_BITS {
        return Err(out_of_range);
    }
    let (min, max) = frequency_range(bits);
    if !(min..=max).contains(&freq_hz) {
        return Err(out_of_range);
    }
    Ok(())
}

pub struct SimulatedPwm {
    state: SharedPwmState,
    speaker: Option<Speaker>,
}

impl SimulatedPwm {
    pub fn new(state: SharedPwmState, speaker: Option<Speaker>) -> Self {
        Self { state, speaker }
    }

    fn state(&self) -> MutexGuard<'_, PwmState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_timer(&self, mode: SpeedMode, timer: TimerId) -> Result<(), SimError> {
        if mode != SpeedMode::LowSpeed {
            return Err(SimError::UnsupportedSpeedMode);
        }
        if self.state().timer != Some(timer) {
            return Err(SimError::TimerNotConfigured(timer.0));
        }
        Ok(())
    }

    fn check_channel(&self, mode: SpeedMode, channel: ChannelId) -> Result<(), SimError> {
        if mode != SpeedMode::LowSpeed {
            return Err(SimError::UnsupportedSpeedMode);
        }
        if self.state().channel != Some(channel) {
            return Err(SimError::ChannelNotConfigured(channel.0));
        }
        Ok(())
    }

    /// Bring the speaker in line with the simulated output. Restarting the
    /// tone on every change mirrors the glitch the real timer makes.
    fn refresh_output(&mut self) {
        let state = *self.state();
        if let Some(speaker) = self.speaker.as_mut() {
            if state.is_sounding() {
                speaker.start(state.freq_hz, state.duty_fraction());
            } else {
                speaker.stop();
            }
        }
    }
}

impl PwmPeripheral for SimulatedPwm {
    type Error = SimError;

    fn configure_timer(&mut self, config: &TimerConfig) -> Result<(), SimError> {
        if config.speed_mode != SpeedMode::LowSpeed {
            return Err(SimError::UnsupportedSpeedMode);
        }
        check_frequency(config.freq_hz, config.duty_resolution_bits)?;

        {
            let mut state = self.state();
            state.timer = Some(config.timer);
            state.freq_hz = config.freq_hz;
            state.resolution_bits = config.duty_resolution_bits;
            // A freshly configured timer runs
            state.running = true;
        }
        log::trace!(
            "sim: timer {} at {} Hz, {}-bit",
            config.timer.0,
            config.freq_hz,
            config.duty_resolution_bits
        );
        self.refresh_output();
        Ok(())
    }

    fn configure_channel(&mut self, config: &ChannelConfig) -> Result<(), SimError> {
        self.check_timer(config.speed_mode, config.timer)?;

        {
            let mut state = self.state();
            if config.duty > state.max_duty() {
                return Err(SimError::DutyOutOfRange {
                    duty: config.duty,
                    bits: state.resolution_bits,
                });
            }
            state.channel = Some(config.channel);
            state.gpio = Some(config.gpio.0);
            state.duty = config.duty;
            state.staged_duty = config.duty;
        }
        log::trace!(
            "sim: channel {} on GPIO{}, duty {}",
            config.channel.0,
            config.gpio.0,
            config.duty
        );
        self.refresh_output();
        Ok(())
    }

    fn pause_timer(&mut self, mode: SpeedMode, timer: TimerId) -> Result<(), SimError> {
        self.check_timer(mode, timer)?;
        self.state().running = false;
        log::trace!("sim: timer {} paused", timer.0);
        self.refresh_output();
        Ok(())
    }

    fn resume_timer(&mut self, mode: SpeedMode, timer: TimerId) -> Result<(), SimError> {
        self.check_timer(mode, timer)?;
        self.state().running = true;
        log::trace!("sim: timer {} resumed", timer.0);
        self.refresh_output();
        Ok(())
    }

    fn set_timer_frequency(
        &mut self,
        mode: SpeedMode,
        timer: TimerId,
        freq_hz: u32,
    ) -> Result<(), SimError> {
        self.check_timer(mode, timer)?;
        {
            let mut state = self.state();
            check_frequency(freq_hz, state.resolution_bits)?;
            state.freq_hz = freq_hz;
        }
        log::trace!("sim: timer {} at {} Hz", timer.0, freq_hz);
        self.refresh_output();
        Ok(())
    }

    fn set_channel_duty(
        &mut self,
        mode: SpeedMode,
        channel: ChannelId,
        duty: u32,
    ) -> Result<(), SimError> {
        self.check_channel(mode, channel)?;
        let mut state = self.state();
        if duty > state.max_duty() {
            return Err(SimError::DutyOutOfRange {
                duty,
                bits: state.resolution_bits,
            });
        }
        state.staged_duty = duty;
        Ok(())
    }

    fn commit_duty(&mut self, mode: SpeedMode, channel: ChannelId) -> Result<(), SimError> {
        self.check_channel(mode, channel)?;
        {
            let mut state = self.state();
            state.duty = state.staged_duty;
        }
        self.refresh_output();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use buzzer_core::peripheral::{ClockSource, PwmOp};
    use buzzer_core::{Buzzer, BuzzerError, GpioNum, Note};
    use embedded_hal::delay::DelayNs;

    use super::*;

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn simulated() -> (SharedPwmState, Buzzer<SimulatedPwm, NoDelay>) {
        let state = SharedPwmState::default();
        let pwm = SimulatedPwm::new(Arc::clone(&state), None);
        let buzzer = Buzzer::new(pwm, NoDelay, ChannelId(0), TimerId(0), GpioNum(9));
        (state, buzzer)
    }

    fn snapshot(state: &SharedPwmState) -> PwmState {
        *state.lock().unwrap()
    }

    #[test]
    fn test_buzzer_init_leaves_output_paused() {
        let (state, buzzer) = simulated();
        let state = snapshot(&state);

        assert!(!buzzer.is_playing());
        assert_eq!(state.timer, Some(TimerId(0)));
        assert_eq!(state.channel, Some(ChannelId(0)));
        assert_eq!(state.gpio, Some(9));
        assert_eq!(state.freq_hz, 440);
        assert_eq!(state.duty, 16384);
        assert!(!state.running);
        assert!(!state.is_sounding());
    }

    #[test]
    fn test_play_and_pause_follow_hardware() {
        let (state, mut buzzer) = simulated();

        buzzer.play().unwrap();
        assert!(snapshot(&state).is_sounding());
        buzzer.rest_for(100).unwrap();
        assert!(snapshot(&state).running);
        buzzer.pause().unwrap();
        assert!(!snapshot(&state).running);
    }

    #[test]
    fn test_self_test_ends_silent() {
        let (state, mut buzzer) = simulated();

        buzzer.play_self_test(240).unwrap();
        let state = snapshot(&state);
        assert!(!state.running);
        assert_eq!(state.freq_hz, 349);
    }

    #[test]
    fn test_frequency_limited_by_resolution() {
        // 80 MHz >> 15 bits = 2441 Hz at most
        let (state, mut buzzer) = simulated();

        buzzer.set_note(Note::B, 6).unwrap();
        assert_eq!(
            buzzer.set_note(Note::C, 8),
            Err(BuzzerError::Peripheral(PwmOp::SetFrequency))
        );
        assert_eq!(buzzer.frequency(), 1975);
        assert_eq!(snapshot(&state).freq_hz, 1975);
    }

    #[test]
    fn test_volume_applies_on_commit() {
        let (state, mut buzzer) = simulated();

        buzzer.set_volume(25).unwrap();
        let state = snapshot(&state);
        assert_eq!(state.duty, 8192);
        assert_eq!(state.duty_fraction(), 0.25);
    }

    #[test]
    fn test_duty_staged_until_commit() {
        let state = SharedPwmState::default();
        let mut pwm = SimulatedPwm::new(Arc::clone(&state), None);
        Buzzer::new(&mut pwm, NoDelay, ChannelId(2), TimerId(1), GpioNum(4)).destroy();

        pwm.set_channel_duty(SpeedMode::LowSpeed, ChannelId(2), 100)
            .unwrap();
        assert_eq!(snapshot(&state).duty, 16384);
        pwm.commit_duty(SpeedMode::LowSpeed, ChannelId(2)).unwrap();
        assert_eq!(snapshot(&state).duty, 100);
    }

    #[test]
    fn test_unconfigured_timer_rejected() {
        let mut pwm = SimulatedPwm::new(SharedPwmState::default(), None);

        assert_eq!(
            pwm.resume_timer(SpeedMode::LowSpeed, TimerId(0)),
            Err(SimError::TimerNotConfigured(0))
        );
        assert_eq!(
            pwm.commit_duty(SpeedMode::LowSpeed, ChannelId(3)),
            Err(SimError::ChannelNotConfigured(3))
        );
    }

    #[test]
    fn test_unsupported_resolution_rejected() {
        let mut pwm = SimulatedPwm::new(SharedPwmState::default(), None);
        let config = |bits| TimerConfig {
            speed_mode: SpeedMode::LowSpeed,
            timer: TimerId(0),
            freq_hz: 440,
            duty_resolution_bits: bits,
            clock: ClockSource::Auto,
        };

        for bits in [0, 21, 32, 40, u32::MAX] {
            assert_eq!(
                pwm.configure_timer(&config(bits)),
                Err(SimError::FrequencyOutOfRange { freq_hz: 440, bits })
            );
        }
        assert_eq!(pwm.configure_timer(&config(10)), Ok(()));
    }

    #[test]
    fn test_high_speed_rejected() {
        let (_, buzzer) = simulated();
        let (mut pwm, _) = buzzer.release();

        assert_eq!(
            pwm.pause_timer(SpeedMode::HighSpeed, TimerId(0)),
            Err(SimError::UnsupportedSpeedMode)
        );
    }
}
