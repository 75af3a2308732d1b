//! Buzzer playback engine
//!
//! A [`Buzzer`] owns one PWM timer/channel pair and tracks whether the timer
//! output is running and which frequency it was last set to. Cached state is
//! only updated after the peripheral accepts a call, so it never drifts from
//! the hardware.
//!
//! Timed operations block the caller through the [`DelayNs`] implementation
//! handed to [`Buzzer::new`]. On an RTOS this yields to other tasks; precision
//! is bounded by the scheduler tick.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::consts::{
    CLOCK, DEFAULT_DUTY, DUTY_RESOLUTION_BITS, INITIAL_FREQ_HZ, MAX_VOLUME, SPEED_MODE, TAG,
};
use crate::error::{BuzzerError, Result};
use crate::melodies;
use crate::music::{Melody, MusicalNote, Note, note_to_frequency, note_type_to_ms};
use crate::peripheral::{
    ChannelConfig, ChannelId, GpioNum, InterruptMode, PwmOp, PwmPeripheral, TimerConfig, TimerId,
};

/// Map a driver result to [`BuzzerError::Peripheral`], logging the driver's error.
fn check<E: Debug>(op: PwmOp, result: core::result::Result<(), E>) -> Result<()> {
    result.map_err(|err| {
        warn!(target: TAG, "failed to {}: {:?}", op, err);
        BuzzerError::Peripheral(op)
    })
}

pub struct Buzzer<P, D> {
    pwm: P,
    delay: D,
    channel: ChannelId,
    timer: TimerId,
    playing: bool,
    frequency_hz: u32,
}

impl<P, D> Buzzer<P, D>
where
    P: PwmPeripheral,
    D: DelayNs,
{
    /// Configure `timer` and `channel` to drive a buzzer on `pin`.
    ///
    /// The timer starts at 440 Hz with a 50% duty and is paused right away, so
    /// nothing sounds until [`Buzzer::play`]. Configuration failures are logged
    /// and otherwise ignored; a buzzer is returned regardless.
    pub fn new(pwm: P, delay: D, channel: ChannelId, timer: TimerId, pin: GpioNum) -> Self {
        let mut buzzer = Self {
            pwm,
            delay,
            channel,
            timer,
            playing: false,
            frequency_hz: INITIAL_FREQ_HZ,
        };

        let timer_config = TimerConfig {
            speed_mode: SPEED_MODE,
            timer,
            freq_hz: INITIAL_FREQ_HZ,
            duty_resolution_bits: DUTY_RESOLUTION_BITS,
            clock: CLOCK,
        };
        let _ = check(
            PwmOp::ConfigureTimer,
            buzzer.pwm.configure_timer(&timer_config),
        );

        let channel_config = ChannelConfig {
            speed_mode: SPEED_MODE,
            channel,
            gpio: pin,
            timer,
            duty: DEFAULT_DUTY,
            hpoint: 0,
            interrupt: InterruptMode::Disabled,
        };
        let _ = check(
            PwmOp::ConfigureChannel,
            buzzer.pwm.configure_channel(&channel_config),
        );

        let _ = check(
            PwmOp::PauseTimer,
            buzzer.pwm.pause_timer(SPEED_MODE, timer),
        );

        info!(
            target: TAG,
            "buzzer on GPIO{} (channel {}, timer {})", pin.0, channel.0, timer.0
        );
        buzzer
    }

    /// Drop the buzzer. The timer output is left as is; pause first if
    /// silence is required.
    pub fn destroy(self) {
        debug!(target: TAG, "buzzer on channel {} destroyed", self.channel.0);
    }

    /// Give back the peripheral and delay. Like [`Buzzer::destroy`], the
    /// timer output is left as is.
    pub fn release(self) -> (P, D) {
        (self.pwm, self.delay)
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn timer(&self) -> TimerId {
        self.timer
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Last frequency accepted by the peripheral, in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency_hz
    }

    /// Resume the timer output. Does nothing if already playing.
    pub fn play(&mut self) -> Result<()> {
        if self.playing {
            return Ok(());
        }
        check(
            PwmOp::ResumeTimer,
            self.pwm.resume_timer(SPEED_MODE, self.timer),
        )?;
        self.playing = true;
        Ok(())
    }

    /// Pause the timer output. Does nothing if already paused.
    pub fn pause(&mut self) -> Result<()> {
        if !self.playing {
            return Ok(());
        }
        check(
            PwmOp::PauseTimer,
            self.pwm.pause_timer(SPEED_MODE, self.timer),
        )?;
        self.playing = false;
        Ok(())
    }

    /// Set the timer frequency.
    ///
    /// The frequency is written even when it equals the current one: the
    /// rewrite causes a short gap in the output, which is what separates two
    /// consecutive identical notes.
    pub fn set_frequency(&mut self, freq_hz: u32) -> Result<()> {
        if freq_hz == 0 {
            return Err(BuzzerError::InvalidArgument("frequency must be non-zero"));
        }
        check(
            PwmOp::SetFrequency,
            self.pwm
                .set_timer_frequency(SPEED_MODE, self.timer, freq_hz),
        )?;
        self.frequency_hz = freq_hz;
        Ok(())
    }

    /// Set the frequency to `note` at `octave`, truncated to whole Hz.
    pub fn set_note(&mut self, note: Note, octave: u8) -> Result<()> {
        self.set_frequency(note_to_frequency(note, octave) as u32)
    }

    /// Play for `duration_ms`, then pause. Always ends paused.
    pub fn play_for(&mut self, duration_ms: u32) -> Result<()> {
        self.play()?;
        self.delay.delay_ms(duration_ms);
        self.pause()
    }

    /// Stay silent for `duration_ms`. If the buzzer was playing before the
    /// rest, it is resumed afterwards.
    pub fn rest_for(&mut self, duration_ms: u32) -> Result<()> {
        let was_playing = self.playing;
        self.pause()?;
        self.delay.delay_ms(duration_ms);
        if was_playing {
            self.play()?;
        }
        Ok(())
    }

    /// Play a single note at `bpm` beats (crotchets) per minute.
    pub fn play_note(&mut self, note: &MusicalNote, bpm: u32) -> Result<()> {
        let duration_ms = note_type_to_ms(note.note_type, bpm)
            .ok_or(BuzzerError::InvalidArgument("tempo must be non-zero"))?;

        if note.note.is_rest() {
            debug!(target: TAG, "rest for {} ms", duration_ms);
            return self.rest_for(duration_ms);
        }

        self.set_note(note.note, note.octave)?;
        debug!(
            target: TAG,
            "{}{} at {} Hz for {} ms", note.note, note.octave, self.frequency_hz, duration_ms
        );
        self.play_for(duration_ms)
    }

    /// Play `note` at `octave` for an explicit duration instead of a tempo.
    pub fn play_note_for(&mut self, note: Note, octave: u8, duration_ms: u32) -> Result<()> {
        self.set_note(note, octave)?;
        self.play_for(duration_ms)
    }

    /// Play every note of `melody` in order.
    ///
    /// Stops at the first failing note; notes already played are not undone.
    /// There is no way to cancel midway, callers that need one should loop
    /// over [`Buzzer::play_note`] themselves.
    pub fn play_melody(&mut self, melody: Melody<'_>, bpm: u32) -> Result<()> {
        if bpm == 0 {
            return Err(BuzzerError::InvalidArgument("tempo must be non-zero"));
        }
        for note in melody {
            self.play_note(note, bpm)?;
        }
        Ok(())
    }

    /// Play the built-in [`melodies::SELF_TEST`] tune.
    ///
    /// Only reports failures of the PWM calls; it can't tell whether a buzzer
    /// is actually connected.
    pub fn play_self_test(&mut self, bpm: u32) -> Result<()> {
        info!(target: TAG, "playing self-test melody at {} bpm", bpm);
        self.play_melody(melodies::SELF_TEST, bpm)
    }

    /// Set the volume as a percentage of the full duty range. Values above
    /// 100 are clamped.
    pub fn set_volume(&mut self, volume: u8) -> Result<()> {
        let volume = volume.min(MAX_VOLUME);
        let duty = (1u32 << DUTY_RESOLUTION_BITS) * u32::from(volume) / u32::from(MAX_VOLUME);

        check(
            PwmOp::SetDuty,
            self.pwm.set_channel_duty(SPEED_MODE, self.channel, duty),
        )?;
        check(
            PwmOp::CommitDuty,
            self.pwm.commit_duty(SPEED_MODE, self.channel),
        )?;
        debug!(target: TAG, "volume {}% (duty {})", volume, duty);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::NoteType;
    use crate::peripheral::{ClockSource, SpeedMode};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        ConfigureTimer(TimerConfig),
        ConfigureChannel(ChannelConfig),
        Pause,
        Resume,
        SetFrequency(u32),
        SetDuty(u32),
        CommitDuty,
    }

    impl Call {
        fn op(&self) -> PwmOp {
            match self {
                Call::ConfigureTimer(_) => PwmOp::ConfigureTimer,
                Call::ConfigureChannel(_) => PwmOp::ConfigureChannel,
                Call::Pause => PwmOp::PauseTimer,
                Call::Resume => PwmOp::ResumeTimer,
                Call::SetFrequency(_) => PwmOp::SetFrequency,
                Call::SetDuty(_) => PwmOp::SetDuty,
                Call::CommitDuty => PwmOp::CommitDuty,
            }
        }
    }

    #[derive(Debug)]
    struct MockError;

    /// Records every call. `fail` makes the nth (0-based) call of an op fail.
    #[derive(Default)]
    struct MockPwm {
        calls: Vec<Call>,
        fail: Option<(PwmOp, usize)>,
    }

    impl MockPwm {
        fn failing(op: PwmOp, nth: usize) -> Self {
            Self {
                calls: Vec::new(),
                fail: Some((op, nth)),
            }
        }

        fn record(&mut self, call: Call) -> core::result::Result<(), MockError> {
            let op = call.op();
            let seen = self.calls.iter().filter(|c| c.op() == op).count();
            self.calls.push(call);
            match self.fail {
                Some((fail_op, nth)) if fail_op == op && nth == seen => Err(MockError),
                _ => Ok(()),
            }
        }

        fn count(&self, op: PwmOp) -> usize {
            self.calls.iter().filter(|c| c.op() == op).count()
        }

        /// Calls made after `Buzzer::new` finished its setup.
        fn after_init(&self) -> &[Call] {
            &self.calls[3..]
        }
    }

    impl PwmPeripheral for MockPwm {
        type Error = MockError;

        fn configure_timer(&mut self, config: &TimerConfig) -> core::result::Result<(), MockError> {
            self.record(Call::ConfigureTimer(*config))
        }

        fn configure_channel(
            &mut self,
            config: &ChannelConfig,
        ) -> core::result::Result<(), MockError> {
            self.record(Call::ConfigureChannel(*config))
        }

        fn pause_timer(&mut self, _: SpeedMode, _: TimerId) -> core::result::Result<(), MockError> {
            self.record(Call::Pause)
        }

        fn resume_timer(&mut self, _: SpeedMode, _: TimerId) -> core::result::Result<(), MockError> {
            self.record(Call::Resume)
        }

        fn set_timer_frequency(
            &mut self,
            _: SpeedMode,
            _: TimerId,
            freq_hz: u32,
        ) -> core::result::Result<(), MockError> {
            self.record(Call::SetFrequency(freq_hz))
        }

        fn set_channel_duty(
            &mut self,
            _: SpeedMode,
            _: ChannelId,
            duty: u32,
        ) -> core::result::Result<(), MockError> {
            self.record(Call::SetDuty(duty))
        }

        fn commit_duty(&mut self, _: SpeedMode, _: ChannelId) -> core::result::Result<(), MockError> {
            self.record(Call::CommitDuty)
        }
    }

    #[derive(Default)]
    struct MockDelay {
        sleeps_ms: Vec<u32>,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_ms(&mut self, ms: u32) {
            self.sleeps_ms.push(ms);
        }
    }

    fn buzzer<'a>(
        pwm: &'a mut MockPwm,
        delay: &'a mut MockDelay,
    ) -> Buzzer<&'a mut MockPwm, &'a mut MockDelay> {
        Buzzer::new(pwm, delay, ChannelId(1), TimerId(0), GpioNum(9))
    }

    #[test]
    fn test_new_configures_then_pauses() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let buzzer = buzzer(&mut pwm, &mut delay);

        assert!(!buzzer.is_playing());
        assert_eq!(buzzer.frequency(), 440);
        assert_eq!(buzzer.channel(), ChannelId(1));
        assert_eq!(buzzer.timer(), TimerId(0));
        buzzer.destroy();

        assert_eq!(
            pwm.calls,
            vec![
                Call::ConfigureTimer(TimerConfig {
                    speed_mode: SpeedMode::LowSpeed,
                    timer: TimerId(0),
                    freq_hz: 440,
                    duty_resolution_bits: 15,
                    clock: ClockSource::Auto,
                }),
                Call::ConfigureChannel(ChannelConfig {
                    speed_mode: SpeedMode::LowSpeed,
                    channel: ChannelId(1),
                    gpio: GpioNum(9),
                    timer: TimerId(0),
                    duty: 16384,
                    hpoint: 0,
                    interrupt: InterruptMode::Disabled,
                }),
                Call::Pause,
            ]
        );
    }

    #[test]
    fn test_new_ignores_configuration_failures() {
        let mut pwm = MockPwm::failing(PwmOp::ConfigureTimer, 0);
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        assert!(!buzzer.is_playing());
        assert_eq!(buzzer.frequency(), 440);
        assert!(buzzer.play().is_ok());
    }

    #[test]
    fn test_play_is_idempotent() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.play().unwrap();
        buzzer.play().unwrap();
        assert!(buzzer.is_playing());

        assert_eq!(pwm.after_init(), &[Call::Resume]);
    }

    #[test]
    fn test_pause_when_paused_is_noop() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        assert_eq!(buzzer.pause(), Ok(()));
        assert!(!buzzer.is_playing());

        assert!(pwm.after_init().is_empty());
    }

    #[test]
    fn test_failed_resume_keeps_state() {
        let mut pwm = MockPwm::failing(PwmOp::ResumeTimer, 0);
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        assert_eq!(
            buzzer.play(),
            Err(BuzzerError::Peripheral(PwmOp::ResumeTimer))
        );
        assert!(!buzzer.is_playing());

        // The second attempt goes through
        buzzer.play().unwrap();
        assert!(buzzer.is_playing());
    }

    #[test]
    fn test_failed_pause_keeps_state() {
        // call 0 is the pause during init
        let mut pwm = MockPwm::failing(PwmOp::PauseTimer, 1);
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.play().unwrap();
        assert_eq!(
            buzzer.pause(),
            Err(BuzzerError::Peripheral(PwmOp::PauseTimer))
        );
        assert!(buzzer.is_playing());
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        assert!(matches!(
            buzzer.set_frequency(0),
            Err(BuzzerError::InvalidArgument(_))
        ));
        assert_eq!(buzzer.frequency(), 440);

        assert_eq!(pwm.count(PwmOp::SetFrequency), 0);
    }

    #[test]
    fn test_same_frequency_is_reapplied() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.set_frequency(440).unwrap();
        buzzer.set_frequency(440).unwrap();

        assert_eq!(
            pwm.after_init(),
            &[Call::SetFrequency(440), Call::SetFrequency(440)]
        );
    }

    #[test]
    fn test_failed_frequency_keeps_cache() {
        let mut pwm = MockPwm::failing(PwmOp::SetFrequency, 1);
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.set_frequency(1000).unwrap();
        assert_eq!(
            buzzer.set_frequency(2000),
            Err(BuzzerError::Peripheral(PwmOp::SetFrequency))
        );
        assert_eq!(buzzer.frequency(), 1000);
    }

    #[test]
    fn test_set_note_truncates_frequency() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.set_note(Note::C, 4).unwrap();
        assert_eq!(buzzer.frequency(), 261);
        buzzer.set_note(Note::A, 5).unwrap();
        assert_eq!(buzzer.frequency(), 880);

        assert!(buzzer.set_note(Note::Rest, 4).is_err());
        assert!(buzzer.set_note(Note::Max, 4).is_err());
        assert_eq!(buzzer.frequency(), 880);
    }

    #[test]
    fn test_play_for_ends_paused() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.play_for(250).unwrap();
        assert!(!buzzer.is_playing());

        buzzer.play().unwrap();
        buzzer.play_for(100).unwrap();
        assert!(!buzzer.is_playing());

        assert_eq!(
            pwm.after_init(),
            &[Call::Resume, Call::Pause, Call::Resume, Call::Pause]
        );
        assert_eq!(delay.sleeps_ms, vec![250, 100]);
    }

    #[test]
    fn test_play_for_skips_sleep_when_play_fails() {
        let mut pwm = MockPwm::failing(PwmOp::ResumeTimer, 0);
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        assert!(buzzer.play_for(250).is_err());
        assert!(delay.sleeps_ms.is_empty());
    }

    #[test]
    fn test_rest_restores_playing() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.play().unwrap();
        buzzer.rest_for(300).unwrap();
        assert!(buzzer.is_playing());

        assert_eq!(
            pwm.after_init(),
            &[Call::Resume, Call::Pause, Call::Resume]
        );
        assert_eq!(delay.sleeps_ms, vec![300]);
    }

    #[test]
    fn test_rest_keeps_paused() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.rest_for(300).unwrap();
        assert!(!buzzer.is_playing());

        assert!(pwm.after_init().is_empty());
        assert_eq!(delay.sleeps_ms, vec![300]);
    }

    #[test]
    fn test_rest_note_only_sleeps() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        let melody = [MusicalNote::rest(NoteType::Crotchet)];
        buzzer.play_melody(&melody, 120).unwrap();

        assert_eq!(delay.sleeps_ms, vec![500]);
        assert_eq!(pwm.count(PwmOp::SetFrequency), 0);
    }

    #[test]
    fn test_play_note_sets_frequency_then_plays() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        let note = MusicalNote::new(Note::A, 4, NoteType::Minim);
        buzzer.play_note(&note, 90).unwrap();
        assert!(!buzzer.is_playing());

        assert_eq!(
            pwm.after_init(),
            &[Call::SetFrequency(440), Call::Resume, Call::Pause]
        );
        assert_eq!(delay.sleeps_ms, vec![1332]);
    }

    #[test]
    fn test_play_note_zero_bpm_rejected() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        let note = MusicalNote::new(Note::A, 4, NoteType::Crotchet);
        assert!(matches!(
            buzzer.play_note(&note, 0),
            Err(BuzzerError::InvalidArgument(_))
        ));
        assert!(matches!(
            buzzer.play_melody(&[note], 0),
            Err(BuzzerError::InvalidArgument(_))
        ));

        assert!(pwm.after_init().is_empty());
        assert!(delay.sleeps_ms.is_empty());
    }

    #[test]
    fn test_play_note_for() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.play_note_for(Note::E, 5, 42).unwrap();
        assert_eq!(buzzer.frequency(), 659);

        assert_eq!(
            pwm.after_init(),
            &[Call::SetFrequency(659), Call::Resume, Call::Pause]
        );
        assert_eq!(delay.sleeps_ms, vec![42]);
    }

    #[test]
    fn test_melody_stops_at_first_failure() {
        let mut pwm = MockPwm::failing(PwmOp::SetFrequency, 2);
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        let melody = [
            MusicalNote::new(Note::C, 4, NoteType::Crotchet),
            MusicalNote::new(Note::D, 4, NoteType::Crotchet),
            MusicalNote::new(Note::E, 4, NoteType::Crotchet),
            MusicalNote::new(Note::F, 4, NoteType::Crotchet),
        ];
        assert_eq!(
            buzzer.play_melody(&melody, 120),
            Err(BuzzerError::Peripheral(PwmOp::SetFrequency))
        );
        // The first two notes stay played
        assert_eq!(buzzer.frequency(), 293);
        assert!(!buzzer.is_playing());

        assert_eq!(pwm.count(PwmOp::SetFrequency), 3);
        assert_eq!(pwm.count(PwmOp::ResumeTimer), 2);
        assert_eq!(delay.sleeps_ms, vec![500, 500]);
    }

    #[test]
    fn test_self_test_plays_every_note() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.play_self_test(120).unwrap();
        assert!(!buzzer.is_playing());
        // last note is F4
        assert_eq!(buzzer.frequency(), 349);

        assert_eq!(pwm.count(PwmOp::SetFrequency), 25);
        assert_eq!(delay.sleeps_ms.len(), 25);
        assert_eq!(delay.sleeps_ms.iter().sum::<u32>(), 12_000);
    }

    #[test]
    fn test_volume_sets_and_commits_duty() {
        let mut pwm = MockPwm::default();
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        buzzer.set_volume(50).unwrap();
        buzzer.set_volume(0).unwrap();
        buzzer.set_volume(250).unwrap();

        assert_eq!(
            pwm.after_init(),
            &[
                Call::SetDuty(16384),
                Call::CommitDuty,
                Call::SetDuty(0),
                Call::CommitDuty,
                Call::SetDuty(32768),
                Call::CommitDuty,
            ]
        );
    }

    #[test]
    fn test_volume_not_committed_when_duty_fails() {
        let mut pwm = MockPwm::failing(PwmOp::SetDuty, 0);
        let mut delay = MockDelay::default();
        let mut buzzer = buzzer(&mut pwm, &mut delay);

        assert_eq!(
            buzzer.set_volume(30),
            Err(BuzzerError::Peripheral(PwmOp::SetDuty))
        );
        assert_eq!(pwm.count(PwmOp::CommitDuty), 0);
    }

    #[test]
    fn test_release_returns_collaborators() {
        let buzzer = Buzzer::new(
            MockPwm::default(),
            MockDelay::default(),
            ChannelId(0),
            TimerId(1),
            GpioNum(4),
        );
        let (pwm, delay) = buzzer.release();

        assert_eq!(pwm.calls.len(), 3);
        assert!(delay.sleeps_ms.is_empty());
    }
}
