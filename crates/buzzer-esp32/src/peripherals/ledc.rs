//! LEDC backend for the buzzer
//!
//! Implements [`PwmPeripheral`] on top of the ESP-IDF LEDC driver. The
//! high-level `LedcTimerDriver` has no pause/resume, so the calls go straight
//! to the C driver. The LEDC handles are held to keep the timer and channel
//! exclusive to the buzzer.

use buzzer_core::peripheral::{
    ChannelConfig, ClockSource, InterruptMode, SpeedMode, TimerConfig,
};
use buzzer_core::{ChannelId, GpioNum, PwmPeripheral, TimerId};
use esp_idf_hal::gpio::{AnyOutputPin, Pin};
use esp_idf_hal::ledc::{LedcChannel, LedcTimer};
use esp_idf_svc::sys::{self, esp, EspError};

pub struct EspLedc<T, C> {
    _timer: T,
    _channel: C,
    pin: AnyOutputPin,
}

impl<T: LedcTimer, C: LedcChannel> EspLedc<T, C> {
    pub fn new(timer: T, channel: C, pin: AnyOutputPin) -> Self {
        Self {
            _timer: timer,
            _channel: channel,
            pin,
        }
    }

    pub fn timer_id(&self) -> TimerId {
        TimerId(T::timer() as u8)
    }

    pub fn channel_id(&self) -> ChannelId {
        ChannelId(C::channel() as u8)
    }

    pub fn gpio(&self) -> GpioNum {
        GpioNum(self.pin.pin())
    }
}

fn not_supported() -> EspError {
    EspError::from_infallible::<{ sys::ESP_ERR_NOT_SUPPORTED }>()
}

fn speed_mode(mode: SpeedMode) -> Result<sys::ledc_mode_t, EspError> {
    match mode {
        SpeedMode::LowSpeed => Ok(sys::ledc_mode_t_LEDC_LOW_SPEED_MODE),
        #[cfg(esp32)]
        SpeedMode::HighSpeed => Ok(sys::ledc_mode_t_LEDC_HIGH_SPEED_MODE),
        // Only the classic ESP32 has a high-speed group
        #[cfg(not(esp32))]
        SpeedMode::HighSpeed => Err(not_supported()),
    }
}

fn clock_source(clock: ClockSource) -> Result<sys::ledc_clk_cfg_t, EspError> {
    match clock {
        ClockSource::Auto => Ok(sys::soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK),
        ClockSource::Apb => Ok(sys::soc_periph_ledc_clk_src_legacy_t_LEDC_USE_APB_CLK),
        ClockSource::RcFast => Ok(sys::soc_periph_ledc_clk_src_legacy_t_LEDC_USE_RC_FAST_CLK),
        #[cfg(not(esp32))]
        ClockSource::Xtal => Ok(sys::soc_periph_ledc_clk_src_legacy_t_LEDC_USE_XTAL_CLK),
        #[cfg(esp32)]
        ClockSource::Xtal => Err(not_supported()),
    }
}

fn interrupt_type(interrupt: InterruptMode) -> sys::ledc_intr_type_t {
    match interrupt {
        InterruptMode::Disabled => sys::ledc_intr_type_t_LEDC_INTR_DISABLE,
        InterruptMode::FadeEnd => sys::ledc_intr_type_t_LEDC_INTR_FADE_END,
    }
}

impl<T: LedcTimer, C: LedcChannel> PwmPeripheral for EspLedc<T, C> {
    type Error = EspError;

    fn configure_timer(&mut self, config: &TimerConfig) -> Result<(), EspError> {
        let timer_config = sys::ledc_timer_config_t {
            speed_mode: speed_mode(config.speed_mode)?,
            timer_num: config.timer.0 as sys::ledc_timer_t,
            freq_hz: config.freq_hz,
            // LEDC_TIMER_n_BIT has the value n
            duty_resolution: config.duty_resolution_bits as sys::ledc_timer_bit_t,
            clk_cfg: clock_source(config.clock)?,
            ..Default::default()
        };
        log::debug!(
            "LEDC timer {}: {} Hz, {}-bit",
            config.timer.0,
            config.freq_hz,
            config.duty_resolution_bits
        );
        esp!(unsafe { sys::ledc_timer_config(&timer_config) })
    }

    fn configure_channel(&mut self, config: &ChannelConfig) -> Result<(), EspError> {
        let channel_config = sys::ledc_channel_config_t {
            gpio_num: config.gpio.0,
            speed_mode: speed_mode(config.speed_mode)?,
            channel: config.channel.0 as sys::ledc_channel_t,
            intr_type: interrupt_type(config.interrupt),
            timer_sel: config.timer.0 as sys::ledc_timer_t,
            duty: config.duty,
            hpoint: config.hpoint,
            ..Default::default()
        };
        log::debug!(
            "LEDC channel {} on GPIO{} (duty {})",
            config.channel.0,
            config.gpio.0,
            config.duty
        );
        esp!(unsafe { sys::ledc_channel_config(&channel_config) })
    }

    fn pause_timer(&mut self, mode: SpeedMode, timer: TimerId) -> Result<(), EspError> {
        esp!(unsafe { sys::ledc_timer_pause(speed_mode(mode)?, timer.0 as sys::ledc_timer_t) })
    }

    fn resume_timer(&mut self, mode: SpeedMode, timer: TimerId) -> Result<(), EspError> {
        esp!(unsafe { sys::ledc_timer_resume(speed_mode(mode)?, timer.0 as sys::ledc_timer_t) })
    }

    fn set_timer_frequency(
        &mut self,
        mode: SpeedMode,
        timer: TimerId,
        freq_hz: u32,
    ) -> Result<(), EspError> {
        esp!(unsafe {
            sys::ledc_set_freq(speed_mode(mode)?, timer.0 as sys::ledc_timer_t, freq_hz)
        })
    }

    fn set_channel_duty(
        &mut self,
        mode: SpeedMode,
        channel: ChannelId,
        duty: u32,
    ) -> Result<(), EspError> {
        esp!(unsafe {
            sys::ledc_set_duty(speed_mode(mode)?, channel.0 as sys::ledc_channel_t, duty)
        })
    }

    fn commit_duty(&mut self, mode: SpeedMode, channel: ChannelId) -> Result<(), EspError> {
        esp!(unsafe { sys::ledc_update_duty(speed_mode(mode)?, channel.0 as sys::ledc_channel_t) })
    }
}
