mod ledc;

pub use ledc::EspLedc;

use buzzer_core::Buzzer;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin};
use esp_idf_hal::ledc::{CHANNEL0, TIMER0};
use esp_idf_hal::peripherals::Peripherals;

/// The buzzer as wired on this board.
pub type BoardBuzzer = Buzzer<EspLedc<TIMER0, CHANNEL0>, FreeRtos>;

pub struct BuzzerPeripherals {
    pub timer: TIMER0,
    pub channel: CHANNEL0,
    pub buzzer_pin: AnyOutputPin, // GPIO9
    /// Active low, replays the self-test when pressed
    pub button: AnyInputPin, // GPIO0 (BOOT button)
}

impl BuzzerPeripherals {
    pub fn take() -> anyhow::Result<Self> {
        let peripherals = Peripherals::take()?;

        Ok(BuzzerPeripherals {
            timer: peripherals.ledc.timer0,
            channel: peripherals.ledc.channel0,
            buzzer_pin: peripherals.pins.gpio9.into(),
            button: peripherals.pins.gpio0.into(),
        })
    }
}
