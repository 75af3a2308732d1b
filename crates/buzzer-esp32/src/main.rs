use esp_idf_hal::{delay::FreeRtos, gpio::PinDriver};

mod peripherals;

use peripherals::{BoardBuzzer, BuzzerPeripherals, EspLedc};

/// Tempo of the self-test played at boot and on every BOOT button press
const SELF_TEST_BPM: u32 = 120;

/// Percent of the duty range, 50 gives a symmetric square wave
const VOLUME_PERCENT: u8 = 50;

const BUTTON_POLL_MS: u32 = 20;

fn main() -> anyhow::Result<()> {
    // It is necessary to call this function once. Otherwise, some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("Buzzer ESP32 starting...");

    let peripherals = BuzzerPeripherals::take()?;

    let button = PinDriver::input(peripherals.button)?;
    log::info!("Button configured on GPIO0");

    let ledc = EspLedc::new(peripherals.timer, peripherals.channel, peripherals.buzzer_pin);
    let (channel, timer, pin) = (ledc.channel_id(), ledc.timer_id(), ledc.gpio());
    let mut buzzer = BoardBuzzer::new(ledc, FreeRtos, channel, timer, pin);

    if let Err(e) = buzzer.set_volume(VOLUME_PERCENT) {
        log::warn!("Could not set buzzer volume: {}", e);
    }

    run_self_test(&mut buzzer);

    // GPIO0 is pulled high, button press pulls it low
    let mut button_pressed = false;
    loop {
        let button_is_low = button.is_low();
        if button_is_low && !button_pressed {
            log::info!("BOOT button pressed");
            run_self_test(&mut buzzer);
        }
        button_pressed = button_is_low;

        FreeRtos::delay_ms(BUTTON_POLL_MS);
    }
}

fn run_self_test(buzzer: &mut BoardBuzzer) {
    match buzzer.play_self_test(SELF_TEST_BPM) {
        Ok(()) => log::info!("Self-test melody finished"),
        Err(e) => {
            log::error!("Self-test melody failed: {}", e);
            // Don't leave a tone running after a failed note
            if let Err(e) = buzzer.pause() {
                log::error!("Could not silence buzzer: {}", e);
            }
        }
    }
}
