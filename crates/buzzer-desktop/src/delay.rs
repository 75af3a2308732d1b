use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// Blocking delay that behaves like an RTOS tick delay: requests are
/// truncated to a whole number of ticks, so anything shorter than one tick
/// returns immediately.
pub struct TickDelay {
    tick_ms: u32,
}

impl TickDelay {
    pub fn new(tick_ms: u32) -> Self {
        Self {
            tick_ms: tick_ms.max(1),
        }
    }

    /// Milliseconds actually slept for a request of `ms`.
    pub fn quantize(&self, ms: u32) -> u32 {
        ms / self.tick_ms * self.tick_ms
    }
}

impl DelayNs for TickDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        let ms = self.quantize(ms);
        if ms > 0 {
            thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }
}
