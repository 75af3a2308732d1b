//! Speaker output for the simulated PWM.
//!
//! With the `audio` feature the timer output is rendered as a square wave on
//! the default sound device. Without it, [`Speaker::open`] always fails and
//! the simulation stays silent.

#[cfg(feature = "audio")]
pub use rodio_speaker::Speaker;

#[cfg(not(feature = "audio"))]
pub use silent::Speaker;

#[cfg(feature = "audio")]
mod rodio_speaker {
    use std::time::Duration;

    use anyhow::Context as _;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    const SAMPLE_RATE: u32 = 48000;
    const AMPLITUDE: f32 = 0.15;

    /// Endless square wave, high for `duty` of each period.
    struct SquareWave {
        step: f32,
        duty: f32,
        phase: f32,
    }

    impl SquareWave {
        fn new(frequency: f32, duty: f32) -> Self {
            Self {
                step: frequency / SAMPLE_RATE as f32,
                duty,
                phase: 0.0,
            }
        }
    }

    impl Iterator for SquareWave {
        type Item = f32;

        fn next(&mut self) -> Option<Self::Item> {
            let high = self.phase < self.duty;
            self.phase = (self.phase + self.step).fract();

            Some(if high { AMPLITUDE } else { -AMPLITUDE })
        }
    }

    impl Source for SquareWave {
        fn current_frame_len(&self) -> Option<usize> {
            None
        }

        fn channels(&self) -> u16 {
            1
        }

        fn sample_rate(&self) -> u32 {
            SAMPLE_RATE
        }

        fn total_duration(&self) -> Option<Duration> {
            None
        }
    }

    pub struct Speaker {
        // dropping the stream closes the device
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sink: Option<Sink>,
    }

    impl Speaker {
        pub fn open() -> anyhow::Result<Self> {
            let (stream, handle) =
                OutputStream::try_default().context("no audio output device")?;

            Ok(Self {
                _stream: stream,
                handle,
                sink: None,
            })
        }

        /// Replace whatever is playing with a tone at `frequency_hz`.
        pub fn start(&mut self, frequency_hz: u32, duty: f32) {
            self.stop();
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.append(SquareWave::new(frequency_hz as f32, duty));
                    self.sink = Some(sink);
                }
                Err(e) => log::warn!("Failed to play tone: {}", e),
            }
        }

        pub fn stop(&mut self) {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
        }
    }
}

#[cfg(not(feature = "audio"))]
mod silent {
    pub struct Speaker;

    impl Speaker {
        pub fn open() -> anyhow::Result<Self> {
            anyhow::bail!("built without the `audio` feature")
        }

        pub fn start(&mut self, _frequency_hz: u32, _duty: f32) {}

        pub fn stop(&mut self) {}
    }
}
