#![cfg_attr(not(test), no_std)]

pub mod buzzer;
pub mod consts;
pub mod error;
pub mod melodies;
pub mod music;
pub mod peripheral;

pub use buzzer::Buzzer;
pub use consts::TAG;
pub use error::{BuzzerError, Result};
pub use music::{Melody, MusicalNote, Note, NoteType};
pub use peripheral::{ChannelId, GpioNum, PwmPeripheral, TimerId};
