//! Player thread behind the control panel.
//!
//! Owns the buzzer and plays whatever the panel asks for. Melodies are played
//! note by note so a stop request is honoured at the next note boundary.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};

use buzzer_core::melodies::SELF_TEST;
use buzzer_core::{Buzzer, Melody, MusicalNote, Note, NoteType, PwmPeripheral, TAG};
use embedded_hal::delay::DelayNs;

const BPM_STEP: u32 = 10;
const MIN_BPM: u32 = 30;
const MAX_BPM: u32 = 300;
const VOLUME_STEP: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    SelfTest,
    Stop,
    PlayNote(Note, u8),
    TempoUp,
    TempoDown,
    VolumeUp,
    VolumeDown,
    Quit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStatus {
    pub bpm: u32,
    pub volume: u8,
    pub now_playing: Option<String>,
    /// Notes played and total notes of the running melody
    pub progress: Option<(usize, usize)>,
    pub last_error: Option<String>,
}

impl PlayerStatus {
    pub fn shared(bpm: u32, volume: u8) -> SharedStatus {
        Arc::new(Mutex::new(Self {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            volume: volume.min(100),
            ..Default::default()
        }))
    }
}

pub type SharedStatus = Arc<Mutex<PlayerStatus>>;

enum Flow {
    Continue,
    Stop,
    Quit,
}

pub struct Player<P, D> {
    buzzer: Buzzer<P, D>,
    status: SharedStatus,
    commands: Receiver<PanelCommand>,
}

impl<P, D> Player<P, D>
where
    P: PwmPeripheral,
    D: DelayNs,
{
    pub fn new(
        buzzer: Buzzer<P, D>,
        status: SharedStatus,
        commands: Receiver<PanelCommand>,
    ) -> Self {
        Self {
            buzzer,
            status,
            commands,
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, PlayerStatus> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn report<T>(&mut self, what: &str, result: buzzer_core::Result<T>) {
        if let Err(err) = result {
            log::error!(target: TAG, "{} failed: {}", what, err);
            self.lock_status().last_error = Some(format!("{what}: {err}"));
        }
    }

    /// Serve commands until `Quit` arrives or the panel goes away. Hands the
    /// buzzer back, silenced.
    pub fn run(mut self) -> Buzzer<P, D> {
        while let Ok(command) = self.commands.recv() {
            if let Flow::Quit = self.handle(command, false) {
                break;
            }
        }
        let result = self.buzzer.pause();
        self.report("pause", result);
        self.buzzer
    }

    fn handle(&mut self, command: PanelCommand, in_melody: bool) -> Flow {
        match command {
            PanelCommand::Quit => return Flow::Quit,
            PanelCommand::Stop => {
                let result = self.buzzer.pause();
                self.report("stop", result);
                return Flow::Stop;
            }
            PanelCommand::TempoUp | PanelCommand::TempoDown => {
                let mut status = self.lock_status();
                status.bpm = match command {
                    PanelCommand::TempoUp => status.bpm + BPM_STEP,
                    _ => status.bpm.saturating_sub(BPM_STEP),
                }
                .clamp(MIN_BPM, MAX_BPM);
                log::info!(target: TAG, "tempo {} bpm", status.bpm);
            }
            PanelCommand::VolumeUp | PanelCommand::VolumeDown => {
                let volume = {
                    let mut status = self.lock_status();
                    status.volume = match command {
                        PanelCommand::VolumeUp => status.volume.saturating_add(VOLUME_STEP),
                        _ => status.volume.saturating_sub(VOLUME_STEP),
                    }
                    .min(100);
                    status.volume
                };
                let result = self.buzzer.set_volume(volume);
                self.report("set volume", result);
            }
            PanelCommand::SelfTest | PanelCommand::PlayNote(..) if in_melody => {
                log::debug!(target: TAG, "busy, ignoring {:?}", command);
            }
            PanelCommand::SelfTest => {
                log::info!(target: TAG, "self-test requested");
                return self.play_melody("self-test", SELF_TEST);
            }
            PanelCommand::PlayNote(note, octave) => {
                let note = MusicalNote::new(note, octave, NoteType::Quaver);
                let bpm = self.lock_status().bpm;
                let result = self.buzzer.play_note(&note, bpm);
                self.report("play note", result);
            }
        }
        Flow::Continue
    }

    /// Play `melody`, checking for commands between notes.
    fn play_melody(&mut self, name: &str, melody: Melody<'_>) -> Flow {
        {
            let mut status = self.lock_status();
            status.now_playing = Some(name.to_string());
            status.progress = Some((0, melody.len()));
            status.last_error = None;
        }

        let mut flow = Flow::Continue;
        for (played, note) in melody.iter().enumerate() {
            let bpm = self.lock_status().bpm;
            if let Err(err) = self.buzzer.play_note(note, bpm) {
                self.report::<()>(name, Err(err));
                break;
            }
            self.lock_status().progress = Some((played + 1, melody.len()));

            match self.commands.try_recv() {
                Ok(command) => match self.handle(command, true) {
                    Flow::Continue => {}
                    stop => {
                        flow = stop;
                        break;
                    }
                },
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    flow = Flow::Quit;
                    break;
                }
            }
        }

        // a failed or interrupted note may leave the output running
        let result = self.buzzer.pause();
        self.report("pause", result);

        let mut status = self.lock_status();
        status.now_playing = None;
        status.progress = None;
        match flow {
            Flow::Quit => Flow::Quit,
            _ => Flow::Continue,
        }
    }
}
