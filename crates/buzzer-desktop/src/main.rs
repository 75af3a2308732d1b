use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::thread;

use anyhow::{Context as _, anyhow};
use buzzer_core::{Buzzer, ChannelId, GpioNum, MusicalNote, Note, TimerId};
use clap::{Parser, Subcommand, value_parser};
use log::LevelFilter;

use crate::audio::Speaker;
use crate::delay::TickDelay;
use crate::player::{PanelCommand, Player, PlayerStatus};
use crate::sim_pwm::{SharedPwmState, SimulatedPwm};

mod audio;
mod console_log;
mod delay;
mod panel;
mod player;
mod sim_pwm;

/// Same pin the board drives its buzzer from
const BUZZER_GPIO: i32 = 9;

type DesktopBuzzer = Buzzer<SimulatedPwm, TickDelay>;

/// Drive a simulated LEDC buzzer from the desktop.
#[derive(Parser, Debug, Clone)]
#[command(name = "buzzer-desktop", version, about)]
struct Cli {
    /// Tempo in crotchets per minute
    #[arg(long, default_value_t = 120, value_parser = value_parser!(u32).range(1..))]
    bpm: u32,

    /// Scheduler tick; every delay is truncated to a multiple of it
    #[arg(long, default_value_t = 10)]
    tick_ms: u32,

    /// Volume in percent of the full duty range
    #[arg(long, default_value_t = 50, value_parser = value_parser!(u8).range(0..=100))]
    volume: u8,

    /// Keep the speaker closed, only simulate the peripheral
    #[arg(long)]
    mute: bool,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Play the built-in self-test melody (default)
    SelfTest,
    /// Play one note for a fixed time
    Note {
        /// Note name, e.g. `A`, `C#`, `Fs`
        note: Note,
        #[arg(value_parser = value_parser!(u8).range(0..=8))]
        octave: u8,
        duration_ms: u32,
    },
    /// Play a raw frequency for a fixed time
    Freq {
        #[arg(value_parser = value_parser!(u32).range(1..))]
        hz: u32,
        duration_ms: u32,
    },
    /// Play a melody written as `NOTE:TYPE` tokens, e.g. `C4:crotchet rest:quaver E4:minim.`
    Play {
        #[arg(required = true)]
        notes: Vec<MusicalNote>,
    },
    /// Interactive control panel
    Panel,
}

fn open_speaker(mute: bool) -> Option<Speaker> {
    if mute {
        return None;
    }
    match Speaker::open() {
        Ok(speaker) => Some(speaker),
        Err(e) => {
            log::warn!("Audio output disabled: {:#}", e);
            None
        }
    }
}

fn build_buzzer(cli: &Cli, pwm_state: &SharedPwmState) -> anyhow::Result<DesktopBuzzer> {
    let pwm = SimulatedPwm::new(Arc::clone(pwm_state), open_speaker(cli.mute));
    let mut buzzer = Buzzer::new(
        pwm,
        TickDelay::new(cli.tick_ms),
        ChannelId(0),
        TimerId(0),
        GpioNum(BUZZER_GPIO),
    );
    buzzer
        .set_volume(cli.volume)
        .context("failed to set volume")?;
    Ok(buzzer)
}

fn run_panel(cli: &Cli, log_rx: Option<Receiver<panel::LogEntry>>) -> anyhow::Result<()> {
    let pwm_state = SharedPwmState::default();
    let status = PlayerStatus::shared(cli.bpm, cli.volume);
    let (tx, rx) = channel::<PanelCommand>();

    // the audio stream can't cross threads, so the buzzer is built on the player thread
    let player = {
        let cli = cli.clone();
        let pwm_state = Arc::clone(&pwm_state);
        let status = Arc::clone(&status);
        thread::Builder::new()
            .name("player".to_string())
            .spawn(move || -> anyhow::Result<()> {
                let buzzer = build_buzzer(&cli, &pwm_state)?;
                Player::new(buzzer, status, rx).run().destroy();
                Ok(())
            })
            .context("failed to spawn player thread")?
    };

    panel::run(pwm_state, status, tx, log_rx).context("control panel failed")?;

    player
        .join()
        .map_err(|_| anyhow!("player thread panicked"))?
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::SelfTest);

    if let Command::Panel = command {
        let log_rx = panel::init_logger(cli.log_level);
        return run_panel(&cli, log_rx);
    }

    console_log::init(cli.log_level);
    let pwm_state = SharedPwmState::default();
    let mut buzzer = build_buzzer(&cli, &pwm_state)?;

    let result = match &command {
        Command::SelfTest => buzzer
            .play_self_test(cli.bpm)
            .context("self-test melody failed"),
        Command::Note {
            note,
            octave,
            duration_ms,
        } => buzzer
            .play_note_for(*note, *octave, *duration_ms)
            .with_context(|| format!("failed to play {note}{octave}")),
        Command::Freq { hz, duration_ms } => buzzer
            .set_frequency(*hz)
            .and_then(|()| buzzer.play_for(*duration_ms))
            .with_context(|| format!("failed to play {hz} Hz")),
        Command::Play { notes } => buzzer
            .play_melody(notes, cli.bpm)
            .context("melody failed"),
        Command::Panel => unreachable!("handled above"),
    };

    // a failure midway can leave the timer running
    if result.is_err() {
        let _ = buzzer.pause();
    }
    buzzer.destroy();

    result
}
