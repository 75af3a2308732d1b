//! Terminal control panel for the simulated buzzer.
//!
//! Shows the simulated LEDC state next to the player status, streams log
//! records into a scrolling pane and turns key presses into
//! [`PanelCommand`]s for the player thread.

use std::io;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

use buzzer_core::Note;
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{Level, LevelFilter, Metadata, Record};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
};

use crate::player::{PanelCommand, SharedStatus};
use crate::sim_pwm::SharedPwmState;

const MAX_LOGS: usize = 200;
const MIN_OCTAVE: u8 = 1;
const MAX_OCTAVE: u8 = 7;

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    fn level_style(&self) -> Style {
        let style = Style::default();
        match self.level {
            Level::Error => style.fg(Color::Red).add_modifier(Modifier::BOLD),
            Level::Warn => style.fg(Color::Yellow),
            Level::Info => style.fg(Color::Green),
            Level::Debug => style.fg(Color::Gray),
            Level::Trace => style.fg(Color::DarkGray),
        }
    }

    /// `LEVEL target: message`, with the level padded to one column.
    fn to_line(&self) -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:<5} ", self.level), self.level_style()),
            Span::styled(self.target.as_str(), Style::default().fg(Color::DarkGray)),
            Span::raw(": "),
            Span::raw(self.message.as_str()),
        ])
    }
}

/// Forwards log records to the panel's log pane.
pub struct TuiLogger {
    tx: Sender<LogEntry>,
}

impl log::Log for TuiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let entry = LogEntry {
                level: record.level(),
                target: record.target().to_string(),
                message: format!("{}", record.args()),
            };
            // the panel may already be gone
            let _ = self.tx.send(entry);
        }
    }

    fn flush(&self) {}
}

/// Route the `log` facade into a panel. Returns `None` if a logger is
/// already installed.
pub fn init_logger(max_level: LevelFilter) -> Option<Receiver<LogEntry>> {
    let (tx, rx) = channel();
    log::set_boxed_logger(Box::new(TuiLogger { tx })).ok()?;
    log::set_max_level(max_level);
    Some(rx)
}

/// Tracker-style piano row: `z s x d c v g b h n j m` covers one octave.
fn piano_key(c: char) -> Option<Note> {
    Some(match c {
        'z' => Note::C,
        's' => Note::Cs,
        'x' => Note::D,
        'd' => Note::Ds,
        'c' => Note::E,
        'v' => Note::F,
        'g' => Note::Fs,
        'b' => Note::G,
        'h' => Note::Gs,
        'n' => Note::A,
        'j' => Note::As,
        'm' => Note::B,
        _ => return None,
    })
}

struct ControlPanel {
    pwm: SharedPwmState,
    status: SharedStatus,
    commands: Sender<PanelCommand>,
    logs: Vec<LogEntry>,
    log_rx: Option<Receiver<LogEntry>>,
    octave: u8,
    should_quit: bool,
}

impl ControlPanel {
    fn collect_logs(&mut self) {
        let Some(rx) = &self.log_rx else {
            return;
        };
        while let Ok(entry) = rx.try_recv() {
            self.logs.push(entry);
        }
        let excess = self.logs.len().saturating_sub(MAX_LOGS);
        self.logs.drain(..excess);
    }

    fn send(&mut self, command: PanelCommand) {
        if self.commands.send(command).is_err() {
            // player thread is gone, nothing left to control
            self.should_quit = true;
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                log::info!("Ctrl+C pressed, shutting down");
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('t') => self.send(PanelCommand::SelfTest),
            KeyCode::Char(' ') => self.send(PanelCommand::Stop),
            KeyCode::Up => self.send(PanelCommand::VolumeUp),
            KeyCode::Down => self.send(PanelCommand::VolumeDown),
            KeyCode::Right => self.send(PanelCommand::TempoUp),
            KeyCode::Left => self.send(PanelCommand::TempoDown),
            KeyCode::Char('[') => self.octave = self.octave.saturating_sub(1).max(MIN_OCTAVE),
            KeyCode::Char(']') => self.octave = (self.octave + 1).min(MAX_OCTAVE),
            KeyCode::Char(c) => {
                if let Some(note) = piano_key(c) {
                    self.send(PanelCommand::PlayNote(note, self.octave));
                }
            }
            _ => {}
        }
    }
}

/// Runs a closure when dropped.
struct OnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        (self.0)()
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Run the panel on the current thread until the user quits. Sends
/// [`PanelCommand::Quit`] on the way out.
///
/// The terminal is restored however this returns, including when setup
/// fails halfway.
pub fn run(
    pwm: SharedPwmState,
    status: SharedStatus,
    commands: Sender<PanelCommand>,
    log_rx: Option<Receiver<LogEntry>>,
) -> io::Result<()> {
    let mut panel = ControlPanel {
        pwm,
        status,
        commands,
        logs: Vec::new(),
        log_rx,
        octave: 4,
        should_quit: false,
    };

    let result = (|| -> io::Result<()> {
        enable_raw_mode()?;
        let _restore = OnDrop(restore_terminal);

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        event_loop(&mut terminal, &mut panel)
    })();

    let _ = panel.commands.send(PanelCommand::Quit);
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    panel: &mut ControlPanel,
) -> io::Result<()> {
    while !panel.should_quit {
        panel.collect_logs();
        terminal.draw(|f| ui(f, panel))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                panel.on_key(key);
            }
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, panel: &ControlPanel) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(f.area());

    let title = Paragraph::new("Buzzer Control Panel")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_pwm(f, middle[0], panel);
    render_player(f, middle[1], panel);

    render_logs(f, chunks[2], panel);

    let help = Paragraph::new(
        "t: self-test | space: stop | z..m: play note | [/]: octave | ↑/↓: volume | ←/→: tempo | q/Esc: quit",
    )
    .style(Style::default().fg(Color::Gray))
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, chunks[3]);
}

fn render_pwm(f: &mut Frame, area: Rect, panel: &ControlPanel) {
    let block = Block::default().borders(Borders::ALL).title("LEDC");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let pwm = *panel.pwm.lock().unwrap_or_else(|e| e.into_inner());

    let (output, style) = if pwm.is_sounding() {
        ("SOUNDING", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        ("silent", Style::default().fg(Color::DarkGray))
    };
    let describe = |id: Option<u8>| id.map_or_else(|| "-".to_string(), |id| id.to_string());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(2)])
        .split(inner);

    let lines = vec![
        Line::from(vec![Span::raw("output:    "), Span::styled(output, style)]),
        Line::from(format!("frequency: {} Hz", pwm.freq_hz)),
        Line::from(format!(
            "timer {} / channel {}",
            describe(pwm.timer.map(|t| t.0)),
            describe(pwm.channel.map(|c| c.0)),
        )),
        Line::from(format!(
            "gpio:      {}",
            pwm.gpio.map_or_else(|| "-".to_string(), |g| g.to_string())
        )),
        Line::from(format!("resolution: {} bits", pwm.resolution_bits)),
    ];
    f.render_widget(Paragraph::new(lines), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Yellow))
        .ratio(f64::from(pwm.duty_fraction()))
        .label(format!("duty {}/{}", pwm.duty, pwm.max_duty()));
    f.render_widget(gauge, rows[1]);
}

fn render_player(f: &mut Frame, area: Rect, panel: &ControlPanel) {
    let block = Block::default().borders(Borders::ALL).title("Player");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let status = panel.status.lock().unwrap_or_else(|e| e.into_inner()).clone();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(2)])
        .split(inner);

    let mut lines = vec![
        Line::from(format!("tempo:  {} bpm", status.bpm)),
        Line::from(format!("volume: {}%", status.volume)),
        Line::from(format!("octave: {}", panel.octave)),
        Line::from(format!(
            "now:    {}",
            status.now_playing.as_deref().unwrap_or("-")
        )),
    ];
    if let Some(error) = &status.last_error {
        lines.push(Line::from(Span::styled(
            format!("error:  {error}"),
            Style::default().fg(Color::Red),
        )));
    }
    f.render_widget(Paragraph::new(lines), rows[0]);

    let (played, total) = status.progress.unwrap_or((0, 0));
    let ratio = if total == 0 {
        0.0
    } else {
        played as f64 / total as f64
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(format!("{played}/{total} notes"));
    f.render_widget(gauge, rows[1]);
}

fn render_logs(f: &mut Frame, area: Rect, panel: &ControlPanel) {
    let block = Block::default().borders(Borders::ALL).title("Logs");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let visible = inner.height as usize;
    let start = panel.logs.len().saturating_sub(visible);

    let items: Vec<ListItem> = panel.logs[start..]
        .iter()
        .map(|entry| ListItem::new(entry.to_line()))
        .collect();

    f.render_widget(List::new(items), inner);
}
