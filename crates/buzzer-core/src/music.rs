//! Music theory helpers
//!
//! Turns (note, octave) pairs into frequencies and (note type, tempo) pairs
//! into durations. Pure arithmetic, no hardware access.
//!
//! Frequencies come from a 12-tone equal-tempered table defined at octave 8;
//! each octave below halves the frequency. Durations are counted in eighths
//! of a pulse, where one pulse (beat) is a crotchet.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

use crate::consts::{BASE_PULSE_DIVISIONS, MAX_OCTAVE, MS_PER_MINUTE};

/// Frequencies in Hz of the chromatic notes at octave 8, starting at C.
pub const NOTE_BASE_FREQ: [u16; 12] = [
    4186, // C
    4435, // C#
    4699, // D
    4978, // D#
    5274, // E
    5588, // F
    5920, // F#
    6272, // G
    6645, // G#
    7040, // A
    7459, // A#
    7902, // B
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Note {
    C = 0,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
    /// One past the last chromatic note. Maps to 0 Hz.
    Max,
    /// Silence. Maps to 0 Hz.
    Rest,
}

impl Note {
    /// The twelve sounding notes, in table order.
    pub const CHROMATIC: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_rest(self) -> bool {
        matches!(self, Note::Rest)
    }

    /// Frequency at octave 8, `None` for notes that never sound.
    pub const fn base_frequency(self) -> Option<u16> {
        match self {
            Note::Max | Note::Rest => None,
            note => Some(NOTE_BASE_FREQ[note as usize]),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Note::C => "C",
            Note::Cs => "C#",
            Note::D => "D",
            Note::Ds => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::Fs => "F#",
            Note::G => "G",
            Note::Gs => "G#",
            Note::A => "A",
            Note::As => "A#",
            Note::B => "B",
            Note::Max => "max",
            Note::Rest => "rest",
        }
    }

    const fn sharpened(self) -> Option<Note> {
        match self {
            Note::C => Some(Note::Cs),
            Note::D => Some(Note::Ds),
            Note::F => Some(Note::Fs),
            Note::G => Some(Note::Gs),
            Note::A => Some(Note::As),
            _ => None,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Note {
    type Err = ParseNoteError;

    /// Accepts `C`..`B` with an optional `#` (or `s`) sharp, and `rest` / `r`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("rest") || s.eq_ignore_ascii_case("r") {
            return Ok(Note::Rest);
        }

        let mut chars = s.chars();
        let natural = match chars.next().ok_or(ParseNoteError::Empty)?.to_ascii_uppercase() {
            'C' => Note::C,
            'D' => Note::D,
            'E' => Note::E,
            'F' => Note::F,
            'G' => Note::G,
            'A' => Note::A,
            'B' => Note::B,
            _ => return Err(ParseNoteError::UnknownNote),
        };

        match chars.as_str() {
            "" => Ok(natural),
            "#" | "s" => natural.sharpened().ok_or(ParseNoteError::UnknownNote),
            _ => Err(ParseNoteError::UnknownNote),
        }
    }
}

/// Rhythmic value of a note. The discriminant is its length in eighths of a
/// pulse, so dotted values are 1.5x their plain sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NoteType {
    SemibreveDotted = 48,
    Semibreve = 32,
    MinimDotted = 24,
    Minim = 16,
    CrotchetDotted = 12,
    Crotchet = 8,
    QuaverDotted = 6,
    Quaver = 4,
    SemiquaverDotted = 3,
    Semiquaver = 2,
}

impl NoteType {
    pub const ALL: [NoteType; 10] = [
        NoteType::SemibreveDotted,
        NoteType::Semibreve,
        NoteType::MinimDotted,
        NoteType::Minim,
        NoteType::CrotchetDotted,
        NoteType::Crotchet,
        NoteType::QuaverDotted,
        NoteType::Quaver,
        NoteType::SemiquaverDotted,
        NoteType::Semiquaver,
    ];

    pub const fn pulse_eighths(self) -> u32 {
        self as u32
    }

    pub const fn is_dotted(self) -> bool {
        matches!(
            self,
            NoteType::SemibreveDotted
                | NoteType::MinimDotted
                | NoteType::CrotchetDotted
                | NoteType::QuaverDotted
                | NoteType::SemiquaverDotted
        )
    }

    /// The dotted sibling of a plain note type.
    pub const fn dotted(self) -> Option<NoteType> {
        match self {
            NoteType::Semibreve => Some(NoteType::SemibreveDotted),
            NoteType::Minim => Some(NoteType::MinimDotted),
            NoteType::Crotchet => Some(NoteType::CrotchetDotted),
            NoteType::Quaver => Some(NoteType::QuaverDotted),
            NoteType::Semiquaver => Some(NoteType::SemiquaverDotted),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            NoteType::SemibreveDotted => "semibreve.",
            NoteType::Semibreve => "semibreve",
            NoteType::MinimDotted => "minim.",
            NoteType::Minim => "minim",
            NoteType::CrotchetDotted => "crotchet.",
            NoteType::Crotchet => "crotchet",
            NoteType::QuaverDotted => "quaver.",
            NoteType::Quaver => "quaver",
            NoteType::SemiquaverDotted => "semiquaver.",
            NoteType::Semiquaver => "semiquaver",
        }
    }

    pub const fn duration_ms(self, bpm: u32) -> Option<u32> {
        note_type_to_ms(self, bpm)
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoteType {
    type Err = ParseNoteError;

    /// British or American names, with a trailing `.` for dotted values:
    /// `crotchet`, `quarter.`, `semiquaver`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, dotted) = match s.strip_suffix('.') {
            Some(name) => (name, true),
            None => (s, false),
        };

        const NAMES: [(&str, &str, NoteType); 5] = [
            ("semibreve", "whole", NoteType::Semibreve),
            ("minim", "half", NoteType::Minim),
            ("crotchet", "quarter", NoteType::Crotchet),
            ("quaver", "eighth", NoteType::Quaver),
            ("semiquaver", "sixteenth", NoteType::Semiquaver),
        ];

        let plain = NAMES
            .iter()
            .find(|(british, american, _)| {
                name.eq_ignore_ascii_case(british) || name.eq_ignore_ascii_case(american)
            })
            .map(|&(_, _, note_type)| note_type)
            .ok_or(ParseNoteError::UnknownNoteType)?;

        if dotted {
            plain.dotted().ok_or(ParseNoteError::UnknownNoteType)
        } else {
            Ok(plain)
        }
    }
}

/// A note with its octave (0 to 8) and rhythmic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MusicalNote {
    pub note: Note,
    pub octave: u8,
    pub note_type: NoteType,
}

impl MusicalNote {
    pub const fn new(note: Note, octave: u8, note_type: NoteType) -> Self {
        Self {
            note,
            octave,
            note_type,
        }
    }

    pub const fn rest(note_type: NoteType) -> Self {
        Self::new(Note::Rest, 0, note_type)
    }

    pub fn frequency(&self) -> f64 {
        note_to_frequency(self.note, self.octave)
    }
}

impl fmt::Display for MusicalNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.note.is_rest() {
            write!(f, "{}:{}", self.note, self.note_type)
        } else {
            write!(f, "{}{}:{}", self.note, self.octave, self.note_type)
        }
    }
}

impl FromStr for MusicalNote {
    type Err = ParseNoteError;

    /// `<note><octave>:<type>` such as `A#4:quaver.`, or `rest:<type>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pitch, note_type) = s.split_once(':').ok_or(ParseNoteError::MissingNoteType)?;
        let note_type = note_type.parse::<NoteType>()?;

        if let Ok(Note::Rest) = pitch.parse::<Note>() {
            return Ok(MusicalNote::rest(note_type));
        }

        let octave_at = pitch
            .find(|c: char| c.is_ascii_digit())
            .ok_or(ParseNoteError::BadOctave)?;
        let note = pitch[..octave_at].parse::<Note>()?;
        let octave = pitch[octave_at..]
            .parse::<u8>()
            .ok()
            .filter(|octave| *octave <= MAX_OCTAVE)
            .ok_or(ParseNoteError::BadOctave)?;

        Ok(MusicalNote::new(note, octave, note_type))
    }
}

/// An ordered sequence of notes, played first to last.
pub type Melody<'a> = &'a [MusicalNote];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseNoteError {
    #[error("empty note")]
    Empty,
    #[error("unknown note name")]
    UnknownNote,
    #[error("unknown note type")]
    UnknownNoteType,
    #[error("octave must be a number from 0 to 8")]
    BadOctave,
    #[error("expected <note><octave>:<type>, e.g. C#4:crotchet")]
    MissingNoteType,
}

/// Frequency of `note` at `octave`, in Hz.
///
/// Octaves above 8 are clamped to 8. [`Note::Rest`] and [`Note::Max`] give
/// `0.0`, which callers use to detect the silent case.
pub fn note_to_frequency(note: Note, octave: u8) -> f64 {
    let octave = octave.min(MAX_OCTAVE);
    let Some(base) = note.base_frequency() else {
        return 0.0;
    };

    let divider = (1u32 << (MAX_OCTAVE - octave)) as f64;
    f64::from(base) / divider
}

/// Duration of `note_type` at `bpm` beats (crotchets) per minute, in ms.
///
/// Both divisions truncate: at 90 bpm a crotchet lasts 666 ms, not 667.
/// Returns `None` for a tempo of zero.
pub const fn note_type_to_ms(note_type: NoteType, bpm: u32) -> Option<u32> {
    if bpm == 0 {
        return None;
    }
    let ms_per_beat = MS_PER_MINUTE / bpm;
    Some(ms_per_beat * note_type.pulse_eighths() / BASE_PULSE_DIVISIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_halves_per_octave() {
        for note in Note::CHROMATIC {
            let base = f64::from(NOTE_BASE_FREQ[note.index()]);
            for octave in 0..=MAX_OCTAVE {
                let expected = base / f64::from(1u32 << (8 - octave));
                assert_eq!(note_to_frequency(note, octave), expected);
            }
        }
    }

    #[test]
    fn test_frequency_increases_with_octave() {
        for note in Note::CHROMATIC {
            for octave in 1..=MAX_OCTAVE {
                assert!(note_to_frequency(note, octave) > note_to_frequency(note, octave - 1));
            }
        }
    }

    #[test]
    fn test_reference_pitches() {
        assert_eq!(note_to_frequency(Note::A, 4), 440.0);
        assert_eq!(note_to_frequency(Note::C, 4), 261.625);
        assert_eq!(note_to_frequency(Note::B, 8), 7902.0);
    }

    #[test]
    fn test_octave_clamped_to_eight() {
        assert_eq!(note_to_frequency(Note::A, 9), note_to_frequency(Note::A, 8));
        assert_eq!(note_to_frequency(Note::C, 255), 4186.0);
    }

    #[test]
    fn test_silent_notes_have_no_frequency() {
        for octave in 0..=10 {
            assert_eq!(note_to_frequency(Note::Rest, octave), 0.0);
            assert_eq!(note_to_frequency(Note::Max, octave), 0.0);
        }
    }

    #[test]
    fn test_crotchet_is_one_beat() {
        for bpm in [1, 7, 60, 90, 120, 133, 240, 1000] {
            assert_eq!(note_type_to_ms(NoteType::Crotchet, bpm), Some(60_000 / bpm));
        }
    }

    #[test]
    fn test_durations_at_120_bpm() {
        assert_eq!(note_type_to_ms(NoteType::Crotchet, 120), Some(500));
        assert_eq!(note_type_to_ms(NoteType::Minim, 120), Some(1000));
        assert_eq!(note_type_to_ms(NoteType::Semibreve, 120), Some(2000));
        assert_eq!(note_type_to_ms(NoteType::QuaverDotted, 120), Some(375));
        assert_eq!(note_type_to_ms(NoteType::Semiquaver, 120), Some(125));
    }

    #[test]
    fn test_durations_truncate() {
        // 60000 / 90 = 666.67
        assert_eq!(note_type_to_ms(NoteType::Crotchet, 90), Some(666));
        // 666 * 16 / 8, not 2 * 666.67 rounded
        assert_eq!(note_type_to_ms(NoteType::Minim, 90), Some(1332));
        // 666 * 3 / 8 = 249.75
        assert_eq!(note_type_to_ms(NoteType::SemiquaverDotted, 90), Some(249));
    }

    #[test]
    fn test_dotted_is_one_and_a_half() {
        for plain in NoteType::ALL.iter().filter(|t| !t.is_dotted()) {
            let dotted = plain.dotted().unwrap();
            assert_eq!(dotted.pulse_eighths() * 2, plain.pulse_eighths() * 3);
        }
    }

    #[test]
    fn test_zero_bpm_rejected() {
        assert_eq!(note_type_to_ms(NoteType::Crotchet, 0), None);
    }

    #[test]
    fn test_parse_note_names() {
        assert_eq!("C".parse::<Note>(), Ok(Note::C));
        assert_eq!("c#".parse::<Note>(), Ok(Note::Cs));
        assert_eq!("As".parse::<Note>(), Ok(Note::As));
        assert_eq!("REST".parse::<Note>(), Ok(Note::Rest));
        assert_eq!("E#".parse::<Note>(), Err(ParseNoteError::UnknownNote));
        assert_eq!("H".parse::<Note>(), Err(ParseNoteError::UnknownNote));
        assert_eq!("".parse::<Note>(), Err(ParseNoteError::Empty));
    }

    #[test]
    fn test_parse_note_types() {
        assert_eq!("crotchet".parse::<NoteType>(), Ok(NoteType::Crotchet));
        assert_eq!("Quarter".parse::<NoteType>(), Ok(NoteType::Crotchet));
        assert_eq!("quaver.".parse::<NoteType>(), Ok(NoteType::QuaverDotted));
        assert_eq!("whole.".parse::<NoteType>(), Ok(NoteType::SemibreveDotted));
        assert_eq!("crotchet..".parse::<NoteType>(), Err(ParseNoteError::UnknownNoteType));
    }

    #[test]
    fn test_parse_musical_note() {
        assert_eq!(
            "A#4:quaver.".parse::<MusicalNote>(),
            Ok(MusicalNote::new(Note::As, 4, NoteType::QuaverDotted))
        );
        assert_eq!("rest:minim".parse::<MusicalNote>(), Ok(MusicalNote::rest(NoteType::Minim)));
        assert_eq!("C9:crotchet".parse::<MusicalNote>(), Err(ParseNoteError::BadOctave));
        assert_eq!("C:crotchet".parse::<MusicalNote>(), Err(ParseNoteError::BadOctave));
        assert_eq!("C4".parse::<MusicalNote>(), Err(ParseNoteError::MissingNoteType));
    }

    #[test]
    fn test_display_parses_back() {
        for note in [
            MusicalNote::new(Note::Fs, 3, NoteType::MinimDotted),
            MusicalNote::rest(NoteType::Semiquaver),
        ] {
            assert_eq!(note.to_string().parse::<MusicalNote>(), Ok(note));
        }
    }
}
