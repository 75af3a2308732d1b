//! Built-in melodies.

use crate::music::{Melody, MusicalNote, Note, NoteType};

macro_rules! n {
    ($note:ident, $octave:expr, $note_type:ident) => {
        MusicalNote::new(Note::$note, $octave, NoteType::$note_type)
    };
}

/// Played by [`crate::Buzzer::play_self_test`] to check the buzzer is wired up.
/// Lasts 12 s at 120 bpm.
pub const SELF_TEST: Melody<'static> = &[
    n!(C, 4, QuaverDotted),
    n!(C, 4, Semiquaver),
    n!(D, 4, Crotchet),
    n!(C, 4, Crotchet),
    n!(F, 4, Crotchet),
    n!(E, 4, Minim),
    n!(C, 4, QuaverDotted),
    n!(C, 4, Semiquaver),
    n!(D, 4, Crotchet),
    n!(C, 4, Crotchet),
    n!(G, 4, Crotchet),
    n!(F, 4, Minim),
    n!(C, 4, QuaverDotted),
    n!(C, 4, Semiquaver),
    n!(C, 5, Crotchet),
    n!(A, 4, Crotchet),
    n!(F, 4, Crotchet),
    n!(E, 4, Crotchet),
    n!(D, 4, Crotchet),
    n!(As, 4, QuaverDotted),
    n!(As, 4, Semiquaver),
    n!(A, 4, Crotchet),
    n!(F, 4, Crotchet),
    n!(G, 4, Crotchet),
    n!(F, 4, Minim),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::note_type_to_ms;

    #[test]
    fn test_self_test_melody() {
        assert_eq!(SELF_TEST.len(), 25);
        assert!(SELF_TEST.iter().all(|note| !note.note.is_rest()));

        let total_ms: u32 = SELF_TEST
            .iter()
            .map(|note| note_type_to_ms(note.note_type, 120).unwrap())
            .sum();
        assert_eq!(total_ms, 12_000);
    }
}
