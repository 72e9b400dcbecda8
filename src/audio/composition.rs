//! Soundtrack data
//!
//! Each section is 32 sixteenth-note steps written tracker style: one token
//! per step, `.` rests, `=` holds the previous note, `|` is a visual bar
//! line. Notes are `C4`, `F#5`, `Bb3`. Drums are `K` kick, `S` snare, `h` hat.

/// Tempo in beats per minute
pub const BPM: f32 = 150.0;
/// Steps per quarter note
pub const STEPS_PER_BEAT: u32 = 4;
/// Steps in every section
pub const SECTION_STEPS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drum {
    Kick,
    Snare,
    Hat,
}

/// A pitched note inside a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub step: usize,
    /// MIDI note number
    pub midi: u8,
    /// Length in steps
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrumHit {
    pub step: usize,
    pub drum: Drum,
}

/// One 32-step block of all four voices
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub lead: &'static str,
    pub bass: &'static str,
    pub arp: &'static str,
    pub drums: &'static str,
}

/// Sections plus the order they play in
#[derive(Debug, Clone, Copy)]
pub struct Song {
    pub sections: &'static [Section],
    pub order: &'static [usize],
}

impl Song {
    pub fn total_steps(&self) -> usize {
        self.order.len() * SECTION_STEPS
    }

    /// Sections in play order. Out-of-range references are skipped.
    pub fn arrangement(&self) -> impl Iterator<Item = &Section> + '_ {
        self.order.iter().filter_map(|&i| self.sections.get(i))
    }
}

const MAIN: Section = Section {
    lead: "E5 = . B4 | E5 = G5 = | F#5 = E5 . | D5 = B4 = | E5 = . B4 | E5 = G5 = | A5 = G5 F#5 | E5 = = =",
    bass: "E2 . E3 . | E2 . E3 . | C2 . C3 . | C2 . C3 . | D2 . D3 . | D2 . D3 . | B1 . B2 . | B1 . B2 .",
    arp: "E4 G4 B4 G4 | E4 G4 B4 G4 | C4 E4 G4 E4 | C4 E4 G4 E4 | D4 F#4 A4 F#4 | D4 F#4 A4 F#4 | B3 D#4 F#4 D#4 | B3 D#4 F#4 D#4",
    drums: "K . h . | S . h . | K . h K | S . h h | K . h . | S . h . | K K h . | S h S h",
};

const CLIMB: Section = Section {
    lead: "G5 = = . | F#5 = E5 = | D5 = E5 = | B4 = = . | C5 = D5 = | E5 = G5 = | F#5 = D#5 = | B4 = = =",
    bass: "C2 . C3 C2 | . C3 C2 . | G1 . G2 G1 | . G2 G1 . | A1 . A2 A1 | . A2 A1 . | B1 . B2 B1 | . B2 B1 .",
    arp: "C4 E4 G4 C5 | G4 E4 C4 E4 | G3 B3 D4 G4 | D4 B3 G3 B3 | A3 C4 E4 A4 | E4 C4 A3 C4 | B3 D#4 F#4 B4 | F#4 D#4 B3 D#4",
    drums: "K . h . | S . h K | K . h . | S . h . | K . h . | S . h K | K . S . | S S S S",
};

const BRIDGE: Section = Section {
    lead: ". . . . | E6 = = = | . . . . | D6 = = = | . . . . | C6 = B5 = | A5 = G5 = | F#5 = = =",
    bass: "A1 A1 A2 A1 | A1 A1 A2 A1 | G1 G1 G2 G1 | G1 G1 G2 G1 | F1 F1 F2 F1 | F1 F1 F2 F1 | B1 B1 B2 B1 | B1 B1 B2 B1",
    arp: "A4 E5 C5 E5 | A4 E5 C5 E5 | G4 D5 B4 D5 | G4 D5 B4 D5 | F4 C5 A4 C5 | F4 C5 A4 C5 | F#4 D#5 B4 D#5 | F#4 D#5 B4 D#5",
    drums: "K . . . | h . h . | K . . . | h . h . | K . . . | h . h . | K . K . | S S S S",
};

/// The in-game loop
pub const SONG: Song = Song {
    sections: &[MAIN, CLIMB, BRIDGE],
    order: &[0, 1, 0, 1, 2, 1],
};

fn tokens(pattern: &str) -> impl Iterator<Item = &str> {
    pattern.split_whitespace().filter(|t| *t != "|")
}

/// Steps written in a pattern (should be `SECTION_STEPS`)
pub fn step_count(pattern: &str) -> usize {
    tokens(pattern).count()
}

/// `C4` = 60, sharps `#`, flats `b`
pub fn parse_note(token: &str) -> Option<u8> {
    let mut chars = token.chars();
    let base: i32 = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let rest = chars.as_str();
    let (shift, octave) = match rest.strip_prefix('#') {
        Some(o) => (1, o),
        None => match rest.strip_prefix('b') {
            Some(o) => (-1, o),
            None => (0, rest),
        },
    };
    let octave: i32 = octave.parse().ok()?;
    u8::try_from(12 * (octave + 1) + base + shift)
        .ok()
        .filter(|m| *m <= 127)
}

/// Pitched track. Unreadable tokens are treated as rests.
pub fn parse_track(pattern: &str) -> Vec<NoteEvent> {
    let mut notes: Vec<NoteEvent> = Vec::new();
    let mut holding = false;
    for (step, token) in tokens(pattern).take(SECTION_STEPS).enumerate() {
        match token {
            "=" => {
                if holding {
                    if let Some(last) = notes.last_mut() {
                        last.len += 1;
                    }
                }
            }
            "." => holding = false,
            _ => match parse_note(token) {
                Some(midi) => {
                    notes.push(NoteEvent { step, midi, len: 1 });
                    holding = true;
                }
                None => {
                    log::warn!("Unreadable note '{token}' at step {step}");
                    holding = false;
                }
            },
        }
    }
    notes
}

pub fn parse_drums(pattern: &str) -> Vec<DrumHit> {
    tokens(pattern)
        .take(SECTION_STEPS)
        .enumerate()
        .filter_map(|(step, token)| {
            let drum = match token {
                "K" => Drum::Kick,
                "S" => Drum::Snare,
                "h" => Drum::Hat,
                _ => return None,
            };
            Some(DrumHit { step, drum })
        })
        .collect()
}

/// Equal temperament, A4 = 440 Hz
pub fn midi_to_freq(midi: u8) -> f32 {
    440.0 * 2f32.powf((midi as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pattern_is_one_section_long() {
        for (i, section) in SONG.sections.iter().enumerate() {
            for pattern in [section.lead, section.bass, section.arp, section.drums] {
                assert_eq!(step_count(pattern), SECTION_STEPS, "section {i}: {pattern}");
            }
            for pattern in [section.lead, section.bass, section.arp] {
                for token in tokens(pattern) {
                    assert!(
                        matches!(token, "." | "=") || parse_note(token).is_some(),
                        "section {i}: bad token {token}"
                    );
                }
            }
        }
        assert!(SONG.order.iter().all(|&i| i < SONG.sections.len()));
    }

    #[test]
    fn test_note_parsing() {
        assert_eq!(parse_note("C4"), Some(60));
        assert_eq!(parse_note("A4"), Some(69));
        assert_eq!(parse_note("F#5"), Some(78));
        assert_eq!(parse_note("Bb3"), Some(58));
        assert_eq!(parse_note("H2"), None);
        assert_eq!(parse_note("C"), None);
        assert!((midi_to_freq(69) - 440.0).abs() < 1e-3);
    }

    #[test]
    fn test_holds_extend_notes() {
        let notes = parse_track("E5 = . B4 = = C5 . = D5");
        assert_eq!(
            notes,
            vec![
                NoteEvent { step: 0, midi: 76, len: 2 },
                NoteEvent { step: 3, midi: 71, len: 3 },
                NoteEvent { step: 6, midi: 72, len: 1 },
                NoteEvent { step: 9, midi: 74, len: 1 },
            ]
        );
        let drums = parse_drums("K . h S");
        assert_eq!(drums.len(), 3);
        assert_eq!(drums[2], DrumHit { step: 3, drum: Drum::Snare });
    }
}
