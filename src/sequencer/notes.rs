// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Preset note frequencies and the do-re-mi scale.

use super::Note;

pub const C4: f32 = 261.63;
pub const D4: f32 = 293.66;
pub const E4: f32 = 329.63;
pub const F4: f32 = 349.23;
pub const G4: f32 = 392.00;
pub const A4: f32 = 440.00;
pub const B4: f32 = 493.88;
pub const C5: f32 = 523.25;

/// A named preset note with its solfège syllable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    /// Syllable accepted by lookups. The upper C is "DO5".
    pub solfege: &'static str,
    /// Label used for the note in sequences.
    pub label: &'static str,
    pub frequency: f32,
}

/// The C major scale from C4 up to C5.
pub const SCALE: [Preset; 8] = [
    Preset {
        name: "C4",
        solfege: "DO",
        label: "DO (C4)",
        frequency: C4,
    },
    Preset {
        name: "D4",
        solfege: "RE",
        label: "RE (D4)",
        frequency: D4,
    },
    Preset {
        name: "E4",
        solfege: "MI",
        label: "MI (E4)",
        frequency: E4,
    },
    Preset {
        name: "F4",
        solfege: "FA",
        label: "FA (F4)",
        frequency: F4,
    },
    Preset {
        name: "G4",
        solfege: "SOL",
        label: "SOL (G4)",
        frequency: G4,
    },
    Preset {
        name: "A4",
        solfege: "LA",
        label: "LA (A4)",
        frequency: A4,
    },
    Preset {
        name: "B4",
        solfege: "SI",
        label: "SI (B4)",
        frequency: B4,
    },
    Preset {
        name: "C5",
        solfege: "DO5",
        label: "DO (C5)",
        frequency: C5,
    },
];

/// Looks up a preset by note name ("A4") or solfège syllable ("LA"), ignoring case.
pub fn preset(name: &str) -> Option<&'static Preset> {
    let name = name.trim();
    SCALE.iter().find(|preset| {
        preset.name.eq_ignore_ascii_case(name) || preset.solfege.eq_ignore_ascii_case(name)
    })
}

/// Builds the eight-note do-re-mi scale with the given note and gap lengths.
pub fn do_re_mi(note_ms: u32, gap_ms: u32) -> Vec<Note> {
    SCALE
        .iter()
        .map(|preset| Note::new(preset.frequency, note_ms, gap_ms).with_label(preset.label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequency_for(name: &str) -> Option<f32> {
        preset(name).map(|preset| preset.frequency)
    }

    #[test]
    fn test_lookup() {
        assert_eq!(frequency_for("A4"), Some(440.0));
        assert_eq!(frequency_for("la"), Some(440.0));
        assert_eq!(frequency_for(" do "), Some(C4));
        assert_eq!(frequency_for("DO5"), Some(C5));
        assert_eq!(frequency_for("c5"), Some(C5));
        assert_eq!(frequency_for("H2"), None);
    }

    #[test]
    fn test_do_re_mi() {
        let notes = do_re_mi(300, 50);
        assert_eq!(notes.len(), 8);
        assert_eq!(notes[0].label, "DO (C4)");
        assert_eq!(notes[4].label, "SOL (G4)");
        assert_eq!(notes[7].label, "DO (C5)");
        assert_eq!(notes[7].frequency, C5);
        assert!(notes
            .iter()
            .all(|n| n.duration_ms == 300 && n.gap_ms == 50 && n.volume == 1.0));
        assert!(notes.windows(2).all(|w| w[1].frequency > w[0].frequency));
    }
}
