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
use std::path::Path;
use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;

use super::error::ConfigError;
use super::parse_duration;
use crate::sequencer::{self, notes};

/// A single note in a sequence file.
#[derive(Deserialize, Clone, Debug)]
pub struct Note {
    /// A preset note name such as "A4" or "LA".
    note: Option<String>,
    /// Frequency in Hz. Takes precedence over the note name.
    frequency: Option<f32>,
    /// How long the note sounds, e.g. "300ms".
    duration: String,
    /// Silence after the note (default: none)
    gap: Option<String>,
    /// Relative volume from 0.0 to 1.0 (default: 1.0)
    volume: Option<f32>,
    label: Option<String>,
}

/// A YAML representation of a note sequence.
#[derive(Deserialize, Clone, Debug)]
pub struct Sequence {
    /// Whether the sequence repeats.
    #[serde(rename = "loop", default)]
    looping: bool,

    notes: Vec<Note>,
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

impl Sequence {
    /// Parse a sequence from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Sequence, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Sequence>()?)
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Resolves note names and durations into a playable sequence.
    pub fn to_sequence(&self) -> Result<sequencer::Sequence, ConfigError> {
        let notes = self
            .notes
            .iter()
            .enumerate()
            .map(|(index, note)| note.to_note(index))
            .collect::<Result<Vec<sequencer::Note>, ConfigError>>()?;
        Ok(sequencer::Sequence::new(notes, self.looping))
    }
}

impl Note {
    fn to_note(&self, index: usize) -> Result<sequencer::Note, ConfigError> {
        let preset = match &self.note {
            Some(name) => Some(
                notes::preset(name).ok_or_else(|| ConfigError::UnknownNote(name.clone()))?,
            ),
            None => None,
        };
        let frequency = match (self.frequency, preset) {
            (Some(frequency), _) => frequency,
            (None, Some(preset)) => preset.frequency,
            (None, None) => return Err(ConfigError::MissingPitch(index)),
        };

        let duration = millis(parse_duration(&self.duration)?);
        let gap = match &self.gap {
            Some(gap) => millis(parse_duration(gap)?),
            None => 0,
        };
        let label = match (&self.label, preset) {
            (Some(label), _) => label.clone(),
            (None, Some(preset)) => preset.label.to_string(),
            (None, None) => String::new(),
        };

        Ok(sequencer::Note::new(frequency, duration, gap)
            .with_volume(self.volume.unwrap_or(1.0))
            .with_label(label))
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Sequence {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_sequence_deserialize() {
        let sequence = parse(
            r#"
            loop: true
            notes:
              - note: C4
                duration: 300ms
                gap: 50ms
              - frequency: 1000
                duration: 1s
                volume: 0.5
                label: beep
              - note: la
                frequency: 445
                duration: 100ms
        "#,
        )
        .to_sequence()
        .unwrap();

        assert!(sequence.is_looping());
        let notes = sequence.notes();
        assert_eq!(notes.len(), 3);

        assert_eq!(notes[0].frequency, notes::C4);
        assert_eq!(notes[0].duration_ms, 300);
        assert_eq!(notes[0].gap_ms, 50);
        assert_eq!(notes[0].label, "DO (C4)");
        assert_eq!(notes[0].volume, 1.0);

        assert_eq!(notes[1].frequency, 1000.0);
        assert_eq!(notes[1].duration_ms, 1000);
        assert_eq!(notes[1].gap_ms, 0);
        assert_eq!(notes[1].volume, 0.5);
        assert_eq!(notes[1].label, "beep");

        // An explicit frequency wins over the note name.
        assert_eq!(notes[2].frequency, 445.0);
        assert_eq!(notes[2].label, "LA (A4)");
    }

    #[test]
    fn test_loop_defaults_to_false() {
        let sequence = parse(
            r#"
            notes:
              - note: E4
                duration: 10ms
        "#,
        );
        assert!(!sequence.is_looping());
    }

    #[test]
    fn test_unknown_note() {
        let sequence = parse(
            r#"
            notes:
              - note: H7
                duration: 10ms
        "#,
        );
        assert!(matches!(
            sequence.to_sequence(),
            Err(ConfigError::UnknownNote(name)) if name == "H7"
        ));
    }

    #[test]
    fn test_missing_pitch() {
        let sequence = parse(
            r#"
            notes:
              - duration: 10ms
              - volume: 1.0
                duration: 10ms
        "#,
        );
        assert!(matches!(
            sequence.to_sequence(),
            Err(ConfigError::MissingPitch(0))
        ));
    }

    #[test]
    fn test_bad_duration() {
        let sequence = parse(
            r#"
            notes:
              - note: A4
                duration: forever
        "#,
        );
        assert!(matches!(
            sequence.to_sequence(),
            Err(ConfigError::Duration { .. })
        ));
    }
}
