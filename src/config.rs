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

use duration_string::DurationString;
use tracing::info;

use crate::decoder::FsStorage;

mod engine;
mod error;
mod sequence;

pub use self::engine::{Engine, Envelope};
pub use self::error::ConfigError;
pub use self::sequence::{Note, Sequence};

/// Parses a duration string such as "250ms" or "1s".
pub(crate) fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    DurationString::from_string(value.to_string())
        .map(Into::into)
        .map_err(|e| ConfigError::Duration {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Creates an engine from a YAML configuration file.
pub fn init_engine(path: &Path) -> Result<crate::Engine<FsStorage>, ConfigError> {
    info!(path = ?path, "Loading engine configuration");
    let config = Engine::deserialize(path)?.to_engine_config()?;
    Ok(crate::Engine::new(config)?)
}

/// Parses a note sequence from a YAML file.
pub fn parse_sequence(path: &Path) -> Result<crate::Sequence, ConfigError> {
    info!(path = ?path, "Loading sequence");
    Sequence::deserialize(path)?.to_sequence()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert!(matches!(
            parse_duration("fast"),
            Err(ConfigError::Duration { value, .. }) if value == "fast"
        ));
    }

    #[test]
    fn test_init_engine_and_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let engine_path = dir.path().join("engine.yaml");
        std::fs::write(&engine_path, "channels: 1\nvolume: 50\n").unwrap();
        let sequence_path = dir.path().join("scale.yaml");
        std::fs::write(
            &sequence_path,
            "loop: false\nnotes:\n  - note: G4\n    duration: 20ms\n",
        )
        .unwrap();

        let mut engine = init_engine(&engine_path).unwrap();
        assert_eq!(engine.config().format.channels, 1);
        assert_eq!(engine.volume(), 50);

        let sequence = parse_sequence(&sequence_path).unwrap();
        assert_eq!(sequence.len(), 1);
        engine.play_sequence(sequence).unwrap();
        assert!(engine.is_playing());
    }
}
