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
use crate::audio::format::DEFAULT_BUFFER_FRAMES;
use crate::decoder::DEFAULT_READ_AHEAD;
use crate::engine::{EngineConfig, DEFAULT_BASE_AMPLITUDE};
use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::synth::{EnvelopeParams, WaveformKind};

const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_CHANNELS: u16 = 2;
const DEFAULT_VOLUME: u8 = 100;
const DEFAULT_ATTACK: Duration = Duration::from_millis(5);
const DEFAULT_DECAY: Duration = Duration::from_millis(20);
const DEFAULT_SUSTAIN: f32 = 0.6;
const DEFAULT_RELEASE: Duration = Duration::from_millis(30);

/// A YAML representation of the envelope. Times are duration strings such as "5ms".
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Envelope {
    attack: Option<String>,
    decay: Option<String>,
    /// Sustain level from 0.0 to 1.0.
    sustain: Option<f32>,
    release: Option<String>,
}

impl Envelope {
    pub fn attack(&self) -> Result<Duration, ConfigError> {
        self.attack
            .as_deref()
            .map_or(Ok(DEFAULT_ATTACK), parse_duration)
    }

    pub fn decay(&self) -> Result<Duration, ConfigError> {
        self.decay.as_deref().map_or(Ok(DEFAULT_DECAY), parse_duration)
    }

    pub fn sustain(&self) -> f32 {
        self.sustain.unwrap_or(DEFAULT_SUSTAIN)
    }

    pub fn release(&self) -> Result<Duration, ConfigError> {
        self.release
            .as_deref()
            .map_or(Ok(DEFAULT_RELEASE), parse_duration)
    }

    /// Converts the envelope to sample counts at the given rate.
    pub fn params(&self, sample_rate: u32) -> Result<EnvelopeParams, ConfigError> {
        Ok(EnvelopeParams::from_durations(
            self.attack()?,
            self.decay()?,
            self.sustain(),
            self.release()?,
            sample_rate,
        ))
    }
}

/// A YAML representation of the engine configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Engine {
    /// Output sample rate in Hz (default: 44100)
    sample_rate: Option<u32>,

    /// Output channels, 1 or 2 (default: 2)
    channels: Option<u16>,

    /// Frames per output buffer (default: 1156)
    buffer_size: Option<usize>,

    /// Size of the file read-ahead buffer in bytes (default: 4096)
    read_ahead_bytes: Option<usize>,

    /// Master volume from 0 to 100 (default: 100)
    volume: Option<u8>,

    /// Waveform name (default: "piano")
    waveform: Option<String>,

    /// Amplitude of a note at full volume (default: 0.8)
    base_amplitude: Option<f32>,

    envelope: Option<Envelope>,

    /// Number of undelivered events kept before new ones are dropped (default: 64)
    event_queue: Option<usize>,
}

impl Engine {
    /// Parse an engine configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Engine, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Engine>()?)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn channels(&self) -> u16 {
        self.channels.unwrap_or(DEFAULT_CHANNELS)
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size.unwrap_or(DEFAULT_BUFFER_FRAMES)
    }

    pub fn read_ahead_bytes(&self) -> usize {
        self.read_ahead_bytes.unwrap_or(DEFAULT_READ_AHEAD)
    }

    pub fn volume(&self) -> u8 {
        self.volume.unwrap_or(DEFAULT_VOLUME)
    }

    pub fn waveform(&self) -> WaveformKind {
        self.waveform
            .as_deref()
            .map_or(WaveformKind::default(), WaveformKind::from_name)
    }

    pub fn base_amplitude(&self) -> f32 {
        self.base_amplitude.unwrap_or(DEFAULT_BASE_AMPLITUDE)
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope.clone().unwrap_or_default()
    }

    pub fn event_queue(&self) -> usize {
        self.event_queue.unwrap_or(DEFAULT_EVENT_CAPACITY)
    }

    /// Builds and validates the runtime configuration.
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let sample_rate = self.sample_rate();
        let config = EngineConfig {
            format: crate::audio::OutputFormat {
                sample_rate,
                channels: self.channels(),
                buffer_frames: self.buffer_size(),
            },
            read_ahead_bytes: self.read_ahead_bytes(),
            volume: self.volume(),
            waveform: self.waveform(),
            base_amplitude: self.base_amplitude(),
            envelope: self.envelope().params(sample_rate)?,
            event_capacity: self.event_queue(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;
    use crate::error::EngineError;

    fn parse(yaml: &str) -> Engine {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_engine_deserialize() {
        let engine = parse(
            r#"
            sample_rate: 22050
            channels: 1
            buffer_size: 512
            read_ahead_bytes: 1024
            volume: 70
            waveform: square
            base_amplitude: 0.5
            envelope:
              attack: 10ms
              decay: 100ms
              sustain: 0.25
              release: 1s
            event_queue: 8
        "#,
        );

        let config = engine.to_engine_config().unwrap();
        assert_eq!(config.format.sample_rate, 22050);
        assert_eq!(config.format.channels, 1);
        assert_eq!(config.format.buffer_frames, 512);
        assert_eq!(config.read_ahead_bytes, 1024);
        assert_eq!(config.volume, 70);
        assert_eq!(config.waveform, WaveformKind::Square);
        assert_eq!(config.base_amplitude, 0.5);
        assert_eq!(config.event_capacity, 8);
        assert_eq!(
            config.envelope,
            EnvelopeParams {
                attack: 220,
                decay: 2205,
                sustain: 0.25,
                release: 22050,
            }
        );
    }

    #[test]
    fn test_engine_defaults() {
        let config = parse("{}").to_engine_config().unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_invalid_duration() {
        let engine = parse(
            r#"
            envelope:
              attack: soon
        "#,
        );
        assert!(matches!(
            engine.to_engine_config(),
            Err(ConfigError::Duration { .. })
        ));
    }

    #[test]
    fn test_invalid_format() {
        let engine = parse("channels: 6");
        assert!(matches!(
            engine.to_engine_config(),
            Err(ConfigError::Engine(EngineError::Configuration(_)))
        ));
    }

    #[test]
    fn test_deserialize_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "sample_rate: 48000\nwaveform: sine\n").unwrap();

        let engine = Engine::deserialize(&path).unwrap();
        assert_eq!(engine.sample_rate(), 48000);
        assert_eq!(engine.waveform(), WaveformKind::Sine);
        assert_eq!(engine.channels(), 2);

        assert!(matches!(
            Engine::deserialize(&dir.path().join("missing.yaml")),
            Err(ConfigError::Load(_))
        ));
    }
}
