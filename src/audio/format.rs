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

use std::fmt;

use crate::error::EngineError;

/// Default number of frames per output buffer.
pub const DEFAULT_BUFFER_FRAMES: usize = 1156;

/// Layout of the buffers handed to an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channels, 1 or 2.
    pub channels: u16,
    /// Frames per buffer.
    pub buffer_frames: usize,
}

impl OutputFormat {
    /// Creates a new OutputFormat
    pub fn new(
        sample_rate: u32,
        channels: u16,
        buffer_frames: usize,
    ) -> Result<Self, EngineError> {
        let format = OutputFormat {
            sample_rate,
            channels,
            buffer_frames,
        };
        format.validate()?;
        Ok(format)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sample_rate == 0 {
            return Err(EngineError::Configuration(
                "sample rate must be greater than 0".to_string(),
            ));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(EngineError::Configuration(format!(
                "channel count must be 1 or 2, got {}",
                self.channels
            )));
        }
        if self.buffer_frames == 0 {
            return Err(EngineError::Configuration(
                "buffer size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of samples in one buffer across all channels.
    pub fn buffer_samples(&self) -> usize {
        self.buffer_frames * self.channels as usize
    }
}

impl Default for OutputFormat {
    /// 44.1kHz stereo.
    fn default() -> Self {
        OutputFormat {
            sample_rate: 44100,
            channels: 2,
            buffer_frames: DEFAULT_BUFFER_FRAMES,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz, {} channel(s), {} frames",
            self.sample_rate, self.channels, self.buffer_frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_new() {
        let format = OutputFormat::new(48000, 1, 256).unwrap();
        assert_eq!(format.sample_rate, 48000);
        assert_eq!(format.channels, 1);
        assert_eq!(format.buffer_samples(), 256);

        let format = OutputFormat::new(44100, 2, 512).unwrap();
        assert_eq!(format.buffer_samples(), 1024);
    }

    #[test]
    fn test_output_format_new_invalid() {
        assert!(matches!(
            OutputFormat::new(0, 2, 256),
            Err(EngineError::Configuration(_))
        ));
        assert!(OutputFormat::new(44100, 0, 256).is_err());
        assert!(OutputFormat::new(44100, 3, 256).is_err());
        assert!(OutputFormat::new(44100, 2, 0).is_err());
    }

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(format.channels, 2);
        assert_eq!(format.buffer_frames, 1156);
        assert!(format.validate().is_ok());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(
            OutputFormat::default().to_string(),
            "44100Hz, 2 channel(s), 1156 frames"
        );
    }
}
