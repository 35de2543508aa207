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

use tracing::warn;

/// The waveform shape an oscillator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaveformKind {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    /// Additive synthesis of six harmonics with faster decay on the upper partials.
    #[default]
    Piano,
}

impl WaveformKind {
    /// Resolves a waveform by name. Unknown names fall back to a sine.
    pub fn from_name(name: &str) -> WaveformKind {
        match name.trim().to_ascii_lowercase().as_str() {
            "sine" => WaveformKind::Sine,
            "square" => WaveformKind::Square,
            "triangle" => WaveformKind::Triangle,
            "sawtooth" | "saw" => WaveformKind::Sawtooth,
            "piano" => WaveformKind::Piano,
            other => {
                warn!(waveform = other, "Unknown waveform, using sine");
                WaveformKind::Sine
            }
        }
    }

    /// Convert to string representation
    pub fn as_str(self) -> &'static str {
        match self {
            WaveformKind::Sine => "sine",
            WaveformKind::Square => "square",
            WaveformKind::Triangle => "triangle",
            WaveformKind::Sawtooth => "sawtooth",
            WaveformKind::Piano => "piano",
        }
    }
}

impl fmt::Display for WaveformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
