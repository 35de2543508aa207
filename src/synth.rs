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

//! Single-voice tone generation.
//!
//! This module provides:
//! - A 32-bit phase accumulator oscillator with five waveform shapes
//! - A linear ADSR envelope driven by a gate
//! - Shared, read-only lookup tables built once per process

mod envelope;
mod oscillator;
mod waveform;
pub(crate) mod wavetable;

pub use envelope::{Envelope, EnvelopeParams};
pub use oscillator::{to_i16, Oscillator};
pub use waveform::WaveformKind;
