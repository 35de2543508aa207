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

//! A small real-time synthesizer.
//!
//! `tinysynth` fills fixed-size blocks of interleaved 16-bit PCM on demand from one of
//! two sources: a note [`Sequencer`] driving a wavetable oscillator, or a streaming
//! [`FileStreamDecoder`] for linear PCM WAV files. The [`Engine`] keeps one source
//! active and hands its output to an [`audio::Output`].

pub mod audio;
pub mod config;
pub mod decoder;
pub mod engine;
mod error;
pub mod events;
pub mod sequencer;
pub mod synth;

#[cfg(test)]
mod testutil;

pub use decoder::{DecoderState, FileStreamDecoder, FsStorage, MemoryStorage, Storage, WavHeader};
pub use engine::{Engine, EngineConfig};
pub use error::EngineError;
pub use events::{Event, SourceKind};
pub use sequencer::{Note, PlaybackState, Sequence, Sequencer};
pub use synth::{EnvelopeParams, Oscillator, WaveformKind};
