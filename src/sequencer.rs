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

//! Note sequencing.
//!
//! A [`Sequencer`] owns one [`Oscillator`] and programs it over time from a list of
//! notes. Each note sounds for its duration, then the gate closes and an optional gap
//! of silence follows before the next note starts.

pub mod notes;

use tracing::{debug, info};

use crate::error::EngineError;
use crate::synth::{EnvelopeParams, Oscillator, WaveformKind};

/// A single note in a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Frequency in Hz.
    pub frequency: f32,
    /// How long the gate is held, in milliseconds.
    pub duration_ms: u32,
    /// Silence after the note, in milliseconds.
    pub gap_ms: u32,
    /// Relative volume [0.0, 1.0].
    pub volume: f32,
    pub label: String,
}

impl Note {
    pub fn new(frequency: f32, duration_ms: u32, gap_ms: u32) -> Note {
        Note {
            frequency,
            duration_ms,
            gap_ms,
            volume: 1.0,
            label: String::new(),
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Note {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Note {
        self.label = label.into();
        self
    }
}

/// An ordered list of notes, optionally repeated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    notes: Vec<Note>,
    looping: bool,
}

impl Sequence {
    pub fn new(notes: Vec<Note>, looping: bool) -> Sequence {
        Sequence { notes, looping }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Playback state of a sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Stage lengths of the current note in samples.
#[derive(Debug, Clone, Copy)]
struct StageLengths {
    note: u32,
    gap: u32,
}

/// Converts milliseconds to a whole number of samples, rounding down. Lengths that
/// do not fit saturate.
fn ms_to_samples(ms: u32, sample_rate: u32) -> u32 {
    u32::try_from(ms as u64 * sample_rate as u64 / 1000).unwrap_or(u32::MAX)
}

/// Plays a [`Sequence`] through a single oscillator.
pub struct Sequencer {
    oscillator: Oscillator,
    sequence: Sequence,
    sample_rate: u32,
    /// Amplitude of a note at full volume.
    base_amplitude: f32,
    /// Index of the current note.
    index: usize,
    /// Samples elapsed in the current stage.
    elapsed: u32,
    in_gap: bool,
    finished: bool,
    state: PlaybackState,
    /// Lengths of the current note's stages. None until the note is entered.
    stage: Option<StageLengths>,
    /// Index of the most recently started note, not yet reported.
    note_started: Option<usize>,
}

impl Sequencer {
    /// Creates a stopped sequencer with an empty sequence.
    pub fn new(
        sample_rate: u32,
        waveform: WaveformKind,
        envelope: EnvelopeParams,
        base_amplitude: f32,
    ) -> Sequencer {
        Sequencer {
            oscillator: Oscillator::new(waveform, sample_rate, envelope),
            sequence: Sequence::default(),
            sample_rate,
            base_amplitude: base_amplitude.clamp(0.0, 1.0),
            index: 0,
            elapsed: 0,
            in_gap: false,
            finished: false,
            state: PlaybackState::Stopped,
            stage: None,
            note_started: None,
        }
    }

    /// Replaces the sequence and rewinds to its first note.
    pub fn set_sequence(&mut self, sequence: Sequence) {
        debug!(
            notes = sequence.len(),
            looping = sequence.is_looping(),
            "Setting sequence"
        );
        self.sequence = sequence;
        self.rewind();
    }

    /// Appends a note and rewinds to the first note.
    pub fn add_note(&mut self, note: Note) {
        self.sequence.push(note);
        self.rewind();
    }

    /// Removes every note and rewinds.
    pub fn clear_sequence(&mut self) {
        self.sequence = Sequence::new(Vec::new(), self.sequence.is_looping());
        self.rewind();
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.sequence.set_looping(looping);
    }

    /// Swaps the timbre. The envelope and amplitude of a sounding note are kept.
    pub fn set_waveform(&mut self, kind: WaveformKind) {
        self.oscillator.set_waveform(kind);
    }

    pub fn set_envelope(&mut self, params: EnvelopeParams) {
        self.oscillator.set_envelope(params);
    }

    /// Starts or resumes playback.
    pub fn play(&mut self) {
        if self.sequence.is_empty() {
            debug!("Sequence is empty, nothing to play");
            self.finish();
            return;
        }

        if self.finished || self.index >= self.sequence.len() {
            self.reset_cursor();
        }

        let resuming = self.state == PlaybackState::Paused && self.stage.is_some() && !self.in_gap;
        self.state = PlaybackState::Playing;
        if resuming {
            self.oscillator.note_on();
        }
        info!(
            index = self.index,
            notes = self.sequence.len(),
            "Sequencer playing"
        );
    }

    /// Pauses playback. The sounding note is released and the position is kept.
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.state = PlaybackState::Paused;
        self.oscillator.note_off();
        info!(index = self.index, "Sequencer paused");
    }

    /// Stops playback and rewinds to the first note.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.reset_cursor();
        self.oscillator.note_off();
        self.oscillator.reset_phase();
        info!("Sequencer stopped");
    }

    /// Jumps to the note at the given index and plays from there.
    pub fn play_note(&mut self, index: usize) -> Result<(), EngineError> {
        if index >= self.sequence.len() {
            return Err(EngineError::SourceUnavailable(format!(
                "note index {} out of range for a sequence of {} notes",
                index,
                self.sequence.len()
            )));
        }

        self.reset_cursor();
        self.index = index;
        self.state = PlaybackState::Playing;
        info!(index, "Playing note");
        Ok(())
    }

    /// Fills a mono buffer. Silence is produced while not playing and inside gaps.
    pub fn generate_samples(&mut self, out: &mut [i16]) {
        if self.state != PlaybackState::Playing {
            out.fill(0);
            return;
        }

        for sample in out.iter_mut() {
            if self.finished {
                *sample = 0;
                continue;
            }
            *sample = if self.update_note_state() {
                self.oscillator.next_sample()
            } else {
                0
            };
            if !self.finished {
                self.elapsed = self.elapsed.saturating_add(1);
            }
        }
    }

    /// Returns the index of a note started since the last call.
    pub fn take_note_change(&mut self) -> Option<usize> {
        self.note_started.take()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Has a non-looping sequence played its last note?
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_looping(&self) -> bool {
        self.sequence.is_looping()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_note(&self) -> Option<&Note> {
        self.sequence.notes().get(self.index)
    }

    pub fn note_count(&self) -> usize {
        self.sequence.len()
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn waveform(&self) -> WaveformKind {
        self.oscillator.waveform()
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    /// Advances the note state machine for the next sample. Returns true if the
    /// oscillator should sound.
    ///
    /// Zero-length stages fall through within the same call. Each call visits every
    /// note at most once, so a looping sequence of zero-length notes produces silence
    /// rather than spinning.
    fn update_note_state(&mut self) -> bool {
        let mut budget = self.sequence.len() + 1;

        while budget > 0 {
            if self.finished {
                return false;
            }

            let stage = match self.stage {
                Some(stage) => stage,
                None => match self.enter_note() {
                    Some(stage) => stage,
                    None => return false,
                },
            };

            if !self.in_gap {
                if self.elapsed < stage.note {
                    return true;
                }
                self.oscillator.note_off();
                if stage.gap > 0 {
                    self.in_gap = true;
                    self.elapsed = 0;
                    continue;
                }
            } else if self.elapsed < stage.gap {
                return false;
            }

            self.advance();
            budget -= 1;
        }

        false
    }

    /// Programs the oscillator for the note at the cursor.
    fn enter_note(&mut self) -> Option<StageLengths> {
        let Some(note) = self.sequence.notes().get(self.index) else {
            self.finish();
            return None;
        };

        let stage = StageLengths {
            note: ms_to_samples(note.duration_ms, self.sample_rate),
            gap: ms_to_samples(note.gap_ms, self.sample_rate),
        };
        let frequency = note.frequency;
        let amplitude = self.base_amplitude * note.volume;

        self.oscillator.reset_phase();
        self.oscillator.set_frequency(frequency);
        self.oscillator.set_amplitude(amplitude);
        self.oscillator.note_on();

        self.stage = Some(stage);
        self.elapsed = 0;
        self.in_gap = false;
        self.note_started = Some(self.index);
        Some(stage)
    }

    /// Moves to the next note, wrapping or finishing at the end.
    fn advance(&mut self) {
        self.stage = None;
        self.elapsed = 0;
        self.in_gap = false;
        self.index += 1;

        if self.index >= self.sequence.len() {
            if self.sequence.is_looping() {
                self.index = 0;
            } else {
                self.finish();
            }
        }
    }

    /// Marks the sequence as played out. The sequencer stops and stays silent until
    /// it is played again or given new notes.
    fn finish(&mut self) {
        self.finished = true;
        self.state = PlaybackState::Stopped;
        self.stage = None;
        self.in_gap = false;
        self.oscillator.note_off();
    }

    fn reset_cursor(&mut self) {
        self.index = 0;
        self.elapsed = 0;
        self.in_gap = false;
        self.finished = false;
        self.stage = None;
        self.note_started = None;
    }

    /// Rewinds after the sequence changed. Clears the finished flag and keeps the
    /// playback state.
    fn rewind(&mut self) {
        self.reset_cursor();
        self.oscillator.note_off();
        self.oscillator.reset_phase();
    }
}
