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

//! The engine facade.
//!
//! An [`Engine`] owns a [`Sequencer`] and a [`FileStreamDecoder`] and keeps exactly one
//! of them active. The output pulls interleaved buffers through [`Engine::fill`], usually
//! by way of [`Engine::process`].

use std::path::Path;

use tracing::{error, info, warn};

use crate::audio::{Output, OutputError, OutputFormat};
use crate::decoder::{DecoderState, FileStreamDecoder, FsStorage, Storage, DEFAULT_READ_AHEAD};
use crate::error::EngineError;
use crate::events::{Event, EventQueue, SourceKind, DEFAULT_EVENT_CAPACITY};
use crate::sequencer::{notes, Note, PlaybackState, Sequence, Sequencer};
use crate::synth::{wavetable, EnvelopeParams, WaveformKind};

/// Frames decoded per step when downmixing a file to mono.
const SCRATCH_FRAMES: usize = 256;

/// Default note amplitude.
pub const DEFAULT_BASE_AMPLITUDE: f32 = 0.8;

/// Runtime settings for an [`Engine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub format: OutputFormat,
    /// Size of the decoder's read-ahead buffer in bytes.
    pub read_ahead_bytes: usize,
    /// Master volume, 0 to 100.
    pub volume: u8,
    pub waveform: WaveformKind,
    /// Amplitude of a note at full volume.
    pub base_amplitude: f32,
    pub envelope: EnvelopeParams,
    /// Number of undelivered events kept before new ones are dropped.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let format = OutputFormat::default();
        EngineConfig {
            format,
            read_ahead_bytes: DEFAULT_READ_AHEAD,
            volume: 100,
            waveform: WaveformKind::default(),
            base_amplitude: DEFAULT_BASE_AMPLITUDE,
            envelope: EnvelopeParams::default_for_rate(format.sample_rate),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.format.validate()?;
        if self.read_ahead_bytes < 4 {
            return Err(EngineError::Configuration(format!(
                "read-ahead buffer of {} bytes cannot hold a frame",
                self.read_ahead_bytes
            )));
        }
        if self.volume > 100 {
            return Err(EngineError::Configuration(format!(
                "volume must be between 0 and 100, got {}",
                self.volume
            )));
        }
        if !(0.0..=1.0).contains(&self.base_amplitude) {
            return Err(EngineError::Configuration(format!(
                "base amplitude must be between 0.0 and 1.0, got {}",
                self.base_amplitude
            )));
        }
        if self.event_capacity == 0 {
            return Err(EngineError::Configuration(
                "event queue capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Plays tones, note sequences and WAV files into an output.
pub struct Engine<S: Storage = FsStorage> {
    config: EngineConfig,
    sequencer: Sequencer,
    decoder: FileStreamDecoder<S>,
    active: Option<SourceKind>,
    /// Master volume, 0 to 100.
    volume: u8,
    muted: bool,
    /// Stereo frames for downmixing. Allocated once.
    scratch: Vec<i16>,
    events: EventQueue,
    /// Whether the end of the active source has been reported.
    finished_reported: bool,
}

impl Engine<FsStorage> {
    /// Creates an engine that reads files from the local filesystem.
    pub fn new(config: EngineConfig) -> Result<Engine<FsStorage>, EngineError> {
        Engine::with_storage(config, FsStorage)
    }
}

impl<S: Storage> Engine<S> {
    /// Creates an engine that reads files through the given storage.
    pub fn with_storage(config: EngineConfig, storage: S) -> Result<Engine<S>, EngineError> {
        config.validate()?;
        wavetable::init();

        let sequencer = Sequencer::new(
            config.format.sample_rate,
            config.waveform,
            config.envelope,
            config.base_amplitude,
        );
        let decoder = FileStreamDecoder::new(storage, config.read_ahead_bytes);

        info!(
            format = %config.format,
            waveform = %config.waveform,
            volume = config.volume,
            "Engine created"
        );

        Ok(Engine {
            sequencer,
            decoder,
            active: None,
            volume: config.volume,
            muted: false,
            scratch: vec![0; SCRATCH_FRAMES * 2],
            events: EventQueue::new(config.event_capacity),
            finished_reported: false,
            config,
        })
    }

    /// Prepares an output for this engine's format.
    pub fn initialize_output<O: Output + ?Sized>(&self, output: &mut O) -> Result<(), OutputError> {
        output.initialize(&self.config.format)
    }

    /// Plays a sequence of notes from the beginning.
    pub fn play_sequence(&mut self, sequence: Sequence) -> Result<(), EngineError> {
        if sequence.is_empty() {
            return Err(EngineError::SourceUnavailable(
                "sequence has no notes".to_string(),
            ));
        }

        self.switch_to(SourceKind::Sequencer);
        info!(
            notes = sequence.len(),
            looping = sequence.is_looping(),
            "Playing sequence"
        );
        self.sequencer.set_sequence(sequence);
        self.sequencer.play();
        self.started(SourceKind::Sequencer);
        Ok(())
    }

    /// Plays a single note.
    pub fn play_note(
        &mut self,
        frequency: f32,
        duration_ms: u32,
        label: &str,
    ) -> Result<(), EngineError> {
        let note = Note::new(frequency, duration_ms, 0).with_label(label);
        self.play_sequence(Sequence::new(vec![note], false))
    }

    /// Plays a preset note by name, such as "A4" or "LA".
    pub fn play_note_by_name(&mut self, name: &str, duration_ms: u32) -> Result<(), EngineError> {
        let preset = notes::preset(name)
            .ok_or_else(|| EngineError::SourceUnavailable(format!("unknown note {}", name)))?;
        self.play_note(preset.frequency, duration_ms, preset.label)
    }

    /// Plays the C major scale from C4 to C5.
    pub fn play_do_re_mi(
        &mut self,
        note_ms: u32,
        gap_ms: u32,
        looping: bool,
    ) -> Result<(), EngineError> {
        self.play_sequence(Sequence::new(notes::do_re_mi(note_ms, gap_ms), looping))
    }

    /// Jumps to a note of the current sequence and plays from there.
    pub fn play_note_by_index(&mut self, index: usize) -> Result<(), EngineError> {
        if self.active != Some(SourceKind::Sequencer) {
            return Err(EngineError::SourceUnavailable(
                "no sequence loaded".to_string(),
            ));
        }
        self.sequencer.play_note(index)?;
        self.started(SourceKind::Sequencer);
        Ok(())
    }

    /// Opens a WAV file and makes it the active source without starting it.
    pub fn load_file(&mut self, path: &Path) -> Result<(), EngineError> {
        self.switch_to(SourceKind::File);
        self.finished_reported = false;
        self.decoder.load_file(path)
    }

    /// Opens a WAV file and plays it from the beginning.
    pub fn play_file(&mut self, path: &Path) -> Result<(), EngineError> {
        self.load_file(path)?;
        self.decoder.play()?;
        self.started(SourceKind::File);
        Ok(())
    }

    /// Moves the active file to the given time in seconds.
    pub fn seek_to(&mut self, seconds: f32) -> Result<(), EngineError> {
        if self.active != Some(SourceKind::File) {
            return Err(EngineError::SourceUnavailable(
                "no file loaded".to_string(),
            ));
        }
        self.decoder.seek_to(seconds)?;
        self.finished_reported = false;
        self.events.push(Event::PositionChanged {
            position_seconds: self.decoder.position_seconds(),
            duration_seconds: self.decoder.duration_seconds(),
        });
        Ok(())
    }

    /// Pauses the active source.
    pub fn pause(&mut self) {
        let paused = match self.active {
            Some(SourceKind::Sequencer) if self.sequencer.state() == PlaybackState::Playing => {
                self.sequencer.pause();
                true
            }
            Some(SourceKind::File) if self.decoder.state() == DecoderState::Playing => {
                self.decoder.pause();
                true
            }
            _ => false,
        };
        if paused {
            info!("Paused");
            self.events.push(Event::PlaybackPaused);
        }
    }

    /// Resumes a paused source.
    pub fn resume(&mut self) {
        let resumed = match self.active {
            Some(SourceKind::Sequencer) if self.sequencer.state() == PlaybackState::Paused => {
                self.sequencer.play();
                true
            }
            Some(SourceKind::File) if self.decoder.state() == DecoderState::Paused => {
                self.decoder.pause();
                true
            }
            _ => false,
        };
        if resumed {
            info!("Resumed");
            self.events.push(Event::PlaybackResumed);
        }
    }

    /// Stops the active source and rewinds it.
    pub fn stop(&mut self) {
        match self.active {
            Some(SourceKind::Sequencer) => self.sequencer.stop(),
            Some(SourceKind::File) => {
                if let Err(e) = self.decoder.stop() {
                    warn!(err = %e, "Unable to rewind file");
                }
            }
            None => {}
        }
        info!("Stopped");
        self.events.push(Event::PlaybackStopped);
    }

    /// Sets the master volume. Values above 100 are clamped.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        self.events.push(Event::VolumeChanged {
            volume: self.volume,
        });
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.events.push(Event::MuteChanged(muted));
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.muted);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Changes the timbre of the sequencer. A sounding note keeps playing.
    pub fn set_waveform(&mut self, kind: WaveformKind) {
        info!(waveform = %kind, "Setting waveform");
        self.sequencer.set_waveform(kind);
    }

    /// Switches between sine and piano.
    pub fn toggle_waveform(&mut self) {
        let next = match self.sequencer.waveform() {
            WaveformKind::Sine => WaveformKind::Piano,
            _ => WaveformKind::Sine,
        };
        self.set_waveform(next);
    }

    pub fn waveform(&self) -> WaveformKind {
        self.sequencer.waveform()
    }

    /// Fills an interleaved buffer with the configured number of channels.
    ///
    /// This is the real-time path. It never blocks or allocates, and faults degrade to
    /// silence with an [`Event::Error`].
    pub fn fill(&mut self, out: &mut [i16]) {
        match self.active {
            Some(SourceKind::Sequencer) => self.fill_from_sequencer(out),
            Some(SourceKind::File) => self.fill_from_decoder(out),
            None => out.fill(0),
        }

        if self.muted {
            out.fill(0);
        } else if self.volume < 100 {
            let volume = self.volume as i32;
            for sample in out.iter_mut() {
                *sample = (*sample as i32 * volume / 100) as i16;
            }
        }

        if !self.finished_reported && self.is_finished() {
            if let Some(source) = self.active {
                self.finished_reported = true;
                self.events.push(Event::PlaybackFinished { source });
            }
        }
    }

    /// Services an output: starts it when a source is playing, fills every buffer it
    /// needs and stops it once the active source has finished.
    ///
    /// Returns the number of buffers filled.
    pub fn process<O: Output + ?Sized>(&mut self, output: &mut O) -> Result<usize, OutputError> {
        if self.is_playing() && !output.is_running() {
            output.start()?;
        }
        if !output.is_running() {
            return Ok(0);
        }

        let filled = output.service(&mut |buffer: &mut [i16]| self.fill(buffer));

        if !self.is_playing() && !self.is_paused() {
            output.stop();
            if self.is_finished() {
                info!("Playback finished, output stopped");
                self.events.push(Event::PlaybackStopped);
            }
        }
        Ok(filled)
    }

    /// Removes and returns every pending event.
    pub fn events(&self) -> Vec<Event> {
        self.events.drain()
    }

    /// A receiver for the event queue, for consumers on another thread.
    pub fn event_receiver(&self) -> crossbeam_channel::Receiver<Event> {
        self.events.receiver()
    }

    pub fn active_source(&self) -> Option<SourceKind> {
        self.active
    }

    pub fn is_playing(&self) -> bool {
        match self.active {
            Some(SourceKind::Sequencer) => self.sequencer.state() == PlaybackState::Playing,
            Some(SourceKind::File) => self.decoder.state() == DecoderState::Playing,
            None => false,
        }
    }

    pub fn is_paused(&self) -> bool {
        match self.active {
            Some(SourceKind::Sequencer) => self.sequencer.state() == PlaybackState::Paused,
            Some(SourceKind::File) => self.decoder.state() == DecoderState::Paused,
            None => false,
        }
    }

    /// Has the active source reached its end, or failed?
    pub fn is_finished(&self) -> bool {
        match self.active {
            Some(SourceKind::Sequencer) => self.sequencer.is_finished(),
            Some(SourceKind::File) => matches!(
                self.decoder.state(),
                DecoderState::Finished | DecoderState::Error
            ),
            None => false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn decoder(&self) -> &FileStreamDecoder<S> {
        &self.decoder
    }

    pub fn storage_mut(&mut self) -> &mut S {
        self.decoder.storage_mut()
    }

    /// Makes the given source active, stopping whichever was active before.
    fn switch_to(&mut self, source: SourceKind) {
        if self.active == Some(source) {
            return;
        }
        match self.active {
            Some(SourceKind::Sequencer) => self.sequencer.stop(),
            Some(SourceKind::File) => self.decoder.close(),
            None => {}
        }
        self.active = Some(source);
        self.finished_reported = false;
    }

    fn started(&mut self, source: SourceKind) {
        self.finished_reported = false;
        self.events.push(Event::PlaybackStarted { source });
    }

    /// Renders the sequencer's mono stream and copies it to every channel.
    fn fill_from_sequencer(&mut self, out: &mut [i16]) {
        let channels = self.config.format.channels as usize;
        let frames = out.len() / channels;

        self.sequencer.generate_samples(&mut out[..frames]);
        if channels > 1 {
            // Expand in place from the back so no sample is overwritten before it is read.
            for frame in (0..frames).rev() {
                let sample = out[frame];
                out[frame * channels..(frame + 1) * channels].fill(sample);
            }
        }
        out[frames * channels..].fill(0);

        if let Some(index) = self.sequencer.take_note_change() {
            if let Some(note) = self.sequencer.sequence().notes().get(index) {
                self.events.push(Event::NoteChanged {
                    index,
                    frequency: note.frequency,
                });
            }
        }
    }

    /// Renders the decoder's stereo stream, downmixing it for mono outputs.
    fn fill_from_decoder(&mut self, out: &mut [i16]) {
        if self.config.format.channels == 2 {
            self.decoder.generate_frames(out);
        } else {
            for chunk in out.chunks_mut(SCRATCH_FRAMES) {
                let stereo = &mut self.scratch[..chunk.len() * 2];
                self.decoder.generate_frames(stereo);
                for (sample, frame) in chunk.iter_mut().zip(stereo.chunks_exact(2)) {
                    *sample = ((frame[0] as i32 + frame[1] as i32) / 2) as i16;
                }
            }
        }

        if let Some(fault) = self.decoder.take_fault() {
            error!(err = %fault, "File playback failed");
            self.events.push(Event::Error {
                message: fault.to_string(),
            });
        }
        if let Some(position_seconds) = self.decoder.take_position_change() {
            self.events.push(Event::PositionChanged {
                position_seconds,
                duration_seconds: self.decoder.duration_seconds(),
            });
        }
    }
}
