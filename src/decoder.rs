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

//! Streaming playback of RIFF/WAVE linear PCM files.
//!
//! The decoder reads raw bytes from a [`Storage`] into a fixed read-ahead buffer and
//! converts them to interleaved 16-bit stereo on demand. 8-bit and 16-bit files,
//! mono or stereo, are supported.

mod header;
mod storage;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

pub use header::{supported_formats, SupportedFormat, WavHeader};
pub use storage::{FsStorage, MemoryHandle, MemoryStorage, Storage};

use crate::error::EngineError;
use header::{CHUNK_HEADER_LEN, FORMAT_PREFIX_LEN, MIN_FMT_SIZE};

/// Default size of the read-ahead buffer in bytes.
pub const DEFAULT_READ_AHEAD: usize = 4096;

/// The largest supported frame, 16-bit stereo. The read-ahead buffer is never smaller.
const MAX_BLOCK_ALIGN: usize = 4;

/// Minimum number of frames between position reports.
const POSITION_REPORT_FRAMES: u64 = 1000;

/// Playback state of a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Stopped,
    Playing,
    Paused,
    /// The end of the data was reached.
    Finished,
    /// Storage failed during playback. See [`FileStreamDecoder::take_fault`].
    Error,
}

/// Decodes a WAV file from storage in fixed-size steps.
pub struct FileStreamDecoder<S: Storage> {
    storage: S,
    handle: Option<S::Handle>,
    path: Option<PathBuf>,
    header: Option<WavHeader>,
    /// Read-ahead buffer. Allocated once.
    buffer: Box<[u8]>,
    /// Bytes of the buffer holding data.
    filled: usize,
    /// Bytes of the buffer already decoded.
    consumed: usize,
    /// Current frame.
    position: u64,
    total_frames: u64,
    volume: f32,
    state: DecoderState,
    fault: Option<EngineError>,
    reported_position: u64,
}

impl<S: Storage> FileStreamDecoder<S> {
    /// Creates a decoder with a read-ahead buffer of the given size.
    pub fn new(storage: S, read_ahead: usize) -> FileStreamDecoder<S> {
        FileStreamDecoder {
            storage,
            handle: None,
            path: None,
            header: None,
            buffer: vec![0u8; read_ahead.max(MAX_BLOCK_ALIGN)].into_boxed_slice(),
            filled: 0,
            consumed: 0,
            position: 0,
            total_frames: 0,
            volume: 1.0,
            state: DecoderState::Stopped,
            fault: None,
            reported_position: 0,
        }
    }

    /// Opens and validates a file, replacing any file already loaded.
    pub fn load_file(&mut self, path: &Path) -> Result<(), EngineError> {
        self.close();

        let mut handle = self.storage.open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                EngineError::SourceUnavailable(format!("{}: {}", path.display(), e))
            }
            _ => EngineError::Io(e),
        })?;

        let header = match read_header(&mut self.storage, &mut handle) {
            Ok(header) => header,
            Err(e) => {
                self.storage.close(handle);
                warn!(path = ?path, err = %e, "Unable to read WAV header");
                return Err(e);
            }
        };

        info!(
            path = ?path,
            channels = header.channels,
            sample_rate = header.sample_rate,
            bits_per_sample = header.bits_per_sample,
            duration = header.duration_seconds(),
            "Loaded WAV file"
        );

        self.handle = Some(handle);
        self.path = Some(path.to_path_buf());
        self.total_frames = header.total_frames();
        self.header = Some(header);
        Ok(())
    }

    /// Starts or resumes playback. A finished stream starts again from the beginning.
    pub fn play(&mut self) -> Result<(), EngineError> {
        if self.header.is_none() {
            return Err(EngineError::SourceUnavailable(
                "no file loaded".to_string(),
            ));
        }
        if matches!(self.state, DecoderState::Finished | DecoderState::Error) {
            self.rewind()?;
        }
        self.state = DecoderState::Playing;
        Ok(())
    }

    /// Toggles between playing and paused.
    pub fn pause(&mut self) {
        self.state = match self.state {
            DecoderState::Playing => DecoderState::Paused,
            DecoderState::Paused => DecoderState::Playing,
            state => state,
        };
    }

    /// Stops playback and rewinds to the start of the data.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.state = DecoderState::Stopped;
        if self.header.is_some() {
            self.rewind()?;
        }
        Ok(())
    }

    /// Moves to the given time. Times past the end land on the final frame.
    pub fn seek_to(&mut self, seconds: f32) -> Result<(), EngineError> {
        let header = self.header.ok_or_else(|| {
            EngineError::SourceUnavailable("no file loaded".to_string())
        })?;

        let target = if seconds.is_nan() {
            0
        } else {
            (seconds as f64 * header.sample_rate as f64)
                .round()
                .clamp(0.0, self.total_frames as f64) as u64
        };
        self.seek_frame(target)?;

        if matches!(self.state, DecoderState::Finished | DecoderState::Error)
            && target < self.total_frames
        {
            self.state = DecoderState::Paused;
        }
        debug!(seconds, frame = target, "Seeked");
        Ok(())
    }

    /// Sets the linear gain applied to decoded samples, clamped to [0.0, 1.0].
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Fills an interleaved stereo buffer and returns the number of frames decoded.
    ///
    /// Anything not decoded is zero-filled. Reaching the end of the data moves the
    /// decoder to [`DecoderState::Finished`]; a storage failure moves it to
    /// [`DecoderState::Error`].
    pub fn generate_frames(&mut self, out: &mut [i16]) -> usize {
        let header = match self.header {
            Some(header) if self.state == DecoderState::Playing => header,
            _ => {
                out.fill(0);
                return 0;
            }
        };

        let block_align = header.block_align as usize;
        let frames = out.len() / 2;
        let mut written = 0;

        while written < frames {
            if self.position >= self.total_frames {
                self.finish();
                break;
            }

            if self.filled - self.consumed < block_align {
                match self.refill() {
                    Ok(()) => continue,
                    Err(e) if !e.is_fault() => {
                        self.finish();
                        break;
                    }
                    Err(e) => {
                        self.fail(e);
                        break;
                    }
                }
            }

            let frame = &self.buffer[self.consumed..self.consumed + block_align];
            let (left, right) = decode_frame(frame, header.channels, header.bits_per_sample);
            out[written * 2] = self.apply_volume(left);
            out[written * 2 + 1] = self.apply_volume(right);

            self.consumed += block_align;
            self.position += 1;
            written += 1;
        }

        out[written * 2..].fill(0);
        written
    }

    /// Returns the position if it moved far enough since the last report.
    pub fn take_position_change(&mut self) -> Option<f32> {
        if self.position.abs_diff(self.reported_position) <= POSITION_REPORT_FRAMES {
            return None;
        }
        self.reported_position = self.position;
        Some(self.position_seconds())
    }

    /// Returns the storage failure that moved the decoder to the error state.
    pub fn take_fault(&mut self) -> Option<EngineError> {
        self.fault.take()
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn has_file_loaded(&self) -> bool {
        self.header.is_some()
    }

    pub fn header(&self) -> Option<&WavHeader> {
        self.header.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn position_frames(&self) -> u64 {
        self.position
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn position_seconds(&self) -> f32 {
        match self.header {
            Some(header) => (self.position as f64 / header.sample_rate as f64) as f32,
            None => 0.0,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        self.header.map_or(0.0, |header| header.duration_seconds())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Closes the current file, if any.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.storage.close(handle);
        }
        self.path = None;
        self.header = None;
        self.total_frames = 0;
        self.state = DecoderState::Stopped;
        self.fault = None;
        self.reset_position(0);
    }

    fn rewind(&mut self) -> Result<(), EngineError> {
        self.fault = None;
        self.seek_frame(0)
    }

    fn seek_frame(&mut self, frame: u64) -> Result<(), EngineError> {
        let (Some(header), Some(handle)) = (self.header, self.handle.as_mut()) else {
            return Err(EngineError::SourceUnavailable(
                "no file loaded".to_string(),
            ));
        };
        let offset = header.data_offset() + frame * header.block_align as u64;
        self.storage.seek(handle, offset)?;
        self.reset_position(frame);
        Ok(())
    }

    fn reset_position(&mut self, frame: u64) {
        self.position = frame;
        self.reported_position = frame;
        self.filled = 0;
        self.consumed = 0;
    }

    /// Moves any partial frame to the front of the buffer and reads more bytes after it.
    /// A read of zero bytes is the end of the stream.
    fn refill(&mut self) -> Result<(), EngineError> {
        let leftover = self.filled - self.consumed;
        self.buffer.copy_within(self.consumed..self.filled, 0);
        self.filled = leftover;
        self.consumed = 0;

        let Some(handle) = self.handle.as_mut() else {
            return Err(EngineError::ExhaustedSource);
        };
        let count = self.storage.read(handle, &mut self.buffer[leftover..])?;
        if count == 0 {
            return Err(EngineError::ExhaustedSource);
        }
        self.filled += count;
        Ok(())
    }

    fn finish(&mut self) {
        if self.state != DecoderState::Finished {
            debug!(frames = self.position, "Reached end of file");
        }
        self.state = DecoderState::Finished;
    }

    fn fail(&mut self, error: EngineError) {
        warn!(err = %error, frame = self.position, "Storage failed during playback");
        self.state = DecoderState::Error;
        self.fault = Some(error);
    }

    #[inline]
    fn apply_volume(&self, sample: i16) -> i16 {
        (sample as f32 * self.volume) as i16
    }
}

impl<S: Storage> Drop for FileStreamDecoder<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.storage.close(handle);
        }
    }
}

/// Converts one frame to a left/right pair. Mono is duplicated to both channels.
#[inline]
fn decode_frame(frame: &[u8], channels: u16, bits_per_sample: u16) -> (i16, i16) {
    let sample = |index: usize| -> i16 {
        if bits_per_sample == 8 {
            (frame[index] as i16 - 128) * 256
        } else {
            i16::from_le_bytes([frame[index * 2], frame[index * 2 + 1]])
        }
    };

    let left = sample(0);
    let right = if channels == 2 { sample(1) } else { left };
    (left, right)
}

/// Reads and validates the header, leaving the handle at the first PCM byte.
fn read_header<S: Storage>(
    storage: &mut S,
    handle: &mut S::Handle,
) -> Result<WavHeader, EngineError> {
    let mut prefix = [0u8; FORMAT_PREFIX_LEN];
    read_exact(storage, handle, &mut prefix)?;
    let mut header = WavHeader::parse_format(&prefix)?;

    if header.fmt_size > MIN_FMT_SIZE {
        storage.seek(handle, header.fmt_chunk_end())?;
    }

    let mut chunk = [0u8; CHUNK_HEADER_LEN];
    read_exact(storage, handle, &mut chunk)?;
    header.set_data_chunk(&chunk)?;
    header.validate()?;
    Ok(header)
}

fn read_exact<S: Storage>(
    storage: &mut S,
    handle: &mut S::Handle,
    buf: &mut [u8],
) -> Result<(), EngineError> {
    let mut offset = 0;
    while offset < buf.len() {
        let count = storage.read(handle, &mut buf[offset..])?;
        if count == 0 {
            return Err(EngineError::MalformedFormat(
                "file ends inside the header".to_string(),
            ));
        }
        offset += count;
    }
    Ok(())
}
