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
use crate::error::EngineError;

/// Length of the RIFF header plus the "fmt " chunk header and its 16 mandatory bytes.
pub const FORMAT_PREFIX_LEN: usize = 36;

/// Length of a chunk header: a four byte tag followed by a 32-bit size.
pub const CHUNK_HEADER_LEN: usize = 8;

/// Size of a fmt chunk without extension bytes.
pub const MIN_FMT_SIZE: u32 = 16;

/// Encoding tag for integer linear PCM.
pub const PCM_ENCODING: u16 = 1;

/// A channel layout and bit depth the decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedFormat {
    pub channels: u16,
    pub bits_per_sample: u16,
}

const SUPPORTED_FORMATS: [SupportedFormat; 4] = [
    SupportedFormat {
        channels: 1,
        bits_per_sample: 8,
    },
    SupportedFormat {
        channels: 1,
        bits_per_sample: 16,
    },
    SupportedFormat {
        channels: 2,
        bits_per_sample: 8,
    },
    SupportedFormat {
        channels: 2,
        bits_per_sample: 16,
    },
];

/// Lists every layout the decoder can play.
pub fn supported_formats() -> &'static [SupportedFormat] {
    &SUPPORTED_FORMATS
}

/// The header of a RIFF/WAVE linear PCM file. All fields are little-endian on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_tag: [u8; 4],
    pub riff_size: u32,
    pub wave_tag: [u8; 4],
    pub fmt_tag: [u8; 4],
    pub fmt_size: u32,
    pub encoding: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_tag: [u8; 4],
    pub data_size: u32,
}

fn tag(bytes: &[u8], offset: usize) -> [u8; 4] {
    [
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]
}

fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn le_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(tag(bytes, offset))
}

fn check_tag(found: [u8; 4], expected: &[u8; 4]) -> Result<(), EngineError> {
    if &found != expected {
        return Err(EngineError::MalformedFormat(format!(
            "expected tag {:?}, found {:?}",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(&found)
        )));
    }
    Ok(())
}

impl WavHeader {
    /// Parses the RIFF header and the mandatory part of the "fmt " chunk.
    ///
    /// The data chunk is read separately with [`WavHeader::set_data_chunk`] because
    /// its offset depends on the fmt chunk size.
    pub fn parse_format(bytes: &[u8; FORMAT_PREFIX_LEN]) -> Result<WavHeader, EngineError> {
        let header = WavHeader {
            riff_tag: tag(bytes, 0),
            riff_size: le_u32(bytes, 4),
            wave_tag: tag(bytes, 8),
            fmt_tag: tag(bytes, 12),
            fmt_size: le_u32(bytes, 16),
            encoding: le_u16(bytes, 20),
            channels: le_u16(bytes, 22),
            sample_rate: le_u32(bytes, 24),
            byte_rate: le_u32(bytes, 28),
            block_align: le_u16(bytes, 32),
            bits_per_sample: le_u16(bytes, 34),
            data_tag: [0; 4],
            data_size: 0,
        };

        check_tag(header.riff_tag, b"RIFF")?;
        check_tag(header.wave_tag, b"WAVE")?;
        check_tag(header.fmt_tag, b"fmt ")?;
        if header.fmt_size < MIN_FMT_SIZE {
            return Err(EngineError::MalformedFormat(format!(
                "fmt chunk is {} bytes, expected at least {}",
                header.fmt_size, MIN_FMT_SIZE
            )));
        }
        Ok(header)
    }

    /// Fills in the data chunk header.
    pub fn set_data_chunk(&mut self, bytes: &[u8; CHUNK_HEADER_LEN]) -> Result<(), EngineError> {
        self.data_tag = tag(bytes, 0);
        self.data_size = le_u32(bytes, 4);
        check_tag(self.data_tag, b"data")
    }

    /// Checks that the format is one the decoder can play.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.encoding != PCM_ENCODING {
            return Err(EngineError::UnsupportedEncoding(format!(
                "encoding tag {} is not linear PCM",
                self.encoding
            )));
        }
        if !supported_formats()
            .iter()
            .any(|f| f.channels == self.channels && f.bits_per_sample == self.bits_per_sample)
        {
            return Err(EngineError::UnsupportedEncoding(format!(
                "{} channel(s) at {} bits per sample",
                self.channels, self.bits_per_sample
            )));
        }
        if self.sample_rate == 0 {
            return Err(EngineError::MalformedFormat(
                "sample rate is zero".to_string(),
            ));
        }

        let expected_align = self.channels * self.bits_per_sample / 8;
        if self.block_align != expected_align {
            return Err(EngineError::MalformedFormat(format!(
                "block align is {}, expected {}",
                self.block_align, expected_align
            )));
        }
        let expected_rate = self.sample_rate as u64 * expected_align as u64;
        if self.byte_rate as u64 != expected_rate {
            return Err(EngineError::MalformedFormat(format!(
                "byte rate is {}, expected {}",
                self.byte_rate, expected_rate
            )));
        }
        Ok(())
    }

    /// Offset of the first byte after the fmt chunk. Chunks are padded to an even size.
    pub fn fmt_chunk_end(&self) -> u64 {
        let padded = self.fmt_size as u64 + (self.fmt_size as u64 & 1);
        12 + CHUNK_HEADER_LEN as u64 + padded
    }

    /// Offset of the first PCM byte.
    pub fn data_offset(&self) -> u64 {
        self.fmt_chunk_end() + CHUNK_HEADER_LEN as u64
    }

    /// Number of whole frames in the data chunk.
    pub fn total_frames(&self) -> u64 {
        if self.block_align == 0 {
            return 0;
        }
        self.data_size as u64 / self.block_align as u64
    }

    /// Playing time in seconds.
    pub fn duration_seconds(&self) -> f32 {
        if self.byte_rate == 0 {
            return 0.0;
        }
        (self.data_size as f64 / self.byte_rate as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::wav_bytes;

    fn split(bytes: &[u8]) -> ([u8; FORMAT_PREFIX_LEN], [u8; CHUNK_HEADER_LEN]) {
        let mut prefix = [0u8; FORMAT_PREFIX_LEN];
        prefix.copy_from_slice(&bytes[..FORMAT_PREFIX_LEN]);
        let mut chunk = [0u8; CHUNK_HEADER_LEN];
        chunk.copy_from_slice(&bytes[FORMAT_PREFIX_LEN..FORMAT_PREFIX_LEN + CHUNK_HEADER_LEN]);
        (prefix, chunk)
    }

    fn parse(bytes: &[u8]) -> Result<WavHeader, EngineError> {
        let (prefix, chunk) = split(bytes);
        let mut header = WavHeader::parse_format(&prefix)?;
        header.set_data_chunk(&chunk)?;
        header.validate()?;
        Ok(header)
    }

    #[test]
    fn test_stereo_16_bit() {
        let data_size = 44100 * 4 * 3;
        let bytes = wav_bytes(2, 44100, 16, &vec![0u8; data_size]);
        let header = parse(&bytes).unwrap();

        assert_eq!(header.channels, 2);
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.byte_rate, 44100 * 4);
        assert_eq!(header.block_align, 4);
        assert_eq!(header.data_size as usize, data_size);
        assert_eq!(header.data_offset(), 44);
        assert_eq!(header.total_frames(), 44100 * 3);
        assert_eq!(header.duration_seconds(), 3.0);
    }

    #[test]
    fn test_mono_8_bit() {
        let bytes = wav_bytes(1, 8000, 8, &[128u8; 4000]);
        let header = parse(&bytes).unwrap();
        assert_eq!(header.block_align, 1);
        assert_eq!(header.total_frames(), 4000);
        assert_eq!(header.duration_seconds(), 0.5);
    }

    #[test]
    fn test_bad_tags() {
        for (offset, replacement) in [(0, b"RIFX"), (8, b"WAVX"), (12, b"fmt_"), (36, b"date")] {
            let mut bytes = wav_bytes(2, 44100, 16, &[0u8; 16]);
            bytes[offset..offset + 4].copy_from_slice(replacement);
            assert!(
                matches!(parse(&bytes), Err(EngineError::MalformedFormat(_))),
                "tag at {offset} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_pcm_encoding() {
        let mut bytes = wav_bytes(2, 44100, 16, &[0u8; 16]);
        // IEEE float
        bytes[20..22].copy_from_slice(&3u16.to_le_bytes());
        assert!(matches!(
            parse(&bytes),
            Err(EngineError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_unsupported_layouts() {
        let bytes = wav_bytes(2, 44100, 24, &[0u8; 18]);
        assert!(matches!(
            parse(&bytes),
            Err(EngineError::UnsupportedEncoding(_))
        ));

        let bytes = wav_bytes(6, 44100, 16, &[0u8; 24]);
        assert!(matches!(
            parse(&bytes),
            Err(EngineError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_inconsistent_fields() {
        let mut bytes = wav_bytes(2, 44100, 16, &[0u8; 16]);
        bytes[32..34].copy_from_slice(&2u16.to_le_bytes());
        assert!(matches!(parse(&bytes), Err(EngineError::MalformedFormat(_))));

        let mut bytes = wav_bytes(2, 44100, 16, &[0u8; 16]);
        bytes[24..28].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(parse(&bytes), Err(EngineError::MalformedFormat(_))));

        let mut bytes = wav_bytes(2, 44100, 16, &[0u8; 16]);
        bytes[16..20].copy_from_slice(&14u32.to_le_bytes());
        assert!(matches!(parse(&bytes), Err(EngineError::MalformedFormat(_))));
    }

    #[test]
    fn test_extended_fmt_chunk_offset() {
        let (prefix, _) = split(&wav_bytes(1, 22050, 16, &[]));
        let mut header = WavHeader::parse_format(&prefix).unwrap();
        header.fmt_size = 18;
        assert_eq!(header.fmt_chunk_end(), 38);
        assert_eq!(header.data_offset(), 46);
        header.fmt_size = 19;
        assert_eq!(header.data_offset(), 48);
    }

    #[test]
    fn test_supported_formats() {
        let formats = supported_formats();
        assert_eq!(formats.len(), 4);
        assert!(formats.contains(&SupportedFormat {
            channels: 2,
            bits_per_sample: 16
        }));
        assert!(!formats.iter().any(|f| f.bits_per_sample == 24));
    }
}
