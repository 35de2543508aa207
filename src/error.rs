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

/// Errors raised by the engine and its sample sources.
///
/// Setup calls (construction, file loading, seeking) return these directly. During
/// generation they never escape the real-time path; the source falls silent and the
/// error is reported through an [`Event::Error`](crate::Event::Error) instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("No source available: {0}")]
    SourceUnavailable(String),

    #[error("Malformed audio file: {0}")]
    MalformedFormat(String),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source exhausted")]
    ExhaustedSource,
}

impl EngineError {
    /// Returns true if this error is a fault rather than a normal end of stream.
    pub fn is_fault(&self) -> bool {
        !matches!(self, EngineError::ExhaustedSource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_source_is_not_a_fault() {
        assert!(!EngineError::ExhaustedSource.is_fault());
        assert!(EngineError::MalformedFormat("short header".to_string()).is_fault());
        assert!(EngineError::Io(std::io::Error::other("read failed")).is_fault());
    }

    #[test]
    fn test_io_error_conversion() {
        let error: EngineError = std::io::Error::other("seek failed").into();
        assert_eq!(error.to_string(), "Storage error: seek failed");
    }
}
