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

pub mod format;
pub mod mock;

pub use format::OutputFormat;

/// Errors raised by an output device.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Output has not been initialized")]
    NotInitialized,

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Output device error: {0}")]
    Device(String),
}

/// An audio output that drains fixed-size buffers of interleaved 16-bit samples.
///
/// The output never calls into the engine on its own. Instead the engine polls
/// [`Output::service`], which hands each buffer the device needs to the fill callback.
pub trait Output: fmt::Display {
    /// Prepares the device for the given format.
    fn initialize(&mut self, format: &OutputFormat) -> Result<(), OutputError>;

    /// Starts draining buffers.
    fn start(&mut self) -> Result<(), OutputError>;

    /// Stops draining buffers. Buffers already handed to the device may still play.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Calls `fill` once for every buffer the device needs right now. Returns the number
    /// of buffers filled.
    fn service(&mut self, fill: &mut dyn FnMut(&mut [i16])) -> usize;
}

/// Gets an output with the given name.
pub fn get_output(name: &str) -> Result<Box<dyn Output>, OutputError> {
    if name.starts_with("mock") {
        return Ok(Box::new(mock::Device::get(name)));
    }
    Err(OutputError::Device(format!("no output named {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_output() {
        let output = get_output("mock-speaker").unwrap();
        assert_eq!(output.to_string(), "mock-speaker (Mock)");
        assert!(!output.is_running());

        assert!(matches!(
            get_output("i2s0"),
            Err(OutputError::Device(_))
        ));
    }
}
