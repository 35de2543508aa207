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

use tracing::{debug, info};

use super::{Output, OutputError, OutputFormat};

/// A mock device. Doesn't actually play anything.
///
/// Tests ask for buffers with [`Device::request_buffers`]; the next call to
/// [`Output::service`] fills that many and records them.
#[derive(Clone)]
pub struct Device {
    name: String,
    format: Option<OutputFormat>,
    running: bool,
    pending: usize,
    buffer: Vec<i16>,
    recorded: Vec<Vec<i16>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            format: None,
            running: false,
            pending: 0,
            buffer: Vec::new(),
            recorded: Vec::new(),
        }
    }

    /// Marks the given number of buffers as needed by the device.
    pub fn request_buffers(&mut self, count: usize) {
        self.pending += count;
    }

    pub fn pending_buffers(&self) -> usize {
        self.pending
    }

    pub fn format(&self) -> Option<&OutputFormat> {
        self.format.as_ref()
    }

    /// Every buffer filled so far, oldest first.
    pub fn recorded(&self) -> &[Vec<i16>] {
        &self.recorded
    }

    pub fn take_recorded(&mut self) -> Vec<Vec<i16>> {
        std::mem::take(&mut self.recorded)
    }
}

impl Output for Device {
    fn initialize(&mut self, format: &OutputFormat) -> Result<(), OutputError> {
        format
            .validate()
            .map_err(|e| OutputError::UnsupportedFormat(e.to_string()))?;
        info!(device = self.name, format = %format, "Initialized mock output");
        self.buffer = vec![0; format.buffer_samples()];
        self.format = Some(*format);
        Ok(())
    }

    fn start(&mut self) -> Result<(), OutputError> {
        if self.format.is_none() {
            return Err(OutputError::NotInitialized);
        }
        self.running = true;
        debug!(device = self.name, "Mock output started");
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
        debug!(device = self.name, "Mock output stopped");
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn service(&mut self, fill: &mut dyn FnMut(&mut [i16])) -> usize {
        if !self.running {
            return 0;
        }

        let count = std::mem::take(&mut self.pending);
        for _ in 0..count {
            self.buffer.fill(0);
            fill(&mut self.buffer);
            self.recorded.push(self.buffer.clone());
        }
        count
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_requires_initialize() {
        let mut device = Device::get("mock");
        assert!(matches!(device.start(), Err(OutputError::NotInitialized)));

        device
            .initialize(&OutputFormat::new(8000, 1, 4).unwrap())
            .unwrap();
        device.start().unwrap();
        assert!(device.is_running());
        device.stop();
        assert!(!device.is_running());
    }

    #[test]
    fn test_service_fills_pending_buffers() {
        let mut device = Device::get("mock");
        device
            .initialize(&OutputFormat::new(8000, 2, 3).unwrap())
            .unwrap();
        device.request_buffers(2);

        // Nothing is drained while stopped.
        let mut calls = 0;
        assert_eq!(device.service(&mut |_| calls += 1), 0);
        assert_eq!(calls, 0);

        device.start().unwrap();
        let mut next = 0i16;
        let filled = device.service(&mut |buffer| {
            for sample in buffer.iter_mut() {
                *sample = next;
                next += 1;
            }
        });
        assert_eq!(filled, 2);
        assert_eq!(device.pending_buffers(), 0);
        assert_eq!(
            device.recorded(),
            &[vec![0, 1, 2, 3, 4, 5], vec![6, 7, 8, 9, 10, 11]]
        );
        assert_eq!(device.take_recorded().len(), 2);
        assert!(device.recorded().is_empty());
    }
}
