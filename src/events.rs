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

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::debug;

/// Default number of undelivered events kept before new ones are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Which kind of source an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Sequencer,
    File,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Sequencer => write!(f, "sequencer"),
            SourceKind::File => write!(f, "file"),
        }
    }
}

/// Notifications raised by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    PlaybackStarted { source: SourceKind },
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped,
    /// A non-looping source reached its end.
    PlaybackFinished { source: SourceKind },
    NoteChanged { index: usize, frequency: f32 },
    PositionChanged {
        position_seconds: f32,
        duration_seconds: f32,
    },
    VolumeChanged { volume: u8 },
    MuteChanged(bool),
    Error { message: String },
}

/// A bounded queue of events.
///
/// Pushing never blocks. When the queue is full the new event is dropped.
#[derive(Debug, Clone)]
pub struct EventQueue {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
}

impl EventQueue {
    pub fn new(capacity: usize) -> EventQueue {
        let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
        EventQueue { sender, receiver }
    }

    pub fn push(&self, event: Event) {
        if let Err(TrySendError::Full(event)) = self.sender.try_send(event) {
            debug!(?event, "Event queue full, dropping event");
        }
    }

    /// Removes and returns every queued event.
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }

    /// A receiver that can be handed to another thread.
    pub fn receiver(&self) -> Receiver<Event> {
        self.receiver.clone()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        EventQueue::new(DEFAULT_EVENT_CAPACITY)
    }
}
