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
use std::time::Duration;

const DEFAULT_ATTACK_MS: f32 = 5.0;
const DEFAULT_DECAY_MS: f32 = 20.0;
const DEFAULT_SUSTAIN: f32 = 0.6;
const DEFAULT_RELEASE_MS: f32 = 30.0;
const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// ADSR timing, expressed in samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Attack length in samples.
    pub attack: u32,
    /// Decay length in samples.
    pub decay: u32,
    /// Sustain level [0.0, 1.0].
    pub sustain: f32,
    /// Release length in samples.
    pub release: u32,
}

impl EnvelopeParams {
    /// Creates envelope parameters from times in milliseconds.
    pub fn from_ms(
        attack_ms: f32,
        decay_ms: f32,
        sustain: f32,
        release_ms: f32,
        sample_rate: u32,
    ) -> Self {
        let ms_to_samples = |ms: f32| (ms.max(0.0) * sample_rate as f32 / 1000.0) as u32;
        Self {
            attack: ms_to_samples(attack_ms),
            decay: ms_to_samples(decay_ms),
            sustain: sustain.clamp(0.0, 1.0),
            release: ms_to_samples(release_ms),
        }
    }

    /// Creates envelope parameters from durations.
    pub fn from_durations(
        attack: Duration,
        decay: Duration,
        sustain: f32,
        release: Duration,
        sample_rate: u32,
    ) -> Self {
        let to_ms = |d: Duration| d.as_micros() as f32 / 1000.0;
        Self::from_ms(
            to_ms(attack),
            to_ms(decay),
            sustain,
            to_ms(release),
            sample_rate,
        )
    }

    /// The default short piano-like shape at the given sample rate.
    pub fn default_for_rate(sample_rate: u32) -> Self {
        Self::from_ms(
            DEFAULT_ATTACK_MS,
            DEFAULT_DECAY_MS,
            DEFAULT_SUSTAIN,
            DEFAULT_RELEASE_MS,
            sample_rate,
        )
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::default_for_rate(DEFAULT_SAMPLE_RATE)
    }
}

/// Gate-driven linear ADSR envelope.
///
/// The position counts samples since note-on. While the gate is open the level follows
/// attack, decay and sustain; once closed it ramps from the level held at note-off down
/// to zero over the release window. The position stops advancing after the release
/// window has elapsed.
#[derive(Debug, Clone)]
pub struct Envelope {
    params: EnvelopeParams,
    position: u32,
    gate: bool,
    triggered: bool,
    release_start: u32,
    release_level: f32,
}

impl Envelope {
    pub fn new(params: EnvelopeParams) -> Self {
        Self {
            params,
            position: 0,
            gate: false,
            triggered: false,
            release_start: 0,
            release_level: 0.0,
        }
    }

    pub fn params(&self) -> &EnvelopeParams {
        &self.params
    }

    pub fn set_params(&mut self, params: EnvelopeParams) {
        self.params = params;
    }

    /// Opens the gate and restarts from the beginning of the attack.
    pub fn note_on(&mut self) {
        self.position = 0;
        self.gate = true;
        self.triggered = true;
    }

    /// Closes the gate. The current level becomes the start of the release ramp.
    pub fn note_off(&mut self) {
        if !self.gate {
            return;
        }
        self.release_level = self.held_level(self.position);
        self.release_start = self.position;
        self.gate = false;
    }

    /// Returns the envelope to its untriggered state.
    pub fn reset(&mut self) {
        self.position = 0;
        self.gate = false;
        self.triggered = false;
        self.release_start = 0;
        self.release_level = 0.0;
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn gate(&self) -> bool {
        self.gate
    }

    /// Is this envelope still producing output?
    pub fn is_active(&self) -> bool {
        self.gate || self.in_release()
    }

    /// Current envelope level [0.0, 1.0].
    pub fn level(&self) -> f32 {
        if self.gate {
            return self.held_level(self.position);
        }
        if !self.triggered || self.params.release == 0 {
            return 0.0;
        }

        let elapsed = self.position.saturating_sub(self.release_start);
        if elapsed >= self.params.release {
            return 0.0;
        }
        let progress = elapsed as f32 / self.params.release as f32;
        self.release_level * (1.0 - progress)
    }

    /// Moves the envelope forward by one sample.
    pub fn advance(&mut self) {
        if self.gate || self.in_release() {
            self.position = self.position.saturating_add(1);
        }
    }

    fn in_release(&self) -> bool {
        self.triggered
            && !self.gate
            && self.position.saturating_sub(self.release_start) < self.params.release
    }

    fn held_level(&self, position: u32) -> f32 {
        let EnvelopeParams {
            attack,
            decay,
            sustain,
            ..
        } = self.params;

        if position < attack {
            return position as f32 / attack as f32;
        }
        let decay_position = position - attack;
        if decay_position < decay {
            let progress = decay_position as f32 / decay as f32;
            return 1.0 - progress * (1.0 - sustain);
        }
        sustain
    }
}
