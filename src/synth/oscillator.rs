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
use super::envelope::{Envelope, EnvelopeParams};
use super::waveform::WaveformKind;
use super::wavetable::{self, Wavetable};

/// Relative weights of the piano harmonics, fundamental first.
const PIANO_HARMONICS: [f32; 6] = [1.0, 0.4, 0.2, 0.1, 0.05, 0.03];

/// Half of the phase range. Square waves flip sign here.
const HALF_PHASE: u32 = 0x8000_0000;

/// Converts a sample in [-1.0, 1.0] to 16-bit PCM. Values outside the range are clamped.
#[inline]
pub fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Computes the per-sample phase increment for a frequency at a sample rate.
fn phase_step(frequency: f32, sample_rate: u32) -> u32 {
    if sample_rate == 0 || !frequency.is_finite() || frequency <= 0.0 {
        return 0;
    }
    let step = (frequency as f64 * 4_294_967_296.0 / sample_rate as f64).round();
    (step as u64 & u32::MAX as u64) as u32
}

/// A single phase-accumulator oscillator shaped by an ADSR envelope.
#[derive(Debug, Clone)]
pub struct Oscillator {
    /// Shared lookup tables.
    table: &'static Wavetable,
    /// The waveform shape being produced.
    kind: WaveformKind,
    sample_rate: u32,
    frequency: f32,
    /// Peak amplitude [0.0, 1.0].
    amplitude: f32,
    /// Phase accumulator. One full cycle spans the whole u32 range.
    phase: u32,
    phase_step: u32,
    envelope: Envelope,
}

impl Oscillator {
    /// Creates a silent oscillator. The gate starts closed and the frequency at zero.
    pub fn new(kind: WaveformKind, sample_rate: u32, envelope: EnvelopeParams) -> Self {
        Self {
            table: wavetable::shared(),
            kind,
            sample_rate,
            frequency: 0.0,
            amplitude: 0.0,
            phase: 0,
            phase_step: 0,
            envelope: Envelope::new(envelope),
        }
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.phase_step = phase_step(frequency, self.sample_rate);
    }

    /// Sets the peak amplitude, clamped to [0.0, 1.0].
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.phase_step = phase_step(self.frequency, sample_rate);
    }

    /// Changes the waveform. Envelope, phase and amplitude are left untouched.
    pub fn set_waveform(&mut self, kind: WaveformKind) {
        self.kind = kind;
    }

    pub fn set_envelope(&mut self, params: EnvelopeParams) {
        self.envelope.set_params(params);
    }

    pub fn note_on(&mut self) {
        self.envelope.note_on();
    }

    pub fn note_off(&mut self) {
        self.envelope.note_off();
    }

    /// Zeros the phase accumulator and returns the envelope to rest.
    pub fn reset_phase(&mut self) {
        self.phase = 0;
        self.envelope.reset();
    }

    pub fn waveform(&self) -> WaveformKind {
        self.kind
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn phase_step(&self) -> u32 {
        self.phase_step
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Produces the next sample in [-1.0, 1.0] and advances the oscillator.
    pub fn next_sample_f32(&mut self) -> f32 {
        let env = self.envelope.level();
        let value = match self.kind {
            WaveformKind::Piano => self.piano(env),
            kind => self.raw(kind),
        };
        let sample = (value * env * self.amplitude).clamp(-1.0, 1.0);

        self.phase = self.phase.wrapping_add(self.phase_step);
        self.envelope.advance();
        sample
    }

    /// Produces the next 16-bit sample and advances the oscillator.
    #[inline]
    pub fn next_sample(&mut self) -> i16 {
        to_i16(self.next_sample_f32())
    }

    /// Fills a mono buffer with consecutive samples.
    pub fn fill(&mut self, out: &mut [i16]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    fn raw(&self, kind: WaveformKind) -> f32 {
        let phase = self.phase;
        match kind {
            WaveformKind::Square => {
                if phase < HALF_PHASE {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveformKind::Triangle => {
                let p = unit_phase(phase);
                if p < 0.5 {
                    4.0 * p - 1.0
                } else {
                    3.0 - 4.0 * p
                }
            }
            WaveformKind::Sawtooth => 2.0 * unit_phase(phase) - 1.0,
            WaveformKind::Sine | WaveformKind::Piano => self.table.sine(phase),
        }
    }

    /// Additive piano tone. Upper harmonics fade faster than the fundamental as the
    /// envelope falls.
    fn piano(&self, env: f32) -> f32 {
        PIANO_HARMONICS
            .iter()
            .enumerate()
            .map(|(h, weight)| {
                let harmonic_phase = self.phase.wrapping_mul(h as u32 + 1);
                let mut value = self.table.sine(harmonic_phase) * weight;
                if h > 0 {
                    value *= env.powf(h as f32 * 0.5 + 1.0);
                }
                value
            })
            .sum()
    }
}

/// Phase as a fraction of a cycle [0.0, 1.0).
#[inline]
fn unit_phase(phase: u32) -> f32 {
    (phase as f64 / 4_294_967_296.0) as f32
}
