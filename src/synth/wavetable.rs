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
use std::f64::consts::PI;
use std::fmt;

use lazy_static::lazy_static;

/// Number of entries in one table cycle. Must be a power of two.
pub const TABLE_SIZE: usize = 2048;

/// Shift that maps a 32-bit phase onto a table index using its top bits.
const INDEX_SHIFT: u32 = 32 - TABLE_SIZE.trailing_zeros();

lazy_static! {
    static ref SHARED: Wavetable = Wavetable::build();
}

/// Precomputed single-cycle waveforms, indexed by phase.
pub struct Wavetable {
    sine: Box<[f32; TABLE_SIZE]>,
}

impl Wavetable {
    fn build() -> Self {
        let mut sine = Box::new([0.0f32; TABLE_SIZE]);
        for (i, value) in sine.iter_mut().enumerate() {
            *value = (2.0 * PI * i as f64 / TABLE_SIZE as f64).sin() as f32;
        }
        Self { sine }
    }

    /// Looks up the sine value for the given phase.
    #[inline]
    pub fn sine(&self, phase: u32) -> f32 {
        self.sine[(phase >> INDEX_SHIFT) as usize]
    }
}

impl fmt::Debug for Wavetable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wavetable")
            .field("size", &TABLE_SIZE)
            .finish_non_exhaustive()
    }
}

/// Returns the process-wide table, building it on first use.
///
/// Callers keep the returned reference so the generation path never touches the
/// lazy initializer.
pub fn shared() -> &'static Wavetable {
    &SHARED
}

/// Forces the tables to be built. Called when an engine is constructed.
pub fn init() {
    lazy_static::initialize(&SHARED);
}
