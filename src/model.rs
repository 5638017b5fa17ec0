//!
//! Sinusoidal speech model
//!
//! A 10ms sub-frame of speech is described by a fundamental `wo`, the
//! `l` harmonics below 4kHz, their amplitudes and phases and a binary
//! voicing decision.
//!

use std::f32::consts::PI;

pub const TWO_PI: f32 = 2.0 * PI;

/// Sampling rate in Hz
pub const SAMPLE_RATE: usize = 8000;
/// Samples in a 10ms sub-frame
pub const N: usize = 80;
/// Pitch analysis window
pub const M: usize = 320;
/// Analysis window width
pub const NW: usize = 279;
/// Trapezoidal synthesis window overlap
pub const TW: usize = 40;
/// Minimum pitch period in samples (400Hz)
pub const P_MIN: usize = 20;
/// Maximum pitch period in samples (50Hz)
pub const P_MAX: usize = 160;
/// Maximum number of harmonics
pub const MAX_AMP: usize = 80;
pub const FFT_ENC: usize = 512;
pub const FFT_DEC: usize = 512;
pub const LPC_ORD: usize = 10;

pub const WO_MIN: f32 = TWO_PI / P_MAX as f32;
pub const WO_MAX: f32 = TWO_PI / P_MIN as f32;

/// Harmonic count for a given fundamental
#[inline(always)]
pub fn harmonics(wo: f32) -> usize {
    ((PI / wo).floor() as usize).min(MAX_AMP)
}

#[derive(Debug, Clone, Copy)]
pub struct Model {
    pub wo: f32,
    pub l: usize,
    /// Amplitudes, `a[1..=l]` are meaningful
    pub a: [f32; MAX_AMP + 1],
    /// Phases, `phi[1..=l]` are meaningful
    pub phi: [f32; MAX_AMP + 1],
    pub voiced: bool,
}

impl Default for Model {
    fn default() -> Self {
        Model::new(WO_MIN)
    }
}

impl Model {
    pub fn new(wo: f32) -> Self {
        Model {
            wo,
            l: harmonics(wo),
            a: [0f32; MAX_AMP + 1],
            phi: [0f32; MAX_AMP + 1],
            voiced: false,
        }
    }

    pub fn set_wo(&mut self, wo: f32) {
        self.wo = wo;
        self.l = harmonics(wo);
    }

    /// Sum of the squared harmonic amplitudes
    pub fn energy(&self) -> f32 {
        self.a[1..=self.l].iter().map(|a| a * a).sum()
    }
}
