//!
//! Sinusoidal synthesis
//!
//! Phases are rebuilt from the LPC filter and a running excitation
//! phase, the postfilter randomises the phase of harmonics buried in the
//! background noise, and each sub-frame is generated with an inverse
//! DFT and overlap-added with the previous one.
//!

use crate::complex::*;
use crate::fft::Fft;
use crate::maths::{Decibel, Rand};
use crate::model::*;

/// Background noise estimation threshold in dB
const BG_THRESH: f32 = 40.0;
/// Background noise estimate update rate
const BG_BETA: f32 = 0.1;
/// Harmonics this many dB above the background keep their phase
const BG_MARGIN: f32 = 6.0;

#[derive(Debug)]
pub struct Synthesiser {
    /// Trapezoidal overlap-add window over `2 * N` samples
    pn: Vec<f32>,
    fft: Fft,
}

fn make_synthesis_window() -> Vec<f32> {
    let mut pn = vec![0f32; 2 * N];
    let step = 1.0 / (2 * TW) as f32;

    let mut win = 0f32;
    for v in pn[N / 2 - TW..N / 2 + TW].iter_mut() {
        *v = win;
        win += step;
    }
    for v in pn[N / 2 + TW..3 * N / 2 - TW].iter_mut() {
        *v = 1.0;
    }
    let mut win = 1f32;
    for v in pn[3 * N / 2 - TW..3 * N / 2 + TW].iter_mut() {
        *v = win;
        win -= step;
    }

    pn
}

impl Default for Synthesiser {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesiser {
    pub fn new() -> Self {
        Synthesiser {
            pn: make_synthesis_window(),
            fft: Fft::new(FFT_DEC),
        }
    }

    /// Zero order phase model: the excitation is a pulse train whose
    /// phase advances by `wo * N` per sub-frame, filtered by `1 / A(z)`.
    pub fn phase_synth_zero_order(
        &self,
        model: &mut Model,
        ak: &[f32],
        ex_phase: &mut f32,
        rng: &mut Rand,
    ) {
        let r = TWO_PI / FFT_DEC as f32;
        let mut a = vec![Complex32::default(); FFT_DEC];

        for (v, &c) in a.iter_mut().zip(ak) {
            v.re = c;
        }
        self.fft.forward(&mut a);

        *ex_phase += model.wo * N as f32;
        *ex_phase -= TWO_PI * (*ex_phase / TWO_PI + 0.5).floor();

        for m in 1..=model.l {
            let b = ((m as f32 * model.wo / r + 0.5) as usize).min(FFT_DEC / 2);
            let h = a[b].conj().unscale(a[b].norm_sqr() + 1e-12);

            let phi = if model.voiced {
                *ex_phase * m as f32
            } else {
                rng.phase()
            };

            model.phi[m] = (h * Complex32::from_polar(&1.0, &phi)).arg();
        }
    }

    /// Overlap-add the next `N` samples of `model` into `sn_`, a `2 * N`
    /// buffer whose first `N` samples are complete afterwards.
    pub fn synthesise(&self, sn_: &mut [f32], model: &Model) {
        sn_.copy_within(N..2 * N - 1, 0);
        sn_[N - 1] = 0.0;

        let mut sw = vec![Complex32::default(); FFT_DEC];
        for l in 1..=model.l {
            let b = ((l as f32 * model.wo * FFT_DEC as f32 / TWO_PI + 0.5) as usize)
                .min(FFT_DEC / 2 - 1);
            let v = Complex32::from_polar(&model.a[l], &model.phi[l]);

            sw[b] = v;
            sw[FFT_DEC - b] = v.conj();
        }

        self.fft.inverse(&mut sw);

        for i in 0..N - 1 {
            sn_[i] += sw[FFT_DEC - N + 1 + i].re * self.pn[i];
        }
        for (j, i) in (N - 1..2 * N).enumerate() {
            sn_[i] = sw[j].re * self.pn[i];
        }
    }
}

/// Track the background noise level on unvoiced sub-frames and give a
/// random phase to the voiced harmonics that do not stand out of it.
pub fn postfilter(model: &mut Model, bg_est: &mut f32, rng: &mut Rand) {
    let e = 1e-12 + model.energy();
    let e = (e / model.l as f32).to_db();

    if e < BG_THRESH && !model.voiced {
        *bg_est = *bg_est * (1.0 - BG_BETA) + e * BG_BETA;
    }

    if model.voiced {
        let thresh = 10f32.powf((*bg_est + BG_MARGIN) / 20.0);
        for m in 1..=model.l {
            if model.a[m] < thresh {
                model.phi[m] = rng.phase();
            }
        }
    }
}
