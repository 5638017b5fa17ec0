//!
//! Non-linear pitch estimation
//!
//! The speech is squared, which brings out a spectral line at the
//! fundamental, low-pass filtered and decimated, then searched in the
//! frequency domain.
//!

use crate::complex::*;
use crate::fft::Fft;
use crate::model::*;

const PE_FFT_SIZE: usize = 512;
/// Decimation factor
const DEC: usize = 5;
const NLP_NTAP: usize = 48;
/// DC notch filter pole
const COEFF: f32 = 0.95;
/// Sub-multiple threshold
const CNLP: f32 = 0.3;
/// Low-pass cut-off in Hz, below the 800Hz decimated Nyquist
const FIR_CUTOFF: f32 = 600.0;

/// Pitch tracking context carried between sub-frames
#[derive(Debug, Clone)]
pub struct NlpMemory {
    sq: Vec<f32>,
    mem_x: f32,
    mem_y: f32,
    mem_fir: [f32; NLP_NTAP],
}

impl Default for NlpMemory {
    fn default() -> Self {
        NlpMemory {
            sq: vec![0f32; M],
            mem_x: 0.0,
            mem_y: 0.0,
            mem_fir: [0f32; NLP_NTAP],
        }
    }
}

#[derive(Debug)]
pub struct Nlp {
    w: Vec<f32>,
    fir: Vec<f32>,
    fft: Fft,
}

fn make_fir() -> Vec<f32> {
    use std::f32::consts::PI;
    let fc = FIR_CUTOFF / SAMPLE_RATE as f32;
    let mid = (NLP_NTAP - 1) as f32 / 2.0;

    let h: Vec<f32> = (0..NLP_NTAP)
        .map(|i| {
            let t = i as f32 - mid;
            let sinc = (2.0 * PI * fc * t).sin() / (PI * t);
            let w = 0.54 - 0.46 * (2.0 * PI * i as f32 / (NLP_NTAP - 1) as f32).cos();
            sinc * w
        })
        .collect();

    let gain: f32 = h.iter().sum();

    h.into_iter().map(|v| v / gain).collect()
}

impl Default for Nlp {
    fn default() -> Self {
        Self::new()
    }
}

impl Nlp {
    pub fn new() -> Self {
        use std::f32::consts::PI;
        let len = M / DEC;
        let w = (0..len)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / (len - 1) as f32).cos())
            .collect();

        Nlp {
            w,
            fir: make_fir(),
            fft: Fft::new(PE_FFT_SIZE),
        }
    }

    /// Estimate the pitch period, in samples, of the `sn` history whose
    /// last `N` samples are new.
    pub fn estimate(&self, mem: &mut NlpMemory, sn: &[f32], prev_wo: f32) -> f32 {
        let sq = &mut mem.sq;

        for i in M - N..M {
            sq[i] = sn[i] * sn[i];
        }

        for v in sq[M - N..M].iter_mut() {
            let notch = *v - mem.mem_x + COEFF * mem.mem_y;
            mem.mem_x = *v;
            mem.mem_y = notch;
            // keeps all-zero input away from denormals
            *v = notch + 1.0;
        }

        for v in sq[M - N..M].iter_mut() {
            mem.mem_fir.copy_within(1.., 0);
            mem.mem_fir[NLP_NTAP - 1] = *v;
            *v = mem
                .mem_fir
                .iter()
                .zip(self.fir.iter())
                .map(|(m, h)| m * h)
                .sum();
        }

        let mut fw = [Complex32::default(); PE_FFT_SIZE];
        for (i, (f, w)) in fw.iter_mut().zip(self.w.iter()).enumerate() {
            *f = Complex32::new(sq[i * DEC] * w, 0.0);
        }
        self.fft.forward(&mut fw);

        let mut pw = [0f32; PE_FFT_SIZE];
        for (p, f) in pw.iter_mut().zip(fw.iter()) {
            *p = f.norm_sqr();
        }

        let min_bin = PE_FFT_SIZE * DEC / P_MAX;
        let max_bin = PE_FFT_SIZE * DEC / P_MIN;
        let mut gmax = 0f32;
        let mut gmax_bin = min_bin;
        for (i, &p) in pw.iter().enumerate().take(max_bin + 1).skip(min_bin) {
            if p > gmax {
                gmax = p;
                gmax_bin = i;
            }
        }

        let best_f0 = sub_multiples(&pw, gmax, gmax_bin, prev_wo);

        sq.copy_within(N.., 0);

        SAMPLE_RATE as f32 / best_f0
    }
}

/// Check the sub-multiples of the global peak, a true fundamental often
/// shows up below a stronger harmonic.
fn sub_multiples(pw: &[f32], gmax: f32, gmax_bin: usize, prev_wo: f32) -> f32 {
    use std::f32::consts::PI;
    let min_bin = PE_FFT_SIZE * DEC / P_MAX;
    let prev_f0_bin =
        prev_wo * (4000.0 / PI) * (PE_FFT_SIZE * DEC) as f32 / SAMPLE_RATE as f32;

    let mut cmax_bin = gmax_bin;
    let mut mult = 2;

    while gmax_bin / mult >= min_bin {
        let b = gmax_bin / mult;
        let bmin = ((0.8 * b as f32) as usize).max(min_bin);
        let bmax = (1.2 * b as f32) as usize;

        // favour the previous pitch estimate
        let thresh = if prev_f0_bin > bmin as f32 && prev_f0_bin < bmax as f32 {
            CNLP * 0.5 * gmax
        } else {
            CNLP * gmax
        };

        let mut lmax = 0f32;
        let mut lmax_bin = bmin;
        for (i, &p) in pw.iter().enumerate().take(bmax + 1).skip(bmin) {
            if p > lmax {
                lmax = p;
                lmax_bin = i;
            }
        }

        if lmax > thresh && lmax > pw[lmax_bin - 1] && lmax > pw[lmax_bin + 1] {
            cmax_bin = lmax_bin;
        }

        mult += 1;
    }

    cmax_bin as f32 * SAMPLE_RATE as f32 / (PE_FFT_SIZE * DEC) as f32
}

#[cfg(test)]
mod test {
    use super::*;

    fn tone(f0: f32, offset: usize) -> Vec<f32> {
        (0..M)
            .map(|i| {
                let t = (i + offset) as f32 / SAMPLE_RATE as f32;
                (1..4)
                    .map(|h| 3000.0 / h as f32 * (TWO_PI * f0 * h as f32 * t).sin())
                    .sum()
            })
            .collect()
    }

    #[test]
    fn fir_is_lowpass() {
        let h = make_fir();
        let dc: f32 = h.iter().sum();
        let nyq: f32 = h
            .iter()
            .enumerate()
            .map(|(i, v)| if i % 2 == 0 { *v } else { -*v })
            .sum();

        assert!((dc - 1.0).abs() < 1e-4);
        assert!(nyq.abs() < 0.01);
    }

    #[test]
    fn pitch_of_harmonic_tone() {
        let nlp = Nlp::new();
        let mut mem = NlpMemory::default();
        let mut pitch = 0.0;
        let mut prev_wo = 0.0;

        // let the filter memories settle over a few sub-frames
        for k in 0..8 {
            let sn = tone(200.0, k * N);
            pitch = nlp.estimate(&mut mem, &sn, prev_wo);
            prev_wo = TWO_PI / pitch;
        }

        assert!((pitch - 40.0).abs() < 2.0, "pitch {}", pitch);
    }

    #[test]
    fn silence_stays_in_range() {
        let nlp = Nlp::new();
        let mut mem = NlpMemory::default();
        let sn = vec![0f32; M];

        for _ in 0..4 {
            let pitch = nlp.estimate(&mut mem, &sn, 0.0);
            assert!(pitch.is_finite());
            assert!(pitch >= P_MIN as f32 && pitch <= P_MAX as f32);
        }
    }
}
