//!
//! Sinusoidal analysis
//!
//! Turns the windowed sample history into a [`Model`]: pitch, harmonic
//! amplitudes and the voicing decision.
//!

use crate::complex::*;
use crate::fft::Fft;
use crate::model::*;
use crate::nlp::{Nlp, NlpMemory};

/// Voicing threshold in dB
const V_THRESH: f32 = 6.0;

#[derive(Debug)]
pub struct Analyser {
    /// Time domain analysis window
    w: Vec<f32>,
    /// DFT of `w`, centred on `FFT_ENC / 2`
    ww: Vec<f32>,
    fft: Fft,
    nlp: Nlp,
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyser {
    pub fn new() -> Self {
        let fft = Fft::new(FFT_ENC);
        let w = make_analysis_window();
        let ww = window_dft(&fft, &w);

        Analyser {
            w,
            ww,
            fft,
            nlp: Nlp::new(),
        }
    }

    #[inline]
    pub fn window(&self) -> &[f32] {
        &self.w
    }

    /// Shift `speech` into the history and extract the model of the
    /// resulting window.
    pub fn analyse(
        &self,
        sn: &mut [f32],
        nlp: &mut NlpMemory,
        prev_wo: &mut f32,
        speech: &[i16],
    ) -> Model {
        sn.copy_within(N.., 0);
        for (s, &v) in sn[M - N..].iter_mut().zip(speech) {
            *s = v as f32;
        }

        let sw = self.dft_speech(sn);

        let pitch = self.nlp.estimate(nlp, sn, *prev_wo);
        let mut model = Model::new(TWO_PI / pitch);

        two_stage_pitch_refinement(&mut model, &sw);
        estimate_amplitudes(&mut model, &sw);
        est_voicing_mbe(&mut model, &sw, &self.ww);

        *prev_wo = model.wo;

        model
    }

    /// DFT of the windowed history, with the window centred on the time
    /// origin so the phases are meaningful.
    fn dft_speech(&self, sn: &[f32]) -> Vec<Complex32> {
        let mut sw = vec![Complex32::default(); FFT_ENC];
        let half = NW / 2;

        for i in 0..half {
            sw[i].re = sn[i + M / 2] * self.w[i + M / 2];
            sw[FFT_ENC - half + i].re = sn[i + M / 2 - half] * self.w[i + M / 2 - half];
        }

        self.fft.forward(&mut sw);

        sw
    }
}

/// Hann window of `NW` samples centred on the `M` sample analysis
/// window, scaled so that harmonic amplitudes come out of the DFT
/// without further normalisation.
fn make_analysis_window() -> Vec<f32> {
    let mut w = vec![0f32; M];
    let start = M / 2 - NW / 2;

    for (j, v) in w[start..start + NW].iter_mut().enumerate() {
        *v = 0.5 - 0.5 * (TWO_PI * j as f32 / (NW - 1) as f32).cos();
    }

    let e: f32 = w.iter().map(|v| v * v).sum();
    let norm = 1.0 / (e * FFT_ENC as f32).sqrt();

    for v in w.iter_mut() {
        *v *= norm;
    }

    w
}

fn window_dft(fft: &Fft, w: &[f32]) -> Vec<f32> {
    let mut shifted = vec![Complex32::default(); FFT_ENC];
    let half = NW / 2;

    for i in 0..half {
        shifted[i].re = w[i + M / 2];
    }
    for (i, v) in shifted[FFT_ENC - half..].iter_mut().enumerate() {
        v.re = w[M / 2 - half + i];
    }

    fft.forward(&mut shifted);

    let mut ww = vec![0f32; FFT_ENC];
    for i in 0..FFT_ENC / 2 {
        ww[i] = shifted[i + FFT_ENC / 2].re;
        ww[i + FFT_ENC / 2] = shifted[i].re;
    }

    ww
}

#[inline(always)]
fn bin(f: f32) -> usize {
    ((f * FFT_ENC as f32 / TWO_PI + 0.5) as usize).min(FFT_ENC - 1)
}

/// Harmonic sum search for the `wo` in `[pmin, pmax]` that captures the
/// most energy.
fn hs_pitch_refinement(model: &mut Model, sw: &[Complex32], pmin: f32, pmax: f32, pstep: f32) {
    model.l = harmonics(model.wo);

    let mut wom = model.wo;
    let mut em = 0f32;
    let mut p = pmin;

    while p <= pmax {
        let wo = TWO_PI / p;
        let e: f32 = (1..=model.l).map(|m| sw[bin(m as f32 * wo)].norm_sqr()).sum();

        if e > em {
            em = e;
            wom = wo;
        }
        p += pstep;
    }

    model.wo = wom;
}

fn two_stage_pitch_refinement(model: &mut Model, sw: &[Complex32]) {
    let p = TWO_PI / model.wo;
    hs_pitch_refinement(model, sw, p - 5.0, p + 5.0, 1.0);

    let p = TWO_PI / model.wo;
    hs_pitch_refinement(model, sw, p - 1.0, p + 1.0, 0.25);

    model.set_wo(model.wo.max(WO_MIN).min(WO_MAX));
}

fn estimate_amplitudes(model: &mut Model, sw: &[Complex32]) {
    let wo = model.wo;

    for m in 1..=model.l {
        let am = bin((m as f32 - 0.5) * wo);
        let bm = bin((m as f32 + 0.5) * wo);
        let den: f32 = sw[am..bm].iter().map(|v| v.norm_sqr()).sum();

        model.a[m] = den.sqrt();
    }
}

/// Multi-band excitation voicing decision over the first kHz, returns the
/// fit SNR in dB.
fn est_voicing_mbe(model: &mut Model, sw: &[Complex32], ww: &[f32]) -> f32 {
    let wo = model.wo;
    let nyquist = (SAMPLE_RATE / 2) as f32;
    let l_1000hz = (model.l as f32 * 1000.0 / nyquist) as usize;
    let scale = FFT_ENC as f32 / TWO_PI;

    let sig = 1e-4 + model.a[1..=l_1000hz].iter().map(|a| a * a).sum::<f32>();
    let mut error = 1e-4f32;

    for l in 1..=l_1000hz {
        let al = ((l as f32 - 0.5) * wo * scale).ceil() as usize;
        let bl = ((l as f32 + 0.5) * wo * scale).ceil() as usize;
        let offset = (FFT_ENC as f32 / 2.0 - l as f32 * wo * scale + 0.5) as usize;

        // amplitude assuming the band is fully voiced
        let mut am = Complex32::default();
        let mut den = 0f32;
        for m in al..bl {
            let w = ww[offset + m];
            am += sw[m].scale(w);
            den += w * w;
        }
        if den > 0.0 {
            am = am.unscale(den);
        }

        for m in al..bl {
            error += (sw[m] - am.scale(ww[offset + m])).norm_sqr();
        }
    }

    let snr = 10.0 * (sig / error).log10();
    model.voiced = snr > V_THRESH;

    // voiced speech is dominated by low frequency energy, unvoiced by high
    let l_2000hz = (model.l as f32 * 2000.0 / nyquist) as usize;
    let elow = 1e-4 + model.a[1..=l_2000hz].iter().map(|a| a * a).sum::<f32>();
    let ehigh = 1e-4 + model.a[l_2000hz..=model.l].iter().map(|a| a * a).sum::<f32>();
    let eratio = 10.0 * (elow / ehigh).log10();

    if !model.voiced && eratio > 10.0 {
        model.voiced = true;
    }

    if model.voiced {
        if eratio < -10.0 {
            model.voiced = false;
        }
        // low pitch estimates of noise match too easily
        if eratio < -4.0 && model.wo <= 60.0 * TWO_PI / SAMPLE_RATE as f32 {
            model.voiced = false;
        }
    }

    snr
}
