//!
//! Linear prediction
//!
//! LPC analysis of the windowed history, the LPC <-> LSP conversions and
//! the recovery of harmonic amplitudes from the LPC envelope.
//!

use crate::complex::*;
use crate::fft::Fft;
use crate::model::*;

use std::f32::consts::PI;

/// Root search step in the cos(w) domain
const LSP_DELTA: f32 = 0.01;
/// Bisection steps once a root is bracketed
const LSP_BISECT: usize = 5;
/// Bandwidth expansion applied before the root search
const BW_GAMMA: f32 = 0.994;

pub fn autocorrelate(wn: &[f32], r: &mut [f32]) {
    for (j, r) in r.iter_mut().enumerate() {
        *r = wn.iter().zip(&wn[j..]).map(|(a, b)| a * b).sum();
    }
}

/// Levinson-Durbin recursion, `a[0]` is always 1.
///
/// Unstable reflection coefficients are zeroed, an all zero input
/// yields the flat predictor.
pub fn levinson_durbin(r: &[f32], a: &mut [f32]) {
    let order = a.len() - 1;
    let mut tmp = vec![0f32; order + 1];
    let mut e = r[0];

    for v in a.iter_mut() {
        *v = 0.0;
    }
    a[0] = 1.0;

    for i in 1..=order {
        let sum: f32 = (1..i).map(|j| a[j] * r[i - j]).sum();
        let mut k = if e > 0.0 { -(r[i] + sum) / e } else { 0.0 };

        if !(k.abs() <= 1.0) {
            k = 0.0;
        }

        tmp[..i].copy_from_slice(&a[..i]);
        a[i] = k;
        for j in 1..i {
            a[j] = tmp[j] + k * tmp[i - j];
        }

        e *= 1.0 - k * k;
    }
}

/// Unquantised LSPs of the windowed history, returns the LPC residual
/// energy.
pub fn speech_to_uq_lsps(lsp: &mut [f32], ak: &mut [f32], sn: &[f32], w: &[f32]) -> f32 {
    let order = lsp.len();
    let wn: Vec<f32> = sn.iter().zip(w).map(|(s, w)| s * w).collect();
    let mut r = vec![0f32; order + 1];

    autocorrelate(&wn, &mut r);
    levinson_durbin(&r, ak);

    let e: f32 = ak.iter().zip(r.iter()).map(|(a, r)| a * r).sum();

    // expand after the energy computation, it keeps the energy positive
    let mut g = 1f32;
    for a in ak.iter_mut() {
        *a *= g;
        g *= BW_GAMMA;
    }

    let roots = lpc_to_lsp(ak, lsp);
    if roots != order {
        debug!("lsp search found {} roots out of {}", roots, order);
        for (i, l) in lsp.iter_mut().enumerate() {
            *l = PI / order as f32 * i as f32;
        }
    }

    e
}

/// Evaluate the Chebyshev series of `coef` at `x`
fn cheb_poly_eva(coef: &[f32], x: f32) -> f32 {
    let m = coef.len() - 1;
    let mut t = vec![0f32; m + 1];

    t[0] = 1.0;
    if m > 0 {
        t[1] = x;
    }
    for i in 2..=m {
        t[i] = 2.0 * x * t[i - 1] - t[i - 2];
    }

    (0..=m).map(|i| coef[m - i] * t[i]).sum()
}

/// Find the LSPs, in radians, of the predictor `a` (`a[0] == 1`).
///
/// Returns the number of roots found.
pub fn lpc_to_lsp(a: &[f32], freq: &mut [f32]) -> usize {
    let order = freq.len();
    let m = order / 2;
    let mut p = vec![0f32; m + 1];
    let mut q = vec![0f32; m + 1];

    p[0] = 1.0;
    q[0] = 1.0;
    for i in 1..=m {
        p[i] = a[i] + a[order + 1 - i] - p[i - 1];
        q[i] = a[i] - a[order + 1 - i] + q[i - 1];
    }
    for i in 0..m {
        p[i] *= 2.0;
        q[i] *= 2.0;
    }

    let mut roots = 0;
    let mut xl = 1f32;
    let mut xr = 0f32;

    for j in 0..order {
        let pt = if j % 2 == 1 { &q } else { &p };
        let mut psuml = cheb_poly_eva(pt, xl);

        while xr >= -1.0 {
            xr = xl - LSP_DELTA;
            let psumr = cheb_poly_eva(pt, xr);

            if psumr * psuml < 0.0 {
                roots += 1;
                let (mut lo, mut hi) = (xl, xr);
                let mut xm = xl;
                for _ in 0..=LSP_BISECT {
                    xm = (lo + hi) / 2.0;
                    let psumm = cheb_poly_eva(pt, xm);
                    if psumm * psuml > 0.0 {
                        psuml = psumm;
                        lo = xm;
                    } else {
                        hi = xm;
                    }
                }
                freq[j] = xm;
                xl = xm;
                break;
            } else {
                psuml = psumr;
                xl = xr;
            }
        }
    }

    for f in freq.iter_mut() {
        *f = f.max(-1.0).min(1.0).acos();
    }

    roots
}

/// Multiply `poly` in place by `1 + c z^-1 + d z^-2`
fn mul_quadratic(poly: &mut Vec<f32>, c: f32, d: f32) {
    let n = poly.len();
    poly.push(0.0);
    poly.push(0.0);
    for i in (0..n).rev() {
        let v = poly[i];
        poly[i + 1] += c * v;
        poly[i + 2] += d * v;
    }
}

/// Rebuild the predictor (`ak[0] == 1`) from LSPs in radians.
pub fn lsp_to_lpc(lsp: &[f32], ak: &mut [f32]) {
    let order = lsp.len();
    // P(z) = (1 + z^-1) prod_even, Q(z) = (1 - z^-1) prod_odd
    let mut p = vec![1f32, 1.0];
    let mut q = vec![1f32, -1.0];

    for (i, w) in lsp.iter().enumerate() {
        let c = -2.0 * w.cos();
        if i % 2 == 0 {
            mul_quadratic(&mut p, c, 1.0);
        } else {
            mul_quadratic(&mut q, c, 1.0);
        }
    }

    for (i, a) in ak.iter_mut().enumerate().take(order + 1) {
        *a = 0.5 * (p[i] + q[i]);
    }
}

/// Sample the LPC envelope `E / |A(e^jw)|^2` at the harmonics of `model`,
/// returning the SNR of the new amplitudes against the previous ones.
pub fn aks_to_m2(fft: &Fft, ak: &[f32], model: &mut Model, e: f32) -> f32 {
    let r = TWO_PI / FFT_DEC as f32;
    let mut a = vec![Complex32::default(); FFT_DEC];

    for (v, &c) in a.iter_mut().zip(ak) {
        v.re = c;
    }
    fft.forward(&mut a);

    let pw: Vec<f32> = a[..FFT_DEC / 2]
        .iter()
        .map(|v| e / (v.norm_sqr() + 1e-6))
        .collect();

    let mut signal = 1e-12f32;
    let mut noise = 1e-12f32;

    for m in 1..=model.l {
        let am = (((m as f32 - 0.5) * model.wo / r + 0.5) as usize).min(FFT_DEC / 2);
        let bm = (((m as f32 + 0.5) * model.wo / r + 0.5) as usize).min(FFT_DEC / 2);
        let em: f32 = pw[am..bm].iter().sum();
        let amp = em.sqrt();

        signal += model.a[m] * model.a[m];
        noise += (model.a[m] - amp) * (model.a[m] - amp);
        model.a[m] = amp;
    }

    10.0 * (signal / noise).log10()
}

/// Empirical compensation of the low frequency bias of `aks_to_m2` for
/// low pitched speakers.
pub fn apply_lpc_correction(model: &mut Model) {
    if model.wo < PI * 150.0 / 4000.0 {
        model.a[1] *= 0.032;
    }
}
