//!
//! Parameter quantisers
//!
//! The joint pitch and energy quantiser and the two LSP quantisers used
//! by the different modes, plus the ordering fixups applied to decoded
//! LSPs.
//!

use crate::maths::Decibel;
use crate::model::*;

use std::f32::consts::PI;

/// Width of a joint Wo/E index
pub const WO_E_BITS: usize = 8;

/// Prediction coefficients for `[log2(f0 / 50), energy dB]`
const GE_COEFF: [f32; 2] = [0.8, 0.9];

/// Residual levels for the pitch dimension, in octaves
const WO_LEVELS: [f32; 16] = [
    -1.6, -0.9, -0.5, -0.25, -0.1, 0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.75, 1.0, 1.4, 2.2,
];

/// Residual levels for the energy dimension, in dB
const E_LEVELS: [f32; 16] = [
    -20.0, -12.0, -7.0, -4.0, -2.5, -1.5, -0.5, 0.0, 0.5, 1.5, 2.5, 4.0, 6.0, 9.0, 14.0, 22.0,
];

#[inline(always)]
fn hz_to_rad(f: f32) -> f32 {
    f * PI / 4000.0
}

#[inline(always)]
fn rad_to_hz(w: f32) -> f32 {
    w * 4000.0 / PI
}

fn nearest(levels: &[f32], v: f32) -> usize {
    let mut best = 0;
    let mut best_e = std::f32::MAX;

    for (i, &l) in levels.iter().enumerate() {
        let e = (v - l) * (v - l);
        if e < best_e {
            best_e = e;
            best = i;
        }
    }

    best
}

#[inline(always)]
fn woe_entry(index: usize) -> [f32; 2] {
    [WO_LEVELS[(index >> 4) & 15], E_LEVELS[index & 15]]
}

/// Jointly quantise the pitch of `model` and the frame energy `e`
/// against the prediction memory `xq`, which is updated.
///
/// The codebook is the product of the two level sets, so the nearest
/// neighbour search splits into one search per dimension.
pub fn encode_woe(model: &Model, e: f32, xq: &mut [f32; 2]) -> usize {
    let x = [
        (rad_to_hz(model.wo) / 50.0).log2(),
        (1e-4 + e).to_db(),
    ];
    let pred = [GE_COEFF[0] * xq[0], GE_COEFF[1] * xq[1]];

    let i0 = nearest(&WO_LEVELS, x[0] - pred[0]);
    let i1 = nearest(&E_LEVELS, x[1] - pred[1]);
    let index = i0 << 4 | i1;

    let entry = woe_entry(index);
    xq[0] = pred[0] + entry[0];
    xq[1] = pred[1] + entry[1];

    index
}

/// Inverse of [`encode_woe`], sets the pitch of `model` and returns the
/// frame energy.
pub fn decode_woe(model: &mut Model, xq: &mut [f32; 2], index: usize) -> f32 {
    let entry = woe_entry(index);

    for i in 0..2 {
        xq[i] = GE_COEFF[i] * xq[i] + entry[i];
    }

    let wo = 2f32.powf(xq[0]) * hz_to_rad(50.0);
    model.set_wo(wo.max(WO_MIN).min(WO_MAX));

    xq[1].from_db()
}

/// LSP quantiser of a given mode
///
/// The quantiser works on LSPs in radians and produces one index per
/// entry of `BITS`, each fitting its width.
pub trait LspQuantiser {
    const BITS: &'static [usize];

    fn encode(lsp: &[f32], indexes: &mut [usize]);
    fn decode(indexes: &[usize], lsp: &mut [f32]);

    fn total_bits() -> usize {
        Self::BITS.iter().sum()
    }
}

/// Independent per coefficient quantisation
pub struct Scalar;

/// Mean-predicted split quantisation of the LSP residual
pub struct PredictiveVq;

const LSP_CB1: &[f32] = &[
    225.0, 250.0, 275.0, 300.0, 325.0, 350.0, 375.0, 400.0, 425.0, 450.0, 475.0, 500.0, 525.0,
    550.0, 575.0, 600.0,
];
const LSP_CB2: &[f32] = &[
    325.0, 350.0, 375.0, 400.0, 425.0, 450.0, 475.0, 500.0, 525.0, 550.0, 575.0, 600.0, 625.0,
    650.0, 675.0, 700.0,
];
const LSP_CB3: &[f32] = &[
    500.0, 550.0, 600.0, 650.0, 700.0, 750.0, 800.0, 850.0, 900.0, 950.0, 1000.0, 1050.0, 1100.0,
    1150.0, 1200.0, 1250.0,
];
const LSP_CB4: &[f32] = &[
    700.0, 800.0, 900.0, 1000.0, 1100.0, 1200.0, 1300.0, 1400.0, 1500.0, 1600.0, 1700.0, 1800.0,
    1900.0, 2000.0, 2100.0, 2200.0,
];
const LSP_CB5: &[f32] = &[
    950.0, 1050.0, 1150.0, 1250.0, 1350.0, 1450.0, 1550.0, 1650.0, 1750.0, 1850.0, 1950.0, 2050.0,
    2150.0, 2250.0, 2350.0, 2450.0,
];
const LSP_CB6: &[f32] = &[
    1100.0, 1200.0, 1300.0, 1400.0, 1500.0, 1600.0, 1700.0, 1800.0, 1900.0, 2000.0, 2100.0,
    2200.0, 2300.0, 2400.0, 2500.0, 2600.0,
];
const LSP_CB7: &[f32] = &[
    1500.0, 1600.0, 1700.0, 1800.0, 1900.0, 2000.0, 2100.0, 2200.0, 2300.0, 2400.0, 2500.0,
    2600.0, 2700.0, 2800.0, 2900.0, 3000.0,
];
const LSP_CB8: &[f32] = &[
    2300.0, 2400.0, 2500.0, 2600.0, 2700.0, 2800.0, 2900.0, 3000.0,
];
const LSP_CB9: &[f32] = &[
    2500.0, 2600.0, 2700.0, 2800.0, 2900.0, 3000.0, 3100.0, 3200.0,
];
const LSP_CB10: &[f32] = &[2900.0, 3100.0, 3300.0, 3500.0];

/// Scalar codebooks in Hz
const LSP_CB: &[&[f32]] = &[
    LSP_CB1, LSP_CB2, LSP_CB3, LSP_CB4, LSP_CB5, LSP_CB6, LSP_CB7, LSP_CB8, LSP_CB9, LSP_CB10,
];

impl LspQuantiser for Scalar {
    const BITS: &'static [usize] = &[4, 4, 4, 4, 4, 4, 4, 3, 3, 2];

    fn encode(lsp: &[f32], indexes: &mut [usize]) {
        for ((idx, &w), cb) in indexes.iter_mut().zip(lsp).zip(LSP_CB) {
            *idx = nearest(cb, rad_to_hz(w));
        }
    }

    fn decode(indexes: &[usize], lsp: &mut [f32]) {
        for ((w, &idx), cb) in lsp.iter_mut().zip(indexes).zip(LSP_CB) {
            *w = hz_to_rad(cb[idx & (cb.len() - 1)]);
        }
    }
}

/// Fixed prediction of the LSP vector, in Hz
const LSP_MEAN: [f32; LPC_ORD] = [
    300.0, 480.0, 800.0, 1150.0, 1500.0, 1800.0, 2200.0, 2550.0, 2900.0, 3250.0,
];

/// Residual bits per coefficient, grouped 4 + 3 + 3 into three indexes
const VQ_DIM_BITS: [usize; LPC_ORD] = [3, 2, 2, 2, 3, 3, 3, 3, 3, 3];
const VQ_SPLIT: [usize; 4] = [0, 4, 7, 10];

/// Residual step per coefficient, in Hz
const VQ_STEP: [f32; LPC_ORD] = [
    40.0, 120.0, 150.0, 200.0, 120.0, 120.0, 120.0, 110.0, 110.0, 110.0,
];

#[inline(always)]
fn vq_level(dim: usize, j: usize) -> f32 {
    let levels = (1 << VQ_DIM_BITS[dim]) as f32;
    (j as f32 - (levels - 1.0) / 2.0) * VQ_STEP[dim]
}

impl LspQuantiser for PredictiveVq {
    const BITS: &'static [usize] = &[9, 9, 9];

    fn encode(lsp: &[f32], indexes: &mut [usize]) {
        for (idx, split) in indexes.iter_mut().zip(VQ_SPLIT.windows(2)) {
            *idx = 0;
            for dim in split[0]..split[1] {
                let levels = 1usize << VQ_DIM_BITS[dim];
                let res = rad_to_hz(lsp[dim]) - LSP_MEAN[dim];
                let j = (res / VQ_STEP[dim] + (levels - 1) as f32 / 2.0)
                    .round()
                    .max(0.0)
                    .min((levels - 1) as f32) as usize;

                *idx = *idx << VQ_DIM_BITS[dim] | j;
            }
        }
    }

    fn decode(indexes: &[usize], lsp: &mut [f32]) {
        for (&idx, split) in indexes.iter().zip(VQ_SPLIT.windows(2)) {
            let mut shift: usize = VQ_DIM_BITS[split[0]..split[1]].iter().sum();
            for dim in split[0]..split[1] {
                shift -= VQ_DIM_BITS[dim];
                let j = (idx >> shift) & ((1 << VQ_DIM_BITS[dim]) - 1);

                lsp[dim] = hz_to_rad(LSP_MEAN[dim] + vq_level(dim, j));
            }
        }
    }
}

/// Swap out of order pairs until the LSPs are strictly increasing,
/// returns the number of swaps.
pub fn check_lsp_order(lsp: &mut [f32]) -> usize {
    let max_swaps = lsp.len() * lsp.len() * 4;
    let mut swaps = 0;
    let mut i = 1;

    while i < lsp.len() {
        if lsp[i] <= lsp[i - 1] {
            if swaps == max_swaps {
                lsp.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                break;
            }
            swaps += 1;
            let tmp = lsp[i - 1];
            lsp[i - 1] = lsp[i] - 0.1;
            lsp[i] = tmp + 0.1;
            i = 1;
        } else {
            i += 1;
        }
    }

    swaps
}

/// Enforce a minimum distance between adjacent LSPs, 50Hz for the first
/// four and 100Hz for the rest.
pub fn bw_expand_lsps(lsp: &mut [f32]) {
    for i in 1..lsp.len() {
        let min = if i < 4 { hz_to_rad(50.0) } else { hz_to_rad(100.0) };

        if !(lsp[i] - lsp[i - 1] >= min) {
            lsp[i] = lsp[i - 1] + min;
        }
    }
}
