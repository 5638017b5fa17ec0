//!
//! Parameter interpolation for the sub-frames that carry no data
//!

use crate::model::*;

/// Fill in the pitch of `interp` from its neighbours.
///
/// The rule depends on the voicing of the three sub-frames, unvoiced
/// sub-frames always get the lowest pitch.
pub fn interp_wo(interp: &mut Model, prev: &Model, next: &Model) {
    // an isolated voiced decision is most likely wrong
    if interp.voiced && !prev.voiced && !next.voiced {
        interp.voiced = false;
    }

    let wo = if interp.voiced {
        match (prev.voiced, next.voiced) {
            (true, true) => (prev.wo + next.wo) / 2.0,
            (false, true) => next.wo,
            _ => prev.wo,
        }
    } else {
        WO_MIN
    };

    interp.set_wo(wo);
}

/// Halfway energy, taken in the log domain
#[inline]
pub fn interp_energy(prev: f32, next: f32) -> f32 {
    10f32.powf((prev.log10() + next.log10()) / 2.0)
}

/// `(1 - weight) * prev + weight * next`
pub fn interpolate_lsp(interp: &mut [f32], prev: &[f32], next: &[f32], weight: f32) {
    for ((i, p), n) in interp.iter_mut().zip(prev).zip(next) {
        *i = (1.0 - weight) * p + weight * n;
    }
}
