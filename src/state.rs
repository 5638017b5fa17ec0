//!
//! Cross-frame codec memory
//!
//! Encoding and decoding keep separate memories so that one instance can
//! run both directions at once.
//!

use crate::maths::Rand;
use crate::model::*;
use crate::nlp::NlpMemory;

use std::f32::consts::PI;

/// Encode direction
#[derive(Debug, Clone)]
pub struct AnalysisMemory {
    /// Last `M` input samples
    pub sn: Vec<f32>,
    /// Pitch of the previous sub-frame, for pitch tracking
    pub prev_wo: f32,
    /// Joint Wo/E quantiser prediction
    pub xq: [f32; 2],
    pub nlp: NlpMemory,
}

impl Default for AnalysisMemory {
    fn default() -> Self {
        AnalysisMemory {
            sn: vec![1f32; M],
            prev_wo: 0.0,
            xq: [0.0; 2],
            nlp: NlpMemory::default(),
        }
    }
}

/// Decode direction
#[derive(Debug, Clone)]
pub struct SynthesisMemory {
    /// Joint Wo/E quantiser prediction
    pub xq: [f32; 2],
    /// Last sub-frame of the previous frame
    pub prev_model: Model,
    pub prev_lsps: [f32; LPC_ORD],
    pub prev_e: f32,
    /// Excitation phase
    pub ex_phase: f32,
    /// Background noise estimate in dB
    pub bg_est: f32,
    /// Overlap-add buffer of `2 * N` samples
    pub sn_: Vec<f32>,
    pub rng: Rand,
}

impl Default for SynthesisMemory {
    fn default() -> Self {
        let mut prev_lsps = [0f32; LPC_ORD];
        for (i, l) in prev_lsps.iter_mut().enumerate() {
            *l = i as f32 * PI / (LPC_ORD + 1) as f32;
        }

        SynthesisMemory {
            xq: [0.0; 2],
            prev_model: Model::new(TWO_PI / P_MAX as f32),
            prev_lsps,
            prev_e: 1.0,
            ex_phase: 0.0,
            bg_est: 0.0,
            sn_: vec![0f32; 2 * N],
            rng: Rand::default(),
        }
    }
}

/// Everything a codec instance carries from one frame to the next
#[derive(Debug, Clone, Default)]
pub struct CodecState {
    pub enc: AnalysisMemory,
    pub dec: SynthesisMemory,
}
