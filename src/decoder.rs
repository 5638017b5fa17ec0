//!
//! Frame decoder
//!
//! Rebuilds the model of every sub-frame from the transmitted ones,
//! interpolating what was not sent, and synthesises it.
//!

use crate::fft::Fft;
use crate::frame::QuantizedFrame;
use crate::interp::*;
use crate::lpc::*;
use crate::maths::saturate;
use crate::mode::{LspKind, Mode};
use crate::model::*;
use crate::quantise::*;
use crate::state::SynthesisMemory;
use crate::synth::*;

/// Parameters of one 10ms sub-frame
#[derive(Debug, Clone, Copy, Default)]
struct SubFrame {
    model: Model,
    e: f32,
    lsps: [f32; LPC_ORD],
}

#[derive(Debug)]
pub struct Decoder {
    fft: Fft,
    synth: Synthesiser,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            fft: Fft::new(FFT_DEC),
            synth: Synthesiser::new(),
        }
    }

    /// Decode the LSPs of the last sub-frame, ordered and expanded
    fn decode_lsps(&self, mode: Mode, frame: &QuantizedFrame) -> [f32; LPC_ORD] {
        let mut lsps = [0f32; LPC_ORD];

        match mode.lsp_kind() {
            LspKind::Scalar => Scalar::decode(&frame.lsp, &mut lsps),
            LspKind::PredictiveVq => PredictiveVq::decode(&frame.lsp, &mut lsps),
        }

        let swaps = check_lsp_order(&mut lsps);
        if swaps > 0 {
            debug!("reordered decoded lsps with {} swaps", swaps);
        }
        bw_expand_lsps(&mut lsps);

        lsps
    }

    /// Rebuild the parameters of every sub-frame of `frame`
    ///
    /// Only the quantiser prediction in `mem` moves forward, the memories
    /// of the previous frame are left for the caller to update.
    fn reconstruct(
        &self,
        mode: Mode,
        mem: &mut SynthesisMemory,
        frame: &QuantizedFrame,
    ) -> Vec<SubFrame> {
        let k = mode.sub_frames();
        let mut sub = vec![SubFrame::default(); k];

        for (s, &v) in sub.iter_mut().zip(frame.voiced.iter()) {
            s.model.voiced = v;
        }

        for i in (1..k).step_by(2) {
            sub[i].e = decode_woe(&mut sub[i].model, &mut mem.xq, frame.woe[i / 2]);
        }

        sub[k - 1].lsps = self.decode_lsps(mode, frame);

        trace!(
            "decoded voicing {:?} woe {:?} lsp {:?}",
            frame.voiced,
            frame.woe,
            frame.lsp
        );

        // pitch and energy of the sub-frames in between
        for i in (0..k).step_by(2) {
            let (prev, prev_e) = if i == 0 {
                (mem.prev_model, mem.prev_e)
            } else {
                (sub[i - 1].model, sub[i - 1].e)
            };
            let next = sub[i + 1];

            interp_wo(&mut sub[i].model, &prev, &next.model);
            sub[i].e = interp_energy(prev_e, next.e);
        }

        let last = sub[k - 1].lsps;
        for (i, s) in sub[..k - 1].iter_mut().enumerate() {
            let weight = (i + 1) as f32 / k as f32;
            interpolate_lsp(&mut s.lsps, &mem.prev_lsps, &last, weight);
        }

        sub
    }

    /// Synthesise `mode.samples_per_frame()` samples into `speech`
    pub fn decode(
        &self,
        mode: Mode,
        mem: &mut SynthesisMemory,
        frame: &QuantizedFrame,
        speech: &mut [i16],
    ) {
        let mut sub = self.reconstruct(mode, mem, frame);

        for (i, (s, out)) in sub.iter_mut().zip(speech.chunks_mut(N)).enumerate() {
            let mut ak = [0f32; LPC_ORD + 1];

            lsp_to_lpc(&s.lsps, &mut ak);
            let snr = aks_to_m2(&self.fft, &ak, &mut s.model, s.e);
            trace!("sub-frame {} wo {} snr {}", i, s.model.wo, snr);
            apply_lpc_correction(&mut s.model);

            self.synthesise_one_frame(mem, out, &mut s.model, &ak);
        }

        if let Some(last) = sub.last() {
            mem.prev_model = last.model;
            mem.prev_e = last.e;
            mem.prev_lsps = last.lsps;
        }
    }

    fn synthesise_one_frame(
        &self,
        mem: &mut SynthesisMemory,
        speech: &mut [i16],
        model: &mut Model,
        ak: &[f32],
    ) {
        self.synth
            .phase_synth_zero_order(model, ak, &mut mem.ex_phase, &mut mem.rng);
        postfilter(model, &mut mem.bg_est, &mut mem.rng);
        self.synth.synthesise(&mut mem.sn_, model);

        for (s, &v) in speech.iter_mut().zip(mem.sn_[..N].iter()) {
            *s = saturate(v);
        }
    }
}
