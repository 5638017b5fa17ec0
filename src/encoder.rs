//!
//! Frame encoder
//!
//! Analysis runs on every 10ms sub-frame; voicing is sent for each of
//! them, pitch and energy every second one and the LSPs once per frame,
//! taken from the last sub-frame.
//!

use crate::frame::QuantizedFrame;
use crate::lpc::speech_to_uq_lsps;
use crate::mode::{LspKind, Mode};
use crate::model::*;
use crate::quantise::*;
use crate::sine::Analyser;
use crate::state::AnalysisMemory;

#[derive(Debug)]
pub struct Encoder {
    analyser: Analyser,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Encoder {
            analyser: Analyser::new(),
        }
    }

    /// Quantise `mode.samples_per_frame()` samples of `speech`
    pub fn encode(&self, mode: Mode, mem: &mut AnalysisMemory, speech: &[i16]) -> QuantizedFrame {
        let mut frame = QuantizedFrame::default();
        let mut lsps = [0f32; LPC_ORD];
        let mut ak = [0f32; LPC_ORD + 1];

        for (i, sub) in speech.chunks(N).take(mode.sub_frames()).enumerate() {
            let model = self
                .analyser
                .analyse(&mut mem.sn, &mut mem.nlp, &mut mem.prev_wo, sub);

            frame.voiced[i] = model.voiced;

            if i % 2 == 1 {
                let e = speech_to_uq_lsps(&mut lsps, &mut ak, &mem.sn, self.analyser.window());
                frame.woe[i / 2] = encode_woe(&model, e, &mut mem.xq);
            }
        }

        // the LSPs of the last sub-frame are the ones sent
        match mode.lsp_kind() {
            LspKind::Scalar => Scalar::encode(&lsps, &mut frame.lsp),
            LspKind::PredictiveVq => PredictiveVq::encode(&lsps, &mut frame.lsp),
        }

        trace!(
            "encoded voicing {:?} woe {:?} lsp {:?}",
            frame.voiced,
            frame.woe,
            frame.lsp
        );

        frame
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tone(mode: Mode, offset: usize) -> Vec<i16> {
        (0..mode.samples_per_frame())
            .map(|i| {
                let t = (i + offset) as f32 / SAMPLE_RATE as f32;
                (1..6)
                    .map(|h| 2000.0 / h as f32 * (TWO_PI * 160.0 * h as f32 * t).cos())
                    .sum::<f32>() as i16
            })
            .collect()
    }

    #[test]
    fn deterministic() {
        let enc = Encoder::default();

        for &mode in [Mode::Rate2400, Mode::Rate1400, Mode::Rate1200].iter() {
            let mut a = AnalysisMemory::default();
            let mut b = AnalysisMemory::default();
            let n = mode.samples_per_frame();

            for k in 0..4 {
                let speech = tone(mode, k * n);
                assert_eq!(enc.encode(mode, &mut a, &speech), enc.encode(mode, &mut b, &speech));
            }
            assert_eq!(a.xq, b.xq);
        }
    }

    #[test]
    fn voiced_tone() {
        let enc = Encoder::new();
        let mode = Mode::Rate1400;
        let mut mem = AnalysisMemory::default();
        let mut frame = QuantizedFrame::default();

        for k in 0..5 {
            frame = enc.encode(mode, &mut mem, &tone(mode, k * mode.samples_per_frame()));
        }

        assert_eq!(frame.voiced, [true; 4]);
        assert!(mem.xq.iter().all(|v| v.is_finite()));
        for (&idx, &bits) in frame.lsp.iter().zip(Scalar::BITS) {
            assert!(idx < 1 << bits);
        }
    }

    #[test]
    fn vq_indexes_fit() {
        let enc = Encoder::new();
        let mode = Mode::Rate1200;
        let mut mem = AnalysisMemory::default();

        for k in 0..3 {
            let frame = enc.encode(mode, &mut mem, &tone(mode, k * mode.samples_per_frame()));

            for (&idx, &bits) in frame.lsp.iter().zip(PredictiveVq::BITS) {
                assert!(idx < 1 << bits);
            }
            assert!(frame.lsp[3..].iter().all(|v| *v == 0));
        }
    }
}
