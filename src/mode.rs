//!
//! Codec modes
//!
//! Every mode fixes the number of 10ms sub-frames per frame, the LSP
//! quantiser and the order and width of the fields in the bitstream.
//!

use crate::codec::error::*;
use crate::model::*;
use crate::quantise::WO_E_BITS;

use std::convert::TryFrom;
use std::str::FromStr;

/// A field of a quantised frame
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Field {
    /// Voicing bit of the given sub-frame
    Voicing(usize),
    /// Joint pitch and energy index, one every two sub-frames
    WoE(usize),
    /// LSP index
    Lsp(usize),
    Spare,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub bits: usize,
}

const fn spec(field: Field, bits: usize) -> FieldSpec {
    FieldSpec { field, bits }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LspKind {
    Scalar,
    PredictiveVq,
}

/// Operating mode, by bitrate
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    /// 2 sub-frames, scalar LSPs
    Rate2400 = 2400,
    /// 4 sub-frames, scalar LSPs
    Rate1400 = 1400,
    /// 4 sub-frames, predictive VQ LSPs
    Rate1200 = 1200,
}

use self::Field::*;

const LAYOUT_2400: &[FieldSpec] = &[
    spec(Voicing(0), 1),
    spec(Voicing(1), 1),
    spec(WoE(0), WO_E_BITS),
    spec(Lsp(0), 4),
    spec(Lsp(1), 4),
    spec(Lsp(2), 4),
    spec(Lsp(3), 4),
    spec(Lsp(4), 4),
    spec(Lsp(5), 4),
    spec(Lsp(6), 4),
    spec(Lsp(7), 3),
    spec(Lsp(8), 3),
    spec(Lsp(9), 2),
    spec(Spare, 2),
];

const LAYOUT_1400: &[FieldSpec] = &[
    spec(Voicing(0), 1),
    spec(Voicing(1), 1),
    spec(WoE(0), WO_E_BITS),
    spec(Voicing(2), 1),
    spec(Voicing(3), 1),
    spec(WoE(1), WO_E_BITS),
    spec(Lsp(0), 4),
    spec(Lsp(1), 4),
    spec(Lsp(2), 4),
    spec(Lsp(3), 4),
    spec(Lsp(4), 4),
    spec(Lsp(5), 4),
    spec(Lsp(6), 4),
    spec(Lsp(7), 3),
    spec(Lsp(8), 3),
    spec(Lsp(9), 2),
];

const LAYOUT_1200: &[FieldSpec] = &[
    spec(Voicing(0), 1),
    spec(Voicing(1), 1),
    spec(WoE(0), WO_E_BITS),
    spec(Voicing(2), 1),
    spec(Voicing(3), 1),
    spec(WoE(1), WO_E_BITS),
    spec(Lsp(0), 9),
    spec(Lsp(1), 9),
    spec(Lsp(2), 9),
    spec(Spare, 1),
];

impl Mode {
    #[inline]
    pub fn bitrate(self) -> u32 {
        self as u32
    }

    /// 10ms sub-frames per frame
    pub fn sub_frames(self) -> usize {
        match self {
            Mode::Rate2400 => 2,
            Mode::Rate1400 | Mode::Rate1200 => 4,
        }
    }

    pub fn lsp_kind(self) -> LspKind {
        match self {
            Mode::Rate2400 | Mode::Rate1400 => LspKind::Scalar,
            Mode::Rate1200 => LspKind::PredictiveVq,
        }
    }

    /// Fields in bitstream order, most significant bit first
    pub fn layout(self) -> &'static [FieldSpec] {
        match self {
            Mode::Rate2400 => LAYOUT_2400,
            Mode::Rate1400 => LAYOUT_1400,
            Mode::Rate1200 => LAYOUT_1200,
        }
    }

    pub fn samples_per_frame(self) -> usize {
        self.sub_frames() * N
    }

    pub fn bits_per_frame(self) -> usize {
        self.layout().iter().map(|f| f.bits).sum()
    }

    pub fn bytes_per_frame(self) -> usize {
        (self.bits_per_frame() + 7) / 8
    }
}

impl TryFrom<u32> for Mode {
    type Error = Error;

    fn try_from(bitrate: u32) -> Result<Self> {
        match bitrate {
            2400 => Ok(Mode::Rate2400),
            1400 => Ok(Mode::Rate1400),
            1200 => Ok(Mode::Rate1200),
            _ => Err(Error::ConfigurationInvalid),
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bitrate = s.trim().parse::<u32>().map_err(|_| Error::ConfigurationInvalid)?;

        Mode::try_from(bitrate)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::quantise::{LspQuantiser, PredictiveVq, Scalar};

    const MODES: &[Mode] = &[Mode::Rate2400, Mode::Rate1400, Mode::Rate1200];

    #[test]
    fn geometry() {
        let expected = [(48, 160, 6), (56, 320, 7), (48, 320, 6)];

        for (&mode, &(bits, samples, bytes)) in MODES.iter().zip(expected.iter()) {
            assert_eq!(mode.bits_per_frame(), bits);
            assert_eq!(mode.samples_per_frame(), samples);
            assert_eq!(mode.bytes_per_frame(), bytes);
        }
    }

    #[test]
    fn lsp_fields_match_quantiser() {
        for &mode in MODES {
            let bits: Vec<usize> = mode
                .layout()
                .iter()
                .filter_map(|f| match f.field {
                    Lsp(_) => Some(f.bits),
                    _ => None,
                })
                .collect();

            match mode.lsp_kind() {
                LspKind::Scalar => assert_eq!(bits, Scalar::BITS),
                LspKind::PredictiveVq => assert_eq!(bits, PredictiveVq::BITS),
            }
        }
    }

    #[test]
    fn every_sub_frame_has_voicing() {
        for &mode in MODES {
            let layout = mode.layout();

            for i in 0..mode.sub_frames() {
                assert_eq!(layout.iter().filter(|f| f.field == Voicing(i)).count(), 1);
            }
            for j in 0..mode.sub_frames() / 2 {
                assert_eq!(layout.iter().filter(|f| f.field == WoE(j)).count(), 1);
            }
        }
    }

    #[test]
    fn parse() {
        assert_eq!(Mode::from_str("2400").ok(), Some(Mode::Rate2400));
        assert_eq!("1400".parse::<Mode>().ok(), Some(Mode::Rate1400));
        assert_eq!(Mode::try_from(1200).ok(), Some(Mode::Rate1200));
        assert_eq!(Mode::Rate1400.bitrate(), 1400);

        assert!(Mode::from_str("3200").is_err());
        assert!(Mode::from_str("fast").is_err());
        match Mode::try_from(700) {
            Err(Error::ConfigurationInvalid) => {}
            _ => panic!("700 is not a mode"),
        }
    }
}
