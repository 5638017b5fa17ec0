//!
//! Codec instance
//!
//! A [`Codec2`] owns the analysis and synthesis tables and the memory
//! carried between frames, in both directions.
//!

use crate::codec::error::*;
use crate::data::packet::Packet;

use crate::bitpack::{pack, unpack};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::mode::Mode;
use crate::state::CodecState;

use std::convert::TryFrom;

#[derive(Debug)]
pub struct Codec2 {
    mode: Mode,
    encoder: Encoder,
    decoder: Decoder,
    state: CodecState,
}

impl Codec2 {
    pub fn new(mode: Mode) -> Self {
        debug!(
            "codec2 {} bit/s: {} samples, {} bits per frame",
            mode.bitrate(),
            mode.samples_per_frame(),
            mode.bits_per_frame()
        );

        Codec2 {
            mode,
            encoder: Encoder::new(),
            decoder: Decoder::new(),
            state: CodecState::default(),
        }
    }

    /// Build an instance from a bitrate, only 2400, 1400 and 1200 are
    /// supported.
    pub fn with_bitrate(bitrate: u32) -> Result<Self> {
        Ok(Codec2::new(Mode::try_from(bitrate)?))
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn bits_per_frame(&self) -> usize {
        self.mode.bits_per_frame()
    }

    #[inline]
    pub fn bytes_per_frame(&self) -> usize {
        self.mode.bytes_per_frame()
    }

    #[inline]
    pub fn samples_per_frame(&self) -> usize {
        self.mode.samples_per_frame()
    }

    /// Forget everything carried over from previous frames
    pub fn reset(&mut self) {
        self.state = CodecState::default();
    }

    /// Encode `samples_per_frame()` samples into `bytes_per_frame()` bytes
    pub fn encode(&mut self, bits: &mut [u8], speech: &[i16]) -> Result<()> {
        if speech.len() != self.samples_per_frame() || bits.len() != self.bytes_per_frame() {
            return Err(Error::InvalidData);
        }

        let frame = self.encoder.encode(self.mode, &mut self.state.enc, speech);
        pack(self.mode.layout(), &frame, bits);

        Ok(())
    }

    /// Decode `bytes_per_frame()` bytes into `samples_per_frame()` samples
    ///
    /// The content of `bits` is not validated, a damaged frame decodes to
    /// damaged audio.
    pub fn decode(&mut self, speech: &mut [i16], bits: &[u8]) -> Result<()> {
        if speech.len() != self.samples_per_frame() || bits.len() != self.bytes_per_frame() {
            return Err(Error::InvalidData);
        }

        let frame = unpack(self.mode.layout(), bits);
        self.decoder
            .decode(self.mode, &mut self.state.dec, &frame, speech);

        Ok(())
    }

    pub fn encode_packet(&mut self, speech: &[i16]) -> Result<Packet> {
        let mut bits = vec![0u8; self.bytes_per_frame()];
        self.encode(&mut bits, speech)?;

        let mut pkt = Packet::new();
        pkt.data = bits;

        Ok(pkt)
    }

    pub fn decode_packet(&mut self, pkt: &Packet, speech: &mut [i16]) -> Result<()> {
        self.decode(speech, pkt.data.as_slice())
    }
}
