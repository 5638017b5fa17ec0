//!
//! rust-av codec surface
//!
//! Wraps [`Codec2`] in the av-codec `Decoder` and `Encoder` traits.
//! Decoded frames are mono S16 at 8kHz, one per codec frame. The stream
//! setup travels in a 4 byte extradata block: version major, version
//! minor, mode id and a flags byte.
//!

use crate::codec::decoder::{Decoder, Descr as DecDescr, Descriptor as DecDescriptor};
use crate::codec::encoder::{Descr as EncDescr, Descriptor as EncDescriptor, Encoder};
use crate::codec::error::*;
use crate::data::audiosample::{formats, ChannelMap};
use crate::data::frame::{ArcFrame, AudioInfo, Frame, FrameBuffer, FrameBufferConv};
use crate::data::packet::Packet;
use crate::data::params::{AudioInfo as StreamInfo, CodecParams, MediaKind as StreamKind};
use crate::data::rational::Rational64;
use crate::data::timeinfo::TimeInfo;
use crate::data::value::Value;

use crate::instance::Codec2;
use crate::mode::Mode;
use crate::model::SAMPLE_RATE;

use std::collections::VecDeque;
use std::convert::TryFrom;
use std::str::FromStr;
use std::sync::Arc;

const EXTRADATA_SIZE: usize = 4;
const VERSION: [u8; 2] = [0, 8];

fn mode_id(mode: Mode) -> u8 {
    match mode {
        Mode::Rate2400 => 1,
        Mode::Rate1400 => 3,
        Mode::Rate1200 => 5,
    }
}

fn extradata(mode: Mode) -> [u8; EXTRADATA_SIZE] {
    [VERSION[0], VERSION[1], mode_id(mode), 0]
}

fn mode_from_extradata(extra: &[u8]) -> Result<Mode> {
    if extra.len() < EXTRADATA_SIZE {
        return Err(Error::ConfigurationInvalid);
    }

    match extra[2] {
        1 => Ok(Mode::Rate2400),
        3 => Ok(Mode::Rate1400),
        5 => Ok(Mode::Rate1200),
        id => Err(Error::Unsupported(format!("mode {}", id))),
    }
}

fn mode_from_bitrate<T>(bitrate: T) -> Result<Mode>
where
    u32: TryFrom<T>,
{
    let bitrate = u32::try_from(bitrate).map_err(|_| Error::ConfigurationInvalid)?;

    Mode::try_from(bitrate)
}

fn time_info(pts: i64, samples: usize) -> TimeInfo {
    TimeInfo {
        pts: Some(pts),
        duration: Some(samples as u64),
        timebase: Some(Rational64::new(1, SAMPLE_RATE as i64)),
        ..Default::default()
    }
}

/// Mono S16 frame holding `speech`
fn audio_frame(speech: &[i16], pts: i64) -> Result<Frame> {
    let n = speech.len();
    let info = AudioInfo::new(
        n,
        SAMPLE_RATE,
        ChannelMap::default_map(1),
        Arc::new(formats::S16),
        Some(n),
    );
    let mut frame = Frame::new_default_frame(info, Some(time_info(pts, n)));

    let buf = <dyn FrameBuffer as FrameBufferConv<i16>>::as_mut_slice(&mut *frame.buf, 0)
        .map_err(|_| Error::InvalidData)?;
    buf[..n].copy_from_slice(speech);

    Ok(frame)
}

pub struct Des {
    descr: DecDescr,
}

pub struct Dec {
    extradata: Option<Vec<u8>>,
    codec: Option<Codec2>,
    pending: VecDeque<ArcFrame>,
    pts: i64,
}

impl Dec {
    fn new() -> Self {
        Dec {
            extradata: None,
            codec: None,
            pending: VecDeque::new(),
            pts: 0,
        }
    }
}

impl DecDescriptor for Des {
    type OutputDecoder = Dec;

    fn create(&self) -> Self::OutputDecoder {
        Dec::new()
    }

    fn describe(&self) -> &DecDescr {
        &self.descr
    }
}

impl Decoder for Dec {
    fn set_extradata(&mut self, extra: &[u8]) {
        self.extradata = Some(Vec::from(extra));
    }

    /// A packet carries one or more whole codec frames
    fn send_packet(&mut self, pkt: &Packet) -> Result<()> {
        let codec = self.codec.as_mut().ok_or(Error::ConfigurationIncomplete)?;
        let size = codec.bytes_per_frame();
        let n = codec.samples_per_frame();

        if pkt.data.is_empty() || pkt.data.len() % size != 0 {
            return Err(Error::InvalidData);
        }

        let mut speech = vec![0i16; n];
        for bits in pkt.data.chunks(size) {
            codec.decode(&mut speech, bits)?;
            self.pending.push_back(Arc::new(audio_frame(&speech, self.pts)?));
            self.pts += n as i64;
        }

        Ok(())
    }

    fn receive_frame(&mut self) -> Result<ArcFrame> {
        self.pending.pop_front().ok_or(Error::MoreDataNeeded)
    }

    fn configure(&mut self) -> Result<()> {
        let mode = match self.extradata {
            Some(ref extra) => {
                let mode = mode_from_extradata(extra)?;
                debug!(
                    "codec2 stream version {}.{} at {} bit/s",
                    extra[0],
                    extra[1],
                    mode.bitrate()
                );
                mode
            }
            None => return Err(Error::ConfigurationIncomplete),
        };

        self.codec = Some(Codec2::new(mode));
        self.pending.clear();
        self.pts = 0;

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.pending.clear();
        if let Some(codec) = self.codec.as_mut() {
            codec.reset();
        }

        Ok(())
    }
}

pub const CODEC2_DESCR: &Des = &Des {
    descr: DecDescr {
        codec: "codec2",
        name: "codec2",
        desc: "pure-rust codec2 decoder",
        mime: "audio/codec2",
    },
};

pub struct EncDes {
    descr: EncDescr,
}

pub struct Enc {
    mode: Option<Mode>,
    codec: Option<Codec2>,
    /// Samples waiting for a whole codec frame
    pending: Vec<i16>,
    packets: VecDeque<Packet>,
    pts: i64,
}

impl Enc {
    fn new() -> Self {
        Enc {
            mode: None,
            codec: None,
            pending: Vec::new(),
            packets: VecDeque::new(),
            pts: 0,
        }
    }

    fn mode(&self) -> Option<Mode> {
        self.codec.as_ref().map(|c| c.mode()).or(self.mode)
    }
}

fn encode_into(
    codec: &mut Codec2,
    speech: &[i16],
    pts: &mut i64,
    packets: &mut VecDeque<Packet>,
) -> Result<()> {
    let mut pkt = codec.encode_packet(speech)?;
    pkt.t = time_info(*pts, speech.len());
    pkt.is_key = true;
    *pts += speech.len() as i64;

    packets.push_back(pkt);

    Ok(())
}

impl EncDescriptor for EncDes {
    type OutputEncoder = Enc;

    fn create(&self) -> Self::OutputEncoder {
        Enc::new()
    }

    fn describe(&self) -> &EncDescr {
        &self.descr
    }
}

impl Encoder for Enc {
    fn get_extradata(&self) -> Option<Vec<u8>> {
        self.mode().map(|mode| extradata(mode).to_vec())
    }

    fn send_frame(&mut self, frame: &ArcFrame) -> Result<()> {
        let codec = self.codec.as_mut().ok_or(Error::ConfigurationIncomplete)?;
        let info = frame.kind.get_audio_info().ok_or(Error::InvalidData)?;
        let format = &info.format;

        if info.map.len() != 1 || format.bits != 16 || format.float || !format.signed {
            return Err(Error::Unsupported(format!("audio format {}", format)));
        }
        if info.sample_rate != SAMPLE_RATE {
            return Err(Error::Unsupported(format!("sample rate {}", info.sample_rate)));
        }

        let samples = <dyn FrameBuffer as FrameBufferConv<i16>>::as_slice(&*frame.buf, 0)
            .map_err(|_| Error::InvalidData)?;
        let count = info.samples.min(samples.len());
        self.pending.extend_from_slice(&samples[..count]);

        let n = codec.samples_per_frame();
        let mut done = 0;
        while self.pending.len() - done >= n {
            let speech = &self.pending[done..done + n];
            encode_into(codec, speech, &mut self.pts, &mut self.packets)?;
            done += n;
        }
        self.pending.drain(..done);

        Ok(())
    }

    fn receive_packet(&mut self) -> Result<Packet> {
        self.packets.pop_front().ok_or(Error::MoreDataNeeded)
    }

    /// Encode what is left, zero padded to a whole frame, and start over
    fn flush(&mut self) -> Result<()> {
        if let Some(codec) = self.codec.as_mut() {
            if !self.pending.is_empty() {
                self.pending.resize(codec.samples_per_frame(), 0);
                encode_into(codec, &self.pending, &mut self.pts, &mut self.packets)?;
            }
            codec.reset();
        }
        self.pending.clear();

        Ok(())
    }

    fn configure(&mut self) -> Result<()> {
        let mode = self.mode.ok_or(Error::ConfigurationIncomplete)?;

        self.codec = Some(Codec2::new(mode));
        self.pending.clear();
        self.pts = 0;

        Ok(())
    }

    fn set_option(&mut self, key: &str, val: Value) -> Result<()> {
        let mode = match (key, val) {
            ("bitrate", Value::U64(v)) => mode_from_bitrate(v)?,
            ("bitrate", Value::I64(v)) => mode_from_bitrate(v)?,
            ("bitrate", Value::Str(s)) => Mode::from_str(s)?,
            _ => return Err(Error::Unsupported(format!("{} key", key))),
        };

        self.mode = Some(mode);

        Ok(())
    }

    fn set_params(&mut self, params: &CodecParams) -> Result<()> {
        if let Some(StreamKind::Audio(ref info)) = params.kind {
            if info.rate != SAMPLE_RATE {
                return Err(Error::Unsupported(format!("sample rate {}", info.rate)));
            }
            if let Some(ref map) = info.map {
                if map.len() != 1 {
                    return Err(Error::Unsupported(format!("{} channels", map.len())));
                }
            }
        }

        if let Some(ref extra) = params.extradata {
            self.mode = Some(mode_from_extradata(extra)?);
        } else if params.bit_rate != 0 {
            self.mode = Some(mode_from_bitrate(params.bit_rate)?);
        }

        Ok(())
    }

    fn get_params(&self) -> Result<CodecParams> {
        let mode = self.mode().ok_or(Error::ConfigurationIncomplete)?;

        Ok(CodecParams {
            kind: Some(StreamKind::Audio(StreamInfo {
                rate: SAMPLE_RATE,
                map: Some(ChannelMap::default_map(1)),
                format: Some(Arc::new(formats::S16)),
            })),
            codec_id: Some("codec2".to_owned()),
            extradata: Some(extradata(mode).to_vec()),
            bit_rate: mode.bitrate() as usize,
            convergence_window: 0,
            delay: 0,
        })
    }
}

pub const CODEC2_ENC_DESCR: &EncDes = &EncDes {
    descr: EncDescr {
        codec: "codec2",
        name: "codec2",
        desc: "pure-rust codec2 encoder",
        mime: "audio/codec2",
    },
};

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::TWO_PI;

    fn tone(len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                (1..6)
                    .map(|h| 2000.0 / h as f32 * (TWO_PI * 140.0 * h as f32 * t).sin())
                    .sum::<f32>() as i16
            })
            .collect()
    }

    fn samples(frame: &ArcFrame) -> Vec<i16> {
        let info = frame.kind.get_audio_info().unwrap();
        let s = <dyn FrameBuffer as FrameBufferConv<i16>>::as_slice(&*frame.buf, 0).unwrap();

        s[..info.samples].to_vec()
    }

    fn encoder(bitrate: u64) -> Enc {
        let mut enc = CODEC2_ENC_DESCR.create();
        enc.set_option("bitrate", Value::U64(bitrate)).unwrap();
        enc.configure().unwrap();
        enc
    }

    #[test]
    fn descriptors() {
        assert_eq!(CODEC2_DESCR.describe().codec, "codec2");
        assert_eq!(CODEC2_ENC_DESCR.describe().codec, "codec2");
    }

    #[test]
    fn encode_through_frames() {
        let mut enc = encoder(1400);
        let mut reference = Codec2::new(Mode::Rate1400);
        let n = reference.samples_per_frame();
        let speech = tone(3 * n + n / 2);

        enc.send_frame(&Arc::new(audio_frame(&speech, 0).unwrap()))
            .unwrap();

        let mut bits = vec![0u8; reference.bytes_per_frame()];
        for (k, chunk) in speech.chunks_exact(n).enumerate() {
            let pkt = enc.receive_packet().unwrap();
            reference.encode(&mut bits, chunk).unwrap();

            assert_eq!(pkt.data, bits);
            assert_eq!(pkt.t.pts, Some((k * n) as i64));
        }
        match enc.receive_packet() {
            Err(Error::MoreDataNeeded) => {}
            _ => panic!("a partial frame was encoded"),
        }

        // the tail is zero padded
        enc.flush().unwrap();
        let pkt = enc.receive_packet().unwrap();
        let mut tail = speech[3 * n..].to_vec();
        tail.resize(n, 0);
        reference.encode(&mut bits, &tail).unwrap();

        assert_eq!(pkt.data, bits);
        assert_eq!(pkt.t.pts, Some((3 * n) as i64));
    }

    #[test]
    fn decode_through_packets() {
        let mut enc = encoder(2400);
        let mut dec = CODEC2_DESCR.create();
        dec.set_extradata(&enc.get_extradata().unwrap());
        dec.configure().unwrap();

        let mut reference = Codec2::new(Mode::Rate2400);
        let n = reference.samples_per_frame();
        enc.send_frame(&Arc::new(audio_frame(&tone(4 * n), 0).unwrap()))
            .unwrap();

        let mut packets = Vec::new();
        while let Ok(pkt) = enc.receive_packet() {
            packets.push(pkt);
        }
        assert_eq!(packets.len(), 4);

        // two codec frames in one packet
        let mut joined = Packet::new();
        joined.data = [packets[2].data.clone(), packets[3].data.clone()].concat();

        dec.send_packet(&packets[0]).unwrap();
        dec.send_packet(&packets[1]).unwrap();
        dec.send_packet(&joined).unwrap();

        let mut out = vec![0i16; n];
        for (k, pkt) in packets.iter().enumerate() {
            let frame = dec.receive_frame().unwrap();
            reference.decode(&mut out, &pkt.data).unwrap();

            assert_eq!(samples(&frame), out);
            assert_eq!(frame.t.pts, Some((k * n) as i64));
        }
        assert!(dec.receive_frame().is_err());
    }

    #[test]
    fn decoder_configuration() {
        let mut dec = CODEC2_DESCR.create();

        match dec.send_packet(&Packet::zeroed(6)) {
            Err(Error::ConfigurationIncomplete) => {}
            _ => panic!("decoded before configuration"),
        }
        match dec.configure() {
            Err(Error::ConfigurationIncomplete) => {}
            _ => panic!("configured without extradata"),
        }

        // 3200 bit/s
        dec.set_extradata(&[0, 8, 0, 0]);
        assert!(dec.configure().is_err());
        dec.set_extradata(&[0, 8]);
        assert!(dec.configure().is_err());

        dec.set_extradata(&extradata(Mode::Rate1200));
        dec.configure().unwrap();

        assert!(dec.send_packet(&Packet::zeroed(7)).is_err());
        assert!(dec.send_packet(&Packet::new()).is_err());
        dec.send_packet(&Packet::zeroed(12)).unwrap();
        assert_eq!(samples(&dec.receive_frame().unwrap()).len(), 320);

        dec.flush().unwrap();
        assert!(dec.receive_frame().is_err());
    }

    #[test]
    fn encoder_configuration() {
        let mut enc = CODEC2_ENC_DESCR.create();

        assert!(enc.configure().is_err());
        assert!(enc.get_params().is_err());
        assert_eq!(enc.get_extradata(), None);
        assert!(enc.set_option("bitrate", Value::U64(3200)).is_err());
        assert!(enc.set_option("bitrate", Value::I64(-1200)).is_err());
        assert!(enc.set_option("quality", Value::U64(1)).is_err());

        enc.set_option("bitrate", Value::Str("1200")).unwrap();
        let params = enc.get_params().unwrap();
        assert_eq!(params.bit_rate, 1200);
        assert_eq!(params.extradata, Some(extradata(Mode::Rate1200).to_vec()));

        let mut other = CODEC2_ENC_DESCR.create();
        other.set_params(&params).unwrap();
        other.configure().unwrap();
        assert_eq!(other.get_extradata(), enc.get_extradata());

        let info = AudioInfo::new(
            160,
            16000,
            ChannelMap::default_map(1),
            Arc::new(formats::S16),
            None,
        );
        let wideband = Arc::new(Frame::new_default_frame(info, None));
        assert!(other.send_frame(&wideband).is_err());
    }
}
