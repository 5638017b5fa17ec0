//!
//! Bitstream packing
//!
//! Fields are stored most significant bit first, back to back, with no
//! padding except for the tail of the last byte.
//!

use crate::bitstream::bitread::*;
use crate::frame::QuantizedFrame;
use crate::mode::FieldSpec;

/// MSB-first writer over a fixed buffer
pub struct BitPacker<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BitPacker<'a> {
    /// The buffer is cleared
    pub fn new(buf: &'a mut [u8]) -> Self {
        for b in buf.iter_mut() {
            *b = 0;
        }

        BitPacker { buf, pos: 0 }
    }

    /// Append the `bits` low bits of `value`
    pub fn put(&mut self, value: usize, bits: usize) {
        for i in (0..bits).rev() {
            if value >> i & 1 != 0 {
                self.buf[self.pos >> 3] |= 0x80 >> (self.pos & 7);
            }
            self.pos += 1;
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }
}

big_endian_reader! { BitUnpacker }

impl<'a> BitUnpacker<'a> {
    #[inline(always)]
    fn fill(&self, count: usize) -> u64 {
        let len = self.buffer.len();
        let end = len.min(self.index + count);
        let start = self.index.min(end);
        let mut v = 0;

        for &b in self.buffer[start..end].iter() {
            v = v << 8 | b as u64;
        }

        // the stream is zero padded past its end
        v << (8 * (count - (end - start)))
    }
}

impl<'a> BitReadFill for BitUnpacker<'a> {
    #[inline(always)]
    fn can_refill(&self) -> bool {
        self.index < self.buffer.len()
    }
    #[inline(always)]
    fn fill32(&self) -> u64 {
        self.fill(4)
    }
    #[inline(always)]
    fn fill64(&self) -> u64 {
        self.fill(8)
    }
}

/// Write `frame` into `buf` following `layout`, values wider than their
/// field are truncated to the field.
pub fn pack(layout: &[FieldSpec], frame: &QuantizedFrame, buf: &mut [u8]) {
    let mut w = BitPacker::new(buf);

    for f in layout {
        let mask = (1usize << f.bits) - 1;
        w.put(frame.get(f.field) & mask, f.bits);
    }
}

/// Read back the fields of `layout` from `buf`
pub fn unpack(layout: &[FieldSpec], buf: &[u8]) -> QuantizedFrame {
    let mut r = BitUnpacker::new(buf);
    let mut frame = QuantizedFrame::default();

    for f in layout {
        frame.set(f.field, r.get_bits_32(f.bits) as usize);
    }

    frame
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mode::{Field, Mode};

    const MODES: &[Mode] = &[Mode::Rate2400, Mode::Rate1400, Mode::Rate1200];

    #[test]
    fn msb_first() {
        let mut buf = [0u8; 2];
        {
            let mut w = BitPacker::new(&mut buf);
            w.put(1, 1);
            w.put(0, 1);
            w.put(0b101, 3);
            w.put(0xff, 8);
            assert_eq!(w.position(), 13);
        }
        assert_eq!(buf, [0b1010_1111, 0b1111_1000]);

        let mut r = BitUnpacker::new(&buf);
        assert_eq!(r.get_bits_32(1), 1);
        assert_eq!(r.get_bits_32(1), 0);
        assert_eq!(r.get_bits_32(3), 0b101);
        assert_eq!(r.get_bits_32(8), 0xff);
    }

    #[test]
    fn packer_clears_buffer() {
        let mut buf = [0xffu8; 6];
        pack(Mode::Rate2400.layout(), &QuantizedFrame::default(), &mut buf);

        assert_eq!(buf, [0u8; 6]);
    }

    #[test]
    fn round_trip() {
        for &mode in MODES {
            let layout = mode.layout();
            let mut frame = QuantizedFrame::default();
            for (i, f) in layout.iter().enumerate() {
                // alternate bit patterns across neighbours
                let v = if i % 2 == 0 { 0x5555 } else { 0x2aaa };
                frame.set(f.field, v & ((1 << f.bits) - 1));
            }

            let mut buf = vec![0u8; mode.bytes_per_frame()];
            pack(layout, &frame, &mut buf);

            assert_eq!(unpack(layout, &buf), frame);
        }
    }

    #[test]
    fn no_bleed_between_fields() {
        for &mode in MODES {
            let layout = mode.layout();

            for f in layout {
                let full = (1 << f.bits) - 1;
                // a single saturated field among zeros and a single zero
                // field among saturated ones
                let mut alone = QuantizedFrame::default();
                alone.set(f.field, full);

                let mut hole = QuantizedFrame::default();
                for g in layout {
                    hole.set(g.field, (1 << g.bits) - 1);
                }
                hole.set(f.field, 0);

                for frame in [alone, hole].iter() {
                    let mut buf = vec![0u8; mode.bytes_per_frame()];
                    pack(layout, frame, &mut buf);
                    let out = unpack(layout, &buf);

                    for g in layout {
                        assert_eq!(out.get(g.field), frame.get(g.field), "{:?}", g.field);
                    }
                }
            }
        }
    }

    #[test]
    fn oversized_values_are_masked() {
        let layout = Mode::Rate1200.layout();
        let mut frame = QuantizedFrame::default();
        frame.set(Field::WoE(0), 0x1ff);
        frame.set(Field::Voicing(1), 1);

        let mut buf = vec![0u8; 6];
        pack(layout, &frame, &mut buf);
        let out = unpack(layout, &buf);

        assert_eq!(out.woe[0], 0xff);
        assert!(out.voiced[1]);
        assert!(!out.voiced[2]);
    }

    #[test]
    fn layout_fills_frame() {
        for &mode in MODES {
            let mut buf = vec![0u8; mode.bytes_per_frame()];
            let mut w = BitPacker::new(&mut buf);
            for f in mode.layout() {
                w.put(0, f.bits);
            }
            assert_eq!(w.position(), mode.bits_per_frame());
        }
    }
}
