use crate::complex::*;

/// Radix-2 complex FFT
///
/// The inverse transform is not normalised, matching what the
/// synthesis side expects.
#[derive(Debug)]
pub struct Fft {
    n: usize,
    exptab: Vec<Complex32>,
    rev: Vec<usize>,
}

impl Fft {
    pub fn new(n: usize) -> Self {
        use std::f32::consts::PI;
        debug_assert!(n.is_power_of_two());

        let bits = n.trailing_zeros();
        let exptab = (0..n / 2)
            .map(|i| {
                let v = -2f32 * PI * i as f32 / n as f32;
                Complex32::new(v.cos(), v.sin())
            })
            .collect();

        let rev = (0..n)
            .map(|i| {
                if bits == 0 {
                    0
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                }
            })
            .collect();

        Fft { n, exptab, rev }
    }

    fn calc(&self, buf: &mut [Complex32], inverse: bool) {
        let n = self.n;

        for (i, &j) in self.rev.iter().enumerate() {
            if i < j {
                buf.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let step = n / len;
            for chunk in buf[..n].chunks_mut(len) {
                let (lo, hi) = chunk.split_at_mut(half);
                for (k, (a, b)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                    let w = self.exptab[k * step];
                    let w = if inverse { w.conj() } else { w };
                    let t = *b * w;
                    *b = *a - t;
                    *a += t;
                }
            }
            len <<= 1;
        }
    }

    pub fn forward(&self, buf: &mut [Complex32]) {
        self.calc(buf, false)
    }

    pub fn inverse(&self, buf: &mut [Complex32]) {
        self.calc(buf, true)
    }
}
