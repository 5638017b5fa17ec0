/// Power ratio conversions
pub trait Decibel {
    fn to_db(self) -> Self;
    fn from_db(self) -> Self;
}

impl Decibel for f32 {
    #[inline(always)]
    fn to_db(self) -> Self {
        10.0 * self.log10()
    }
    #[inline(always)]
    fn from_db(self) -> Self {
        10f32.powf(self / 10.0)
    }
}

/// Saturate a synthesized sample into the symmetric 16-bit range
#[inline(always)]
pub fn saturate(v: f32) -> i16 {
    if v > 32767.0 {
        32767
    } else if v < -32767.0 {
        -32767
    } else {
        v as i16
    }
}

pub const RAND_MAX: u32 = 32767;

/// The linear congruential generator codec2 uses for random phases.
///
/// Kept per instance so that decoding is reproducible.
#[derive(Debug, Clone)]
pub struct Rand {
    next: u32,
}

impl Default for Rand {
    fn default() -> Self {
        Rand { next: 1 }
    }
}

impl Rand {
    pub fn next(&mut self) -> u32 {
        self.next = self.next.wrapping_mul(1103515245).wrapping_add(12345);
        (self.next / 65536) % (RAND_MAX + 1)
    }

    /// Uniform phase in [0, 2π]
    pub fn phase(&mut self) -> f32 {
        crate::model::TWO_PI * self.next() as f32 / RAND_MAX as f32
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn saturation() {
        assert_eq!(saturate(0.0), 0);
        assert_eq!(saturate(1234.7), 1234);
        assert_eq!(saturate(-1234.7), -1234);
        assert_eq!(saturate(32767.0), 32767);
        assert_eq!(saturate(32768.0), 32767);
        assert_eq!(saturate(1e9), 32767);
        assert_eq!(saturate(-32768.0), -32767);
        assert_eq!(saturate(-1e9), -32767);
        assert_eq!(saturate(std::f32::INFINITY), 32767);
        assert_eq!(saturate(std::f32::NEG_INFINITY), -32767);
    }

    #[test]
    fn decibel() {
        assert!((100f32.to_db() - 20.0).abs() < 1e-5);
        assert!((20f32.from_db() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn rand() {
        let mut a = Rand::default();
        let mut b = Rand::default();

        for _ in 0..1000 {
            let v = a.next();
            assert!(v <= RAND_MAX);
            assert_eq!(v, b.next());
        }

        let p = a.phase();
        assert!(p >= 0.0 && p <= crate::model::TWO_PI);
    }
}
