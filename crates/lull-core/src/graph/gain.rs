//! Gain stages shared between the control side and the audio thread

use std::sync::atomic::{AtomicU32, Ordering};

/// A linear gain value readable from the audio thread without locking
///
/// Stored as the bit pattern of an `f32`. Relaxed ordering is enough: the
/// renderer only needs to eventually observe the latest value, it never
/// synchronizes other memory through it.
#[derive(Debug)]
pub struct GainStage {
    bits: AtomicU32,
}

impl GainStage {
    pub fn new(gain: f32) -> Self {
        Self {
            bits: AtomicU32::new(Self::sanitize(gain).to_bits()),
        }
    }

    /// Set the linear gain (clamped to 0.0..=1.0), effective on the next block
    #[inline]
    pub fn set(&self, gain: f32) {
        self.bits.store(Self::sanitize(gain).to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    fn sanitize(gain: f32) -> f32 {
        if gain.is_nan() {
            0.0
        } else {
            gain.clamp(0.0, 1.0)
        }
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_roundtrip() {
        let stage = GainStage::new(0.3);
        assert_eq!(stage.get(), 0.3);
        stage.set(0.75);
        assert_eq!(stage.get(), 0.75);
    }

    #[test]
    fn test_gain_is_clamped() {
        let stage = GainStage::default();
        stage.set(4.0);
        assert_eq!(stage.get(), 1.0);
        stage.set(-1.0);
        assert_eq!(stage.get(), 0.0);
        stage.set(f32::NAN);
        assert_eq!(stage.get(), 0.0);
    }
}
