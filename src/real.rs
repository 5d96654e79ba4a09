//! Real-number types over which the decoders are generic

use std::fmt::Debug;
use std::iter::Sum;

use num_traits::Float;

/// Floating-point type used for LLR values and path metrics
///
/// Implemented for `f32` and `f64`. Every decoder in this crate is monomorphized per `Real` type,
/// so no precision dispatch happens inside the recursions.
pub trait Real: Float + Debug + Default + Sum + Send + Sync + 'static {
    /// Largest LLR magnitude accepted by the decoders; inputs beyond it are clipped.
    const SATURATION: Self;

    /// Returns the value closest to the given `f64`.
    fn from_f64(x: f64) -> Self;

    /// Returns the value clipped to `[-SATURATION, SATURATION]`.
    #[must_use]
    fn saturate(self) -> Self {
        self.max(-Self::SATURATION).min(Self::SATURATION)
    }
}

impl Real for f32 {
    const SATURATION: f32 = 1e30;

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(x: f64) -> Self {
        x as f32
    }
}

impl Real for f64 {
    const SATURATION: f64 = 1e100;

    fn from_f64(x: f64) -> Self {
        x
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn test_saturate() {
        assert_float_eq!(f64::INFINITY.saturate(), 1e100, abs <= 1e-8);
        assert_float_eq!(f64::NEG_INFINITY.saturate(), -1e100, abs <= 1e-8);
        assert_float_eq!((-3.5f64).saturate(), -3.5, abs <= 1e-8);
        assert_float_eq!(f32::INFINITY.saturate(), 1e30, abs <= 1.0);
    }

    #[test]
    fn test_from_f64() {
        assert_float_eq!(<f32 as Real>::from_f64(0.25), 0.25f32, abs <= 1e-8);
        assert_float_eq!(<f64 as Real>::from_f64(-2.0), -2.0, abs <= 1e-8);
    }
}
