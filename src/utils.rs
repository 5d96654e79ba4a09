//! # Some useful functions for exercising the decoders
//!
//! The [`random_bits`] function returns a given number of random bits; the [`hard_decisions`]
//! function slices LLR values to bits; and the [`error_count`] function returns the number of
//! errors in a sequence with respect to a reference sequence.
//!
//! # Examples
//!
//! The code below illustrates the usage of the functions in this module.
//! ```
//! use softdec::{utils, Bit};
//!
//! let bits = utils::random_bits(40);
//! let llrs: Vec<f64> = bits
//!     .iter()
//!     .map(|&b| if b == Bit::Zero { 4.0 } else { -4.0 })
//!     .collect();
//! let bits_hat: Vec<Bit> = utils::hard_decisions(&llrs);
//! assert_eq!(utils::error_count(&bits_hat, &bits), 0);
//! ```

use rand::Rng;

use crate::{Bit, HardBit, Real};

/// Returns given number of random bits.
///
/// # Parameters
///
/// - `num_bits`: Number of random bits to be generated.
///
/// # Returns
///
/// - `bits`: Random bits.
#[must_use]
pub fn random_bits(num_bits: usize) -> Vec<Bit> {
    let mut rng = rand::rng();
    (0 .. num_bits)
        .map(|_| {
            if rng.random_bool(0.5) {
                Bit::One
            } else {
                Bit::Zero
            }
        })
        .collect()
}

/// Returns hard decision for a single LLR value (nonnegative values map to `Zero`).
#[must_use]
pub fn hard_decision<R: Real>(llr: R) -> Bit {
    if llr >= R::zero() {
        Bit::Zero
    } else {
        Bit::One
    }
}

/// Returns hard decisions for given LLR values.
///
/// # Parameters
///
/// - `llrs`: LLR values to be sliced. Nonnegative values are mapped to `Zero`, and negative
///   values to `One`.
///
/// # Returns
///
/// - `bits_hat`: Bits obtained by slicing the given LLR values, in the requested representation.
#[must_use]
pub fn hard_decisions<R: Real, B: HardBit>(llrs: &[R]) -> Vec<B> {
    llrs.iter()
        .map(|&x| B::from_bit(hard_decision(x)))
        .collect()
}

/// Returns number of errors in a sequence with respect to a reference sequence.
///
/// # Parameters
///
/// - `seq`: Sequence in which errors must be counted.
///
/// - `ref_seq`: Reference sequence to which the given sequence is compared.
///
/// # Returns
///
/// - `err_count`: Number of positions in which the two sequences differ. If they are of different
///   lengths, then the longer sequence is effectively truncated to the length of the shorter one.
pub fn error_count<T: PartialEq>(seq: &[T], ref_seq: &[T]) -> usize {
    ref_seq
        .iter()
        .zip(seq.iter())
        .filter(|&(x, y)| x != y)
        .count()
}
