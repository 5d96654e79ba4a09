//! Gray-mapped pulse-amplitude modulation (PAM)
//!
//! Maps groups of `bps` bits to real symbols of a `2^bps`-ary constellation with unit average
//! energy, and computes bit LLR values from noisy symbols for the decoders in this crate.
//!
//! # Examples
//!
//! ```
//! use softdec::maxstar::MaxLogMap;
//! use softdec::pam::{Pam, PamParams};
//! use softdec::{utils, Bit};
//!
//! let pam = Pam::<f64>::new(PamParams { bits_per_symbol: 2, sigma: 0.5 })?;
//! let bits = [Bit::One, Bit::Zero, Bit::Zero, Bit::One, Bit::One];
//! let mut symbols = vec![0.0; pam.num_symbols(bits.len())];
//! pam.modulate(&bits, &mut symbols);
//! let mut llrs = [0.0; 5];
//! pam.demodulate::<MaxLogMap>(&symbols, &mut llrs);
//! assert_eq!(utils::hard_decisions::<f64, Bit>(&llrs), bits);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::maxstar::MaxStar;
use crate::{Bit, Error, Real};

/// Largest supported number of bits per symbol
const MAX_BITS_PER_SYMBOL: usize = 16;

/// Parameters of a PAM modem
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct PamParams {
    /// Number of bits per symbol
    pub bits_per_symbol: usize,
    /// Standard deviation of the channel noise assumed by the demodulator
    pub sigma: f64,
}

impl PamParams {
    /// Checks validity of parameters.
    pub(crate) fn check(&self) -> Result<(), Error> {
        if !(1 ..= MAX_BITS_PER_SYMBOL).contains(&self.bits_per_symbol) {
            return Err(Error::InvalidInput(format!(
                "Number of bits per symbol must be in 1..={MAX_BITS_PER_SYMBOL} (found {})",
                self.bits_per_symbol
            )));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(Error::InvalidInput(format!(
                "Noise standard deviation must be positive and finite (found {})",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// PAM modulator and demodulator
#[derive(Clone, Debug, PartialEq)]
pub struct Pam<R: Real> {
    /// Number of bits per symbol
    bits_per_symbol: usize,
    /// Noise variance
    sigma2: R,
    /// Symbol for each group of bits, the `j`-th bit of the group being bit `j` of the index
    constellation: Vec<R>,
}

impl<R: Real> Pam<R> {
    /// Returns PAM modem for given parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of bits per symbol is not in `1 ..= 16`, or if the noise
    /// standard deviation is not positive and finite.
    pub fn new(params: PamParams) -> Result<Self, Error> {
        params.check()?;
        let bps = params.bits_per_symbol;
        let num_points = 1usize << bps;
        #[allow(clippy::cast_precision_loss)]
        let sqrt_es = (((num_points * num_points) as f64 - 1.0) / 3.0).sqrt();
        let constellation = (0 .. num_points)
            .map(|index| {
                let bit_sign = |j: usize| 1.0 - 2.0 * f64::from(u8::from((index >> j) & 1 == 1));
                let mut symbol = bit_sign(0);
                for j in 1 .. bps {
                    #[allow(clippy::cast_precision_loss)]
                    let level = (1usize << j) as f64;
                    symbol = bit_sign(j) * (level - symbol);
                }
                R::from_f64(symbol / sqrt_es)
            })
            .collect();
        log::debug!("PAM modem: {num_points} points, sigma = {}", params.sigma);
        Ok(Self {
            bits_per_symbol: bps,
            sigma2: R::from_f64(params.sigma * params.sigma),
            constellation,
        })
    }

    /// Returns number of bits per symbol.
    #[must_use]
    pub fn bits_per_symbol(&self) -> usize {
        self.bits_per_symbol
    }

    /// Returns constellation points, indexed by the bits they carry.
    #[must_use]
    pub fn constellation(&self) -> &[R] {
        &self.constellation
    }

    /// Returns number of symbols needed to carry given number of bits.
    #[must_use]
    pub fn num_symbols(&self, num_bits: usize) -> usize {
        num_bits.div_ceil(self.bits_per_symbol)
    }

    /// Maps bits to symbols, padding the last group of bits with `Zero` if it is incomplete.
    ///
    /// # Panics
    ///
    /// Panics if `symbols.len()` differs from `self.num_symbols(bits.len())`.
    pub fn modulate(&self, bits: &[Bit], symbols: &mut [R]) {
        assert_eq!(
            symbols.len(),
            self.num_symbols(bits.len()),
            "Wrong number of symbols"
        );
        for (symbol, group) in symbols.iter_mut().zip(bits.chunks(self.bits_per_symbol)) {
            let index = group
                .iter()
                .enumerate()
                .fold(0, |acc, (j, b)| acc | (b.index() << j));
            *symbol = self.constellation[index];
        }
    }

    /// Writes bit LLR values for given noisy symbols.
    ///
    /// The LLR value of bit `b` of symbol `y` is `L0 - L1`, where `L0` (resp. `L1`) is the
    /// max-star of `-(y - c)^2 / sigma^2` over constellation points `c` whose bit `b` is `Zero`
    /// (resp. `One`).
    ///
    /// # Panics
    ///
    /// Panics if `symbols.len()` differs from `self.num_symbols(llrs.len())`.
    pub fn demodulate<M: MaxStar>(&self, symbols: &[R], llrs: &mut [R]) {
        assert_eq!(
            symbols.len(),
            self.num_symbols(llrs.len()),
            "Wrong number of symbols"
        );
        for (n, llr) in llrs.iter_mut().enumerate() {
            let bit_pos = n % self.bits_per_symbol;
            let y = symbols[n / self.bits_per_symbol];
            let mut metric_for_zero = R::neg_infinity();
            let mut metric_for_one = R::neg_infinity();
            for (index, &point) in self.constellation.iter().enumerate() {
                let metric = -(y - point) * (y - point) / self.sigma2;
                if (index >> bit_pos) & 1 == 0 {
                    metric_for_zero = M::max_star(metric_for_zero, metric);
                } else {
                    metric_for_one = M::max_star(metric_for_one, metric);
                }
            }
            *llr = (metric_for_zero - metric_for_one).saturate();
        }
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::maxstar::{LogMap, MaxLogMap};
    use crate::utils;
    use Bit::{One, Zero};

    fn new_pam(bits_per_symbol: usize, sigma: f64) -> Pam<f64> {
        Pam::new(PamParams {
            bits_per_symbol,
            sigma,
        })
        .unwrap()
    }

    #[test]
    fn test_new() {
        for (bps, sigma) in [(0, 1.0), (17, 1.0), (2, 0.0), (2, f64::NAN), (2, -1.0)] {
            assert!(Pam::<f64>::new(PamParams {
                bits_per_symbol: bps,
                sigma
            })
            .is_err());
        }
        let pam = new_pam(2, 1.0);
        assert_eq!(pam.bits_per_symbol(), 2);
        let s = 5f64.sqrt();
        assert_float_eq!(
            pam.constellation().to_vec(),
            vec![1.0 / s, 3.0 / s, -1.0 / s, -3.0 / s],
            abs_all <= 1e-12
        );
        assert_float_eq!(
            new_pam(1, 1.0).constellation().to_vec(),
            vec![1.0, -1.0],
            abs_all <= 1e-12
        );
    }

    #[test]
    fn test_unit_energy_and_gray_mapping() {
        for bps in 1 .. 6 {
            let pam = new_pam(bps, 1.0);
            let points = pam.constellation();
            #[allow(clippy::cast_precision_loss)]
            let energy = points.iter().map(|x| x * x).sum::<f64>() / points.len() as f64;
            assert_float_eq!(energy, 1.0, abs <= 1e-12);
            // Neighboring points differ in exactly one bit
            let mut order: Vec<usize> = (0 .. points.len()).collect();
            order.sort_by(|&i, &j| points[i].total_cmp(&points[j]));
            for pair in order.windows(2) {
                assert_eq!((pair[0] ^ pair[1]).count_ones(), 1);
            }
        }
    }

    #[test]
    fn test_modulate_pads_last_symbol() {
        let pam = new_pam(2, 1.0);
        assert_eq!(pam.num_symbols(5), 3);
        let mut symbols = [0.0; 3];
        pam.modulate(&[One, Zero, Zero, One, One], &mut symbols);
        let points = pam.constellation();
        assert_eq!(symbols, [points[1], points[2], points[1]]);
    }

    #[test]
    fn test_demodulate_bpsk() {
        let pam = new_pam(1, 1.0);
        let mut llrs = [0.0; 2];
        pam.demodulate::<LogMap>(&[1.0, -0.5], &mut llrs);
        assert_float_eq!(llrs.to_vec(), vec![4.0, -2.0], abs_all <= 1e-12);
    }

    #[test]
    fn test_demodulate_noiseless() {
        let pam = new_pam(3, 0.3);
        let bits = utils::random_bits(300);
        let mut symbols = vec![0.0; 100];
        pam.modulate(&bits, &mut symbols);
        let mut llrs = vec![0.0; 300];
        pam.demodulate::<MaxLogMap>(&symbols, &mut llrs);
        assert_eq!(utils::hard_decisions::<f64, Bit>(&llrs), bits);
        pam.demodulate::<LogMap>(&symbols, &mut llrs);
        assert_eq!(utils::hard_decisions::<f64, Bit>(&llrs), bits);
    }

    #[test]
    #[should_panic(expected = "Wrong number of symbols")]
    fn test_demodulate_wrong_len() {
        let mut llrs = [0.0; 4];
        new_pam(2, 1.0).demodulate::<LogMap>(&[0.5], &mut llrs);
    }
}
