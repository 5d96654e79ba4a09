//! Decoders selected at runtime
//!
//! The decoders in this crate are generic over their max-star strategy or check-node update rule,
//! which keeps the recursions free of dynamic dispatch. This module turns the runtime selections
//! [`MaxStarKind`] and [`UpdateRuleKind`] into boxed decoders behind the object-safe
//! [`SisoDecoder`] and [`LdpcDecoder`] traits, so that dispatch happens once per frame.
//!
//! # Examples
//!
//! ```
//! use softdec::bcjr::BcjrParams;
//! use softdec::maxstar::MaxStarKind;
//! use softdec::trellis::Trellis;
//!
//! let trellis = Trellis::from_polynomials(&[0o13, 0o15])?;
//! let params = BcjrParams { block_len: 16, buffered_encoding: true };
//! let mut decoder = MaxStarKind::LinearLogMAP.build_bcjr_decoder::<f32>(trellis, params)?;
//! let sys = vec![0.5; decoder.num_steps()];
//! let par = vec![0.5; decoder.num_steps()];
//! let mut ext = vec![0.0; decoder.block_len()];
//! decoder.decode(&sys, &par, &mut ext);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use crate::bcjr::{BcjrDecoder, BcjrParams};
use crate::ldpc::{DecoderOutput, FloodingDecoder, LdpcParams};
use crate::maxstar::{LinearLogMap, LogMap, MaxLogMap, MaxStar, MaxStarKind};
use crate::tanner::TannerGraph;
use crate::trellis::Trellis;
use crate::update_rule::{
    MinSum, NormalizedMinSum, OffsetMinSum, SumProduct, UpdateRule, UpdateRuleKind,
};
use crate::{Bit, Error, Real};

/// Soft-input/soft-output trellis decoder
///
/// This trait is used to form BCJR decoder trait objects, abstracting over the max-star strategy.
pub trait SisoDecoder<R: Real>: std::fmt::Debug + Send {
    /// Returns number of information bits per block.
    fn block_len(&self) -> usize;

    /// Returns number of trellis steps per block.
    fn num_steps(&self) -> usize;

    /// Writes extrinsic LLR values for the information bits.
    fn decode(&mut self, sys: &[R], par: &[R], ext: &mut [R]);

    /// Same as [`SisoDecoder::decode`], additionally writing extrinsic LLR values for the parity
    /// bits of all trellis steps.
    fn decode_siso(&mut self, sys: &[R], par: &[R], ext_sys: &mut [R], ext_par: &mut [R]);

    /// Same as [`SisoDecoder::decode`], with systematic and parity LLR values interleaved.
    fn decode_interleaved(&mut self, y_n1: &[R], y_n2: &mut [R]);

    /// Writes decisions on the information bits.
    fn decode_bits(&mut self, sys: &[R], par: &[R], bits: &mut [Bit]);
}

impl<R: Real, M: MaxStar> SisoDecoder<R> for BcjrDecoder<R, M> {
    fn block_len(&self) -> usize {
        BcjrDecoder::block_len(self)
    }

    fn num_steps(&self) -> usize {
        BcjrDecoder::num_steps(self)
    }

    fn decode(&mut self, sys: &[R], par: &[R], ext: &mut [R]) {
        BcjrDecoder::decode(self, sys, par, ext);
    }

    fn decode_siso(&mut self, sys: &[R], par: &[R], ext_sys: &mut [R], ext_par: &mut [R]) {
        BcjrDecoder::decode_siso(self, sys, par, ext_sys, ext_par);
    }

    fn decode_interleaved(&mut self, y_n1: &[R], y_n2: &mut [R]) {
        BcjrDecoder::decode_interleaved(self, y_n1, y_n2);
    }

    fn decode_bits(&mut self, sys: &[R], par: &[R], bits: &mut [Bit]) {
        BcjrDecoder::decode_bits(self, sys, par, bits);
    }
}

/// LDPC decoder
///
/// This trait is used to form LDPC decoder trait objects, abstracting over the update rule.
pub trait LdpcDecoder<R: Real>: std::fmt::Debug + Send {
    /// Returns codeword length `N`.
    fn codeword_len(&self) -> usize;

    /// Decodes one frame, writing the posterior LLR value of every codeword bit.
    fn decode(&mut self, llrs: &[R], posterior: &mut [R]) -> DecoderOutput;

    /// Decodes one frame, writing the hard decision on every codeword bit.
    fn decode_bits(&mut self, llrs: &[R], bits: &mut [Bit]) -> DecoderOutput;

    /// Decodes one frame, writing the hard decisions on the information bits.
    fn decode_info_bits(&mut self, llrs: &[R], info_bits: &mut [Bit]) -> DecoderOutput;
}

impl<R: Real, U: UpdateRule<R>> LdpcDecoder<R> for FloodingDecoder<R, U> {
    fn codeword_len(&self) -> usize {
        self.graph().num_vars()
    }

    fn decode(&mut self, llrs: &[R], posterior: &mut [R]) -> DecoderOutput {
        FloodingDecoder::decode(self, llrs, posterior)
    }

    fn decode_bits(&mut self, llrs: &[R], bits: &mut [Bit]) -> DecoderOutput {
        FloodingDecoder::decode_bits(self, llrs, bits)
    }

    fn decode_info_bits(&mut self, llrs: &[R], info_bits: &mut [Bit]) -> DecoderOutput {
        FloodingDecoder::decode_info_bits(self, llrs, info_bits)
    }
}

impl MaxStarKind {
    /// Builds a BCJR decoder using this max-star strategy.
    ///
    /// # Errors
    ///
    /// Returns an error under the conditions listed for [`BcjrDecoder::new`].
    pub fn build_bcjr_decoder<R: Real>(
        self,
        trellis: impl Into<Arc<Trellis>>,
        params: BcjrParams,
    ) -> Result<Box<dyn SisoDecoder<R>>, Error> {
        log::debug!("Building {self} BCJR decoder");
        Ok(match self {
            MaxStarKind::LogMAP => Box::new(BcjrDecoder::<R, LogMap>::new(trellis, params)?),
            MaxStarKind::MaxLogMAP => Box::new(BcjrDecoder::<R, MaxLogMap>::new(trellis, params)?),
            MaxStarKind::LinearLogMAP => {
                Box::new(BcjrDecoder::<R, LinearLogMap>::new(trellis, params)?)
            }
        })
    }
}

impl UpdateRuleKind {
    /// Builds a flooding LDPC decoder using this update rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule parameters are out of range, under the conditions listed for
    /// [`FloodingDecoder::new`], or if `info_bits_pos` is invalid.
    pub fn build_ldpc_decoder<R: Real>(
        self,
        graph: impl Into<Arc<TannerGraph>>,
        params: LdpcParams,
        info_bits_pos: Vec<usize>,
    ) -> Result<Box<dyn LdpcDecoder<R>>, Error> {
        log::debug!("Building {self} LDPC decoder");
        let graph = graph.into();
        Ok(match self {
            UpdateRuleKind::SumProduct => Box::new(
                FloodingDecoder::new(graph, params, SumProduct::<R>::new())?
                    .with_info_bits_pos(info_bits_pos)?,
            ),
            UpdateRuleKind::MinSum => Box::new(
                FloodingDecoder::<R, _>::new(graph, params, MinSum)?
                    .with_info_bits_pos(info_bits_pos)?,
            ),
            UpdateRuleKind::OffsetMinSum { offset } => Box::new(
                FloodingDecoder::new(graph, params, OffsetMinSum::new(R::from_f64(offset))?)?
                    .with_info_bits_pos(info_bits_pos)?,
            ),
            UpdateRuleKind::NormalizedMinSum { factor } => Box::new(
                FloodingDecoder::new(graph, params, NormalizedMinSum::new(R::from_f64(factor))?)?
                    .with_info_bits_pos(info_bits_pos)?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::bcjr::tests::{encode, llrs};
    use crate::tanner::tests::hamming_graph;
    use crate::utils;

    #[test]
    fn test_build_bcjr_decoder() {
        let trellis = Arc::new(Trellis::from_polynomials(&[0o7, 0o5]).unwrap());
        let params = BcjrParams {
            block_len: 12,
            buffered_encoding: true,
        };
        let info_bits = utils::random_bits(12);
        let (sys_bits, par_bits) = encode(&trellis, &info_bits, true);
        let (sys, par) = (llrs(&sys_bits, 3.0), llrs(&par_bits, 3.0));
        let mut expected = vec![0.0; 12];
        BcjrDecoder::<f64, MaxLogMap>::new(trellis.clone(), params)
            .unwrap()
            .decode(&sys, &par, &mut expected);
        let mut decoder = MaxStarKind::MaxLogMAP
            .build_bcjr_decoder::<f64>(trellis.clone(), params)
            .unwrap();
        assert_eq!(decoder.block_len(), 12);
        assert_eq!(decoder.num_steps(), 14);
        let mut ext = vec![0.0; 12];
        decoder.decode(&sys, &par, &mut ext);
        assert_float_eq!(ext, expected, abs_all <= 1e-12);
        let mut ext_par = vec![0.0; 14];
        decoder.decode_siso(&sys, &par, &mut ext, &mut ext_par);
        assert_float_eq!(ext, expected, abs_all <= 1e-12);
        assert!(ext_par.iter().all(|x| x.is_finite()));
        let mut bits = vec![Bit::Zero; 12];
        decoder.decode_bits(&sys, &par, &mut bits);
        assert_eq!(bits, info_bits);
        for kind in [MaxStarKind::LogMAP, MaxStarKind::LinearLogMAP] {
            assert!(kind.build_bcjr_decoder::<f32>(trellis.clone(), params).is_ok());
        }
        let params = BcjrParams {
            block_len: 0,
            buffered_encoding: true,
        };
        assert!(MaxStarKind::LogMAP
            .build_bcjr_decoder::<f64>(trellis, params)
            .is_err());
    }

    #[test]
    fn test_build_ldpc_decoder() {
        let graph = Arc::new(hamming_graph());
        let params = LdpcParams::default();
        let llrs = [2.0, 2.0, 2.0, 2.0, -0.5, 2.0, 2.0];
        for kind in [
            UpdateRuleKind::SumProduct,
            UpdateRuleKind::MinSum,
            UpdateRuleKind::OffsetMinSum { offset: 0.25 },
            UpdateRuleKind::NormalizedMinSum { factor: 0.75 },
        ] {
            let mut decoder = kind
                .build_ldpc_decoder::<f64>(graph.clone(), params, vec![2, 4, 5, 6])
                .unwrap();
            assert_eq!(decoder.codeword_len(), 7);
            let mut bits = [Bit::One; 7];
            let output = decoder.decode_bits(&llrs, &mut bits);
            assert!(output.converged, "{kind}");
            assert_eq!(bits, [Bit::Zero; 7]);
            let mut info_bits = [Bit::One; 4];
            decoder.decode_info_bits(&llrs, &mut info_bits);
            assert_eq!(info_bits, [Bit::Zero; 4]);
        }
        assert!(UpdateRuleKind::OffsetMinSum { offset: -1.0 }
            .build_ldpc_decoder::<f64>(graph.clone(), params, Vec::new())
            .is_err());
        assert!(UpdateRuleKind::MinSum
            .build_ldpc_decoder::<f64>(graph, params, vec![7])
            .is_err());
    }
}
