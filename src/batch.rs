//! Decoding of many independent frames in parallel
//!
//! Frames are laid out back to back in flat buffers. Each rayon worker decodes its share of the
//! frames with its own clone of the given decoder, so no decoder state is shared between threads.
//!
//! # Examples
//!
//! ```
//! use softdec::batch;
//! use softdec::bcjr::{BcjrDecoder, BcjrParams};
//! use softdec::maxstar::MaxLogMap;
//! use softdec::trellis::Trellis;
//!
//! let trellis = Trellis::from_polynomials(&[0o13, 0o15])?;
//! let params = BcjrParams { block_len: 8, buffered_encoding: true };
//! let decoder = BcjrDecoder::<f32, MaxLogMap>::new(trellis, params)?;
//! let num_frames = 5;
//! let sys = vec![1.0; num_frames * decoder.num_steps()];
//! let par = vec![1.0; num_frames * decoder.num_steps()];
//! let mut ext = vec![0.0; num_frames * decoder.block_len()];
//! assert_eq!(batch::bcjr_decode_frames(&decoder, &sys, &par, &mut ext), num_frames);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use rayon::prelude::*;

use crate::bcjr::BcjrDecoder;
use crate::ldpc::{DecoderOutput, FloodingDecoder};
use crate::maxstar::MaxStar;
use crate::update_rule::UpdateRule;
use crate::Real;

/// Writes extrinsic LLR values for consecutive frames, and returns the number of frames.
///
/// # Parameters
///
/// - `decoder`: Decoder to be cloned for each worker.
///
/// - `sys`: Systematic LLR values of all frames, [`BcjrDecoder::num_steps`] per frame.
///
/// - `par`: Parity LLR values of all frames, [`BcjrDecoder::num_steps`] per frame.
///
/// - `ext`: Buffer for the extrinsic LLR values of all frames, [`BcjrDecoder::block_len`] per frame.
///
/// # Panics
///
/// Panics if the buffer lengths do not correspond to the same whole number of frames.
pub fn bcjr_decode_frames<R: Real, M: MaxStar>(
    decoder: &BcjrDecoder<R, M>,
    sys: &[R],
    par: &[R],
    ext: &mut [R],
) -> usize {
    let num_steps = decoder.num_steps();
    let block_len = decoder.block_len();
    assert_eq!(
        sys.len() % num_steps,
        0,
        "Number of systematic LLR values must be a multiple of {num_steps}"
    );
    let num_frames = sys.len() / num_steps;
    assert_eq!(par.len(), sys.len(), "Wrong number of parity LLR values");
    assert_eq!(
        ext.len(),
        num_frames * block_len,
        "Wrong number of extrinsic LLR values"
    );
    ext.par_chunks_mut(block_len)
        .zip(sys.par_chunks(num_steps))
        .zip(par.par_chunks(num_steps))
        .for_each_init(
            || decoder.clone(),
            |worker, ((ext_frame, sys_frame), par_frame)| {
                worker.decode(sys_frame, par_frame, ext_frame);
            },
        );
    log::debug!("Decoded {num_frames} BCJR frames");
    num_frames
}

/// Writes posterior LLR values for consecutive frames, and returns the outcome for each frame.
///
/// # Parameters
///
/// - `decoder`: Decoder to be cloned for each worker.
///
/// - `llrs`: Channel LLR values of all frames, `N` per frame.
///
/// - `posterior`: Buffer for the posterior LLR values of all frames, `N` per frame.
///
/// # Panics
///
/// Panics if the buffer lengths differ or are not a multiple of `N`.
pub fn ldpc_decode_frames<R: Real, U: UpdateRule<R>>(
    decoder: &FloodingDecoder<R, U>,
    llrs: &[R],
    posterior: &mut [R],
) -> Vec<DecoderOutput> {
    let frame_len = decoder.graph().num_vars();
    assert_eq!(
        llrs.len() % frame_len,
        0,
        "Number of channel LLR values must be a multiple of {frame_len}"
    );
    assert_eq!(
        posterior.len(),
        llrs.len(),
        "Wrong number of posterior LLR values"
    );
    let outputs: Vec<DecoderOutput> = llrs
        .par_chunks(frame_len)
        .zip(posterior.par_chunks_mut(frame_len))
        .map_init(
            || decoder.clone(),
            |worker, (llrs_frame, posterior_frame)| worker.decode(llrs_frame, posterior_frame),
        )
        .collect();
    log::debug!(
        "Decoded {} LDPC frames, {} converged",
        outputs.len(),
        outputs.iter().filter(|out| out.converged).count()
    );
    outputs
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bcjr::tests::{encode, noisy_llrs};
    use crate::bcjr::BcjrParams;
    use crate::ldpc::LdpcParams;
    use crate::maxstar::LogMap;
    use crate::tanner::tests::hamming_graph;
    use crate::trellis::Trellis;
    use crate::update_rule::SumProduct;
    use crate::{utils, Bit};

    #[test]
    fn test_bcjr_frames_match_sequential_decoding() {
        let trellis = Arc::new(Trellis::from_polynomials(&[0o13, 0o15]).unwrap());
        let params = BcjrParams {
            block_len: 40,
            buffered_encoding: true,
        };
        let mut decoder = BcjrDecoder::<f64, LogMap>::new(trellis.clone(), params).unwrap();
        let num_frames = 9;
        let mut sys = Vec::new();
        let mut par = Vec::new();
        for _ in 0 .. num_frames {
            let (sys_bits, par_bits) = encode(&trellis, &utils::random_bits(40), true);
            sys.extend(noisy_llrs(&sys_bits, 0.8));
            par.extend(noisy_llrs(&par_bits, 0.8));
        }
        let mut ext = vec![0.0; num_frames * 40];
        assert_eq!(bcjr_decode_frames(&decoder, &sys, &par, &mut ext), num_frames);
        let num_steps = decoder.num_steps();
        let mut ext_frame = vec![0.0; 40];
        for frame in 0 .. num_frames {
            let steps = frame * num_steps .. (frame + 1) * num_steps;
            decoder.decode(&sys[steps.clone()], &par[steps], &mut ext_frame);
            assert_eq!(ext_frame, ext[frame * 40 .. (frame + 1) * 40]);
        }
    }

    #[test]
    fn test_ldpc_frames_match_sequential_decoding() {
        let params = LdpcParams {
            n_ite: 20,
            enable_syndrome: true,
            syndrome_depth: 2,
        };
        let mut decoder =
            FloodingDecoder::new(Arc::new(hamming_graph()), params, SumProduct::new()).unwrap();
        let num_frames = 16;
        let llrs = noisy_llrs(&vec![Bit::Zero; num_frames * 7], 0.7);
        let mut posterior = vec![0.0; num_frames * 7];
        let outputs = ldpc_decode_frames(&decoder, &llrs, &mut posterior);
        assert_eq!(outputs.len(), num_frames);
        let mut posterior_frame = [0.0; 7];
        for (frame, output) in outputs.iter().enumerate() {
            let range = frame * 7 .. (frame + 1) * 7;
            assert_eq!(decoder.decode(&llrs[range.clone()], &mut posterior_frame), *output);
            assert_eq!(posterior_frame, posterior[range]);
        }
    }

    #[test]
    #[should_panic(expected = "Wrong number of extrinsic LLR values")]
    fn test_bcjr_frames_wrong_len() {
        let trellis = Trellis::from_polynomials(&[0o7, 0o5]).unwrap();
        let params = BcjrParams {
            block_len: 4,
            buffered_encoding: false,
        };
        let decoder = BcjrDecoder::<f64, LogMap>::new(trellis, params).unwrap();
        let mut ext = [0.0; 7];
        bcjr_decode_frames(&decoder, &[0.0; 8], &[0.0; 8], &mut ext);
    }
}
