//! Soft-input/soft-output BCJR decoder for a rate-1/2 trellis code
//!
//! The decoder runs the forward-backward recursion of the BCJR algorithm in the log domain, with
//! the max-star operator chosen through the [`MaxStar`] type parameter. For each block of `K`
//! information bits, it takes systematic and parity LLR values (with the a priori information
//! already added to the systematic values) and returns the extrinsic LLR values.
//!
//! All metrics live in buffers allocated once at construction and overwritten by every call; their
//! contents are undefined between calls.
//!
//! # Examples
//!
//! ```
//! use softdec::bcjr::{BcjrDecoder, BcjrParams};
//! use softdec::maxstar::LogMap;
//! use softdec::trellis::Trellis;
//!
//! let trellis = Trellis::from_polynomials(&[0o7, 0o5])?;
//! let params = BcjrParams { block_len: 4, buffered_encoding: true };
//! let mut decoder = BcjrDecoder::<f64, LogMap>::new(trellis, params)?;
//! // 4 information bits and 2 tail bits, all observed as `Zero`
//! let sys = [2.0; 6];
//! let par = [2.0; 6];
//! let mut ext = [0.0; 4];
//! decoder.decode(&sys, &par, &mut ext);
//! assert!(ext.iter().all(|&x| x > 0.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::maxstar::MaxStar;
use crate::trellis::{Transition, Trellis};
use crate::{utils, Bit, Error, HardBit, Real};

/// Number of (systematic, parity) output labels per time step
const NUM_LABELS: usize = 4;

/// Parameters for BCJR decoder
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct BcjrParams {
    /// Number of information bits `K` per block
    pub block_len: usize,
    /// Whether the encoder is terminated in state `0` with `m` tail bits whose LLR values follow
    /// those of the information bits
    pub buffered_encoding: bool,
}

impl BcjrParams {
    /// Checks validity of parameters.
    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.block_len == 0 {
            return Err(Error::InvalidInput(
                "Block length of BCJR decoder must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// BCJR decoder
#[derive(Clone, Debug)]
pub struct BcjrDecoder<R: Real, M: MaxStar> {
    /// Trellis of the code
    trellis: Arc<Trellis>,
    /// Decoder parameters
    params: BcjrParams,
    /// Branch metrics for all time steps, `NUM_LABELS` per step
    gamma: Vec<R>,
    /// Forward metrics for all time step boundaries, `num_states` per boundary
    alpha: Vec<R>,
    /// Backward metrics for all time step boundaries, `num_states` per boundary
    beta: Vec<R>,
    /// Backward metrics at the current and next time step boundaries (fused backward pass)
    beta_rows: Vec<R>,
    /// Buffers for deinterleaved systematic and parity LLR values
    sys_buf: Vec<R>,
    par_buf: Vec<R>,
    /// Buffer for extrinsic LLR values
    ext_buf: Vec<R>,
    _max_star: PhantomData<M>,
}

impl<R: Real, M: MaxStar> BcjrDecoder<R, M> {
    /// Returns BCJR decoder for given trellis and parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `params.block_len` is `0`, or if `params.buffered_encoding` is set and
    /// state `0` cannot be reached from some state of the trellis.
    pub fn new(trellis: impl Into<Arc<Trellis>>, params: BcjrParams) -> Result<Self, Error> {
        let trellis = trellis.into();
        params.check()?;
        if params.buffered_encoding
            && (0 .. trellis.num_states()).any(|s| trellis.termination_input(s).is_none())
        {
            return Err(Error::InvalidInput(
                "Buffered encoding requires a trellis that can be terminated in state 0"
                    .to_string(),
            ));
        }
        let num_states = trellis.num_states();
        let tail_len = if params.buffered_encoding {
            trellis.memory_len()
        } else {
            0
        };
        let num_steps = params.block_len + tail_len;
        log::debug!(
            "BCJR decoder: {num_states} states, {} information bits, {tail_len} tail bits",
            params.block_len
        );
        Ok(Self {
            trellis,
            params,
            gamma: vec![R::zero(); num_steps * NUM_LABELS],
            alpha: vec![R::zero(); (num_steps + 1) * num_states],
            beta: vec![R::zero(); (num_steps + 1) * num_states],
            beta_rows: vec![R::zero(); 2 * num_states],
            sys_buf: vec![R::zero(); num_steps],
            par_buf: vec![R::zero(); num_steps],
            ext_buf: vec![R::zero(); params.block_len],
            _max_star: PhantomData,
        })
    }

    /// Returns trellis of the code.
    #[must_use]
    pub fn trellis(&self) -> &Trellis {
        &self.trellis
    }

    /// Returns number of information bits per block.
    #[must_use]
    pub fn block_len(&self) -> usize {
        self.params.block_len
    }

    /// Returns number of tail bits per block (`0` unless buffered encoding is used).
    #[must_use]
    pub fn tail_len(&self) -> usize {
        if self.params.buffered_encoding {
            self.trellis.memory_len()
        } else {
            0
        }
    }

    /// Returns number of trellis steps per block (information bits plus tail bits).
    #[must_use]
    pub fn num_steps(&self) -> usize {
        self.params.block_len + self.tail_len()
    }

    /// Writes extrinsic LLR values for the information bits.
    ///
    /// # Parameters
    ///
    /// - `sys`: LLR values for the systematic bits (channel plus a priori information), one per
    ///   trellis step.
    ///
    /// - `par`: LLR values for the parity bits, one per trellis step.
    ///
    /// - `ext`: Buffer for the extrinsic LLR values of the `K` information bits.
    ///
    /// # Panics
    ///
    /// Panics if `sys.len()` or `par.len()` differs from [`Self::num_steps`], or if `ext.len()`
    /// differs from [`Self::block_len`].
    pub fn decode(&mut self, sys: &[R], par: &[R], ext: &mut [R]) {
        self.check_lengths(sys, par, ext);
        self.compute_gamma(sys, par);
        self.compute_alpha();
        self.compute_beta();
        self.compute_ext(sys, ext);
        log::trace!("BCJR decoded block of {} steps", self.num_steps());
    }

    /// Same as [`Self::decode`], but with a single backward sweep that computes the backward
    /// metrics and the extrinsic LLR values together. The output is identical.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Self::decode`].
    pub fn decode_fused(&mut self, sys: &[R], par: &[R], ext: &mut [R]) {
        self.check_lengths(sys, par, ext);
        self.compute_gamma(sys, par);
        self.compute_alpha();
        self.compute_beta_ext(sys, ext);
        log::trace!("BCJR decoded block of {} steps (fused)", self.num_steps());
    }

    /// Same as [`Self::decode`], additionally writing extrinsic LLR values for the parity bits.
    ///
    /// # Parameters
    ///
    /// - `sys`: LLR values for the systematic bits, one per trellis step.
    ///
    /// - `par`: LLR values for the parity bits, one per trellis step.
    ///
    /// - `ext_sys`: Buffer for the extrinsic LLR values of the `K` information bits.
    ///
    /// - `ext_par`: Buffer for the extrinsic LLR values of the parity bits, one per trellis step.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Self::decode`], or if `ext_par.len()` differs from
    /// [`Self::num_steps`].
    pub fn decode_siso(&mut self, sys: &[R], par: &[R], ext_sys: &mut [R], ext_par: &mut [R]) {
        self.check_lengths(sys, par, ext_sys);
        assert_eq!(
            ext_par.len(),
            self.num_steps(),
            "Wrong number of parity extrinsic LLR values (expected {})",
            self.num_steps()
        );
        self.compute_gamma(sys, par);
        self.compute_alpha();
        self.compute_beta();
        self.compute_ext(sys, ext_sys);
        self.compute_ext_par(par, ext_par);
        log::trace!("BCJR decoded block of {} steps (SISO)", self.num_steps());
    }

    /// Same as [`Self::decode`], with systematic and parity LLR values interleaved.
    ///
    /// # Parameters
    ///
    /// - `y_n1`: LLR values `[sys_0, par_0, sys_1, par_1, ...]`, two per trellis step.
    ///
    /// - `y_n2`: Buffer for the extrinsic LLR values of the `K` information bits.
    ///
    /// # Panics
    ///
    /// Panics if `y_n1.len()` is not twice [`Self::num_steps`], or if `y_n2.len()` differs from
    /// [`Self::block_len`].
    pub fn decode_interleaved(&mut self, y_n1: &[R], y_n2: &mut [R]) {
        assert_eq!(
            y_n1.len(),
            2 * self.num_steps(),
            "Wrong number of interleaved LLR values"
        );
        let mut sys = std::mem::take(&mut self.sys_buf);
        let mut par = std::mem::take(&mut self.par_buf);
        for ((chunk, s), p) in y_n1.chunks_exact(2).zip(sys.iter_mut()).zip(par.iter_mut()) {
            *s = chunk[0];
            *p = chunk[1];
        }
        self.decode(&sys, &par, y_n2);
        self.sys_buf = sys;
        self.par_buf = par;
    }

    /// Writes decisions on the information bits, based on their a posteriori LLR values.
    ///
    /// # Parameters
    ///
    /// - `sys`: LLR values for the systematic bits, one per trellis step.
    ///
    /// - `par`: LLR values for the parity bits, one per trellis step.
    ///
    /// - `bits`: Buffer for the decisions on the `K` information bits.
    ///
    /// # Panics
    ///
    /// Panics if `sys.len()` or `par.len()` differs from [`Self::num_steps`], or if `bits.len()`
    /// differs from [`Self::block_len`].
    pub fn decode_bits<B: HardBit>(&mut self, sys: &[R], par: &[R], bits: &mut [B]) {
        assert_eq!(bits.len(), self.block_len(), "Wrong number of bit decisions");
        let mut ext = std::mem::take(&mut self.ext_buf);
        self.decode(sys, par, &mut ext);
        for ((b, &e), &s) in bits.iter_mut().zip(&ext).zip(sys) {
            *b = B::from_bit(utils::hard_decision(s.saturate() + e));
        }
        self.ext_buf = ext;
    }

    /// Computes branch metrics for all time steps.
    ///
    /// For a transition with systematic bit `u` and parity bit `p`, the branch metric at time `t`
    /// is `(s(u) * sys[t] + s(p) * par[t]) / 2`, where `s(Zero) = 1` and `s(One) = -1`.
    pub fn compute_gamma(&mut self, sys: &[R], par: &[R]) {
        let half = R::from_f64(0.5);
        for ((gamma_t, &s), &p) in self
            .gamma
            .chunks_exact_mut(NUM_LABELS)
            .zip(sys)
            .zip(par)
        {
            let (s, p) = (half * s.saturate(), half * p.saturate());
            gamma_t[0] = s + p;
            gamma_t[1] = s - p;
            gamma_t[2] = -s + p;
            gamma_t[3] = -s - p;
        }
    }

    /// Computes forward metrics for all time step boundaries, starting from state `0`.
    ///
    /// Must follow [`Self::compute_gamma`].
    pub fn compute_alpha(&mut self) {
        let num_states = self.trellis.num_states();
        init_known_state(&mut self.alpha[.. num_states]);
        for (t, gamma_t) in self.gamma.chunks_exact(NUM_LABELS).enumerate() {
            let (done, rest) = self.alpha.split_at_mut((t + 1) * num_states);
            let alpha_t = &done[t * num_states ..];
            let alpha_next = &mut rest[.. num_states];
            alpha_next.fill(R::neg_infinity());
            for tr in self.trellis.transitions() {
                alpha_next[tr.next_state] = M::max_star(
                    alpha_next[tr.next_state],
                    alpha_t[tr.state] + gamma_t[tr.label()],
                );
            }
            recenter(alpha_next);
        }
    }

    /// Computes backward metrics for all time step boundaries, ending in state `0` with buffered
    /// encoding and in any state otherwise.
    ///
    /// Must follow [`Self::compute_gamma`].
    pub fn compute_beta(&mut self) {
        let num_states = self.trellis.num_states();
        let num_steps = self.num_steps();
        self.init_last_beta_values(num_steps * num_states);
        for (t, gamma_t) in self.gamma.chunks_exact(NUM_LABELS).enumerate().rev() {
            let (head, done) = self.beta.split_at_mut((t + 1) * num_states);
            let beta_t = &mut head[t * num_states ..];
            let beta_next = &done[.. num_states];
            update_previous_beta_values::<R, M>(&self.trellis, gamma_t, beta_next, beta_t);
        }
    }

    /// Writes extrinsic LLR values for the information bits.
    ///
    /// Must follow [`Self::compute_alpha`] and [`Self::compute_beta`].
    pub fn compute_ext(&self, sys: &[R], ext: &mut [R]) {
        let num_states = self.trellis.num_states();
        for (t, (e, &s)) in ext.iter_mut().zip(sys).enumerate() {
            *e = extrinsic_llr::<R, M>(
                &self.trellis,
                &self.gamma[t * NUM_LABELS .. (t + 1) * NUM_LABELS],
                &self.alpha[t * num_states .. (t + 1) * num_states],
                &self.beta[(t + 1) * num_states .. (t + 2) * num_states],
                |tr| tr.input,
                s,
            );
        }
    }

    /// Writes extrinsic LLR values for the parity bits of all trellis steps, tail steps included.
    ///
    /// Must follow [`Self::compute_alpha`] and [`Self::compute_beta`].
    pub fn compute_ext_par(&self, par: &[R], ext_par: &mut [R]) {
        let num_states = self.trellis.num_states();
        for (t, (e, &p)) in ext_par.iter_mut().zip(par).enumerate() {
            *e = extrinsic_llr::<R, M>(
                &self.trellis,
                &self.gamma[t * NUM_LABELS .. (t + 1) * NUM_LABELS],
                &self.alpha[t * num_states .. (t + 1) * num_states],
                &self.beta[(t + 1) * num_states .. (t + 2) * num_states],
                |tr| tr.parity,
                p,
            );
        }
    }

    /// Computes backward metrics and writes extrinsic LLR values in a single backward sweep,
    /// keeping backward metrics for only two time step boundaries.
    ///
    /// Must follow [`Self::compute_alpha`].
    pub fn compute_beta_ext(&mut self, sys: &[R], ext: &mut [R]) {
        let num_states = self.trellis.num_states();
        let block_len = self.block_len();
        let (mut beta_t, mut beta_next) = self.beta_rows.split_at_mut(num_states);
        if self.params.buffered_encoding {
            init_known_state(beta_next);
        } else {
            beta_next.fill(R::zero());
        }
        for (t, gamma_t) in self.gamma.chunks_exact(NUM_LABELS).enumerate().rev() {
            if t < block_len {
                ext[t] = extrinsic_llr::<R, M>(
                    &self.trellis,
                    gamma_t,
                    &self.alpha[t * num_states .. (t + 1) * num_states],
                    beta_next,
                    |tr| tr.input,
                    sys[t],
                );
            }
            update_previous_beta_values::<R, M>(&self.trellis, gamma_t, beta_next, beta_t);
            std::mem::swap(&mut beta_t, &mut beta_next);
        }
    }

    /// Initializes backward metrics at the last time step boundary, which starts at given index.
    fn init_last_beta_values(&mut self, start: usize) {
        let beta_last = &mut self.beta[start ..];
        if self.params.buffered_encoding {
            init_known_state(beta_last);
        } else {
            beta_last.fill(R::zero());
        }
    }

    /// Checks lengths of decoder inputs and output.
    fn check_lengths(&self, sys: &[R], par: &[R], ext: &[R]) {
        let num_steps = self.num_steps();
        assert_eq!(
            sys.len(),
            num_steps,
            "Wrong number of systematic LLR values (expected {num_steps})"
        );
        assert_eq!(
            par.len(),
            num_steps,
            "Wrong number of parity LLR values (expected {num_steps})"
        );
        assert_eq!(
            ext.len(),
            self.block_len(),
            "Wrong number of extrinsic LLR values (expected {})",
            self.block_len()
        );
    }
}

/// Initializes metrics so that state `0` is certain.
fn init_known_state<R: Real>(metrics: &mut [R]) {
    metrics.fill(R::neg_infinity());
    metrics[0] = R::zero();
}

/// Subtracts the largest finite metric from all metrics.
fn recenter<R: Real>(metrics: &mut [R]) {
    let max_val = metrics
        .iter()
        .fold(R::neg_infinity(), |acc, &x| acc.max(x));
    if max_val.is_finite() {
        metrics.iter_mut().for_each(|x| *x = *x - max_val);
    }
}

/// Computes backward metrics at a time step boundary from those at the next boundary.
fn update_previous_beta_values<R: Real, M: MaxStar>(
    trellis: &Trellis,
    gamma_t: &[R],
    beta_next: &[R],
    beta_t: &mut [R],
) {
    beta_t.fill(R::neg_infinity());
    for tr in trellis.transitions() {
        beta_t[tr.state] = M::max_star(
            beta_t[tr.state],
            gamma_t[tr.label()] + beta_next[tr.next_state],
        );
    }
    recenter(beta_t);
}

/// Returns extrinsic LLR value for the bit picked out of each transition by `bit_of`, given the
/// channel LLR value `llr` of that bit.
fn extrinsic_llr<R: Real, M: MaxStar>(
    trellis: &Trellis,
    gamma_t: &[R],
    alpha_t: &[R],
    beta_next: &[R],
    bit_of: impl Fn(&Transition) -> Bit,
    llr: R,
) -> R {
    let mut metric_for_zero = R::neg_infinity();
    let mut metric_for_one = R::neg_infinity();
    for tr in trellis.transitions() {
        let cand_metric = alpha_t[tr.state] + gamma_t[tr.label()] + beta_next[tr.next_state];
        match bit_of(tr) {
            Bit::Zero => metric_for_zero = M::max_star(metric_for_zero, cand_metric),
            Bit::One => metric_for_one = M::max_star(metric_for_one, cand_metric),
        }
    }
    if !metric_for_zero.is_finite() && !metric_for_one.is_finite() {
        // No path through this step
        return R::zero();
    }
    (metric_for_zero - metric_for_one - llr.saturate()).saturate()
}
