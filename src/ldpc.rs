//! # LDPC belief-propagation decoder with flooding schedule
//!
//! Each iteration updates all check nodes from the current variable-to-check messages, then all
//! variable nodes from the fresh check-to-variable messages. Messages live in flat, edge-indexed
//! buffers laid out in the order of [`TannerGraph`] edges, so a decoder allocates nothing per
//! frame once built.
//!
//! Decoding stops after `n_ite` iterations, or earlier if syndrome checking is enabled and the
//! hard decisions on the total beliefs satisfy every parity check for `syndrome_depth`
//! consecutive iterations.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use softdec::ldpc::{FloodingDecoder, LdpcParams};
//! use softdec::tanner::TannerGraph;
//! use softdec::update_rule::SumProduct;
//!
//! let graph = TannerGraph::new(7, &[vec![0, 2, 4, 6], vec![1, 2, 5, 6], vec![3, 4, 5, 6]])?;
//! let params = LdpcParams {
//!     n_ite: 10,
//!     enable_syndrome: true,
//!     syndrome_depth: 1,
//! };
//! let mut decoder = FloodingDecoder::new(Arc::new(graph), params, SumProduct::<f64>::new())?;
//! let llrs = [3.0, 2.5, 1.0, 4.0, -0.5, 2.0, 3.5];
//! let mut posterior = [0.0; 7];
//! let output = decoder.decode(&llrs, &mut posterior);
//! assert!(output.converged);
//! assert!(posterior.iter().all(|&x| x > 0.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::tanner::TannerGraph;
use crate::update_rule::UpdateRule;
use crate::{utils, Bit, Error, HardBit, Real};

/// Parameters of the iterative decoding
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct LdpcParams {
    /// Maximum number of iterations
    pub n_ite: usize,
    /// Whether to stop once the syndrome is zero
    pub enable_syndrome: bool,
    /// Number of consecutive zero-syndrome iterations needed to stop early
    pub syndrome_depth: usize,
}

impl LdpcParams {
    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `syndrome_depth` is `0`.
    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.syndrome_depth == 0 {
            return Err(Error::InvalidInput(
                "Syndrome depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LdpcParams {
    fn default() -> Self {
        Self {
            n_ite: 10,
            enable_syndrome: true,
            syndrome_depth: 1,
        }
    }
}

/// Outcome of decoding one frame
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DecoderOutput {
    /// Number of iterations performed
    pub iterations: usize,
    /// Whether the final hard decisions satisfy every parity check
    pub converged: bool,
}

/// Flooding belief-propagation decoder
#[derive(Clone, Debug)]
pub struct FloodingDecoder<R: Real, U: UpdateRule<R>> {
    /// Tanner graph of the code
    graph: Arc<TannerGraph>,
    /// Iteration parameters
    params: LdpcParams,
    /// Check-node update rule
    update_rule: U,
    /// Positions of the information bits in the codeword
    info_bits_pos: Vec<usize>,
    /// A priori LLR of each variable node
    prior: Vec<R>,
    /// Variable-to-check message on each edge
    var_to_check: Vec<R>,
    /// Check-to-variable message on each edge
    check_to_var: Vec<R>,
    /// Total belief of each variable node
    belief: Vec<R>,
    /// Hard decision on each total belief
    hard: Vec<Bit>,
}

impl<R: Real, U: UpdateRule<R>> FloodingDecoder<R, U> {
    /// Returns flooding decoder for given Tanner graph.
    ///
    /// # Parameters
    ///
    /// - `graph`: Tanner graph of the code (may be shared among decoders).
    ///
    /// - `params`: Iteration parameters.
    ///
    /// - `update_rule`: Check-node update rule.
    ///
    /// # Errors
    ///
    /// Returns an error if `params.syndrome_depth` is `0`.
    pub fn new(
        graph: impl Into<Arc<TannerGraph>>,
        params: LdpcParams,
        mut update_rule: U,
    ) -> Result<Self, Error> {
        params.check()?;
        let graph = graph.into();
        update_rule.reserve(graph.max_check_degree());
        let num_vars = graph.num_vars();
        let num_edges = graph.num_edges();
        log::debug!(
            "Flooding decoder: N = {num_vars}, M = {}, {num_edges} edges, {params:?}",
            graph.num_checks()
        );
        Ok(Self {
            graph,
            params,
            update_rule,
            info_bits_pos: Vec::new(),
            prior: vec![R::zero(); num_vars],
            var_to_check: vec![R::zero(); num_edges],
            check_to_var: vec![R::zero(); num_edges],
            belief: vec![R::zero(); num_vars],
            hard: vec![Bit::Zero; num_vars],
        })
    }

    /// Returns decoder with given information bit positions, used by [`Self::decode_info_bits`].
    ///
    /// # Errors
    ///
    /// Returns an error if a position is not less than the codeword length, or is repeated.
    pub fn with_info_bits_pos(mut self, info_bits_pos: Vec<usize>) -> Result<Self, Error> {
        let num_vars = self.graph.num_vars();
        if let Some(&pos) = info_bits_pos.iter().find(|&&pos| pos >= num_vars) {
            return Err(Error::InvalidInput(format!(
                "Information bit position {pos} is out of range (codeword length {num_vars})"
            )));
        }
        if let Some(pos) = info_bits_pos.iter().duplicates().next() {
            return Err(Error::InvalidInput(format!(
                "Information bit position {pos} is repeated"
            )));
        }
        self.info_bits_pos = info_bits_pos;
        Ok(self)
    }

    /// Returns Tanner graph of the code.
    #[must_use]
    pub fn graph(&self) -> &Arc<TannerGraph> {
        &self.graph
    }

    /// Returns iteration parameters.
    #[must_use]
    pub fn params(&self) -> LdpcParams {
        self.params
    }

    /// Returns positions of the information bits.
    #[must_use]
    pub fn info_bits_pos(&self) -> &[usize] {
        &self.info_bits_pos
    }

    /// Decodes one frame, writing the total belief (posterior LLR) of each variable node.
    ///
    /// # Parameters
    ///
    /// - `llrs`: Channel LLR values of the `N` codeword bits (positive values favor `Zero`).
    ///   Infinite values are saturated.
    ///
    /// - `posterior`: Buffer for the `N` posterior LLR values.
    ///
    /// # Panics
    ///
    /// Panics if either slice does not have length `N`.
    pub fn decode(&mut self, llrs: &[R], posterior: &mut [R]) -> DecoderOutput {
        assert_eq!(
            posterior.len(),
            self.graph.num_vars(),
            "Wrong number of posterior LLR values (expected {})",
            self.graph.num_vars()
        );
        let output = self.run(llrs);
        posterior.copy_from_slice(&self.belief);
        output
    }

    /// Decodes one frame, writing the hard decision on every codeword bit.
    ///
    /// # Panics
    ///
    /// Panics if either slice does not have length `N`.
    pub fn decode_bits<B: HardBit>(&mut self, llrs: &[R], bits: &mut [B]) -> DecoderOutput {
        assert_eq!(
            bits.len(),
            self.graph.num_vars(),
            "Wrong number of output bits (expected {})",
            self.graph.num_vars()
        );
        let output = self.run(llrs);
        for (out, &bit) in bits.iter_mut().zip(&self.hard) {
            *out = B::from_bit(bit);
        }
        output
    }

    /// Decodes one frame, writing the hard decisions on the information bits only.
    ///
    /// # Panics
    ///
    /// Panics if `llrs` does not have length `N`, or if `info_bits` does not have as many entries
    /// as there are information bit positions.
    pub fn decode_info_bits<B: HardBit>(
        &mut self,
        llrs: &[R],
        info_bits: &mut [B],
    ) -> DecoderOutput {
        assert_eq!(
            info_bits.len(),
            self.info_bits_pos.len(),
            "Wrong number of information bits (expected {})",
            self.info_bits_pos.len()
        );
        let output = self.run(llrs);
        for (out, &pos) in info_bits.iter_mut().zip(&self.info_bits_pos) {
            *out = B::from_bit(self.hard[pos]);
        }
        output
    }

    /// Runs the iterations, leaving the total beliefs and their hard decisions in the buffers.
    fn run(&mut self, llrs: &[R]) -> DecoderOutput {
        assert_eq!(
            llrs.len(),
            self.graph.num_vars(),
            "Wrong number of channel LLR values (expected {})",
            self.graph.num_vars()
        );
        self.init_messages(llrs);
        let mut iterations = 0;
        let mut zero_syndrome_count = 0;
        let mut converged = false;
        while iterations < self.params.n_ite {
            self.update_check_nodes();
            self.update_var_nodes();
            iterations += 1;
            if self.params.enable_syndrome {
                if self.syndrome_is_zero() {
                    zero_syndrome_count += 1;
                    log::trace!("Iteration {iterations}: zero syndrome ({zero_syndrome_count})");
                    if zero_syndrome_count >= self.params.syndrome_depth {
                        converged = true;
                        break;
                    }
                } else {
                    zero_syndrome_count = 0;
                }
            }
        }
        if !converged {
            converged = self.syndrome_is_zero();
        }
        log::debug!("Decoded frame in {iterations} iterations (converged: {converged})");
        DecoderOutput {
            iterations,
            converged,
        }
    }

    /// Loads the channel LLR values as priors and as the first variable-to-check messages.
    fn init_messages(&mut self, llrs: &[R]) {
        for (prior, belief, &llr) in itertools::izip!(&mut self.prior, &mut self.belief, llrs) {
            *prior = llr.saturate();
            *belief = *prior;
        }
        for (e, msg) in self.var_to_check.iter_mut().enumerate() {
            *msg = self.prior[self.graph.edge_var(e)];
        }
        self.check_to_var.fill(R::zero());
        for (hard, &belief) in self.hard.iter_mut().zip(&self.belief) {
            *hard = utils::hard_decision(belief);
        }
    }

    /// Computes all check-to-variable messages.
    fn update_check_nodes(&mut self) {
        for c in 0 .. self.graph.num_checks() {
            let edges = self.graph.check_edges(c);
            self.update_rule.check_to_var(
                &self.var_to_check[edges.clone()],
                &mut self.check_to_var[edges],
            );
        }
    }

    /// Computes all variable-to-check messages, total beliefs and hard decisions.
    fn update_var_nodes(&mut self) {
        for v in 0 .. self.graph.num_vars() {
            let edges = self.graph.var_edges(v);
            let prior = self.prior[v];
            // Each outgoing message excludes the incoming message on its own edge
            for &e in edges {
                let extrinsic: R = edges
                    .iter()
                    .filter(|&&other| other != e)
                    .map(|&other| self.check_to_var[other])
                    .sum();
                self.var_to_check[e] = (prior + extrinsic).saturate();
            }
            let total: R = edges.iter().map(|&e| self.check_to_var[e]).sum();
            self.belief[v] = (prior + total).saturate();
            self.hard[v] = utils::hard_decision(self.belief[v]);
        }
    }

    /// Returns whether the current hard decisions satisfy every parity check.
    fn syndrome_is_zero(&self) -> bool {
        self.graph.is_codeword(&self.hard)
    }
}
