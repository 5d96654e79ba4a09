//! Check-node update rules for LDPC belief propagation
//!
//! A check node of degree `d` receives `d` variable-to-check messages and emits, on each of its
//! edges, a message computed from the *other* `d - 1` incoming messages. The rules provided here
//! are:
//!
//! - [`SumProduct`]: exact rule, `2 * atanh(prod tanh(v_j / 2))`, evaluated in the log domain.
//! - [`MinSum`]: product of signs times minimum magnitude.
//! - [`OffsetMinSum`]: min-sum with magnitudes reduced by a fixed offset (floored at zero).
//! - [`NormalizedMinSum`]: min-sum with magnitudes scaled by a fixed factor.
//!
//! A degree-1 check node has no other edges to combine and always emits `0`.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::maxstar::{LogMap, MaxStar};
use crate::{Error, Real};

/// Check-node update rule
pub trait UpdateRule<R: Real>: Clone + Debug + Send + Sync {
    /// Prepares the rule for check nodes of degree up to `max_degree`.
    ///
    /// Called once when a decoder is built; rules needing scratch space allocate it here.
    fn reserve(&mut self, _max_degree: usize) {}

    /// Computes the outgoing messages of one check node.
    ///
    /// `outgoing[i]` is computed from all entries of `incoming` except `incoming[i]`. Both slices
    /// have the length of the check node degree, which is at least `1`.
    fn check_to_var(&mut self, incoming: &[R], outgoing: &mut [R]);
}

/// Sum-product (tanh) rule
///
/// Incoming messages are combined pairwise with the box-plus operator in the log domain, which
/// stays exact for messages of any magnitude.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SumProduct<R: Real> {
    /// Saturated incoming messages
    values: Vec<R>,
    /// `prefix[i]` is the box-plus of `values[0 ..= i]`
    prefix: Vec<R>,
}

impl<R: Real> SumProduct<R> {
    /// Returns sum-product rule.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            prefix: Vec::new(),
        }
    }
}

impl<R: Real> UpdateRule<R> for SumProduct<R> {
    fn reserve(&mut self, max_degree: usize) {
        self.values.reserve(max_degree);
        self.prefix.reserve(max_degree);
    }

    fn check_to_var(&mut self, incoming: &[R], outgoing: &mut [R]) {
        let degree = incoming.len();
        if degree == 1 {
            outgoing[0] = R::zero();
            return;
        }
        self.values.clear();
        self.values.extend(incoming.iter().map(|&v| v.saturate()));
        self.prefix.clear();
        let mut acc = self.values[0];
        self.prefix.push(acc);
        for &v in &self.values[1 .. degree - 1] {
            acc = box_plus(acc, v);
            self.prefix.push(acc);
        }
        // Walk backwards, combining each prefix with the running suffix
        let mut suffix = self.values[degree - 1];
        outgoing[degree - 1] = self.prefix[degree - 2];
        for i in (1 .. degree - 1).rev() {
            outgoing[i] = box_plus(self.prefix[i - 1], suffix);
            suffix = box_plus(suffix, self.values[i]);
        }
        outgoing[0] = suffix;
    }
}

/// Returns `2 * atanh(tanh(a / 2) * tanh(b / 2))` for finite `a` and `b`.
fn box_plus<R: Real>(a: R, b: R) -> R {
    let magnitude = a.abs().min(b.abs());
    let signed = if (a < R::zero()) ^ (b < R::zero()) {
        -magnitude
    } else {
        magnitude
    };
    signed + LogMap::correction((a + b).abs()) - LogMap::correction((a - b).abs())
}

/// Min-sum rule
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct MinSum;

impl<R: Real> UpdateRule<R> for MinSum {
    fn check_to_var(&mut self, incoming: &[R], outgoing: &mut [R]) {
        min_sum(incoming, outgoing, |magnitude| magnitude);
    }
}

/// Offset min-sum rule
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OffsetMinSum<R: Real> {
    offset: R,
}

impl<R: Real> OffsetMinSum<R> {
    /// Returns offset min-sum rule.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is negative or not finite.
    pub fn new(offset: R) -> Result<Self, Error> {
        if !offset.is_finite() || offset < R::zero() {
            return Err(Error::InvalidInput(format!(
                "Min-sum offset must be nonnegative and finite (found {offset:?})"
            )));
        }
        Ok(Self { offset })
    }
}

impl<R: Real> UpdateRule<R> for OffsetMinSum<R> {
    fn check_to_var(&mut self, incoming: &[R], outgoing: &mut [R]) {
        let offset = self.offset;
        min_sum(incoming, outgoing, |magnitude| {
            (magnitude - offset).max(R::zero())
        });
    }
}

/// Normalized min-sum rule
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedMinSum<R: Real> {
    factor: R,
}

impl<R: Real> NormalizedMinSum<R> {
    /// Returns normalized min-sum rule.
    ///
    /// # Errors
    ///
    /// Returns an error if `factor` is not in `(0, 1]`.
    pub fn new(factor: R) -> Result<Self, Error> {
        if !(factor > R::zero() && factor <= R::one()) {
            return Err(Error::InvalidInput(format!(
                "Min-sum normalization factor must be in (0, 1] (found {factor:?})"
            )));
        }
        Ok(Self { factor })
    }
}

impl<R: Real> UpdateRule<R> for NormalizedMinSum<R> {
    fn check_to_var(&mut self, incoming: &[R], outgoing: &mut [R]) {
        let factor = self.factor;
        min_sum(incoming, outgoing, |magnitude| magnitude * factor);
    }
}

/// Writes min-sum check-to-variable messages, applying `shape` to each outgoing magnitude.
fn min_sum<R: Real>(incoming: &[R], outgoing: &mut [R], shape: impl Fn(R) -> R) {
    if incoming.len() == 1 {
        outgoing[0] = R::zero();
        return;
    }
    let mut min1 = R::infinity();
    let mut min2 = R::infinity();
    let mut min1_pos = 0;
    let mut negative = false;
    for (pos, &v) in incoming.iter().enumerate() {
        let magnitude = v.abs();
        if magnitude < min1 {
            min2 = min1;
            min1 = magnitude;
            min1_pos = pos;
        } else if magnitude < min2 {
            min2 = magnitude;
        }
        negative ^= v < R::zero();
    }
    for (pos, (out, &v)) in outgoing.iter_mut().zip(incoming).enumerate() {
        let magnitude = shape(if pos == min1_pos { min2 } else { min1 }).saturate();
        *out = if negative ^ (v < R::zero()) {
            -magnitude
        } else {
            magnitude
        };
    }
}

/// Runtime selection of a check-node update rule (used in configuration files)
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum UpdateRuleKind {
    /// [`SumProduct`]
    SumProduct,
    /// [`MinSum`]
    MinSum,
    /// [`OffsetMinSum`] with given offset
    OffsetMinSum {
        /// Offset subtracted from each magnitude
        offset: f64,
    },
    /// [`NormalizedMinSum`] with given factor
    NormalizedMinSum {
        /// Factor applied to each magnitude
        factor: f64,
    },
}

impl UpdateRuleKind {
    /// Checks the parameters of the rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the offset or normalization factor is out of range.
    pub fn check(self) -> Result<(), Error> {
        match self {
            UpdateRuleKind::SumProduct | UpdateRuleKind::MinSum => Ok(()),
            UpdateRuleKind::OffsetMinSum { offset } => OffsetMinSum::new(offset).map(|_| ()),
            UpdateRuleKind::NormalizedMinSum { factor } => {
                NormalizedMinSum::new(factor).map(|_| ())
            }
        }
    }
}

impl std::fmt::Display for UpdateRuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateRuleKind::SumProduct => write!(f, "SPA"),
            UpdateRuleKind::MinSum => write!(f, "MS"),
            UpdateRuleKind::OffsetMinSum { offset } => write!(f, "OMS({offset})"),
            UpdateRuleKind::NormalizedMinSum { factor } => write!(f, "NMS({factor})"),
        }
    }
}
