//! Max-star (Jacobian logarithm) operators
//!
//! The max-star of `a` and `b` is `ln(exp(a) + exp(b)) = max(a, b) + ln(1 + exp(-|a - b|))`. Three
//! strategies are provided, differing only in how the correction term is evaluated:
//!
//! - [`LogMap`]: exact correction term.
//! - [`LinearLogMap`]: piecewise-linear correction term (Valenti & Sun, 2001).
//! - [`MaxLogMap`]: no correction term.
//!
//! All of them treat `-inf` as "impossible": `max_star(a, -inf) == a`, and no combination of
//! finite or infinite inputs yields `NaN`.
//!
//! # Examples
//!
//! ```
//! use softdec::maxstar::{self, LogMap, MaxLogMap};
//!
//! assert_eq!(maxstar::max_star::<MaxLogMap, f64>(1.2, 1.3), 1.3);
//! assert_eq!(maxstar::max_star::<LogMap, f64>(1.5, f64::NEG_INFINITY), 1.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::Real;

/// Strategy for evaluating the max-star operator
pub trait MaxStar: Clone + Copy + std::fmt::Debug + Default + Send + Sync + 'static {
    /// Returns the correction term for a given nonnegative, finite difference `|a - b|`.
    fn correction<R: Real>(abs_diff: R) -> R;

    /// Returns the max-star of two numbers.
    fn max_star<R: Real>(a: R, b: R) -> R {
        let max_val = a.max(b);
        let abs_diff = (a - b).abs();
        if abs_diff.is_finite() {
            max_val + Self::correction(abs_diff)
        } else {
            max_val
        }
    }
}

/// Log-MAP (exact) max-star
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct LogMap;

impl MaxStar for LogMap {
    fn correction<R: Real>(abs_diff: R) -> R {
        (-abs_diff).exp().ln_1p()
    }
}

/// Max-Log-MAP (approximate) max-star
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct MaxLogMap;

impl MaxStar for MaxLogMap {
    fn correction<R: Real>(_abs_diff: R) -> R {
        R::zero()
    }
}

/// Linear-Log-MAP max-star (Valenti & Sun, 2001)
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct LinearLogMap;

impl MaxStar for LinearLogMap {
    fn correction<R: Real>(abs_diff: R) -> R {
        let thresh = R::from_f64(2.506_816_400_220_01);
        if abs_diff > thresh {
            R::zero()
        } else {
            R::from_f64(-0.249_041_818_917_1) * (abs_diff - thresh)
        }
    }
}

/// Returns the max-star of two numbers for the given strategy.
#[must_use]
pub fn max_star<M: MaxStar, R: Real>(a: R, b: R) -> R {
    M::max_star(a, b)
}

/// Runtime selection of a max-star strategy (used in configuration files)
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum MaxStarKind {
    /// [`LogMap`]
    LogMAP,
    /// [`MaxLogMap`]
    MaxLogMAP,
    /// [`LinearLogMap`]
    LinearLogMAP,
}

impl MaxStarKind {
    /// Returns the name of the variant.
    fn name(self) -> &'static str {
        match self {
            MaxStarKind::LogMAP => "Log-MAP",
            MaxStarKind::MaxLogMAP => "Max-Log-MAP",
            MaxStarKind::LinearLogMAP => "Linear-Log-MAP",
        }
    }
}

impl std::fmt::Display for MaxStarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
