//! This crate implements the soft-decision decoding core of a forward-error-correction (FEC)
//! simulator. It provides a soft-input/soft-output BCJR decoder for rate-1/2 trellis codes, which
//! returns extrinsic log-likelihood-ratio (LLR) values and can serve as the constituent decoder of
//! a turbo decoder, and a belief-propagation decoder with flooding schedule for low-density
//! parity-check (LDPC) codes, which stops early once all parity checks are satisfied. Both rely
//! on the max-star (Jacobian logarithm) operator in one of its exact or approximate forms.
//!
//! All LLR values follow the convention `log(P(bit = 0) / P(bit = 1))`, so that positive values
//! favor [`Bit::Zero`]. The decoders are generic over the real type ([`f32`] or [`f64`]) used for
//! metrics and messages, and over the integer type used for hard decisions.
//!
//! The [`pam`] module maps bits to symbols and computes channel LLR values, the [`batch`] module
//! decodes many frames in parallel, and the [`config`] and [`factory`] modules build decoders from
//! runtime selections.

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

pub mod batch;
pub mod bcjr;
mod common;
pub mod config;
pub mod factory;
pub mod ldpc;
pub mod maxstar;
pub mod pam;
mod real;
pub mod tanner;
pub mod trellis;
pub mod update_rule;
pub mod utils;

pub use common::{Bit, Error, HardBit};
pub use real::Real;
