//! Trellis of a rate-1/2 recursive convolutional code

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Bit, Error};

/// Largest supported memory length
const MAX_MEMORY_LEN: usize = 16;

/// Single state transition in a trellis
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Transition {
    /// State before the transition
    pub state: usize,
    /// Input bit labeling the transition
    pub input: Bit,
    /// State after the transition
    pub next_state: usize,
    /// Systematic output bit
    pub systematic: Bit,
    /// Parity output bit
    pub parity: Bit,
}

impl Transition {
    /// Returns index of the (systematic, parity) output label, in `[0, 4)`.
    pub(crate) fn label(&self) -> usize {
        2 * self.systematic.index() + self.parity.index()
    }
}

/// Trellis of a code with `2^m` states and one input bit per time step
///
/// Transitions are deterministic: there is exactly one transition for every (state, input bit)
/// pair. The trellis is immutable once built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Trellis {
    /// Memory length `m`
    memory_len: usize,
    /// Number of states `2^m`
    num_states: usize,
    /// All transitions, transition `2 * state + input` being the one from `state` for `input`
    transitions: Vec<Transition>,
    /// Input bit driving each state one step closer to state `0` (if state `0` is reachable)
    termination_inputs: Vec<Option<Bit>>,
}

impl Trellis {
    /// Returns trellis with given memory length and transitions.
    ///
    /// # Parameters
    ///
    /// - `memory_len`: Memory length `m` of the encoder, in `[1, 16]`. The trellis has `2^m`
    ///   states.
    ///
    /// - `transitions`: Transition table. Must contain exactly one transition for every (state,
    ///   input bit) pair, in any order.
    ///
    /// # Errors
    ///
    /// Returns an error if `memory_len` is out of range, if the number of transitions is not
    /// `2^(m+1)`, if any state index is out of range, or if some (state, input bit) pair does not
    /// have exactly one transition.
    ///
    /// # Examples
    ///
    /// ```
    /// use softdec::trellis::{Transition, Trellis};
    /// use softdec::Bit::{One, Zero};
    ///
    /// // Accumulator: next state is the XOR of state and input, parity equals the next state
    /// let transitions = [
    ///     Transition { state: 0, input: Zero, next_state: 0, systematic: Zero, parity: Zero },
    ///     Transition { state: 0, input: One, next_state: 1, systematic: One, parity: One },
    ///     Transition { state: 1, input: Zero, next_state: 1, systematic: Zero, parity: One },
    ///     Transition { state: 1, input: One, next_state: 0, systematic: One, parity: Zero },
    /// ];
    /// let trellis = Trellis::new(1, &transitions)?;
    /// assert_eq!(trellis.num_states(), 2);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(memory_len: usize, transitions: &[Transition]) -> Result<Self, Error> {
        if memory_len == 0 || memory_len > MAX_MEMORY_LEN {
            return Err(Error::InvalidInput(format!(
                "Memory length must be in the range [1, {MAX_MEMORY_LEN}] (found {memory_len})"
            )));
        }
        let num_states = 1 << memory_len;
        if transitions.len() != 2 * num_states {
            return Err(Error::InvalidInput(format!(
                "Expected {} transitions for {} states (found {})",
                2 * num_states,
                num_states,
                transitions.len()
            )));
        }
        let mut table: Vec<Option<Transition>> = vec![None; 2 * num_states];
        for tr in transitions {
            if tr.state >= num_states || tr.next_state >= num_states {
                return Err(Error::InvalidInput(format!(
                    "State index out of range [0, {num_states}) in transition {tr:?}"
                )));
            }
            let slot = &mut table[2 * tr.state + tr.input.index()];
            if slot.is_some() {
                return Err(Error::InvalidInput(format!(
                    "Duplicate transition from state {} for input bit {:?}",
                    tr.state, tr.input
                )));
            }
            *slot = Some(*tr);
        }
        // Every slot is filled: the count matched and no slot was filled twice
        let transitions: Vec<Transition> = table.into_iter().flatten().collect();
        let termination_inputs = termination_inputs(num_states, &transitions);
        log::debug!("Built trellis with {num_states} states (memory length {memory_len})");
        Ok(Self {
            memory_len,
            num_states,
            transitions,
            termination_inputs,
        })
    }

    /// Returns trellis of a rate-1/2 recursive systematic convolutional (RSC) code.
    ///
    /// # Parameters
    ///
    /// - `code_polynomials`: Integer representations of the feedback and feedforward generator
    ///   polynomials, in that order. For a code of constraint length `L`, the feedback polynomial
    ///   must be in the range `(2^(L-1), 2^L)`, and the feedforward polynomial must be in the
    ///   range `[1, 2^L)` and different from the feedback polynomial.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of code polynomials is not `2`, if the feedback polynomial
    /// is either `0` or a power of `2`, or if the feedforward polynomial is either not in the
    /// range `[1, 2^L)` or equals the feedback polynomial.
    ///
    /// # Notes
    ///
    /// Let `b_{n,0}`, `b_{n,1}`, ... , `b_{n,L-1}` be the `L`-bit binary representation of
    /// `code_polynomials[n]`, with `b_{n,0}` being the MSB. With `x_{k}` the input bit at time
    /// `k`, the feedback bit is `s_{k} = x_{k} + sum_{i=1}^{L-1} b_{0,i} * s_{k-i}` and the parity
    /// bit is `y_{k} = sum_{i=0}^{L-1} b_{1,i} * s_{k-i}`. The bits `s_{k-1}`, ... , `s_{k-L+1}`
    /// form the binary representation of the state at time `k`, with `s_{k-1}` being the MSB.
    ///
    /// # Examples
    ///
    /// ```
    /// use softdec::trellis::Trellis;
    ///
    /// let trellis = Trellis::from_polynomials(&[0o13, 0o15])?; // RSC code in LTE
    /// assert_eq!(trellis.memory_len(), 3);
    /// assert_eq!(trellis.num_states(), 8);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_polynomials(code_polynomials: &[usize]) -> Result<Self, Error> {
        if code_polynomials.len() != 2 {
            return Err(Error::InvalidInput(format!(
                "Expected exactly two code polynomials (found {})",
                code_polynomials.len()
            )));
        }
        let constraint_len = constraint_length(code_polynomials)?;
        let num_states = 1 << (constraint_len - 1);
        let (feedback_poly, feedforward_poly) = (code_polynomials[0], code_polynomials[1]);
        let mut transitions = Vec::with_capacity(2 * num_states);
        for state in 0 .. num_states {
            for bit_index in 0 .. 2 {
                let input = Bit::from_index(bit_index);
                let feedback_bit = bitxor((bit_index * num_states + state) & feedback_poly);
                let aug_state_index = feedback_bit.index() * num_states + state;
                transitions.push(Transition {
                    state,
                    input,
                    next_state: aug_state_index >> 1,
                    systematic: input,
                    parity: bitxor(aug_state_index & feedforward_poly),
                });
            }
        }
        Self::new(constraint_len - 1, &transitions)
    }

    /// Returns memory length.
    #[must_use]
    pub fn memory_len(&self) -> usize {
        self.memory_len
    }

    /// Returns number of states.
    #[must_use]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Returns all transitions, ordered by state and then by input bit.
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Returns transition from given state for given input bit.
    ///
    /// # Panics
    ///
    /// Panics if `state` is not less than the number of states.
    #[must_use]
    pub fn transition(&self, state: usize, input: Bit) -> &Transition {
        &self.transitions[2 * state + input.index()]
    }

    /// Returns input bit that drives the encoder from given state one step closer to state `0`,
    /// or `None` if state `0` is unreachable from it.
    ///
    /// # Panics
    ///
    /// Panics if `state` is not less than the number of states.
    #[must_use]
    pub fn termination_input(&self, state: usize) -> Option<Bit> {
        self.termination_inputs[state]
    }
}

/// Returns, for each state, the input bit along a shortest path to state `0`.
fn termination_inputs(num_states: usize, transitions: &[Transition]) -> Vec<Option<Bit>> {
    // Breadth-first search from state `0` over reversed transitions
    let mut dist: Vec<Option<usize>> = vec![None; num_states];
    dist[0] = Some(0);
    let mut queue = VecDeque::from([0]);
    while let Some(curr) = queue.pop_front() {
        let curr_dist = dist[curr].unwrap_or_default();
        for tr in transitions.iter().filter(|tr| tr.next_state == curr) {
            if dist[tr.state].is_none() {
                dist[tr.state] = Some(curr_dist + 1);
                queue.push_back(tr.state);
            }
        }
    }
    (0 .. num_states)
        .map(|state| {
            transitions[2 * state .. 2 * state + 2]
                .iter()
                .filter_map(|tr| dist[tr.next_state].map(|d| (d, tr.input)))
                .min_by_key(|&(d, input)| (d, input.index()))
                .map(|(_, input)| input)
        })
        .collect()
}

/// Returns constraint length corresponding to given code polynomials.
fn constraint_length(code_polynomials: &[usize]) -> Result<usize, Error> {
    let feedback_poly = code_polynomials[0];
    if feedback_poly == 0 || feedback_poly & (feedback_poly - 1) == 0 {
        return Err(Error::InvalidInput(
            "Feedback polynomial cannot be 0 or a power of 2".to_string(),
        ));
    }
    // OK to cast `u32` to `usize`: Numbers involved will always be small enough.
    let constraint_len = (usize::BITS - feedback_poly.leading_zeros()) as usize;
    let two_pow_constraint_len = 1 << constraint_len;
    if code_polynomials[1 ..]
        .iter()
        .any(|&x| x == 0 || x == feedback_poly || x >= two_pow_constraint_len)
    {
        return Err(Error::InvalidInput(format!(
            "For constraint length of {constraint_len}, each feedforward polynomial \
            must be in the range [1, {two_pow_constraint_len}), and cannot equal the \
            feedback polynomial {feedback_poly}",
        )));
    }
    Ok(constraint_len)
}

/// Returns XOR of bits in the binary representation of given integer.
fn bitxor(num: usize) -> Bit {
    match num.count_ones() % 2 {
        0 => Bit::Zero,
        _ => Bit::One,
    }
}


#[cfg(test)]
mod tests_of_functions {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_constraint_length() {
        assert!(constraint_length(&[0o0, 0o15]).is_err());
        assert!(constraint_length(&[0o20, 0o15]).is_err());
        assert!(constraint_length(&[0o13, 0o0]).is_err());
        assert!(constraint_length(&[0o13, 0o20]).is_err());
        assert!(constraint_length(&[0o13, 0o13]).is_err());
        assert_eq!(constraint_length(&[0o11, 0o15]).unwrap(), 4);
        assert_eq!(constraint_length(&[0o13, 0o15]).unwrap(), 4);
        assert_eq!(constraint_length(&[0o7, 0o5]).unwrap(), 3);
    }

    #[test]
    fn test_bitxor() {
        assert_eq!(bitxor(0x0), Zero);
        assert_eq!(bitxor(0x1), One);
        assert_eq!(bitxor(0x3), Zero);
        assert_eq!(bitxor(0x7), One);
        assert_eq!(bitxor(0xB), One);
        assert_eq!(bitxor(0xF), Zero);
    }

    #[test]
    fn test_label() {
        let tr = Transition {
            state: 0,
            input: One,
            next_state: 1,
            systematic: One,
            parity: Zero,
        };
        assert_eq!(tr.label(), 2);
    }
}
