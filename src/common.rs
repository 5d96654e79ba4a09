//! Types needed in multiple modules

use serde::{Deserialize, Serialize};

/// Enumeration of binary symbol values
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum Bit {
    /// Binary symbol `0`
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

impl Bit {
    /// Returns bit corresponding to given index (`0` maps to `Zero`, anything else to `One`).
    #[must_use]
    pub fn from_index(bit_index: usize) -> Self {
        match bit_index {
            0 => Bit::Zero,
            _ => Bit::One,
        }
    }

    /// Returns index of the bit (`0` or `1`).
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::ops::BitXor for Bit {
    type Output = Bit;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Bit::from_index(self.index() ^ rhs.index())
    }
}

/// Hard-decision output type
///
/// Decoders write hard decisions through this trait, so that callers can choose the integer
/// width of their bit buffers.
pub trait HardBit: Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Returns the representation of the given bit.
    fn from_bit(bit: Bit) -> Self;
}

impl HardBit for Bit {
    fn from_bit(bit: Bit) -> Self {
        bit
    }
}

macro_rules! impl_hard_bit {
    ($($t:ty),+) => {
        $(
            impl HardBit for $t {
                fn from_bit(bit: Bit) -> Self {
                    match bit {
                        Bit::Zero => 0,
                        Bit::One => 1,
                    }
                }
            }
        )+
    };
}

impl_hard_bit!(u8, i8, i16, i32, i64);

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
}
