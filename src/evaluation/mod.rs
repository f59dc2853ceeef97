//! This module implements "static" [evaluation], i.e. predicting the relative
//! value/score of given position without [`crate::search`].
//!
//! For convenience, the score is returned in centipawn units.
//!
//! [evaluation]: https://www.chessprogramming.org/Evaluation

use std::fmt::Display;
use std::ops::Neg;

pub mod material;

/// Evaluation of a position from the perspective of the side to move. A thin
/// wrapper around [i32] in centipawn (100 CP = 1 "pawn") units.
///
/// Scores are symmetric around zero: [`Score::LOSE`] is the negation of
/// [`Score::WIN`], so negating any score never overflows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score {
    value: i32,
}

impl Score {
    /// The side to move has no moves left.
    pub const LOSE: Self = Self { value: -32_000 };
    #[allow(missing_docs)]
    pub const MAX: Self = Self::WIN;
    #[allow(missing_docs)]
    pub const MIN: Self = Self::LOSE;
    /// The opponent has no moves left.
    pub const WIN: Self = Self { value: 32_000 };

    /// Centipawn value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.value
    }
}

impl Neg for Score {
    type Output = Self;

    /// Mirrors evaluation to other player's perspective.
    fn neg(self) -> Self::Output {
        Self {
            value: self.value.neg(),
        }
    }
}

impl From<i32> for Score {
    fn from(value: i32) -> Self {
        Self {
            value: value.clamp(Self::MIN.value, Self::MAX.value),
        }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cp {}", self.value)
    }
}
