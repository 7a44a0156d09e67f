//! Scoring weight vectors.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Tolerance used when checking that a weight vector sums to one.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Floor applied to learned dimensions so that none collapses to exactly zero.
pub const WEIGHT_FLOOR: f64 = 1e-3;

/// Relative importance of the four scoring criteria.
///
/// A vector handed to the decision engine must have non-negative, finite
/// components summing to 1.0; [`WeightVector::validate`] enforces that and
/// [`WeightVector::normalized`] restores it after any derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub effort: f64,
    pub risk: f64,
    pub alignment: f64,
    pub confidence: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            effort: 0.3,
            risk: 0.3,
            alignment: 0.3,
            confidence: 0.1,
        }
    }
}

impl WeightVector {
    pub const fn new(effort: f64, risk: f64, alignment: f64, confidence: f64) -> Self {
        Self {
            effort,
            risk,
            alignment,
            confidence,
        }
    }

    pub const fn uniform() -> Self {
        Self::new(0.25, 0.25, 0.25, 0.25)
    }

    pub const fn to_array(self) -> [f64; 4] {
        [self.effort, self.risk, self.alignment, self.confidence]
    }

    pub const fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn sum(&self) -> f64 {
        self.to_array().iter().sum()
    }

    /// Apply `f` to every dimension.
    #[must_use]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        let [e, r, a, c] = self.to_array();
        Self::new(f(e), f(r), f(a), f(c))
    }

    /// Combine two vectors dimension by dimension.
    #[must_use]
    pub fn zip_with(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let lhs = self.to_array();
        let rhs = other.to_array();
        Self::from_array([
            f(lhs[0], rhs[0]),
            f(lhs[1], rhs[1]),
            f(lhs[2], rhs[2]),
            f(lhs[3], rhs[3]),
        ])
    }

    /// Rescale so the dimensions sum to 1.0.
    ///
    /// Negative and non-finite components are treated as zero. A vector with
    /// nothing left to scale becomes [`WeightVector::uniform`].
    #[must_use]
    pub fn normalized(self) -> Self {
        self.normalized_with_floor(0.0)
    }

    /// Rescale so the dimensions sum to 1.0, first raising every component to at least `floor`.
    #[must_use]
    pub fn normalized_with_floor(self, floor: f64) -> Self {
        let floored = self.map(|v| if v.is_finite() { v.max(floor) } else { floor });
        let total = floored.sum();
        if total <= 0.0 || !total.is_finite() {
            return Self::uniform();
        }
        floored.map(|v| v / total)
    }

    /// Linear blend: `self * ratio + other * (1 - ratio)`, renormalized.
    #[must_use]
    pub fn blend(self, other: Self, ratio: f64) -> Self {
        let ratio = ratio.clamp(0.0, 1.0);
        self.zip_with(other, |a, b| a.mul_add(ratio, b * (1.0 - ratio)))
            .normalized()
    }

    /// Check the invariant required before scoring.
    pub fn validate(&self, epsilon: f64) -> DomainResult<()> {
        if let Some(bad) = self.to_array().iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(DomainError::InvalidWeights(format!(
                "weights must be finite and non-negative, found {bad}"
            )));
        }
        let total = self.sum();
        if (total - 1.0).abs() > epsilon {
            return Err(DomainError::InvalidWeights(format!(
                "weights must sum to 1.0, found {total:.6}"
            )));
        }
        Ok(())
    }

    /// Arithmetic mean of each dimension, or `None` for an empty input.
    pub fn mean<'a>(vectors: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        let mut count = 0usize;
        let mut acc = Self::new(0.0, 0.0, 0.0, 0.0);
        for v in vectors {
            acc = acc.zip_with(*v, |a, b| a + b);
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(acc.map(|v| v / n))
    }
}
