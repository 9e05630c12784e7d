//! Bounded confidence scores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence score clamped to `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    /// No confidence at all.
    pub const NONE: Self = Self(0.0);

    /// Confidence reported by a degraded classification.
    pub const DEGRADED: Self = Self(0.1);

    /// Complete certainty.
    pub const CERTAIN: Self = Self(1.0);

    /// Creates a confidence score, clamping into `[0.0, 1.0]`.
    ///
    /// `NaN` maps to [`Confidence::NONE`].
    #[must_use]
    pub const fn saturating(value: f64) -> Self {
        if value.is_nan() {
            Self::NONE
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Returns the raw score.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns whether this score reaches `threshold`.
    #[must_use]
    pub const fn meets(self, threshold: f64) -> bool {
        self.0 >= threshold
    }

    /// Returns whether this score strictly exceeds `threshold`.
    #[must_use]
    pub const fn exceeds(self, threshold: f64) -> bool {
        self.0 > threshold
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
