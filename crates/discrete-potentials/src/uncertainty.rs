//! Second-order uncertainty annotations attached to table cells.
//!
//! The algebra never computes with these; it only carries them along when a
//! table is reordered or projected, so that the cell an annotation describes
//! keeps its annotation.

use serde::{Deserialize, Serialize};

/// Distribution describing the uncertainty about one table value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UncertainDistribution {
    Exact(f64),
    Beta { alpha: f64, beta: f64 },
    /// Dirichlet parameter of this cell within its block
    Dirichlet { alpha: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Normal { mean: f64, std_dev: f64 },
    Range { min: f64, max: f64 },
}

/// Uncertainty annotation of a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertainValue {
    pub name: Option<String>,
    pub distribution: UncertainDistribution,
}

impl UncertainValue {
    pub fn new(distribution: UncertainDistribution) -> Self {
        Self {
            name: None,
            distribution,
        }
    }

    pub fn named(name: impl Into<String>, distribution: UncertainDistribution) -> Self {
        Self {
            name: Some(name.into()),
            distribution,
        }
    }

    /// Mean of the distribution.
    ///
    /// Dirichlet cells report their raw parameter; the mean depends on the
    /// other cells of the block.
    pub fn mean(&self) -> f64 {
        match self.distribution {
            UncertainDistribution::Exact(v) => v,
            UncertainDistribution::Beta { alpha, beta } => alpha / (alpha + beta),
            UncertainDistribution::Dirichlet { alpha } => alpha,
            UncertainDistribution::Triangular { min, mode, max } => (min + mode + max) / 3.0,
            UncertainDistribution::Normal { mean, .. } => mean,
            UncertainDistribution::Range { min, max } => (min + max) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_means() {
        let beta = UncertainValue::new(UncertainDistribution::Beta {
            alpha: 2.0,
            beta: 6.0,
        });
        assert_abs_diff_eq!(beta.mean(), 0.25, epsilon = 1e-12);

        let tri = UncertainValue::named(
            "cost",
            UncertainDistribution::Triangular {
                min: 0.0,
                mode: 1.0,
                max: 2.0,
            },
        );
        assert_abs_diff_eq!(tri.mean(), 1.0, epsilon = 1e-12);
        assert_eq!(tri.name.as_deref(), Some("cost"));
    }
}
