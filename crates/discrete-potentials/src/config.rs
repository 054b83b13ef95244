//! Configuration of the algebra façade.

use serde::{Deserialize, Serialize};

use crate::error::{PotentialError, Result};

/// Default tolerance under which two maxima are considered tied.
pub const DEFAULT_TIE_TOLERANCE: f64 = 1e-5;

/// Default minimum number of output cells before the fused operators go parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Settings threaded through every operation of `PotentialOperations`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgebraConfig {
    /// Maximum difference between two values that still counts as a tie in max-out
    pub tie_tolerance: f64,
    /// Whether the fused operators may run on the rayon pool
    pub parallel: bool,
    /// Output size from which parallel execution kicks in
    pub parallel_threshold: usize,
}

impl Default for AlgebraConfig {
    fn default() -> Self {
        Self {
            tie_tolerance: DEFAULT_TIE_TOLERANCE,
            parallel: false,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl AlgebraConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tie_tolerance(mut self, tolerance: f64) -> Self {
        self.tie_tolerance = tolerance;
        self
    }

    /// Enable or disable parallel fused operators.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Whether an output of `cells` cells should be computed in parallel.
    pub fn runs_parallel(&self, cells: usize) -> bool {
        self.parallel && cells >= self.parallel_threshold
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tie_tolerance.is_finite() || self.tie_tolerance < 0.0 {
            return Err(PotentialError::InvalidConfig(format!(
                "tie tolerance must be finite and non-negative, got {}",
                self.tie_tolerance
            )));
        }
        if self.parallel_threshold == 0 {
            return Err(PotentialError::InvalidConfig(
                "parallel threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AlgebraConfig::default();
        assert_eq!(config.tie_tolerance, 1e-5);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
        assert!(!config.runs_parallel(1_000_000));
    }

    #[test]
    fn test_builder_and_threshold() {
        let config = AlgebraConfig::new()
            .with_parallelism(true)
            .with_parallel_threshold(100);
        assert!(config.runs_parallel(100));
        assert!(!config.runs_parallel(99));
    }

    #[test]
    fn test_invalid_values() {
        assert!(AlgebraConfig::new().with_tie_tolerance(-1.0).validate().is_err());
        assert!(AlgebraConfig::new()
            .with_tie_tolerance(f64::NAN)
            .validate()
            .is_err());
        assert!(matches!(
            AlgebraConfig::new().with_parallel_threshold(0).validate(),
            Err(PotentialError::InvalidConfig(_))
        ));
    }
}
