//! Common data types shared across the fundamental matrix solvers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for fundamental matrix estimation.
#[derive(Debug, Error)]
pub enum FundamentalError {
    /// Fewer correspondences than the selected algorithm requires.
    #[error("Need at least {required} correspondences, got {actual}")]
    InsufficientPoints {
        /// Minimum number of correspondences required by the algorithm.
        required: usize,
        /// Actual number of correspondences provided.
        actual: usize,
    },

    /// The two point sequences are not index aligned.
    #[error("Mismatched correspondence lengths: previous points ({0}) != next points ({1})")]
    MismatchedLengths(usize, usize),

    /// Normalization or solving cannot proceed on this input.
    #[error("Degenerate configuration: {0}")]
    DegenerateConfiguration(String),

    /// RANSAC never found a candidate supported by enough inliers.
    #[error("RANSAC found no consensus: best candidate has {inliers} inliers, {required} required")]
    NoConsensus {
        /// Inlier count of the best candidate seen.
        inliers: usize,
        /// Minimum inlier count for acceptance.
        required: usize,
    },

    /// The estimation parameters are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The estimation result was queried before `solve()` succeeded.
    #[error("The estimator has not been solved yet")]
    NotSolved,
}

/// Algorithm used to estimate the fundamental matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundamentalMethod {
    /// Minimal 7-point solver, picks the best of up to three real solutions.
    SevenPoint,
    /// Normalized 8-point linear solver over all correspondences.
    EightPoint,
    /// RANSAC over minimal 8-point samples.
    Ransac,
}

impl FundamentalMethod {
    /// Minimum number of correspondences accepted by the method.
    pub fn min_correspondences(&self) -> usize {
        match self {
            FundamentalMethod::SevenPoint => 7,
            FundamentalMethod::EightPoint | FundamentalMethod::Ransac => 8,
        }
    }
}

/// Parameters of a fundamental matrix estimation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Algorithm to run.
    pub method: FundamentalMethod,
    /// Standard deviation of the Gaussian pixel noise.
    pub sigma: f64,
    /// Fixed number of RANSAC trials, `None` adapts the count to the inlier ratio.
    ///
    /// With a fixed count and `refine` off, the inlier count of a seeded run never
    /// decreases as `sigma` grows. The adaptive count depends on the inlier ratio, so a
    /// larger `sigma` may stop the search earlier and the count is not monotonic then.
    pub iterations: Option<usize>,
    /// Desired probability that at least one sample is outlier free.
    pub confidence: f64,
    /// Upper bound on the adaptive trial count.
    pub max_iterations: usize,
    /// Multiplier of `sigma²` bounding the squared epipolar distance of an inlier.
    ///
    /// The default `3.84` is the 95% quantile of the chi-square distribution with one
    /// degree of freedom.
    pub chi_square_threshold: f64,
    /// Refit the RANSAC model on all of its inliers.
    pub refine: bool,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            method: FundamentalMethod::EightPoint,
            sigma: 1.0,
            iterations: None,
            confidence: 0.99,
            max_iterations: 2000,
            chi_square_threshold: 3.84,
            refine: true,
            random_seed: Some(0),
        }
    }
}

impl EstimationConfig {
    /// Create a configuration for the given method with default parameters.
    pub fn new(method: FundamentalMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Squared pixel distance below which a correspondence counts as an inlier.
    pub fn inlier_threshold(&self) -> f64 {
        self.chi_square_threshold * self.sigma * self.sigma
    }

    /// Check that all parameters are in range.
    pub fn validate(&self) -> Result<(), FundamentalError> {
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return Err(FundamentalError::InvalidConfig(format!(
                "sigma must be positive, got {}",
                self.sigma
            )));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(FundamentalError::InvalidConfig(format!(
                "confidence must be in (0, 1), got {}",
                self.confidence
            )));
        }
        if self.iterations == Some(0) {
            return Err(FundamentalError::InvalidConfig(
                "fixed iteration count must be positive".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(FundamentalError::InvalidConfig(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.chi_square_threshold > 0.0) {
            return Err(FundamentalError::InvalidConfig(format!(
                "chi_square_threshold must be positive, got {}",
                self.chi_square_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_correspondences() {
        assert_eq!(FundamentalMethod::SevenPoint.min_correspondences(), 7);
        assert_eq!(FundamentalMethod::EightPoint.min_correspondences(), 8);
        assert_eq!(FundamentalMethod::Ransac.min_correspondences(), 8);
    }

    #[test]
    fn test_config_default_is_valid() -> Result<(), FundamentalError> {
        let config = EstimationConfig::default();
        config.validate()?;
        assert_eq!(config.iterations, None);
        assert!((config.inlier_threshold() - 3.84).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let bad = [
            EstimationConfig {
                sigma: 0.0,
                ..Default::default()
            },
            EstimationConfig {
                confidence: 1.0,
                ..Default::default()
            },
            EstimationConfig {
                iterations: Some(0),
                ..Default::default()
            },
            EstimationConfig {
                max_iterations: 0,
                ..Default::default()
            },
            EstimationConfig {
                chi_square_threshold: -1.0,
                ..Default::default()
            },
        ];
        for config in bad.iter() {
            assert!(matches!(
                config.validate(),
                Err(FundamentalError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_config_deserialize_partial() -> Result<(), serde_json::Error> {
        let config: EstimationConfig =
            serde_json::from_str(r#"{ "method": "Ransac", "sigma": 0.5, "iterations": 300 }"#)?;
        assert_eq!(config.method, FundamentalMethod::Ransac);
        assert_eq!(config.iterations, Some(300));
        assert_eq!(config.max_iterations, 2000);
        assert_eq!(config.random_seed, Some(0));
        assert!((config.inlier_threshold() - 3.84 * 0.25).abs() < 1e-12);
        Ok(())
    }
}
