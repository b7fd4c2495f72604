#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Kornia Epipolar
//!
//! Estimation of the fundamental matrix relating two views from matched 2d points.
//!
//! ## Key Features
//!
//! - **Isotropic normalization**: every solver runs on conditioned coordinates
//! - **7-point and 8-point solvers**: closed-form estimation with rank-2 enforcement
//! - **RANSAC**: robust estimation with an adaptive trial count and a noise-derived
//!   inlier threshold
//! - **Symmetric epipolar errors**: point-to-line distances in both images
//!
//! ## Example: Robust estimation
//!
//! ```rust
//! use kornia_epipolar::{EstimationConfig, FundamentalEstimator, FundamentalMethod};
//!
//! // points in the previous and next images, index aligned
//! let pts_prev: Vec<[f64; 2]> = vec![
//!     [100.0, 120.0], [340.0, 80.0], [220.0, 400.0], [510.0, 300.0], [60.0, 260.0],
//!     [400.0, 420.0], [300.0, 200.0], [150.0, 330.0], [450.0, 150.0], [250.0, 50.0],
//! ];
//! // rectified stereo pair: points move along the image rows by their disparity
//! let disparity = [12.0, 30.0, 7.5, 21.0, 16.0, 9.0, 26.0, 14.0, 19.0, 11.0];
//! let pts_next: Vec<[f64; 2]> = pts_prev
//!     .iter()
//!     .zip(disparity.iter())
//!     .map(|(p, d)| [p[0] - d, p[1]])
//!     .collect();
//!
//! let config = EstimationConfig {
//!     method: FundamentalMethod::Ransac,
//!     sigma: 1.0,
//!     iterations: None,
//!     ..Default::default()
//! };
//!
//! let mut estimator = FundamentalEstimator::new(&pts_prev, &pts_next, config);
//! let f = estimator.solve()?;
//! let inliers = estimator.inliers()?;
//!
//! println!("F: {:?}", f);
//! println!("Inliers: {}/{}", inliers.iter().filter(|&&b| b).count(), inliers.len());
//! # Ok::<(), kornia_epipolar::FundamentalError>(())
//! ```

/// Symmetric point-to-epipolar-line distances.
pub mod distance;

/// Normalized 8-point solver.
pub mod eight_point;

/// Estimator dispatching between the solvers.
pub mod estimator;

/// Fixed-size linear algebra helpers.
pub mod linalg;

/// Isotropic point normalization.
pub mod normalize;

/// RANSAC-based robust estimation.
///
/// Samples minimal 8-point sets and keeps the candidate with the largest consensus.
pub mod ransac;

/// Minimal 7-point solver.
pub mod seven_point;

/// Common data types, configuration and errors.
pub mod types;

#[cfg(test)]
mod testing;

pub use distance::{epipolar_errors, score_inliers, InlierScore};
pub use eight_point::{enforce_rank2, fundamental_8point, fundamental_8point_normalized};
pub use estimator::{find_fundamental, FundamentalEstimator, FundamentalSolution};
pub use normalize::{normalize_points_2d, NormalizedPoints};
pub use ransac::{adaptive_iterations, ransac_fundamental, RansacParams, RansacResult};
pub use seven_point::{fundamental_7point, fundamental_7point_normalized, solve_cubic_real};
pub use types::{EstimationConfig, FundamentalError, FundamentalMethod};
