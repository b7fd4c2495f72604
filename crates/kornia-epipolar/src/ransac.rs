//! RANSAC-based robust estimation of the fundamental matrix.

use crate::distance::{score_inliers, InlierScore};
use crate::eight_point::{
    check_correspondences, denormalize_fundamental, fundamental_8point_normalized,
};
use crate::normalize::NormalizedPoints;
use crate::types::{EstimationConfig, FundamentalError};
use rand::Rng;

/// Number of correspondences drawn per RANSAC trial.
pub const SAMPLE_SIZE: usize = 8;

/// Parameters for RANSAC over the 8-point solver.
#[derive(Debug, Clone)]
pub struct RansacParams {
    /// Fixed number of trials, `None` adapts the count to the observed inlier ratio.
    ///
    /// Only a fixed count draws the same samples for every threshold.
    pub iterations: Option<usize>,
    /// Upper bound on the adaptive trial count.
    pub max_iterations: usize,
    /// Desired probability that at least one sample set is outlier-free.
    pub confidence: f64,
    /// Inlier threshold (squared pixel distance to the epipolar lines).
    pub threshold: f64,
    /// Minimum number of inliers required for acceptance.
    pub min_inliers: usize,
    /// Whether to refit on all inliers of the best model.
    pub refine: bool,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self::from(&EstimationConfig::default())
    }
}

impl From<&EstimationConfig> for RansacParams {
    fn from(config: &EstimationConfig) -> Self {
        Self {
            iterations: config.iterations,
            max_iterations: config.max_iterations,
            confidence: config.confidence,
            threshold: config.inlier_threshold(),
            min_inliers: SAMPLE_SIZE,
            refine: config.refine,
        }
    }
}

/// Result of a RANSAC model fit.
#[derive(Clone, Debug)]
pub struct RansacResult {
    /// Estimated fundamental matrix in pixel coordinates.
    pub model: [[f64; 3]; 3],
    /// Per-point inlier mask.
    pub inliers: Vec<bool>,
    /// Total inlier count.
    pub inlier_count: usize,
    /// Sum of squared inlier errors (lower is better).
    pub score: f64,
    /// Number of trials performed.
    pub iterations: usize,
}

/// Number of trials needed to draw an outlier-free sample with the given confidence.
///
/// Evaluates `k = log(1 - confidence) / log(1 - w^s)` and clamps it to
/// `[1, max_iterations]`.
pub fn adaptive_iterations(
    inlier_ratio: f64,
    sample_size: usize,
    confidence: f64,
    max_iterations: usize,
) -> usize {
    if !(inlier_ratio > 0.0) {
        return max_iterations;
    }
    let ws = inlier_ratio.min(1.0).powi(sample_size as i32);
    if ws >= 1.0 - f64::EPSILON {
        return 1.min(max_iterations);
    }
    let denom = (1.0 - ws).ln();
    if !(denom < 0.0) {
        return max_iterations;
    }
    let k = ((1.0 - confidence).ln() / denom).ceil();
    if !k.is_finite() || k >= max_iterations as f64 {
        return max_iterations;
    }
    (k as usize).max(1)
}

/// Estimate a fundamental matrix with RANSAC using the 8-point solver.
///
/// * `x1` - The raw points in image 1, used for scoring.
/// * `x2` - The raw points in image 2, used for scoring.
/// * `n1` - The normalized points of image 1 with their transform, used for sampling.
/// * `n2` - The normalized points of image 2 with their transform, used for sampling.
/// * `params` - The RANSAC parameters.
/// * `rng` - The random source drawing the samples.
///
/// Trials whose sample is degenerate count toward the iteration budget but are not
/// scored. Fails with [`FundamentalError::NoConsensus`] when the best candidate has fewer
/// than `params.min_inliers` inliers.
pub fn ransac_fundamental<R: Rng + ?Sized>(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    n1: &NormalizedPoints,
    n2: &NormalizedPoints,
    params: &RansacParams,
    rng: &mut R,
) -> Result<RansacResult, FundamentalError> {
    check_correspondences(x1, x2, SAMPLE_SIZE)?;
    check_correspondences(&n1.points, x1, x1.len())?;
    check_correspondences(&n2.points, x2, x2.len())?;

    let n = x1.len();
    let mut best_model = None;
    let mut best_score: Option<InlierScore> = None;

    let mut iter = 0usize;
    let mut required = params.iterations.unwrap_or(params.max_iterations);
    let mut s1 = Vec::with_capacity(SAMPLE_SIZE);
    let mut s2 = Vec::with_capacity(SAMPLE_SIZE);

    while iter < required {
        iter += 1;

        let sample = rand::seq::index::sample(rng, n, SAMPLE_SIZE);
        s1.clear();
        s2.clear();
        for idx in sample.iter() {
            s1.push(n1.points[idx]);
            s2.push(n2.points[idx]);
        }

        let f = match fundamental_8point_normalized(&s1, &s2)
            .and_then(|f| denormalize_fundamental(&f, &n1.transform, &n2.transform))
        {
            Ok(f) => f,
            Err(e) => {
                log::trace!("RANSAC trial {iter} skipped: {e}");
                continue;
            }
        };

        let score = score_inliers(&f, x1, x2, params.threshold);
        if best_score.as_ref().map_or(true, |best| score.is_better_than(best)) {
            log::trace!(
                "RANSAC trial {iter}: {} inliers, residual {:.6}",
                score.count,
                score.residual
            );
            if params.iterations.is_none() {
                let w = score.count as f64 / n as f64;
                required = adaptive_iterations(
                    w,
                    SAMPLE_SIZE,
                    params.confidence,
                    params.max_iterations,
                );
            }
            best_model = Some(f);
            best_score = Some(score);
        }
    }

    let (mut model, mut score) = match (best_model, best_score) {
        (Some(m), Some(s)) => (m, s),
        _ => {
            return Err(FundamentalError::DegenerateConfiguration(format!(
                "all {iter} RANSAC samples were degenerate"
            )))
        }
    };

    if score.count < params.min_inliers {
        log::warn!(
            "RANSAC found no consensus after {iter} trials: {} inliers, {} required",
            score.count,
            params.min_inliers
        );
        return Err(FundamentalError::NoConsensus {
            inliers: score.count,
            required: params.min_inliers,
        });
    }

    if params.refine {
        if let Some((refined, refined_score)) = refit_inliers(x1, x2, n1, n2, &score, params) {
            if refined_score.is_better_than(&score) {
                log::debug!(
                    "RANSAC refit on inliers: {} -> {} inliers",
                    score.count,
                    refined_score.count
                );
                model = refined;
                score = refined_score;
            }
        }
    }

    log::debug!(
        "RANSAC finished after {iter} trials with {}/{n} inliers",
        score.count
    );

    Ok(RansacResult {
        model,
        inliers: score.inliers,
        inlier_count: score.count,
        score: score.residual,
        iterations: iter,
    })
}

fn refit_inliers(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    n1: &NormalizedPoints,
    n2: &NormalizedPoints,
    score: &InlierScore,
    params: &RansacParams,
) -> Option<([[f64; 3]; 3], InlierScore)> {
    let (s1, s2): (Vec<_>, Vec<_>) = score
        .inliers
        .iter()
        .enumerate()
        .filter(|(_, inlier)| **inlier)
        .map(|(i, _)| (n1.points[i], n2.points[i]))
        .unzip();

    let f = match fundamental_8point_normalized(&s1, &s2)
        .and_then(|f| denormalize_fundamental(&f, &n1.transform, &n2.transform))
    {
        Ok(f) => f,
        Err(e) => {
            log::debug!("RANSAC refit skipped: {e}");
            return None;
        }
    };
    let refined_score = score_inliers(&f, x1, x2, params.threshold);
    Some((f, refined_score))
}
