use crate::distance::{epipolar_errors, score_inliers, InlierScore};
use crate::eight_point::{
    check_correspondences, denormalize_fundamental, fundamental_8point_normalized,
};
use crate::normalize::{normalize_points_2d, NormalizedPoints};
use crate::ransac::{ransac_fundamental, RansacParams};
use crate::seven_point::fundamental_7point_normalized;
use crate::types::{EstimationConfig, FundamentalError, FundamentalMethod};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Output of a fundamental matrix estimation.
#[derive(Clone, Debug)]
pub struct FundamentalSolution {
    /// Rank-2 fundamental matrix with unit Frobenius norm, `x2^T * F * x1 = 0`.
    pub fundamental: [[f64; 3]; 3],
    /// Per-correspondence inlier mask, aligned with the input points.
    pub inliers: Vec<bool>,
    /// Number of inliers.
    pub inlier_count: usize,
    /// Normalization transform of the previous image points.
    pub t1: [[f64; 3]; 3],
    /// Normalization transform of the next image points.
    pub t2: [[f64; 3]; 3],
    /// Algorithm that produced the matrix.
    pub method: FundamentalMethod,
    /// Number of RANSAC trials, `None` for the closed-form solvers.
    pub iterations: Option<usize>,
}

/// Fundamental matrix estimator over a fixed set of correspondences.
///
/// The estimator owns its point sequences and keeps the result of the last successful
/// [`FundamentalEstimator::solve`] call.
#[derive(Debug)]
pub struct FundamentalEstimator {
    pts_prev: Vec<[f64; 2]>,
    pts_next: Vec<[f64; 2]>,
    config: EstimationConfig,
    solution: Option<FundamentalSolution>,
}

impl FundamentalEstimator {
    /// Create an estimator.
    ///
    /// * `pts_prev` - The points in the previous image.
    /// * `pts_next` - The corresponding points in the next image.
    /// * `config` - The estimation parameters.
    pub fn new(pts_prev: &[[f64; 2]], pts_next: &[[f64; 2]], config: EstimationConfig) -> Self {
        Self {
            pts_prev: pts_prev.to_vec(),
            pts_next: pts_next.to_vec(),
            config,
            solution: None,
        }
    }

    /// The estimation parameters.
    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// Estimate the fundamental matrix.
    ///
    /// RANSAC samples are drawn from an RNG seeded with `config.random_seed`, or from
    /// entropy when no seed is set.
    pub fn solve(&mut self) -> Result<[[f64; 3]; 3], FundamentalError> {
        let mut rng = match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => {
                let mut tr = rand::rng();
                StdRng::from_rng(&mut tr)
            }
        };
        self.solve_with_rng(&mut rng)
    }

    /// Estimate the fundamental matrix drawing RANSAC samples from `rng`.
    pub fn solve_with_rng<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<[[f64; 3]; 3], FundamentalError> {
        self.solution = None;
        self.config.validate()?;

        let method = self.config.method;
        check_correspondences(
            &self.pts_prev,
            &self.pts_next,
            method.min_correspondences(),
        )?;

        log::debug!(
            "Estimating fundamental matrix with {:?} from {} correspondences",
            method,
            self.pts_prev.len()
        );

        let n1 = normalize_points_2d(&self.pts_prev)?;
        let n2 = normalize_points_2d(&self.pts_next)?;
        let threshold = self.config.inlier_threshold();

        let (fundamental, score, iterations) = match method {
            FundamentalMethod::EightPoint => {
                let f_norm = fundamental_8point_normalized(&n1.points, &n2.points)?;
                let f = denormalize_fundamental(&f_norm, &n1.transform, &n2.transform)?;
                let score = score_inliers(&f, &self.pts_prev, &self.pts_next, threshold);
                (f, score, None)
            }
            FundamentalMethod::SevenPoint => {
                let (f, score) = self.best_seven_point(&n1, &n2, threshold)?;
                (f, score, None)
            }
            FundamentalMethod::Ransac => {
                let params = RansacParams::from(&self.config);
                let res =
                    ransac_fundamental(&self.pts_prev, &self.pts_next, &n1, &n2, &params, rng)?;
                let score = InlierScore {
                    inliers: res.inliers,
                    count: res.inlier_count,
                    residual: res.score,
                };
                (res.model, score, Some(res.iterations))
            }
        };

        log::debug!(
            "Fundamental matrix estimated with {}/{} inliers",
            score.count,
            self.pts_prev.len()
        );

        self.solution = Some(FundamentalSolution {
            fundamental,
            inliers: score.inliers,
            inlier_count: score.count,
            t1: n1.transform,
            t2: n2.transform,
            method,
            iterations,
        });
        Ok(fundamental)
    }

    fn best_seven_point(
        &self,
        n1: &NormalizedPoints,
        n2: &NormalizedPoints,
        threshold: f64,
    ) -> Result<([[f64; 3]; 3], InlierScore), FundamentalError> {
        let mut best: Option<([[f64; 3]; 3], InlierScore)> = None;
        for f_norm in fundamental_7point_normalized(&n1.points, &n2.points)? {
            let f = match denormalize_fundamental(&f_norm, &n1.transform, &n2.transform) {
                Ok(f) => f,
                Err(e) => {
                    log::trace!("Seven-point candidate skipped: {e}");
                    continue;
                }
            };
            let score = score_inliers(&f, &self.pts_prev, &self.pts_next, threshold);
            if best
                .as_ref()
                .map_or(true, |(_, best_score)| score.is_better_than(best_score))
            {
                best = Some((f, score));
            }
        }
        best.ok_or_else(|| {
            FundamentalError::DegenerateConfiguration(
                "no valid seven-point candidate".to_string(),
            )
        })
    }

    /// The result of the last successful `solve()`, if any.
    pub fn solution(&self) -> Option<&FundamentalSolution> {
        self.solution.as_ref()
    }

    /// Consume the estimator and return its solution.
    pub fn into_solution(self) -> Result<FundamentalSolution, FundamentalError> {
        self.solution.ok_or(FundamentalError::NotSolved)
    }

    /// The estimated fundamental matrix.
    pub fn fundamental(&self) -> Result<&[[f64; 3]; 3], FundamentalError> {
        self.solution
            .as_ref()
            .map(|s| &s.fundamental)
            .ok_or(FundamentalError::NotSolved)
    }

    /// The inlier mask computed by `solve()`, one entry per correspondence.
    ///
    /// The closed-form solvers classify correspondences with the same noise-derived
    /// threshold as RANSAC.
    pub fn inliers(&self) -> Result<&[bool], FundamentalError> {
        self.solution
            .as_ref()
            .map(|s| s.inliers.as_slice())
            .ok_or(FundamentalError::NotSolved)
    }

    /// Distances `(err1, err2)` of every correspondence to its epipolar lines.
    pub fn errors(&self) -> Result<Vec<(f64, f64)>, FundamentalError> {
        let f = self.fundamental()?;
        Ok(self
            .pts_prev
            .iter()
            .zip(self.pts_next.iter())
            .map(|(p1, p2)| epipolar_errors(f, p1, p2))
            .collect())
    }
}

/// Find the fundamental matrix relating two sets of matched points.
///
/// * `pts_prev` - The points in the first image.
/// * `pts_next` - The corresponding points in the second image.
/// * `config` - The estimation parameters.
///
/// Example:
///
/// ```
/// use kornia_epipolar::{find_fundamental, EstimationConfig, FundamentalError, FundamentalMethod};
///
/// let x1 = vec![[0.0, 0.0]; 5];
/// let x2 = vec![[0.0, 0.0]; 5];
/// let config = EstimationConfig::new(FundamentalMethod::Ransac);
/// let res = find_fundamental(&x1, &x2, &config);
/// assert!(matches!(res, Err(FundamentalError::InsufficientPoints { .. })));
/// ```
pub fn find_fundamental(
    pts_prev: &[[f64; 2]],
    pts_next: &[[f64; 2]],
    config: &EstimationConfig,
) -> Result<FundamentalSolution, FundamentalError> {
    let mut estimator = FundamentalEstimator::new(pts_prev, pts_next, config.clone());
    estimator.solve()?;
    estimator.into_solution()
}
