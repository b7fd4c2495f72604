use crate::linalg::{dot_product3, mat33_mul_vec3, mat33_transpose_mul_vec3};

// lines whose normal is shorter than this are treated as degenerate
const MIN_LINE_NORM: f64 = 1e-12;

/// Symmetric point-to-epipolar-line distances of a correspondence.
///
/// * `f` - The fundamental matrix mapping points of the first image to lines in the second.
/// * `p1` - The point in the first image.
/// * `p2` - The corresponding point in the second image.
///
/// Returns `(err1, err2)` where `err1` is the distance of `p1` to the line `F^T * p2` and
/// `err2` is the distance of `p2` to the line `F * p1`. A degenerate line yields
/// `f64::INFINITY` for its side.
pub fn epipolar_errors(f: &[[f64; 3]; 3], p1: &[f64; 2], p2: &[f64; 2]) -> (f64, f64) {
    let x1 = [p1[0], p1[1], 1.0];
    let x2 = [p2[0], p2[1], 1.0];

    let l2 = mat33_mul_vec3(f, &x1);
    let l1 = mat33_transpose_mul_vec3(f, &x2);

    (point_line_distance(&l1, &x1), point_line_distance(&l2, &x2))
}

fn point_line_distance(line: &[f64; 3], x: &[f64; 3]) -> f64 {
    let norm = (line[0] * line[0] + line[1] * line[1]).sqrt();
    if norm < MIN_LINE_NORM {
        return f64::INFINITY;
    }
    dot_product3(line, x).abs() / norm
}

/// Inlier classification of a set of correspondences under one matrix.
#[derive(Debug, Clone)]
pub struct InlierScore {
    /// Per-correspondence inlier mask.
    pub inliers: Vec<bool>,
    /// Number of `true` entries in the mask.
    pub count: usize,
    /// Sum of the squared inlier errors (lower is better).
    pub residual: f64,
}

impl InlierScore {
    /// More inliers wins, ties go to the lower residual.
    pub fn is_better_than(&self, other: &InlierScore) -> bool {
        self.count > other.count || (self.count == other.count && self.residual < other.residual)
    }
}

/// Classify correspondences as inliers of `f`.
///
/// A correspondence is an inlier iff `max(err1, err2)^2` is below `threshold`, a squared
/// pixel distance.
pub fn score_inliers(
    f: &[[f64; 3]; 3],
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    threshold: f64,
) -> InlierScore {
    let mut inliers = vec![false; x1.len()];
    let mut count = 0usize;
    let mut residual = 0.0f64;
    for (i, (p1, p2)) in x1.iter().zip(x2.iter()).enumerate() {
        let (err1, err2) = epipolar_errors(f, p1, p2);
        let d = err1.max(err2);
        let d2 = d * d;
        if d2 < threshold {
            inliers[i] = true;
            count += 1;
            residual += d2;
        }
    }
    InlierScore {
        inliers,
        count,
        residual,
    }
}
