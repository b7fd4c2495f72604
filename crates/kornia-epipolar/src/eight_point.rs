use crate::linalg::{
    array33_to_faer_mat33, faer_mat33_to_array33, normalize_mat33_inplace, vec9_to_mat33,
};
use crate::normalize::normalize_points_2d;
use crate::types::FundamentalError;

/// Relative magnitude below which a singular value of the design matrix counts as zero.
const RANK_TOL: f64 = 1e-10;

/// Check the correspondence sets are index aligned and hold at least `required` points.
pub(crate) fn check_correspondences(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    required: usize,
) -> Result<(), FundamentalError> {
    if x1.len() != x2.len() {
        return Err(FundamentalError::MismatchedLengths(x1.len(), x2.len()));
    }
    if x1.len() < required {
        return Err(FundamentalError::InsufficientPoints {
            required,
            actual: x1.len(),
        });
    }
    Ok(())
}

/// Build the N x 9 design matrix A of the epipolar constraint `x2^T * F * x1 = 0`.
pub(crate) fn design_matrix(x1: &[[f64; 2]], x2: &[[f64; 2]]) -> faer::Mat<f64> {
    let mut a = faer::Mat::<f64>::zeros(x1.len(), 9);
    for (i, (p1, p2)) in x1.iter().zip(x2.iter()).enumerate() {
        let (x, y) = (p1[0], p1[1]);
        let (xp, yp) = (p2[0], p2[1]);
        a.write(i, 0, xp * x);
        a.write(i, 1, xp * y);
        a.write(i, 2, xp);
        a.write(i, 3, yp * x);
        a.write(i, 4, yp * y);
        a.write(i, 5, yp);
        a.write(i, 6, x);
        a.write(i, 7, y);
        a.write(i, 8, 1.0);
    }
    a
}

/// Singular values and the 9x9 right singular vectors of the design matrix.
///
/// Tall matrices go through the thin factorization so `U` stays N x 9.
pub(crate) fn design_svd(a: &faer::Mat<f64>) -> (faer::Col<f64>, faer::Mat<f64>) {
    if a.nrows() >= 9 {
        let svd = a.thin_svd();
        (svd.s_diagonal().to_owned(), svd.v().to_owned())
    } else {
        // fewer rows than unknowns: the null vectors only show up in the full V
        let svd = a.svd();
        (svd.s_diagonal().to_owned(), svd.v().to_owned())
    }
}

/// Check that the design matrix keeps at least `rank` significant singular values.
pub(crate) fn check_design_rank(
    s: faer::ColRef<'_, f64>,
    rank: usize,
) -> Result<(), FundamentalError> {
    let s_max = s.read(0);
    if !(s_max > 0.0) || s.nrows() < rank || s.read(rank - 1) < RANK_TOL * s_max {
        return Err(FundamentalError::DegenerateConfiguration(format!(
            "design matrix has rank lower than {rank}"
        )));
    }
    Ok(())
}

/// Force a 3x3 matrix to rank 2 by zeroing its smallest singular value.
pub fn enforce_rank2(f: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let svd = array33_to_faer_mat33(f).svd();
    let u = svd.u();
    let v = svd.v();
    let s = svd.s_diagonal();

    // F' = s0 * u0 * v0^T + s1 * u1 * v1^T
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = s.read(0) * u.read(i, 0) * v.read(j, 0) + s.read(1) * u.read(i, 1) * v.read(j, 1);
        }
    }
    out
}

/// Map a matrix estimated on normalized points back to pixel coordinates.
///
/// F = T2^T * F_norm * T1
pub(crate) fn denormalize_fundamental(
    f_norm: &[[f64; 3]; 3],
    t1: &[[f64; 3]; 3],
    t2: &[[f64; 3]; 3],
) -> Result<[[f64; 3]; 3], FundamentalError> {
    let t1 = array33_to_faer_mat33(t1);
    let t2 = array33_to_faer_mat33(t2);
    let f_norm = array33_to_faer_mat33(f_norm);
    let t2t = t2.transpose();
    let f_denorm = t2t * f_norm * t1;

    let mut f = faer_mat33_to_array33(f_denorm.as_ref());
    if !normalize_mat33_inplace(&mut f) {
        return Err(FundamentalError::DegenerateConfiguration(
            "estimated fundamental matrix vanished".to_string(),
        ));
    }
    Ok(f)
}

/// Estimate the fundamental matrix from already normalized correspondences.
///
/// - `x1`: normalized points in image 1 (length >= 8)
/// - `x2`: corresponding normalized points in image 2 (same length)
///
/// Returns the rank-2 matrix in the normalized frame.
pub fn fundamental_8point_normalized(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
) -> Result<[[f64; 3]; 3], FundamentalError> {
    check_correspondences(x1, x2, 8)?;

    // Solve Af = 0 via SVD: take last column of V
    let a = design_matrix(x1, x2);
    let (s, v) = design_svd(&a);
    check_design_rank(s.as_ref(), 8)?;

    let fvec = v.col(8);
    let mut f = [0.0; 9];
    for (k, val) in f.iter_mut().enumerate() {
        *val = fvec.read(k);
    }
    if f.iter().any(|v| !v.is_finite()) {
        return Err(FundamentalError::DegenerateConfiguration(
            "null vector of the design matrix is not finite".to_string(),
        ));
    }

    Ok(enforce_rank2(&vec9_to_mat33(&f)))
}

/// Estimate the fundamental matrix using the normalized 8-point algorithm.
///
/// - `x1`: points in image 1 as `&[[f64; 2]]` (length >= 8)
/// - `x2`: corresponding points in image 2 as `&[[f64; 2]]` (same length)
///
/// Returns the rank-2 matrix scaled to unit Frobenius norm, such that
/// `x2^T * F * x1 ~ 0` for every correspondence.
pub fn fundamental_8point(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
) -> Result<[[f64; 3]; 3], FundamentalError> {
    check_correspondences(x1, x2, 8)?;

    let n1 = normalize_points_2d(x1)?;
    let n2 = normalize_points_2d(x2)?;

    let f_norm = fundamental_8point_normalized(&n1.points, &n2.points)?;
    denormalize_fundamental(&f_norm, &n1.transform, &n2.transform)
}
