use crate::eight_point::{
    check_correspondences, check_design_rank, denormalize_fundamental, design_matrix, design_svd,
};
use crate::linalg::{det_mat33, normalize_mat33_inplace, vec9_to_mat33};
use crate::normalize::normalize_points_2d;
use crate::types::FundamentalError;

/// Leading coefficients below this magnitude drop the polynomial degree.
const COEFF_TOL: f64 = 1e-12;

/// Real roots of `a * x^3 + b * x^2 + c * x + d = 0`.
///
/// Falls back to the quadratic or linear equation when the leading coefficients vanish.
pub fn solve_cubic_real(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let scale = a.abs().max(b.abs()).max(c.abs()).max(d.abs());
    if scale == 0.0 {
        return Vec::new();
    }
    if a.abs() <= COEFF_TOL * scale {
        return solve_quadratic_real(b, c, d);
    }

    // depressed cubic t^3 + p * t + q = 0 with x = t - b / 3
    let (b, c, d) = (b / a, c / a, d / a);
    let shift = b / 3.0;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let disc = q * q / 4.0 + p * p * p / 27.0;

    if p.abs() < COEFF_TOL && q.abs() < COEFF_TOL {
        return vec![-shift];
    }

    if disc > 0.0 {
        let sq = disc.sqrt();
        let t = (-q / 2.0 + sq).cbrt() + (-q / 2.0 - sq).cbrt();
        vec![t - shift]
    } else {
        // three real roots, trigonometric form
        let r = 2.0 * (-p / 3.0).sqrt();
        let arg = (3.0 * q / (2.0 * p) * (-3.0 / p).sqrt()).clamp(-1.0, 1.0);
        let phi = arg.acos() / 3.0;
        (0..3)
            .map(|k| r * (phi - 2.0 * std::f64::consts::PI * k as f64 / 3.0).cos() - shift)
            .collect()
    }
}

fn solve_quadratic_real(a: f64, b: f64, c: f64) -> Vec<f64> {
    let scale = a.abs().max(b.abs()).max(c.abs());
    if scale == 0.0 {
        return Vec::new();
    }
    if a.abs() <= COEFF_TOL * scale {
        if b.abs() <= COEFF_TOL * scale {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    // numerically stable form
    let sq = disc.sqrt();
    let q = -0.5 * (b + b.signum() * sq);
    if q == 0.0 {
        return vec![0.0];
    }
    vec![q / a, c / q]
}

/// Estimate fundamental matrix candidates from already normalized correspondences.
///
/// - `x1`: normalized points in image 1 (length >= 7)
/// - `x2`: corresponding normalized points in image 2 (same length)
///
/// Returns up to three rank-2 candidates in the normalized frame, each with unit
/// Frobenius norm.
pub fn fundamental_7point_normalized(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
) -> Result<Vec<[[f64; 3]; 3]>, FundamentalError> {
    check_correspondences(x1, x2, 7)?;

    let a = design_matrix(x1, x2);
    let (s, v) = design_svd(&a);
    check_design_rank(s.as_ref(), 7)?;

    // the two right singular vectors of the smallest singular values span the solutions
    let mut f1 = [0.0; 9];
    let mut f2 = [0.0; 9];
    for k in 0..9 {
        f1[k] = v.read(k, 7);
        f2[k] = v.read(k, 8);
    }
    let f1 = vec9_to_mat33(&f1);
    let f2 = vec9_to_mat33(&f2);

    // F(l) = l * F1 + (1 - l) * F2 = F2 + l * (F1 - F2)
    let pencil = |l: f64| -> [[f64; 3]; 3] {
        let mut m = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                m[i][j] = f2[i][j] + l * (f1[i][j] - f2[i][j]);
            }
        }
        m
    };

    // det F(l) is a cubic in l, interpolate it from four samples
    let d0 = det_mat33(&pencil(0.0));
    let d1 = det_mat33(&pencil(1.0));
    let dm1 = det_mat33(&pencil(-1.0));
    let d2 = det_mat33(&pencil(2.0));
    let c2 = (d1 + dm1) / 2.0 - d0;
    let odd = (d1 - dm1) / 2.0;
    let c3 = (d2 - 4.0 * c2 - d0 - 2.0 * odd) / 6.0;
    let c1 = odd - c3;

    let mut candidates = Vec::with_capacity(3);
    for l in solve_cubic_real(c3, c2, c1, d0) {
        let mut f = pencil(l);
        if normalize_mat33_inplace(&mut f) {
            candidates.push(f);
        }
    }

    // a vanishing cubic term means F1 - F2 itself is singular
    let scale = c3.abs().max(c2.abs()).max(c1.abs()).max(d0.abs());
    if c3.abs() <= COEFF_TOL * scale {
        let mut f = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                f[i][j] = f1[i][j] - f2[i][j];
            }
        }
        if normalize_mat33_inplace(&mut f) {
            candidates.push(f);
        }
    }

    if candidates.is_empty() {
        return Err(FundamentalError::DegenerateConfiguration(
            "seven-point cubic has no real root".to_string(),
        ));
    }
    Ok(candidates)
}

/// Estimate fundamental matrix candidates using the 7-point algorithm.
///
/// - `x1`: points in image 1 as `&[[f64; 2]]` (length >= 7)
/// - `x2`: corresponding points in image 2 as `&[[f64; 2]]` (same length)
///
/// Returns one to three rank-2 candidates in pixel coordinates. With exactly seven
/// correspondences every candidate satisfies all of them.
pub fn fundamental_7point(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
) -> Result<Vec<[[f64; 3]; 3]>, FundamentalError> {
    check_correspondences(x1, x2, 7)?;

    let n1 = normalize_points_2d(x1)?;
    let n2 = normalize_points_2d(x2)?;

    fundamental_7point_normalized(&n1.points, &n2.points)?
        .iter()
        .map(|f| denormalize_fundamental(f, &n1.transform, &n2.transform))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::epipolar_errors;
    use crate::linalg::{dot_product3, mat33_mul_vec3};
    use crate::testing::{assert_same_up_to_scale, synthetic_scene};
    use approx::assert_abs_diff_eq;

    fn eval_cubic(a: f64, b: f64, c: f64, d: f64, x: f64) -> f64 {
        ((a * x + b) * x + c) * x + d
    }

    #[test]
    fn test_cubic_three_roots() {
        // (x - 1)(x + 2)(x - 3) = x^3 - 2x^2 - 5x + 6
        let mut roots = solve_cubic_real(1.0, -2.0, -5.0, 6.0);
        roots.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(roots.len(), 3);
        assert_abs_diff_eq!(roots[0], -2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(roots[1], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(roots[2], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_cubic_one_root() {
        // x^3 + x + 10 has a single real root at -2
        let roots = solve_cubic_real(2.0, 0.0, 2.0, 20.0);
        assert_eq!(roots.len(), 1);
        assert_abs_diff_eq!(roots[0], -2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(eval_cubic(2.0, 0.0, 2.0, 20.0, roots[0]), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cubic_degrades_to_quadratic() {
        let mut roots = solve_cubic_real(0.0, 1.0, -3.0, 2.0);
        roots.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(roots.len(), 2);
        assert_abs_diff_eq!(roots[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(roots[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fundamental_7point_minimal() -> Result<(), FundamentalError> {
        let scene = synthetic_scene(7, 3);

        let n1 = normalize_points_2d(&scene.x1)?;
        let n2 = normalize_points_2d(&scene.x2)?;
        for f in fundamental_7point_normalized(&n1.points, &n2.points)?.iter() {
            assert_abs_diff_eq!(det_mat33(f), 0.0, epsilon = 1e-10);
        }

        let candidates = fundamental_7point(&scene.x1, &scene.x2)?;
        assert!(!candidates.is_empty() && candidates.len() <= 3);
        for f in candidates.iter() {
            for (p1, p2) in scene.x1.iter().zip(scene.x2.iter()) {
                let x1 = [p1[0], p1[1], 1.0];
                let x2 = [p2[0], p2[1], 1.0];
                let residual = dot_product3(&x2, &mat33_mul_vec3(f, &x1));
                let scale = dot_product3(&x1, &x1).sqrt() * dot_product3(&x2, &x2).sqrt();
                assert!(residual.abs() < 1e-8 * scale, "residual {residual}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_fundamental_7point_contains_true_solution() -> Result<(), FundamentalError> {
        let scene = synthetic_scene(12, 4);
        let candidates = fundamental_7point(&scene.x1, &scene.x2)?;

        // with more than seven exact points only the true matrix fits all of them
        let fits_all = |f: &[[f64; 3]; 3]| {
            scene.x1.iter().zip(scene.x2.iter()).all(|(p1, p2)| {
                let (err1, err2) = epipolar_errors(f, p1, p2);
                err1.max(err2) < 1e-4
            })
        };
        let f_best = candidates.iter().find(|f| fits_all(f));
        assert!(f_best.is_some(), "no candidate fits all correspondences");
        if let Some(f) = f_best {
            assert_same_up_to_scale(f, &scene.f, 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_fundamental_7point_many_points() -> Result<(), FundamentalError> {
        let scene = synthetic_scene(3000, 21);
        let candidates = fundamental_7point(&scene.x1, &scene.x2)?;
        let f_best = candidates.iter().find(|f| {
            scene.x1.iter().zip(scene.x2.iter()).all(|(p1, p2)| {
                let (err1, err2) = epipolar_errors(f, p1, p2);
                err1.max(err2) < 1e-4
            })
        });
        assert!(f_best.is_some(), "no candidate fits all correspondences");
        Ok(())
    }

    #[test]
    fn test_fundamental_7point_insufficient() {
        let x1 = vec![[1.0, 2.0]; 6];
        let x2 = vec![[1.0, 2.0]; 6];
        assert!(matches!(
            fundamental_7point(&x1, &x2),
            Err(FundamentalError::InsufficientPoints {
                required: 7,
                actual: 6
            })
        ));
    }
}
