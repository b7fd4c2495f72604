use crate::types::FundamentalError;

/// Points rescaled into a well-conditioned frame, with the transform that produced them.
#[derive(Debug, Clone)]
pub struct NormalizedPoints {
    /// Normalized points, centroid at the origin and mean distance `sqrt(2)` from it.
    pub points: Vec<[f64; 2]>,
    /// Similarity transform `T` mapping raw homogeneous points to normalized ones.
    pub transform: [[f64; 3]; 3],
}

/// Normalize points with an isotropic similarity transform.
///
/// Translates the centroid to the origin and scales uniformly so the mean distance to
/// the origin is `sqrt(2)`.
///
/// * `points` - The raw 2d points in pixel coordinates.
///
/// Returns an error if the slice is empty or if all points coincide.
pub fn normalize_points_2d(points: &[[f64; 2]]) -> Result<NormalizedPoints, FundamentalError> {
    let n = points.len();
    if n == 0 {
        return Err(FundamentalError::InsufficientPoints {
            required: 1,
            actual: 0,
        });
    }

    let (mut mx, mut my) = (0.0, 0.0);
    for p in points {
        mx += p[0];
        my += p[1];
    }
    mx /= n as f64;
    my /= n as f64;

    let mut mean_dist = 0.0;
    for p in points {
        let dx = p[0] - mx;
        let dy = p[1] - my;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n as f64;

    if !(mean_dist > f64::EPSILON * (1.0 + mx.abs().max(my.abs()))) {
        return Err(FundamentalError::DegenerateConfiguration(
            "all points coincide, normalization scale is undefined".to_string(),
        ));
    }
    let scale = std::f64::consts::SQRT_2 / mean_dist;

    let normalized = points
        .iter()
        .map(|p| [(p[0] - mx) * scale, (p[1] - my) * scale])
        .collect();

    // T = [[s, 0, -s*mx], [0, s, -s*my], [0, 0, 1]]
    let transform = [
        [scale, 0.0, -scale * mx],
        [0.0, scale, -scale * my],
        [0.0, 0.0, 1.0],
    ];

    Ok(NormalizedPoints {
        points: normalized,
        transform,
    })
}
