use argh::FromArgs;
use rand::Rng;

use kornia_epipolar as kepi;

#[derive(FromArgs)]
/// Estimate the fundamental matrix of a synthetic two-view scene
struct Args {
    /// number of correspondences
    #[argh(option, default = "200")]
    num_points: usize,

    /// fraction of correspondences turned into outliers
    #[argh(option, default = "0.25")]
    outlier_ratio: f64,

    /// pixel noise level, also passed to the estimator as sigma
    #[argh(option, default = "0.5")]
    sigma: f64,

    /// estimation method: seven, eight or ransac
    #[argh(option, default = "String::from(\"ransac\")")]
    method: String,

    /// fixed number of RANSAC iterations, adaptive when omitted
    #[argh(option)]
    iterations: Option<usize>,

    /// random seed for the RANSAC sampler
    #[argh(option)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let method = match args.method.as_str() {
        "seven" => kepi::FundamentalMethod::SevenPoint,
        "eight" => kepi::FundamentalMethod::EightPoint,
        "ransac" => kepi::FundamentalMethod::Ransac,
        other => return Err(format!("unknown method: {other}").into()),
    };

    // Camera intrinsics (pinhole, fx=fy=800, cx=640, cy=480)
    let k = [[800.0, 0.0, 640.0], [0.0, 800.0, 480.0], [0.0, 0.0, 1.0]];

    // Ground-truth relative pose: small rotation about Y + sideways translation
    let yaw = 8.0_f64.to_radians();
    let (cy, sy) = (yaw.cos(), yaw.sin());
    let gt_r = [[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]];
    let gt_t = [-1.0, 0.1, 0.2];

    let mut rng = rand::rng();
    let mut pts_prev = Vec::with_capacity(args.num_points);
    let mut pts_next = Vec::with_capacity(args.num_points);
    let mut is_outlier = Vec::with_capacity(args.num_points);
    for _ in 0..args.num_points {
        let p = [
            rng.random_range(-3.0..3.0),
            rng.random_range(-2.0..2.0),
            rng.random_range(5.0..15.0),
        ];
        let x_c = gt_r[0][0] * p[0] + gt_r[0][1] * p[1] + gt_r[0][2] * p[2] + gt_t[0];
        let y_c = gt_r[1][0] * p[0] + gt_r[1][1] * p[1] + gt_r[1][2] * p[2] + gt_t[1];
        let z_c = gt_r[2][0] * p[0] + gt_r[2][1] * p[1] + gt_r[2][2] * p[2] + gt_t[2];

        let noise = |rng: &mut rand::rngs::ThreadRng| rng.random_range(-1.0..1.0) * args.sigma;
        let u1 = k[0][0] * p[0] / p[2] + k[0][2] + noise(&mut rng);
        let v1 = k[1][1] * p[1] / p[2] + k[1][2] + noise(&mut rng);
        let mut u2 = k[0][0] * x_c / z_c + k[0][2] + noise(&mut rng);
        let mut v2 = k[1][1] * y_c / z_c + k[1][2] + noise(&mut rng);

        let outlier = rng.random::<f64>() < args.outlier_ratio;
        if outlier {
            u2 += rng.random_range(-100.0..100.0);
            v2 += rng.random_range(30.0..120.0) * if rng.random::<bool>() { 1.0 } else { -1.0 };
        }
        pts_prev.push([u1, v1]);
        pts_next.push([u2, v2]);
        is_outlier.push(outlier);
    }

    let config = kepi::EstimationConfig {
        method,
        sigma: args.sigma,
        iterations: args.iterations,
        random_seed: args.seed,
        ..Default::default()
    };
    log::info!("Config: {:?}", config);

    let mut estimator = kepi::FundamentalEstimator::new(&pts_prev, &pts_next, config);
    let f = estimator.solve()?;
    println!("Fundamental matrix:");
    for row in f.iter() {
        println!("  [{:+.6e}, {:+.6e}, {:+.6e}]", row[0], row[1], row[2]);
    }

    let inliers = estimator.inliers()?;
    let num_inliers = inliers.iter().filter(|&&b| b).count();
    let true_positives = inliers
        .iter()
        .zip(is_outlier.iter())
        .filter(|&(&inlier, &outlier)| inlier && !outlier)
        .count();
    let num_true = is_outlier.iter().filter(|&&o| !o).count();
    println!("Inliers: {}/{}", num_inliers, pts_prev.len());
    println!("Recovered true inliers: {}/{}", true_positives, num_true);

    if let Some(iterations) = estimator.solution().and_then(|s| s.iterations) {
        println!("RANSAC iterations: {iterations}");
    }

    let errors = estimator.errors()?;
    let mean_err = errors
        .iter()
        .zip(inliers.iter())
        .filter(|&(_, &inlier)| inlier)
        .map(|((e1, e2), _)| 0.5 * (e1 + e2))
        .sum::<f64>()
        / num_inliers.max(1) as f64;
    println!("Mean inlier epipolar error: {mean_err:.4} px");

    Ok(())
}
