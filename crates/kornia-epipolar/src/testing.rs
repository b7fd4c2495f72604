//! Synthetic two-view scenes shared by the unit tests.

use crate::linalg::{frobenius_norm_mat33, mat33_mul, mat33_mul_vec3, mat33_transpose};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub(crate) struct Scene {
    pub x1: Vec<[f64; 2]>,
    pub x2: Vec<[f64; 2]>,
    pub f: [[f64; 3]; 3],
}

const K: [[f64; 3]; 3] = [[800.0, 0.0, 320.0], [0.0, 800.0, 240.0], [0.0, 0.0, 1.0]];
const K_INV: [[f64; 3]; 3] = [
    [1.0 / 800.0, 0.0, -320.0 / 800.0],
    [0.0, 1.0 / 800.0, -240.0 / 800.0],
    [0.0, 0.0, 1.0],
];

fn rotation(roll: f64, pitch: f64, yaw: f64) -> [[f64; 3]; 3] {
    let (cy, sy) = (yaw.cos(), yaw.sin());
    let (cp, sp) = (pitch.cos(), pitch.sin());
    let (cr, sr) = (roll.cos(), roll.sin());
    [
        [cy * cp, cy * sp * sr - sy * cr, cy * sp * cr + sy * sr],
        [sy * cp, sy * sp * sr + cy * cr, sy * sp * cr - cy * sr],
        [-sp, cp * sr, cp * cr],
    ]
}

fn skew(t: &[f64; 3]) -> [[f64; 3]; 3] {
    [[0.0, -t[2], t[1]], [t[2], 0.0, -t[0]], [-t[1], t[0], 0.0]]
}

fn project(p: &[f64; 3]) -> [f64; 2] {
    let uv = mat33_mul_vec3(&K, p);
    [uv[0] / uv[2], uv[1] / uv[2]]
}

/// Project `n` random points seen by two pinhole cameras, noise free.
pub(crate) fn synthetic_scene(n: usize, seed: u64) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let r = rotation(0.05, -0.1, 0.08);
    let t = [1.0, 0.2, 0.1];

    let mut x1 = Vec::with_capacity(n);
    let mut x2 = Vec::with_capacity(n);
    for _ in 0..n {
        let p = [
            rng.random_range(-2.0..2.0),
            rng.random_range(-1.5..1.5),
            rng.random_range(4.0..8.0),
        ];
        let rp = mat33_mul_vec3(&r, &p);
        let q = [rp[0] + t[0], rp[1] + t[1], rp[2] + t[2]];
        x1.push(project(&p));
        x2.push(project(&q));
    }

    // F = K^-T * [t]x * R * K^-1
    let e = mat33_mul(&skew(&t), &r);
    let f = mat33_mul(&mat33_mul(&mat33_transpose(&K_INV), &e), &K_INV);

    Scene { x1, x2, f }
}

/// Assert two matrices are equal once scaled to unit norm, up to sign.
pub(crate) fn assert_same_up_to_scale(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3], tol: f64) {
    let na = frobenius_norm_mat33(a);
    let nb = frobenius_norm_mat33(b);
    let (mut diff_pos, mut diff_neg) = (0.0, 0.0);
    for i in 0..3 {
        for j in 0..3 {
            let (u, v) = (a[i][j] / na, b[i][j] / nb);
            diff_pos += (u - v) * (u - v);
            diff_neg += (u + v) * (u + v);
        }
    }
    let diff = diff_pos.min(diff_neg).sqrt();
    assert!(diff < tol, "matrices differ by {diff}: {a:?} vs {b:?}");
}
