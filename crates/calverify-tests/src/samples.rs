//! Seeded random samples for property tests

use calverify_core::{Lab, Xyz};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Lab colors with L in 0..100 and a/b in -128..128
pub fn random_labs(seed: u64, count: usize) -> Vec<Lab> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Lab::new(
                rng.gen_range(0.0..100.0),
                rng.gen_range(-128.0..128.0),
                rng.gen_range(-128.0..128.0),
            )
        })
        .collect()
}

/// Lab pairs a small distance apart, the range verification data lives in
pub fn random_lab_pairs(seed: u64, count: usize, spread: f64) -> Vec<(Lab, Lab)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    random_labs(seed, count)
        .into_iter()
        .map(|lab| {
            let sample = Lab::new(
                (lab.l + rng.gen_range(-spread..spread)).clamp(0.0, 100.0),
                lab.a + rng.gen_range(-spread..spread),
                lab.b + rng.gen_range(-spread..spread),
            );
            (lab, sample)
        })
        .collect()
}

/// XYZ colors with every component in 0..1
pub fn random_xyz(seed: u64, count: usize) -> Vec<Xyz> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| Xyz::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
        .collect()
}
