/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use linkrank::utils::Granularity;
use linkrank_algo::rank::{GoogleMatrix, GoogleMatrixBuilder, Mode, PowerIteration, preds};
use predicates::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn random_arcs(rng: &mut SmallRng, n: usize, max_outdegree: usize) -> Vec<(usize, usize)> {
    let mut arcs = Vec::new();
    for src in 0..n {
        if rng.random_bool(0.25) {
            continue;
        }
        for _ in 0..rng.random_range(1..=max_outdegree) {
            arcs.push((src, rng.random_range(0..n)));
        }
    }
    arcs
}

/// Returns the ℓ∞ distance (maximum absolute difference) between two vectors.
fn l_inf_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Runs `k` iterations from the uniform vector.
fn iterate(g: &GoogleMatrix, k: usize) -> Result<Box<[f64]>> {
    let mut pi = PowerIteration::new(g);
    pi.run(preds::MaxIter::from(k))?;
    assert_eq!(pi.iterations(), k);
    Ok(pi.into_rank())
}

/// A dense, sequential power iteration on the conceptual matrix (indexed by
/// source, then target) used as an oracle.
fn dense_iterate(m: &[Vec<f64>], k: usize) -> Vec<f64> {
    let n = m.len();
    let mut pi = vec![1.0 / n as f64; n];
    for _ in 0..k {
        let mut next = vec![0.0; n];
        for (j, x) in next.iter_mut().enumerate() {
            for i in 0..n {
                *x += pi[i] * m[i][j];
            }
        }
        let total: f64 = next.iter().sum();
        pi = next.into_iter().map(|x| x / total).collect();
    }
    pi
}

/// The dense matrix prescribed by the reference construction.
fn dense_reference(n: usize, arcs: &[(usize, usize)], alpha: f64) -> Vec<Vec<f64>> {
    let mut d = vec![0; n];
    let mut linked = vec![vec![false; n]; n];
    for &(src, dest) in arcs {
        d[src] += 1;
        linked[src][dest] = true;
    }
    let jump = (1.0 - alpha) / n as f64;
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if d[i] == 0 {
                        alpha / n as f64 + jump
                    } else if linked[i][j] {
                        alpha / d[i] as f64 + jump
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

/// The canonical Google matrix.
fn dense_google(n: usize, arcs: &[(usize, usize)], alpha: f64) -> Vec<Vec<f64>> {
    let mut d = vec![0; n];
    let mut count = vec![vec![0; n]; n];
    for &(src, dest) in arcs {
        d[src] += 1;
        count[src][dest] = 1;
    }
    let jump = (1.0 - alpha) / n as f64;
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if d[i] == 0 {
                        alpha / n as f64 + jump
                    } else {
                        alpha * count[i][j] as f64 / d[i] as f64 + jump
                    }
                })
                .collect()
        })
        .collect()
}

/// A 3-cycle has the uniform distribution as PageRank.
#[test]
fn test_cycle() -> Result<()> {
    for mode in [Mode::Reference, Mode::Canonical] {
        let g = GoogleMatrixBuilder::new(3)
            .alpha(0.85)
            .mode(mode)
            .build(vec![(0, 1), (1, 2), (2, 0)])?;
        let rank = iterate(&g, 20)?;
        for &r in rank.iter() {
            assert!((r - 1.0 / 3.0).abs() < 1E-6, "{mode}: {rank:?}");
        }
    }
    Ok(())
}

/// Two nodes and the arc 0 → 1, so node 1 is dangling. The reference
/// matrix (rows are targets) is
///
/// ```text
/// [ 0  1/2 ]
/// [ c  1/2 ]   with c = α + (1 − α)/2,
/// ```
///
/// and the renormalized power iteration converges to its dominant
/// eigenvector: if λ = (1 + √(1 + 8c)) / 4, then x₁ = 2λ x₀.
#[test]
fn test_two_nodes_dangling() -> Result<()> {
    for &alpha in &[0.5, 0.85, 0.95] {
        let g = GoogleMatrixBuilder::new(2).alpha(alpha).build(vec![(0, 1)])?;
        let rank = iterate(&g, 100)?;

        let c = alpha + (1.0 - alpha) / 2.0;
        let lambda = (1.0 + (1.0 + 8.0 * c).sqrt()) / 4.0;
        let expected = [1.0 / (1.0 + 2.0 * lambda), 2.0 * lambda / (1.0 + 2.0 * lambda)];
        assert!(
            l_inf_distance(&rank, &expected) < 1E-9,
            "alpha={alpha}: {rank:?} != {expected:?}"
        );
    }

    let g = GoogleMatrixBuilder::new(2).build(vec![(0, 1)])?;
    let rank = iterate(&g, 100)?;
    assert!((rank[0] - 0.339082).abs() < 1E-6);
    assert!((rank[1] - 0.660918).abs() < 1E-6);
    Ok(())
}

/// In canonical mode the same graph gives the textbook solution of
/// x₀ = (1 − α)/2 + α x₁/2 and x₀ + x₁ = 1.
#[test]
fn test_two_nodes_dangling_canonical() -> Result<()> {
    let alpha = 0.85;
    let g = GoogleMatrixBuilder::new(2)
        .alpha(alpha)
        .mode(Mode::Canonical)
        .build(vec![(0, 1)])?;
    let rank = iterate(&g, 200)?;
    let x0 = 1.0 / (2.0 + alpha);
    assert!(l_inf_distance(&rank, &[x0, 1.0 - x0]) < 1E-12, "{rank:?}");
    Ok(())
}

#[test]
fn test_single_node() -> Result<()> {
    for mode in [Mode::Reference, Mode::Canonical] {
        let g = GoogleMatrixBuilder::new(1).mode(mode).build(vec![])?;
        for k in 0..5 {
            assert_eq!(&*iterate(&g, k)?, &[1.0]);
        }
    }
    Ok(())
}

/// For every graph, damping factor, and number of iterations, the result is a
/// probability distribution.
#[test]
fn test_stochastic() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0);
    for &n in &[1, 2, 5, 50, 300] {
        for &alpha in &[0.1, 0.5, 0.85, 0.99] {
            for mode in [Mode::Reference, Mode::Canonical] {
                let arcs = random_arcs(&mut rng, n, 5);
                let g = GoogleMatrixBuilder::new(n)
                    .alpha(alpha)
                    .mode(mode)
                    .build(arcs)?;
                for &k in &[0, 1, 7, 20] {
                    let rank = iterate(&g, k)?;
                    assert_eq!(rank.len(), n);
                    assert!(rank.iter().all(|&r| r >= 0.0));
                    let total: f64 = rank.iter().sum();
                    assert!(
                        (total - 1.0).abs() < 1E-9,
                        "n={n} alpha={alpha} {mode} k={k}: sum = {total}"
                    );
                }
            }
        }
    }
    Ok(())
}

/// The sparse computation matches a dense one on the conceptual matrix.
#[test]
fn test_dense_oracle() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(1);
    for &n in &[3, 10, 40] {
        for &alpha in &[0.3, 0.85] {
            let arcs = random_arcs(&mut rng, n, 4);

            let reference = GoogleMatrixBuilder::new(n)
                .alpha(alpha)
                .build(arcs.clone())?;
            let expected = dense_iterate(&dense_reference(n, &arcs, alpha), 15);
            let rank = iterate(&reference, 15)?;
            assert!(
                l_inf_distance(&rank, &expected) < 1E-12,
                "reference n={n} alpha={alpha}"
            );

            let canonical = GoogleMatrixBuilder::new(n)
                .alpha(alpha)
                .mode(Mode::Canonical)
                .build(arcs.clone())?;
            let expected = dense_iterate(&dense_google(n, &arcs, alpha), 15);
            let rank = iterate(&canonical, 15)?;
            assert!(
                l_inf_distance(&rank, &expected) < 1E-12,
                "canonical n={n} alpha={alpha}"
            );
        }
    }
    Ok(())
}

/// In canonical mode the distance between successive iterates contracts by
/// at least α at each step.
#[test]
fn test_contraction() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(2);
    let n = 100;
    let alpha = 0.85;
    let g = GoogleMatrixBuilder::new(n)
        .alpha(alpha)
        .mode(Mode::Canonical)
        .build(random_arcs(&mut rng, n, 8))?;

    let mut previous = f64::INFINITY;
    for k in 1..60 {
        let mut pi = PowerIteration::new(&g);
        pi.run(preds::MaxIter::from(k))?;
        let delta = pi.norm_delta();
        if previous > 1E-12 {
            assert!(
                delta <= alpha * previous + 1E-14,
                "k={k}: {delta} > {alpha} * {previous}"
            );
        }
        previous = delta;
    }
    Ok(())
}

/// Near convergence, additional iterations bring successive iterates closer.
#[test]
fn test_decreasing_delta() -> Result<()> {
    let g = GoogleMatrixBuilder::new(2).build(vec![(0, 1)])?;
    let mut previous = f64::INFINITY;
    for k in 1..40 {
        let mut pi = PowerIteration::new(&g);
        pi.run(preds::MaxIter::from(k))?;
        let delta = pi.norm_delta();
        if delta > 1E-12 {
            assert!(delta < previous, "k={k}: {delta} >= {previous}");
        }
        previous = delta;
    }
    Ok(())
}

#[test]
fn test_threshold() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(3);
    let n = 200;
    let g = GoogleMatrixBuilder::new(n)
        .mode(Mode::Canonical)
        .build(random_arcs(&mut rng, n, 5))?;

    let mut pi = PowerIteration::new(&g);
    pi.run(preds::MaxIter::from(10_000).or(preds::L1Norm::try_from(1E-10)?))?;
    assert!(pi.iterations() < 10_000);
    assert!(pi.norm_delta() <= 1E-10);

    // The iteration bound wins when it is smaller
    let mut pi = PowerIteration::new(&g);
    pi.run(preds::MaxIter::from(3).or(preds::L1Norm::try_from(1E-10)?))?;
    assert_eq!(pi.iterations(), 3);
    Ok(())
}

/// A custom initial vector affects the iterates but not the limit.
#[test]
fn test_initial() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(4);
    let n = 20;
    let g = GoogleMatrixBuilder::new(n)
        .mode(Mode::Canonical)
        .build(random_arcs(&mut rng, n, 3))?;

    let mut initial = vec![0.0; n];
    initial[0] = 1.0;

    let mut pi = PowerIteration::new(&g);
    pi.initial(Some(initial.as_slice()));
    pi.run(preds::MaxIter::from(1))?;
    let one_step = pi.rank().to_vec();
    let uniform_step = iterate(&g, 1)?;
    assert!(l_inf_distance(&one_step, &uniform_step) > 1E-6);

    pi.run(preds::L1Norm::try_from(1E-13)?)?;
    let limit = pi.rank().to_vec();
    let mut pi = PowerIteration::new(&g);
    pi.run(preds::L1Norm::try_from(1E-13)?)?;
    assert!(l_inf_distance(&limit, pi.rank()) < 1E-10);
    Ok(())
}

/// The result does not depend on the granularity.
#[test]
fn test_granularity() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(5);
    let n = 500;
    for mode in [Mode::Reference, Mode::Canonical] {
        let g = GoogleMatrixBuilder::new(n)
            .mode(mode)
            .build(random_arcs(&mut rng, n, 6))?;
        let expected = iterate(&g, 20)?;
        for granularity in [
            Granularity::Nodes(1),
            Granularity::Nodes(7),
            Granularity::Entries(100),
        ] {
            let mut pi = PowerIteration::new(&g);
            pi.granularity(granularity);
            pi.run(preds::MaxIter::default())?;
            assert!(l_inf_distance(&expected, pi.rank()) < 1E-15);
        }
    }
    Ok(())
}

/// A larger graph on which many chunks are processed concurrently.
#[cfg_attr(feature = "slow_tests", test)]
#[cfg_attr(not(feature = "slow_tests"), allow(dead_code))]
fn test_large() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(6);
    let n = 1_000_000;
    let arcs = random_arcs(&mut rng, n, 10);
    let g = GoogleMatrixBuilder::new(n)
        .mode(Mode::Canonical)
        .build(arcs)?;
    let mut pi = PowerIteration::new(&g);
    pi.granularity(Granularity::Nodes(1000));
    pi.run(preds::MaxIter::from(100).or(preds::L1Norm::try_from(1E-9)?))?;
    let total: f64 = pi.rank().iter().sum();
    assert!((total - 1.0).abs() < 1E-9);
    assert!(pi.rank().iter().all(|&r| r > 0.0));
    Ok(())
}
