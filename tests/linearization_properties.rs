//! Property tests of the linearization engine over mixed manifold problems
//!
//! Builds randomized (seeded) graphs over SE(2) poses, SO(3) rotations, scalars and
//! points and checks determinism, whitening consistency, ordering idempotence and the
//! retract / local-coordinates inverse law at the store level.

#![allow(clippy::unwrap_used)]

use apex_linearization::core::factors::NonlinearFactor;
use apex_linearization::factors::{BetweenFactor, PriorFactor};
use apex_linearization::manifold::se2::SE2;
use apex_linearization::manifold::so3::SO3;
use apex_linearization::{
    ApexResult, Key, LinearizeConfig, NoiseModel, NonlinearFactorGraph, Value, Values,
};
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOLERANCE: f64 = 1e-9;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn random_se2(rng: &mut StdRng) -> SE2 {
    SE2::from_xy_angle(
        rng.random_range(-5.0..5.0),
        rng.random_range(-5.0..5.0),
        rng.random_range(-3.0..3.0),
    )
}

fn random_so3(rng: &mut StdRng) -> SO3 {
    SO3::from_euler_angles(
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
        rng.random_range(-3.0..3.0),
    )
}

/// Parallel chains of SE(2) poses, SO(3) rotations, scalars and 2D points.
fn mixed_problem(seed: u64, num_poses: u64) -> ApexResult<(NonlinearFactorGraph, Values)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = NonlinearFactorGraph::new();
    let mut values = Values::new();

    let pose_model = NoiseModel::diagonal(&[0.1, 0.2, 0.05])?;
    let rot_model = NoiseModel::isotropic(3, 0.02)?;
    let scalar_model = NoiseModel::isotropic(1, 0.5)?;
    let point_model = NoiseModel::diagonal(&[0.3, 0.4])?;

    graph.add(PriorFactor::new(
        Key::new('x', 0),
        random_se2(&mut rng).into(),
        pose_model.clone(),
    )?);
    graph.add(PriorFactor::new(
        Key::new('r', 0),
        random_so3(&mut rng).into(),
        rot_model.clone(),
    )?);
    values.insert(Key::new('x', 0), random_se2(&mut rng))?;
    values.insert(Key::new('r', 0), random_so3(&mut rng))?;

    for i in 1..num_poses {
        graph.add(BetweenFactor::new(
            Key::new('x', i - 1),
            Key::new('x', i),
            random_se2(&mut rng).into(),
            pose_model.clone(),
        )?);
        graph.add(BetweenFactor::new(
            Key::new('r', i - 1),
            Key::new('r', i),
            random_so3(&mut rng).into(),
            rot_model.clone(),
        )?);
        graph.add(BetweenFactor::new(
            Key::new('s', i - 1),
            Key::new('s', i),
            Value::Scalar(rng.random_range(-1.0..1.0)),
            scalar_model.clone(),
        )?);
        graph.add(BetweenFactor::new(
            Key::new('l', i - 1),
            Key::new('l', i),
            Value::point2(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
            point_model.clone(),
        )?);
        values.insert(Key::new('x', i), random_se2(&mut rng))?;
        values.insert(Key::new('r', i), random_so3(&mut rng))?;
        values.insert(Key::new('s', i), rng.random_range(-2.0..2.0_f64))?;
        values.insert(
            Key::new('l', i),
            Value::point2(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)),
        )?;
    }
    values.insert(Key::new('s', 0), 0.0)?;
    values.insert(Key::new('l', 0), Value::point2(0.0, 0.0))?;
    Ok((graph, values))
}

#[test]
fn test_linearization_is_deterministic() -> TestResult {
    let (graph, values) = mixed_problem(7, 60)?;
    let ordering = values.ordering_arbitrary();

    let first = graph.linearize(&values, &ordering)?;
    let second = graph.linearize(&values, &ordering)?;
    assert_eq!(first, second);

    for config in [
        LinearizeConfig::new().with_parallel(false),
        LinearizeConfig::new().with_min_factors_for_parallel(1),
    ] {
        let other = graph.linearize_with_config(&values, &ordering, &config)?;
        assert_eq!(first, other);
    }
    Ok(())
}

#[test]
fn test_whitening_consistency() -> TestResult {
    let (graph, values) = mixed_problem(11, 20)?;
    for factor in graph.iter() {
        let whitened = factor.noise_model().whiten(&factor.unwhitened_error(&values)?)?;
        let expected = 0.5 * whitened.norm_squared();
        assert!((factor.error(&values)? - expected).abs() <= TOLERANCE * expected.max(1.0));
    }
    Ok(())
}

#[test]
fn test_linear_error_at_zero_matches_nonlinear_error() -> TestResult {
    let (graph, values) = mixed_problem(3, 25)?;
    let ordering = values.ordering_arbitrary();
    let linear = graph.linearize(&values, &ordering)?;

    let nonlinear = graph.error(&values)?;
    let at_zero = linear.error(&DVector::zeros(ordering.total_dimension()), &ordering)?;
    assert!((nonlinear - at_zero).abs() <= TOLERANCE * nonlinear.max(1.0));
    Ok(())
}

#[test]
fn test_linear_model_predicts_small_steps() -> TestResult {
    let (graph, values) = mixed_problem(5, 10)?;
    let ordering = values.ordering_arbitrary();
    let linear = graph.linearize(&values, &ordering)?;

    let mut rng = StdRng::seed_from_u64(99);
    let step = 1e-5;
    let delta = DVector::from_fn(ordering.total_dimension(), |_, _| {
        rng.random_range(-step..step)
    });
    let moved = values.retract(&delta, &ordering)?;

    // first order: W·r(x ⊕ δ) ≈ W·r(x) + A·δ = A·δ - b
    for (factor, jacobian_factor) in graph.iter().zip(linear.iter()) {
        let predicted = jacobian_factor.residual(&delta, &ordering)?;
        let actual = factor.whitened_error(&moved)?;
        assert!(
            (predicted - actual).norm() < 1e-6,
            "{} on {:?}",
            factor.kind(),
            factor.keys()
        );
    }
    Ok(())
}

#[test]
fn test_ordering_arbitrary_idempotent() -> TestResult {
    let (_, values) = mixed_problem(13, 15)?;
    let first = values.ordering_arbitrary();
    let second = values.ordering_arbitrary();
    assert_eq!(first, second);
    assert_eq!(first.total_dimension(), values.dim());

    let keys = first.keys();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

#[test]
fn test_values_retract_local_coordinates_inverse() -> TestResult {
    let (_, values) = mixed_problem(17, 15)?;
    let ordering = values.ordering_arbitrary();
    let mut rng = StdRng::seed_from_u64(23);

    for _ in 0..10 {
        let delta = DVector::from_fn(ordering.total_dimension(), |_, _| {
            rng.random_range(-0.5..0.5)
        });
        let moved = values.retract(&delta, &ordering)?;
        let back = values.local_coordinates(&moved, &ordering)?;
        assert!((back - &delta).norm() < TOLERANCE * delta.len() as f64);
    }
    Ok(())
}

#[test]
fn test_constrained_rows_vanish_when_satisfied() -> TestResult {
    let x1 = Key::new('x', 1);
    let pose = SE2::from_xy_angle(1.0, -2.0, 0.7);
    let factor = PriorFactor::new(x1, pose.clone().into(), NoiseModel::all_constrained(3)?)?;

    let mut values = Values::new();
    values.insert(x1, pose)?;
    let linear = factor.linearize(&values, &values.ordering_arbitrary())?;

    assert_eq!(linear.model().constrained_rows(), vec![0, 1, 2]);
    assert!(linear.b().norm() < TOLERANCE);
    assert!(linear.b().iter().all(|v| v.is_finite()));
    Ok(())
}
