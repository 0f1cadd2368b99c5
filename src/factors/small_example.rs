//! Small reference problem: two poses and one landmark in the simulated 2D world.
//!
//! ```text
//!   f1 (prior)     f2 (odometry)
//!   ──── x1 ─────────────── x2
//!          \               /
//!     f3    \             /  f4
//!            ──── l1 ─────
//! ```
//!
//! The ground truth is `x1 = (0, 0)`, `x2 = (1.5, 0)`, `l1 = (0, -1)`; the measurements
//! are exact and the noisy configuration perturbs every variable by about 0.1.

use crate::core::graph::NonlinearFactorGraph;
use crate::core::noise_model::NoiseModel;
use crate::core::ordering::Ordering;
use crate::core::values::Values;
use crate::core::variable::Value;
use crate::error::ApexResult;
use crate::factors::simulated2d::{self, point_key, pose_key};
use crate::linalg::{JacobianFactor, LinearFactorGraph};
use nalgebra::{DMatrix, DVector, Vector2};

const SIGMA_ODOMETRY: f64 = 0.1;
const SIGMA_MEASUREMENT: f64 = 0.2;

/// Four-factor graph: a prior on x1, odometry x1→x2 and landmark measurements of l1
/// from both poses.
pub fn nonlinear_factor_graph() -> ApexResult<NonlinearFactorGraph> {
    let odometry_model = NoiseModel::isotropic(2, SIGMA_ODOMETRY)?;
    let measurement_model = NoiseModel::isotropic(2, SIGMA_MEASUREMENT)?;

    let mut graph = NonlinearFactorGraph::new();
    graph.add(simulated2d::prior(
        Vector2::new(0.0, 0.0),
        odometry_model.clone(),
        1,
    )?);
    graph.add(simulated2d::odometry(
        Vector2::new(1.5, 0.0),
        odometry_model,
        1,
        2,
    )?);
    graph.add(simulated2d::measurement(
        Vector2::new(0.0, -1.0),
        measurement_model.clone(),
        1,
        1,
    )?);
    graph.add(simulated2d::measurement(
        Vector2::new(-1.5, -1.0),
        measurement_model,
        2,
        1,
    )?);
    Ok(graph)
}

/// Ground-truth configuration.
pub fn true_values() -> ApexResult<Values> {
    let mut values = Values::new();
    values.insert(pose_key(1), Value::point2(0.0, 0.0))?;
    values.insert(pose_key(2), Value::point2(1.5, 0.0))?;
    values.insert(point_key(1), Value::point2(0.0, -1.0))?;
    Ok(values)
}

/// Perturbed configuration the reference linear graph is taken at.
pub fn noisy_values() -> ApexResult<Values> {
    let mut values = Values::new();
    values.insert(pose_key(1), Value::point2(0.1, 0.1))?;
    values.insert(pose_key(2), Value::point2(1.4, 0.2))?;
    values.insert(point_key(1), Value::point2(0.1, -1.1))?;
    Ok(values)
}

/// Linearization of [`nonlinear_factor_graph`] at [`noisy_values`], block indices taken
/// from `ordering`.
pub fn linear_factor_graph(ordering: &Ordering) -> ApexResult<LinearFactorGraph> {
    let (x1, x2, l1) = (pose_key(1), pose_key(2), point_key(1));
    let (i1, i2, j1) = (
        ordering.index_of(x1)?,
        ordering.index_of(x2)?,
        ordering.index_of(l1)?,
    );
    let eye = |scale: f64| DMatrix::<f64>::identity(2, 2) * scale;
    let b = |u: f64, v: f64| DVector::from_vec(vec![u, v]);
    let unit = NoiseModel::unit(2)?;

    let mut graph = LinearFactorGraph::new();
    graph.push(JacobianFactor::new(
        vec![(x1, i1, eye(10.0))],
        b(-1.0, -1.0),
        unit.clone(),
    )?);
    graph.push(JacobianFactor::new(
        vec![(x1, i1, eye(-10.0)), (x2, i2, eye(10.0))],
        b(2.0, -1.0),
        unit.clone(),
    )?);
    graph.push(JacobianFactor::new(
        vec![(x1, i1, eye(-5.0)), (l1, j1, eye(5.0))],
        b(0.0, 1.0),
        unit.clone(),
    )?);
    graph.push(JacobianFactor::new(
        vec![(x2, i2, eye(-5.0)), (l1, j1, eye(5.0))],
        b(-1.0, 1.5),
        unit,
    )?);
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_values_have_zero_error() -> ApexResult<()> {
        let graph = nonlinear_factor_graph()?;
        assert!(graph.error(&true_values()?)? < 1e-20);
        Ok(())
    }

    #[test]
    fn test_reference_graph_shape() -> ApexResult<()> {
        let values = noisy_values()?;
        let linear = linear_factor_graph(&values.ordering_arbitrary())?;
        assert_eq!(linear.len(), 4);
        assert_eq!(linear.rows(), 8);
        Ok(())
    }
}
