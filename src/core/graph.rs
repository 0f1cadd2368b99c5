//! Nonlinear factor graph and its linearization pass.
//!
//! Factors are owned by the graph and addressed by their position. Linearization is a
//! pure function of the graph, a [`Values`] snapshot and an [`Ordering`]; per-factor
//! work is independent, so the pass can run on the rayon pool. Results are always
//! gathered by factor position, so sequential and parallel passes produce identical
//! graphs and report the same (lowest-index) failure.

use crate::core::factors::NonlinearFactor;
use crate::core::key::Key;
use crate::core::ordering::Ordering;
use crate::core::values::Values;
use crate::error::{ApexError, ApexResult};
use crate::linalg::{JacobianFactor, LinearFactorGraph};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

/// Configuration of a linearization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearizeConfig {
    /// Linearize factors on the rayon thread pool
    pub parallel: bool,
    /// Graphs with fewer factors are linearized sequentially even when `parallel` is set
    pub min_factors_for_parallel: usize,
}

impl Default for LinearizeConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            min_factors_for_parallel: 64,
        }
    }
}

impl LinearizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_min_factors_for_parallel(mut self, min_factors: usize) -> Self {
        self.min_factors_for_parallel = min_factors;
        self
    }

    fn runs_parallel(&self, num_factors: usize) -> bool {
        self.parallel && num_factors >= self.min_factors_for_parallel
    }
}

/// Statistics about a factor graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStatistics {
    pub num_factors: usize,
    pub num_variables: usize,
    pub residual_dimension: usize,
}

impl fmt::Display for GraphStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FactorGraph Statistics:\n\
             Factors: {}\n\
             Variables: {}\n\
             Residual dimension: {}",
            self.num_factors, self.num_variables, self.residual_dimension
        )
    }
}

#[derive(Debug, Default)]
pub struct NonlinearFactorGraph {
    factors: Vec<Box<dyn NonlinearFactor>>,
}

impl NonlinearFactorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a factor; returns its position.
    pub fn add(&mut self, factor: impl NonlinearFactor + 'static) -> usize {
        self.push_boxed(Box::new(factor))
    }

    pub fn push_boxed(&mut self, factor: Box<dyn NonlinearFactor>) -> usize {
        self.factors.push(factor);
        self.factors.len() - 1
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn NonlinearFactor> {
        self.factors.get(index).map(|f| f.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn NonlinearFactor> {
        self.factors.iter().map(|f| f.as_ref())
    }

    /// Every key referenced by some factor, ascending.
    pub fn keys(&self) -> Vec<Key> {
        let keys: BTreeSet<Key> = self
            .factors
            .iter()
            .flat_map(|factor| factor.keys().iter().copied())
            .collect();
        keys.into_iter().collect()
    }

    pub fn statistics(&self) -> GraphStatistics {
        GraphStatistics {
            num_factors: self.len(),
            num_variables: self.keys().len(),
            residual_dimension: self.factors.iter().map(|f| f.dim()).sum(),
        }
    }

    /// Total cost `Σ 0.5·‖W·r‖²` at `values`.
    ///
    /// The first failing factor aborts with [`ApexError::ErrorEvaluationFailure`].
    pub fn error(&self, values: &Values) -> ApexResult<f64> {
        let mut total_error = 0.0;
        for (index, factor) in self.factors.iter().enumerate() {
            total_error += factor
                .error(values)
                .map_err(|e| ApexError::error_evaluation_failure(index, e))?;
        }
        Ok(total_error)
    }

    /// Linearize every factor with the default [`LinearizeConfig`].
    pub fn linearize(&self, values: &Values, ordering: &Ordering) -> ApexResult<LinearFactorGraph> {
        self.linearize_with_config(values, ordering, &LinearizeConfig::default())
    }

    /// Linearize every factor, in factor order.
    ///
    /// The first failing factor (lowest position) aborts the pass with
    /// [`ApexError::LinearizationFailure`]; no partial graph is returned.
    pub fn linearize_with_config(
        &self,
        values: &Values,
        ordering: &Ordering,
        config: &LinearizeConfig,
    ) -> ApexResult<LinearFactorGraph> {
        let parallel = config.runs_parallel(self.len());
        debug!(
            "Linearizing {} factors over {} columns ({})",
            self.len(),
            ordering.total_dimension(),
            if parallel { "parallel" } else { "sequential" }
        );

        let linearize_one = |(index, factor): (usize, &Box<dyn NonlinearFactor>)| {
            factor
                .linearize(values, ordering)
                .map_err(|e| ApexError::linearization_failure(index, e))
        };

        let results: Vec<ApexResult<JacobianFactor>> = if parallel {
            self.factors.par_iter().enumerate().map(linearize_one).collect()
        } else {
            self.factors.iter().enumerate().map(linearize_one).collect()
        };

        let linear = results
            .into_iter()
            .collect::<ApexResult<LinearFactorGraph>>()
            .inspect_err(|e| warn!("Linearization aborted: {e}"))?;

        debug!("Linearized {} factors, {} rows", linear.len(), linear.rows());
        Ok(linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::noise_model::NoiseModel;
    use crate::core::variable::Value;
    use crate::factors::{BetweenFactor, PriorFactor};
    use crate::manifold::so2::SO2;
    use crate::manifold::{ManifoldError, ManifoldType};

    fn chain(len: u64) -> ApexResult<(NonlinearFactorGraph, Values)> {
        let model = NoiseModel::isotropic(2, 0.5)?;
        let mut graph = NonlinearFactorGraph::new();
        let mut values = Values::new();
        graph.add(PriorFactor::new(
            Key::new('x', 0),
            Value::point2(0.0, 0.0),
            model.clone(),
        )?);
        values.insert(Key::new('x', 0), Value::point2(0.1, -0.1))?;
        for i in 1..len {
            graph.add(BetweenFactor::new(
                Key::new('x', i - 1),
                Key::new('x', i),
                Value::point2(1.0, 0.0),
                model.clone(),
            )?);
            values.insert(Key::new('x', i), Value::point2(i as f64 + 0.05, 0.02 * i as f64))?;
        }
        Ok((graph, values))
    }

    #[test]
    fn test_linearize_preserves_factor_order() -> ApexResult<()> {
        let (graph, values) = chain(5)?;
        let ordering = values.ordering_arbitrary();
        let linear = graph.linearize(&values, &ordering)?;

        assert_eq!(linear.len(), graph.len());
        assert_eq!(linear.get(0).map(|f| f.keys().to_vec()), Some(vec![Key::new('x', 0)]));
        for (i, factor) in linear.iter().enumerate().skip(1) {
            assert_eq!(
                factor.keys(),
                &[Key::new('x', i as u64 - 1), Key::new('x', i as u64)]
            );
        }
        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential() -> ApexResult<()> {
        let (graph, values) = chain(200)?;
        let ordering = values.ordering_arbitrary();

        let sequential = graph.linearize_with_config(
            &values,
            &ordering,
            &LinearizeConfig::new().with_parallel(false),
        )?;
        let parallel = graph.linearize_with_config(
            &values,
            &ordering,
            &LinearizeConfig::new()
                .with_parallel(true)
                .with_min_factors_for_parallel(1),
        )?;
        assert_eq!(sequential, parallel);
        Ok(())
    }

    #[test]
    fn test_first_failure_reported() -> ApexResult<()> {
        let (graph, values) = chain(100)?;
        let mut ordering = Ordering::new();
        for i in 0..100 {
            // x7 and x40 are left out
            if i != 7 && i != 40 {
                ordering.push(Key::new('x', i), 2)?;
            }
        }

        for config in [
            LinearizeConfig::new().with_parallel(false),
            LinearizeConfig::new().with_min_factors_for_parallel(1),
        ] {
            let result = graph.linearize_with_config(&values, &ordering, &config);
            match result {
                Err(ApexError::LinearizationFailure {
                    factor_index,
                    source,
                }) => {
                    assert_eq!(factor_index, 7);
                    assert_eq!(
                        *source,
                        ApexError::UnknownVariable {
                            key: Key::new('x', 7),
                            container: "ordering",
                        }
                    );
                }
                other => panic!("expected a linearization failure, got {other:?}"),
            }
        }
        Ok(())
    }

    #[test]
    fn test_error_reports_failing_factor() -> ApexResult<()> {
        let mut graph = NonlinearFactorGraph::new();
        graph.add(PriorFactor::new(
            Key::new('x', 0),
            Value::point2(0.0, 0.0),
            NoiseModel::isotropic(2, 0.5)?,
        )?);
        graph.add(PriorFactor::new(
            Key::new('x', 1),
            Value::Scalar(1.0),
            NoiseModel::isotropic(1, 0.5)?,
        )?);

        let mut values = Values::new();
        values.insert(Key::new('x', 0), Value::point2(0.1, 0.0))?;
        values.insert(Key::new('x', 1), Value::SO2(SO2::from_angle(0.3)))?;

        match graph.error(&values) {
            Err(ApexError::ErrorEvaluationFailure {
                factor_index,
                source,
            }) => {
                assert_eq!(factor_index, 1);
                assert_eq!(
                    *source,
                    ApexError::Manifold(ManifoldError::TypeMismatch {
                        expected: ManifoldType::Scalar,
                        actual: ManifoldType::SO2,
                    })
                );
            }
            other => panic!("expected an error evaluation failure, got {other:?}"),
        }

        let ordering = values.ordering_arbitrary();
        let linearized = graph.linearize(&values, &ordering);
        assert_eq!(linearized.err().and_then(|e| e.factor_index()), Some(1));
        Ok(())
    }

    #[test]
    fn test_error_and_keys() -> ApexResult<()> {
        let (graph, values) = chain(3)?;
        assert_eq!(
            graph.keys(),
            vec![Key::new('x', 0), Key::new('x', 1), Key::new('x', 2)]
        );
        let total: f64 = graph
            .iter()
            .map(|f| f.error(&values))
            .collect::<ApexResult<Vec<_>>>()?
            .iter()
            .sum();
        assert!((graph.error(&values)? - total).abs() < 1e-12);

        let stats = graph.statistics();
        assert_eq!(stats.num_factors, 3);
        assert_eq!(stats.num_variables, 3);
        assert_eq!(stats.residual_dimension, 6);
        Ok(())
    }

    #[test]
    fn test_empty_graph() -> ApexResult<()> {
        let graph = NonlinearFactorGraph::new();
        let values = Values::new();
        let linear = graph.linearize(&values, &values.ordering_arbitrary())?;
        assert!(linear.is_empty());
        assert_eq!(graph.error(&values)?, 0.0);
        Ok(())
    }
}
