//! The nonlinear factor abstraction.
//!
//! A factor constrains an ordered scope of variables through a residual
//! `r(x₁, …, x_k) ∈ ℝᵐ` and a noise model of dimension `m`. Concrete factors only
//! implement [`NonlinearFactor::evaluate`]; error evaluation, whitening and linearization
//! into a [`JacobianFactor`] are provided on top of it.
//!
//! # Jacobian layout
//!
//! `evaluate` returns one stacked Jacobian whose column blocks follow the scope order,
//! each block taken with respect to the variable's right tangent perturbation
//! `x ⊕ δ`:
//!
//! ```text
//! J = [ ∂r/∂δ₁ | ∂r/∂δ₂ | … | ∂r/∂δ_k ]      (m × Σ dim(x_i))
//! ```

use crate::core::key::Key;
use crate::core::noise_model::NoiseModel;
use crate::core::ordering::Ordering;
use crate::core::values::Values;
use crate::core::variable::Value;
use crate::error::{ApexError, ApexResult};
use crate::linalg::JacobianFactor;
use nalgebra::{DMatrix, DVector};
use std::collections::HashSet;
use std::fmt;
use tracing::trace;

/// Residual and optional stacked Jacobian of one factor evaluation.
pub type Evaluation = (DVector<f64>, Option<DMatrix<f64>>);

pub trait NonlinearFactor: fmt::Debug + Send + Sync {
    /// Scope of the factor, in Jacobian column-block order.
    fn keys(&self) -> &[Key];

    fn noise_model(&self) -> &NoiseModel;

    /// Name of the residual definition, used by [`equals`](Self::equals).
    fn kind(&self) -> &'static str;

    /// Parameters of the residual definition (usually the measurement), flattened.
    fn measurement(&self) -> DVector<f64>;

    /// Evaluate the unwhitened residual at `values`, given in scope order, and the stacked
    /// Jacobian when `compute_jacobian` is set.
    fn evaluate(&self, values: &[&Value], compute_jacobian: bool) -> ApexResult<Evaluation>;

    /// Residual dimension `m`.
    fn dim(&self) -> usize {
        self.noise_model().dim()
    }

    /// Number of variables in scope.
    fn size(&self) -> usize {
        self.keys().len()
    }

    fn unwhitened_error(&self, values: &Values) -> ApexResult<DVector<f64>> {
        let scoped = gather(self.keys(), values)?;
        let (residual, _) = self.evaluate(&scoped, false)?;
        check_residual(self.dim(), &residual)?;
        Ok(residual)
    }

    fn whitened_error(&self, values: &Values) -> ApexResult<DVector<f64>> {
        self.noise_model().whiten(&self.unwhitened_error(values)?)
    }

    /// `0.5 · ‖W·r‖²`
    fn error(&self, values: &Values) -> ApexResult<f64> {
        Ok(0.5 * self.whitened_error(values)?.norm_squared())
    }

    /// Linearize around `values` into a Jacobian factor whose blocks are addressed by
    /// `ordering`.
    ///
    /// The Jacobian and `b = -r` are whitened and carry a unit model, unless the noise
    /// model has exact-constraint rows: then both stay unscaled and the factor carries
    /// the constrained model.
    fn linearize(&self, values: &Values, ordering: &Ordering) -> ApexResult<JacobianFactor> {
        let scoped = gather(self.keys(), values)?;

        let mut slots = Vec::with_capacity(self.size());
        for (&key, value) in self.keys().iter().zip(&scoped) {
            let index = ordering.index_of(key)?;
            let dim = ordering.dim_of(key)?;
            if dim != value.dim() {
                return Err(ApexError::DimensionMismatch {
                    context: format!("ordering dimension of {key}"),
                    expected: value.dim(),
                    actual: dim,
                });
            }
            slots.push((key, index, dim));
        }

        let (residual, jacobian) = self.evaluate(&scoped, true)?;
        check_residual(self.dim(), &residual)?;
        let jacobian = jacobian.ok_or_else(|| {
            ApexError::LinearAlgebra(format!("{} returned no Jacobian", self.kind()))
        })?;
        let total_cols: usize = slots.iter().map(|&(_, _, dim)| dim).sum();
        if jacobian.nrows() != self.dim() {
            return Err(ApexError::DimensionMismatch {
                context: format!("{} Jacobian rows", self.kind()),
                expected: self.dim(),
                actual: jacobian.nrows(),
            });
        }
        if jacobian.ncols() != total_cols {
            return Err(ApexError::DimensionMismatch {
                context: format!("{} Jacobian columns", self.kind()),
                expected: total_cols,
                actual: jacobian.ncols(),
            });
        }

        // Hard rows must stay identifiable, so constrained models are handed to the
        // solver unapplied.
        let model = self.noise_model();
        let (jacobian, b, linear_model) = if model.is_constrained() {
            (jacobian, -residual, model.clone())
        } else {
            (
                model.whiten_matrix(&jacobian)?,
                -model.whiten(&residual)?,
                NoiseModel::unit(self.dim())?,
            )
        };

        let mut terms = Vec::with_capacity(slots.len());
        let mut col = 0;
        for (key, index, dim) in slots {
            let block = jacobian.columns(col, dim).into_owned();
            terms.push((key, index, block));
            col += dim;
        }
        trace!("Linearized {} on {:?}", self.kind(), self.keys());

        JacobianFactor::new(terms, b, linear_model)
    }

    /// Same residual definition, same scope in the same order, same noise model.
    fn equals(&self, other: &dyn NonlinearFactor, tolerance: f64) -> bool {
        let (mine, theirs) = (self.measurement(), other.measurement());
        self.kind() == other.kind()
            && self.keys() == other.keys()
            && self.noise_model().equals(other.noise_model(), tolerance)
            && mine.len() == theirs.len()
            && mine
                .iter()
                .zip(theirs.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// Reject a scope that repeats a key.
pub fn check_scope(keys: &[Key]) -> ApexResult<()> {
    let mut seen = HashSet::with_capacity(keys.len());
    for &key in keys {
        if !seen.insert(key) {
            return Err(ApexError::DuplicateVariable {
                key,
                container: "factor",
            });
        }
    }
    Ok(())
}

/// Look up the scope of a factor in `values`.
pub fn gather<'a>(keys: &[Key], values: &'a Values) -> ApexResult<Vec<&'a Value>> {
    keys.iter().map(|&key| values.at(key)).collect()
}

fn check_residual(dim: usize, residual: &DVector<f64>) -> ApexResult<()> {
    if residual.len() != dim {
        return Err(ApexError::DimensionMismatch {
            context: "residual vs noise model".to_string(),
            expected: dim,
            actual: residual.len(),
        });
    }
    Ok(())
}
