//! Gaussian noise models expressed as whitening transforms.
//!
//! A noise model of dimension `m` describes the uncertainty of an `m`-dimensional
//! residual by per-component standard deviations. Whitening scales row `i` of a residual
//! or Jacobian by `1/σᵢ`, so that ordinary least squares on whitened quantities is the
//! maximum-likelihood problem:
//!
//! ```text
//! r_w = W r        J_w = W J        W = diag(1/σ₁, …, 1/σₘ)
//! ```
//!
//! # Constrained rows
//!
//! A [`NoiseModel::Constrained`] model may carry `σᵢ = 0`, marking component `i` as an
//! exact equality constraint. Such rows are never divided: [`NoiseModel::whiten`] passes
//! them through with weight 1. Linearization does not apply a model with hard rows at
//! all; the linear factor keeps the raw Jacobian and offset together with the model
//! itself, so the solver sees both the soft sigmas and which rows are equalities.

use crate::error::{ApexError, ApexResult};
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// Noise model of a factor's residual.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseModel {
    /// Identity whitening; the model of already-whitened factors
    Unit { dim: usize },
    /// Single sigma shared by every component
    Isotropic { dim: usize, sigma: f64 },
    /// Per-component sigmas, all strictly positive
    Diagonal { sigmas: DVector<f64> },
    /// Per-component sigmas where zero marks an exact constraint
    Constrained { sigmas: DVector<f64> },
}

fn check_dim(dim: usize) -> ApexResult<()> {
    if dim == 0 {
        return Err(ApexError::InvalidNoiseModel(
            "dimension must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn check_sigma(index: usize, sigma: f64, allow_zero: bool) -> ApexResult<()> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(ApexError::InvalidNoiseModel(format!(
            "sigma[{index}] = {sigma} must be finite and non-negative"
        )));
    }
    if sigma == 0.0 && !allow_zero {
        return Err(ApexError::InvalidNoiseModel(format!(
            "sigma[{index}] is zero; use a constrained model for exact components"
        )));
    }
    Ok(())
}

impl NoiseModel {
    /// Identity noise model of dimension `dim`.
    pub fn unit(dim: usize) -> ApexResult<Self> {
        check_dim(dim)?;
        Ok(NoiseModel::Unit { dim })
    }

    /// Isotropic model: the same `sigma` on all `dim` components.
    pub fn isotropic(dim: usize, sigma: f64) -> ApexResult<Self> {
        check_dim(dim)?;
        check_sigma(0, sigma, false)?;
        Ok(NoiseModel::Isotropic { dim, sigma })
    }

    /// Diagonal model from per-component sigmas.
    pub fn diagonal(sigmas: &[f64]) -> ApexResult<Self> {
        check_dim(sigmas.len())?;
        for (i, &sigma) in sigmas.iter().enumerate() {
            check_sigma(i, sigma, false)?;
        }
        Ok(NoiseModel::Diagonal {
            sigmas: DVector::from_column_slice(sigmas),
        })
    }

    /// Mixed model: zero sigmas are hard constraints, the others soft.
    pub fn constrained(sigmas: &[f64]) -> ApexResult<Self> {
        check_dim(sigmas.len())?;
        for (i, &sigma) in sigmas.iter().enumerate() {
            check_sigma(i, sigma, true)?;
        }
        Ok(NoiseModel::Constrained {
            sigmas: DVector::from_column_slice(sigmas),
        })
    }

    /// Fully constrained model: every component is exact.
    pub fn all_constrained(dim: usize) -> ApexResult<Self> {
        check_dim(dim)?;
        Ok(NoiseModel::Constrained {
            sigmas: DVector::zeros(dim),
        })
    }

    pub fn dim(&self) -> usize {
        match self {
            NoiseModel::Unit { dim } | NoiseModel::Isotropic { dim, .. } => *dim,
            NoiseModel::Diagonal { sigmas } | NoiseModel::Constrained { sigmas } => sigmas.len(),
        }
    }

    /// Per-component standard deviations.
    pub fn sigmas(&self) -> DVector<f64> {
        match self {
            NoiseModel::Unit { dim } => DVector::from_element(*dim, 1.0),
            NoiseModel::Isotropic { dim, sigma } => DVector::from_element(*dim, *sigma),
            NoiseModel::Diagonal { sigmas } | NoiseModel::Constrained { sigmas } => {
                sigmas.clone()
            }
        }
    }

    /// True when at least one component is an exact constraint.
    pub fn is_constrained(&self) -> bool {
        match self {
            NoiseModel::Constrained { sigmas } => sigmas.iter().any(|&s| s == 0.0),
            _ => false,
        }
    }

    /// Indices of the exact-constraint components.
    pub fn constrained_rows(&self) -> Vec<usize> {
        match self {
            NoiseModel::Constrained { sigmas } => sigmas
                .iter()
                .enumerate()
                .filter(|&(_, &s)| s == 0.0)
                .map(|(i, _)| i)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Row weights of the whitening operator: 1/σ, or 1 on constrained rows.
    pub fn weights(&self) -> DVector<f64> {
        self.sigmas()
            .map(|sigma| if sigma == 0.0 { 1.0 } else { 1.0 / sigma })
    }

    fn check_rows(&self, rows: usize) -> ApexResult<()> {
        if rows != self.dim() {
            return Err(ApexError::DimensionMismatch {
                context: "noise model whitening".to_string(),
                expected: self.dim(),
                actual: rows,
            });
        }
        Ok(())
    }

    /// Whitened residual W·r.
    pub fn whiten(&self, residual: &DVector<f64>) -> ApexResult<DVector<f64>> {
        self.check_rows(residual.len())?;
        Ok(residual.component_mul(&self.weights()))
    }

    /// Whitened Jacobian W·J (row scaling).
    pub fn whiten_matrix(&self, jacobian: &DMatrix<f64>) -> ApexResult<DMatrix<f64>> {
        self.check_rows(jacobian.nrows())?;
        let weights = self.weights();
        let mut whitened = jacobian.clone();
        for (i, mut row) in whitened.row_iter_mut().enumerate() {
            row *= weights[i];
        }
        Ok(whitened)
    }

    /// Inverse of [`whiten`](Self::whiten).
    pub fn unwhiten(&self, whitened: &DVector<f64>) -> ApexResult<DVector<f64>> {
        self.check_rows(whitened.len())?;
        Ok(whitened.component_div(&self.weights()))
    }

    /// ‖W·r‖²
    pub fn squared_mahalanobis(&self, residual: &DVector<f64>) -> ApexResult<f64> {
        Ok(self.whiten(residual)?.norm_squared())
    }

    /// Same dimension, same constrained rows and sigmas equal within `tolerance`.
    pub fn equals(&self, other: &NoiseModel, tolerance: f64) -> bool {
        if self.dim() != other.dim() || self.constrained_rows() != other.constrained_rows() {
            return false;
        }
        self.sigmas()
            .iter()
            .zip(other.sigmas().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseModel::Unit { dim } => write!(f, "Unit(dim: {dim})"),
            NoiseModel::Isotropic { dim, sigma } => {
                write!(f, "Isotropic(dim: {dim}, sigma: {sigma})")
            }
            NoiseModel::Diagonal { sigmas } => write!(f, "Diagonal(sigmas: {:?})", sigmas.as_slice()),
            NoiseModel::Constrained { sigmas } => {
                write!(f, "Constrained(sigmas: {:?})", sigmas.as_slice())
            }
        }
    }
}
