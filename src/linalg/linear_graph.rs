//! Linear factor graph and its sparse handoff to the solver.

use crate::core::ordering::Ordering;
use crate::error::{ApexError, ApexResult};
use crate::linalg::jacobian_factor::JacobianFactor;
use crate::linalg::{FaerMatrix, SparseMatrix};
use faer::sparse::{SparseColMat, Triplet};
use nalgebra::DVector;

/// Ordered sequence of [`JacobianFactor`]s, in the order of the nonlinear factors they
/// came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearFactorGraph {
    factors: Vec<JacobianFactor>,
}

impl LinearFactorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, factor: JacobianFactor) {
        self.factors.push(factor);
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&JacobianFactor> {
        self.factors.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JacobianFactor> {
        self.factors.iter()
    }

    /// Total number of rows over all factors.
    pub fn rows(&self) -> usize {
        self.factors.iter().map(JacobianFactor::rows).sum()
    }

    /// Sum of factor errors for a stacked step.
    pub fn error(&self, delta: &DVector<f64>, ordering: &Ordering) -> ApexResult<f64> {
        self.factors
            .iter()
            .map(|factor| factor.error(delta, ordering))
            .sum()
    }

    /// Factor-by-factor comparison within `tolerance`.
    pub fn equals(&self, other: &LinearFactorGraph, tolerance: f64) -> bool {
        self.len() == other.len()
            && self
                .factors
                .iter()
                .zip(&other.factors)
                .all(|(a, b)| a.equals(b, tolerance))
    }

    /// Rows of the stacked system that are exact equality constraints.
    pub fn constrained_rows(&self) -> Vec<usize> {
        let mut rows = Vec::new();
        let mut row_start = 0;
        for factor in &self.factors {
            rows.extend(factor.model().constrained_rows().into_iter().map(|r| row_start + r));
            row_start += factor.rows();
        }
        rows
    }

    /// Stack all factors into a sparse `A` and dense `b`.
    ///
    /// Rows follow factor order; the columns of each variable start at its offset in
    /// `ordering`. Each factor's rows are scaled by its model's weights, so soft rows of
    /// constrained factors end up whitened and hard rows keep weight 1 (see
    /// [`constrained_rows`](Self::constrained_rows)). Exact zeros are not stored.
    pub fn sparse_system(&self, ordering: &Ordering) -> ApexResult<(SparseMatrix, FaerMatrix)> {
        let nrows = self.rows();
        let ncols = ordering.total_dimension();
        let mut triplets = Vec::new();
        let mut rhs = FaerMatrix::zeros(nrows, 1);

        let mut row_start = 0;
        for factor in &self.factors {
            let weights = factor.model().weights();
            for (key, block) in factor.keys().iter().zip(factor.blocks()) {
                let col_start = ordering.offset_of(*key)?;
                let dim = ordering.dim_of(*key)?;
                if dim != block.ncols() {
                    return Err(ApexError::DimensionMismatch {
                        context: format!("columns of {key} in sparse system"),
                        expected: dim,
                        actual: block.ncols(),
                    });
                }
                for c in 0..block.ncols() {
                    for r in 0..block.nrows() {
                        let value = weights[r] * block[(r, c)];
                        if value != 0.0 {
                            triplets.push(Triplet::new(row_start + r, col_start + c, value));
                        }
                    }
                }
            }
            for (r, &value) in factor.b().iter().enumerate() {
                rhs[(row_start + r, 0)] = weights[r] * value;
            }
            row_start += factor.rows();
        }

        let a = SparseColMat::try_new_from_triplets(nrows, ncols, &triplets).map_err(|e| {
            ApexError::LinearAlgebra(format!("Failed to assemble sparse system: {:?}", e))
        })?;
        Ok((a, rhs))
    }
}

impl FromIterator<JacobianFactor> for LinearFactorGraph {
    fn from_iter<I: IntoIterator<Item = JacobianFactor>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LinearFactorGraph {
    type Item = &'a JacobianFactor;
    type IntoIter = std::slice::Iter<'a, JacobianFactor>;

    fn into_iter(self) -> Self::IntoIter {
        self.factors.iter()
    }
}
