//! Whitened linear factor `A·δ ≈ b`.

use crate::core::key::Key;
use crate::core::noise_model::NoiseModel;
use crate::core::ordering::Ordering;
use crate::error::{ApexError, ApexResult};
use nalgebra::{DMatrix, DVector};

/// Gaussian factor on the tangent steps of its variables.
///
/// Factors from soft noise models are already whitened and carry a unit model. Factors
/// from constrained models keep the raw Jacobian and offset and carry the constrained
/// model, which [`error`](Self::error) and the sparse handoff apply.
///
/// Blocks are stored in scope order. Each block has `rows()` rows and as many columns as
/// the tangent dimension of its variable; `indices` holds the block index of each
/// variable in the ordering used for linearization.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianFactor {
    keys: Vec<Key>,
    indices: Vec<usize>,
    blocks: Vec<DMatrix<f64>>,
    b: DVector<f64>,
    model: NoiseModel,
}

impl JacobianFactor {
    /// Build from `(key, block index, block)` terms. Every block must have `b.len()` rows
    /// and the model must have dimension `b.len()`.
    pub fn new(
        terms: Vec<(Key, usize, DMatrix<f64>)>,
        b: DVector<f64>,
        model: NoiseModel,
    ) -> ApexResult<Self> {
        if model.dim() != b.len() {
            return Err(ApexError::DimensionMismatch {
                context: "linear factor noise model".to_string(),
                expected: b.len(),
                actual: model.dim(),
            });
        }

        let mut keys = Vec::with_capacity(terms.len());
        let mut indices = Vec::with_capacity(terms.len());
        let mut blocks = Vec::with_capacity(terms.len());
        for (key, index, block) in terms {
            if block.nrows() != b.len() {
                return Err(ApexError::DimensionMismatch {
                    context: format!("rows of Jacobian block for {key}"),
                    expected: b.len(),
                    actual: block.nrows(),
                });
            }
            keys.push(key);
            indices.push(index);
            blocks.push(block);
        }

        Ok(Self {
            keys,
            indices,
            blocks,
            b,
            model,
        })
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Ordering block index of each term.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Jacobian block of the `position`-th term.
    pub fn block(&self, position: usize) -> Option<&DMatrix<f64>> {
        self.blocks.get(position)
    }

    /// Jacobian block attached to `key`, if it is in scope.
    pub fn block_for(&self, key: Key) -> Option<&DMatrix<f64>> {
        self.keys
            .iter()
            .position(|&k| k == key)
            .map(|position| &self.blocks[position])
    }

    pub fn blocks(&self) -> &[DMatrix<f64>] {
        &self.blocks
    }

    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    /// Unit model, or the constrained model of the originating factor.
    pub fn model(&self) -> &NoiseModel {
        &self.model
    }

    pub fn rows(&self) -> usize {
        self.b.len()
    }

    /// Total number of columns over all blocks.
    pub fn cols(&self) -> usize {
        self.blocks.iter().map(|block| block.ncols()).sum()
    }

    /// `A·δ - b` for a stacked step laid out by `ordering`.
    pub fn residual(&self, delta: &DVector<f64>, ordering: &Ordering) -> ApexResult<DVector<f64>> {
        let mut residual = -self.b.clone();
        for (key, block) in self.keys.iter().zip(&self.blocks) {
            let offset = ordering.offset_of(*key)?;
            if offset + block.ncols() > delta.len() {
                return Err(ApexError::DimensionMismatch {
                    context: format!("step for {key}"),
                    expected: offset + block.ncols(),
                    actual: delta.len(),
                });
            }
            residual += block * delta.rows(offset, block.ncols());
        }
        Ok(residual)
    }

    /// `0.5 · ‖W·(A·δ - b)‖²`
    pub fn error(&self, delta: &DVector<f64>, ordering: &Ordering) -> ApexResult<f64> {
        Ok(0.5 * self.model.squared_mahalanobis(&self.residual(delta, ordering)?)?)
    }

    /// Same block indices, blocks and offset within `tolerance`, and equal models.
    pub fn equals(&self, other: &JacobianFactor, tolerance: f64) -> bool {
        let close = |a: &[f64], b: &[f64]| {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= tolerance)
        };
        self.indices == other.indices
            && self.model.equals(&other.model, tolerance)
            && close(self.b.as_slice(), other.b.as_slice())
            && self
                .blocks
                .iter()
                .zip(&other.blocks)
                .all(|(a, b)| a.shape() == b.shape() && close(a.as_slice(), b.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor() -> ApexResult<JacobianFactor> {
        JacobianFactor::new(
            vec![
                (Key::new('x', 1), 0, DMatrix::identity(2, 2) * -10.0),
                (Key::new('x', 2), 1, DMatrix::identity(2, 2) * 10.0),
            ],
            DVector::from_vec(vec![2.0, -1.0]),
            NoiseModel::unit(2)?,
        )
    }

    #[test]
    fn test_accessors() -> ApexResult<()> {
        let f = factor()?;
        assert_eq!(f.rows(), 2);
        assert_eq!(f.cols(), 4);
        assert_eq!(f.indices(), &[0, 1]);
        assert_eq!(f.block_for(Key::new('x', 2)), Some(&(DMatrix::identity(2, 2) * 10.0)));
        assert_eq!(f.block_for(Key::new('l', 1)), None);
        Ok(())
    }

    #[test]
    fn test_block_rows_must_match_b() -> ApexResult<()> {
        let result = JacobianFactor::new(
            vec![(Key::new('x', 1), 0, DMatrix::identity(3, 2))],
            DVector::zeros(2),
            NoiseModel::unit(2)?,
        );
        assert!(matches!(result, Err(ApexError::DimensionMismatch { .. })));
        Ok(())
    }

    #[test]
    fn test_error_at_zero_step() -> ApexResult<()> {
        let f = factor()?;
        let ordering = Ordering::from_keys([(Key::new('x', 1), 2), (Key::new('x', 2), 2)])?;
        let error = f.error(&DVector::zeros(4), &ordering)?;
        assert!((error - 2.5).abs() < 1e-12);

        // δ solving A·δ = b exactly
        let delta = DVector::from_vec(vec![0.0, 0.0, 0.2, -0.1]);
        assert!(f.error(&delta, &ordering)? < 1e-20);
        Ok(())
    }

    #[test]
    fn test_equals() -> ApexResult<()> {
        let f = factor()?;
        let mut g = factor()?;
        assert!(f.equals(&g, 1e-9));
        g.b[0] += 1e-6;
        assert!(!f.equals(&g, 1e-9));
        assert!(f.equals(&g, 1e-5));
        Ok(())
    }
}
