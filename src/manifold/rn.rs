//! Rⁿ - Euclidean vector space as a (commutative) Lie group
//!
//! The group operation is vector addition, so plus/minus reduce to ordinary addition and
//! subtraction and every Jacobian is the identity. Scalars and 2D/3D points are all `Rn`.

use crate::manifold::{LieGroup, ManifoldResult, Tangent, check_tangent_dim};
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// Euclidean vector element.
#[derive(Clone, Debug, PartialEq)]
pub struct Rn {
    data: DVector<f64>,
}

/// Tangent vector of Rⁿ, which is again a vector of Rⁿ.
#[derive(Clone, Debug, PartialEq)]
pub struct RnTangent {
    data: DVector<f64>,
}

impl fmt::Display for Rn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rn({:?})", self.data.as_slice())
    }
}

impl Rn {
    pub fn new(data: DVector<f64>) -> Self {
        Rn { data }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Rn::new(DVector::from_column_slice(values))
    }

    pub fn data(&self) -> &DVector<f64> {
        &self.data
    }
}

impl From<DVector<f64>> for Rn {
    fn from(data: DVector<f64>) -> Self {
        Rn::new(data)
    }
}

impl LieGroup for Rn {
    type TangentVector = RnTangent;

    fn tangent_dim(&self) -> usize {
        self.data.len()
    }

    fn inverse(&self) -> Self {
        Rn::new(-&self.data)
    }

    fn compose(&self, other: &Self) -> Self {
        Rn::new(&self.data + &other.data)
    }

    fn log(&self) -> Self::TangentVector {
        RnTangent {
            data: self.data.clone(),
        }
    }

    fn adjoint(&self) -> DMatrix<f64> {
        DMatrix::identity(self.data.len(), self.data.len())
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    fn minus(&self, other: &Self) -> Self::TangentVector {
        RnTangent {
            data: &self.data - &other.data,
        }
    }
}

impl RnTangent {
    pub fn new(data: DVector<f64>) -> Self {
        RnTangent { data }
    }
}

impl Tangent<Rn> for RnTangent {
    fn exp(&self) -> Rn {
        Rn::new(self.data.clone())
    }

    fn right_jacobian_inv(&self) -> DMatrix<f64> {
        DMatrix::identity(self.data.len(), self.data.len())
    }

    fn from_vector(vector: &DVector<f64>) -> ManifoldResult<Self> {
        check_tangent_dim(vector.len(), vector)?;
        Ok(RnTangent::new(vector.clone()))
    }

    fn to_vector(&self) -> DVector<f64> {
        self.data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rn_plus_minus_are_addition() {
        let a = Rn::from_slice(&[1.0, 2.0, 3.0]);
        let b = Rn::from_slice(&[0.5, -1.0, 4.0]);

        let diff = b.minus(&a);
        assert_eq!(diff.to_vector(), DVector::from_vec(vec![-0.5, -3.0, 1.0]));

        let back = a.plus(&diff);
        assert!(back.is_approx(&b, 1e-15));
    }

    #[test]
    fn test_rn_jacobians_are_identity() {
        let a = Rn::from_slice(&[1.0, 2.0]);
        assert_eq!(a.adjoint(), DMatrix::identity(2, 2));
        assert_eq!(a.log().right_jacobian_inv(), DMatrix::identity(2, 2));
    }

    #[test]
    fn test_rn_is_approx_rejects_dimension_change() {
        let a = Rn::from_slice(&[1.0, 2.0]);
        let b = Rn::from_slice(&[1.0, 2.0, 0.0]);
        assert!(!a.is_approx(&b, 1.0));
    }
}
