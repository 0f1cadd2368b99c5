//! SO(2) - Special Orthogonal Group in 2D
//!
//! SO(2) elements are represented using nalgebra's UnitComplex internally.
//! SO(2) tangent elements are represented as a single angle in radians.
//!
//! SO(2) is commutative, so its adjoint and both Jacobians are the 1×1 identity.

use crate::manifold::{LieGroup, ManifoldResult, Tangent, check_tangent_dim};
use nalgebra::{DMatrix, DVector, Matrix2, UnitComplex, Vector2};
use std::fmt;

/// SO(2) group element representing rotations in 2D.
#[derive(Clone, Debug, PartialEq)]
pub struct SO2 {
    /// Internal representation as a unit complex number
    complex: UnitComplex<f64>,
}

impl fmt::Display for SO2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SO2(angle: {:.4})", self.complex.angle())
    }
}

/// SO(2) tangent space element: an angle in radians.
#[derive(Clone, Debug, PartialEq)]
pub struct SO2Tangent {
    data: f64,
}

impl SO2 {
    /// Tangent space dimension
    pub const DOF: usize = 1;

    pub fn new(complex: UnitComplex<f64>) -> Self {
        SO2 { complex }
    }

    /// Create SO(2) from an angle in radians.
    pub fn from_angle(angle: f64) -> Self {
        SO2::new(UnitComplex::from_angle(angle))
    }

    pub fn identity() -> Self {
        SO2::new(UnitComplex::identity())
    }

    /// Rotation angle in (-π, π].
    pub fn angle(&self) -> f64 {
        self.complex.angle()
    }

    pub fn rotation_matrix(&self) -> Matrix2<f64> {
        self.complex.to_rotation_matrix().into_inner()
    }

    /// Rotate a 2D vector.
    pub fn rotate(&self, v: &Vector2<f64>) -> Vector2<f64> {
        self.complex * v
    }
}

impl LieGroup for SO2 {
    type TangentVector = SO2Tangent;

    fn tangent_dim(&self) -> usize {
        Self::DOF
    }

    fn inverse(&self) -> Self {
        SO2::new(self.complex.inverse())
    }

    fn compose(&self, other: &Self) -> Self {
        SO2::new(self.complex * other.complex)
    }

    fn log(&self) -> Self::TangentVector {
        SO2Tangent::new(self.complex.angle())
    }

    fn adjoint(&self) -> DMatrix<f64> {
        DMatrix::identity(1, 1)
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        self.complex.angle_to(&other.complex).abs() <= tolerance
    }
}

impl SO2Tangent {
    pub fn new(angle: f64) -> Self {
        SO2Tangent { data: angle }
    }

    pub fn angle(&self) -> f64 {
        self.data
    }
}

impl Tangent<SO2> for SO2Tangent {
    fn exp(&self) -> SO2 {
        SO2::from_angle(self.data)
    }

    fn right_jacobian_inv(&self) -> DMatrix<f64> {
        DMatrix::identity(1, 1)
    }

    fn from_vector(vector: &DVector<f64>) -> ManifoldResult<Self> {
        check_tangent_dim(SO2::DOF, vector)?;
        Ok(SO2Tangent::new(vector[0]))
    }

    fn to_vector(&self) -> DVector<f64> {
        DVector::from_element(1, self.data)
    }
}
