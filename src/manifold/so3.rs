//! SO(3) - Special Orthogonal Group in 3D
//!
//! SO(3) elements are stored as nalgebra unit quaternions; tangent elements are rotation
//! vectors θ·axis. The adjoint of a rotation is its rotation matrix.

use crate::manifold::{
    LieGroup, ManifoldResult, SMALL_ANGLE_THRESHOLD, Tangent, check_tangent_dim, skew,
};
use nalgebra::{DMatrix, DVector, Matrix3, UnitQuaternion, Vector3};
use std::fmt;

/// SO(3) group element representing rotations in 3D.
#[derive(Clone, Debug, PartialEq)]
pub struct SO3 {
    quaternion: UnitQuaternion<f64>,
}

impl fmt::Display for SO3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = self.quaternion;
        write!(
            f,
            "SO3(quaternion: [w: {:.4}, x: {:.4}, y: {:.4}, z: {:.4}])",
            q.w, q.i, q.j, q.k
        )
    }
}

/// SO(3) tangent space element (rotation vector).
#[derive(Clone, Debug, PartialEq)]
pub struct SO3Tangent {
    data: Vector3<f64>,
}

impl SO3 {
    /// Tangent space dimension
    pub const DOF: usize = 3;

    pub fn new(quaternion: UnitQuaternion<f64>) -> Self {
        SO3 { quaternion }
    }

    pub fn identity() -> Self {
        SO3::new(UnitQuaternion::identity())
    }

    /// Create from roll, pitch, yaw (radians).
    pub fn from_euler_angles(roll: f64, pitch: f64, yaw: f64) -> Self {
        SO3::new(UnitQuaternion::from_euler_angles(roll, pitch, yaw))
    }

    /// Create from an axis (normalized internally) and an angle.
    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Self {
        match nalgebra::Unit::try_new(*axis, f64::EPSILON) {
            Some(unit_axis) => SO3::new(UnitQuaternion::from_axis_angle(&unit_axis, angle)),
            None => SO3::identity(),
        }
    }

    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        self.quaternion
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.quaternion.to_rotation_matrix().into_inner()
    }

    /// Rotate a 3D vector.
    pub fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.quaternion * v
    }
}

impl LieGroup for SO3 {
    type TangentVector = SO3Tangent;

    fn tangent_dim(&self) -> usize {
        Self::DOF
    }

    fn inverse(&self) -> Self {
        SO3::new(self.quaternion.inverse())
    }

    fn compose(&self, other: &Self) -> Self {
        SO3::new(self.quaternion * other.quaternion)
    }

    fn log(&self) -> Self::TangentVector {
        SO3Tangent::new(self.quaternion.scaled_axis())
    }

    fn adjoint(&self) -> DMatrix<f64> {
        let r = self.rotation_matrix();
        DMatrix::from_column_slice(3, 3, r.as_slice())
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        self.quaternion.angle_to(&other.quaternion) <= tolerance
    }
}

impl SO3Tangent {
    pub fn new(data: Vector3<f64>) -> Self {
        SO3Tangent { data }
    }

    pub fn angle(&self) -> f64 {
        self.data.norm()
    }
}

impl Tangent<SO3> for SO3Tangent {
    fn exp(&self) -> SO3 {
        SO3::new(UnitQuaternion::from_scaled_axis(self.data))
    }

    /// Jr⁻¹(θ) = I + ½[θ]x + (1/θ² − (1 + cos θ)/(2θ sin θ)) [θ]x²
    fn right_jacobian_inv(&self) -> DMatrix<f64> {
        let theta = self.angle();
        let hat = skew(&self.data);
        let coefficient = if theta < SMALL_ANGLE_THRESHOLD {
            1.0 / 12.0 + theta * theta / 720.0
        } else {
            1.0 / (theta * theta) - (1.0 + theta.cos()) / (2.0 * theta * theta.sin())
        };
        let jac = Matrix3::identity() + 0.5 * hat + coefficient * hat * hat;
        DMatrix::from_column_slice(3, 3, jac.as_slice())
    }

    fn from_vector(vector: &DVector<f64>) -> ManifoldResult<Self> {
        check_tangent_dim(SO3::DOF, vector)?;
        Ok(SO3Tangent::new(Vector3::new(vector[0], vector[1], vector[2])))
    }

    fn to_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(self.data.as_slice())
    }
}
