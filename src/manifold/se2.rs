//! SE(2) - Special Euclidean Group in 2D
//!
//! SE(2) elements are rigid body transformations in 2D, stored as an SO(2) rotation and a
//! translation. Tangent elements are `[ρx, ρy, θ]`: translational part first, rotation
//! last, as in manif.
//!
//! ```text
//! Exp([ρ, θ]) = (R(θ), V(θ) ρ)        V(θ) = 1/θ [ sinθ  -(1-cosθ) ; 1-cosθ  sinθ ]
//! Log(R, t)   = [V(θ)⁻¹ t, θ]
//! ```

use crate::manifold::so2::SO2;
use crate::manifold::{LieGroup, ManifoldResult, SMALL_ANGLE_THRESHOLD, Tangent, check_tangent_dim};
use nalgebra::{DMatrix, DVector, Matrix2, Vector2, Vector3};
use std::fmt;

/// SE(2) group element representing rigid body transformations in 2D.
#[derive(Clone, Debug, PartialEq)]
pub struct SE2 {
    translation: Vector2<f64>,
    rotation: SO2,
}

impl fmt::Display for SE2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SE2(translation: [{:.4}, {:.4}], rotation: {:.4})",
            self.translation.x,
            self.translation.y,
            self.angle()
        )
    }
}

/// SE(2) tangent space element `[ρx, ρy, θ]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SE2Tangent {
    data: Vector3<f64>,
}

/// V(θ) as the pair (sinθ/θ, (1-cosθ)/θ).
fn v_coefficients(theta: f64) -> (f64, f64) {
    if theta.abs() < SMALL_ANGLE_THRESHOLD {
        let theta_sq = theta * theta;
        (1.0 - theta_sq / 6.0, theta / 2.0 - theta * theta_sq / 24.0)
    } else {
        (theta.sin() / theta, (1.0 - theta.cos()) / theta)
    }
}

/// V(θ)⁻¹ = [a b; -b a] with a = (θ/2)·cot(θ/2), b = θ/2. Returns (a, da/dθ).
fn v_inverse_coefficient(theta: f64) -> (f64, f64) {
    if theta.abs() < SMALL_ANGLE_THRESHOLD {
        let theta_sq = theta * theta;
        (
            1.0 - theta_sq / 12.0,
            -theta / 6.0 - theta * theta_sq / 180.0,
        )
    } else {
        let half = 0.5 * theta;
        let (sin_half, cos_half) = half.sin_cos();
        let cot_half = cos_half / sin_half;
        (
            half * cot_half,
            0.5 * (cot_half - half / (sin_half * sin_half)),
        )
    }
}

impl SE2 {
    /// Tangent space dimension
    pub const DOF: usize = 3;

    pub fn new(translation: Vector2<f64>, rotation: SO2) -> Self {
        SE2 {
            translation,
            rotation,
        }
    }

    /// Create SE(2) from x, y and heading angle.
    pub fn from_xy_angle(x: f64, y: f64, theta: f64) -> Self {
        SE2::new(Vector2::new(x, y), SO2::from_angle(theta))
    }

    pub fn identity() -> Self {
        SE2::new(Vector2::zeros(), SO2::identity())
    }

    pub fn translation(&self) -> Vector2<f64> {
        self.translation
    }

    pub fn rotation(&self) -> &SO2 {
        &self.rotation
    }

    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    pub fn x(&self) -> f64 {
        self.translation.x
    }

    pub fn y(&self) -> f64 {
        self.translation.y
    }

    /// Transform a 2D point: R p + t.
    pub fn transform_point(&self, p: &Vector2<f64>) -> Vector2<f64> {
        self.rotation.rotate(p) + self.translation
    }
}

impl LieGroup for SE2 {
    type TangentVector = SE2Tangent;

    fn tangent_dim(&self) -> usize {
        Self::DOF
    }

    fn inverse(&self) -> Self {
        let rotation_inv = self.rotation.inverse();
        let translation = -rotation_inv.rotate(&self.translation);
        SE2::new(translation, rotation_inv)
    }

    fn compose(&self, other: &Self) -> Self {
        SE2::new(
            self.translation + self.rotation.rotate(&other.translation),
            self.rotation.compose(&other.rotation),
        )
    }

    fn log(&self) -> Self::TangentVector {
        let theta = self.angle();
        let (a, _) = v_inverse_coefficient(theta);
        let b = 0.5 * theta;
        let v_inv = Matrix2::new(a, b, -b, a);
        let rho = v_inv * self.translation;
        SE2Tangent::new(rho.x, rho.y, theta)
    }

    /// Ad = [R  (y, -x)ᵀ; 0 0 1]
    fn adjoint(&self) -> DMatrix<f64> {
        let r = self.rotation.rotation_matrix();
        let mut adj = DMatrix::<f64>::zeros(3, 3);
        adj.view_mut((0, 0), (2, 2)).copy_from(&r);
        adj[(0, 2)] = self.translation.y;
        adj[(1, 2)] = -self.translation.x;
        adj[(2, 2)] = 1.0;
        adj
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        (self.translation - other.translation).amax() <= tolerance
            && self.rotation.is_approx(&other.rotation, tolerance)
    }
}

impl SE2Tangent {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        SE2Tangent {
            data: Vector3::new(x, y, theta),
        }
    }

    pub fn rho(&self) -> Vector2<f64> {
        Vector2::new(self.data.x, self.data.y)
    }

    pub fn angle(&self) -> f64 {
        self.data.z
    }
}

impl Tangent<SE2> for SE2Tangent {
    fn exp(&self) -> SE2 {
        let theta = self.angle();
        let (a, b) = v_coefficients(theta);
        let v = Matrix2::new(a, -b, b, a);
        SE2::new(v * self.rho(), SO2::from_angle(theta))
    }

    /// Jr⁻¹ = [V(θ)⁻¹ R(θ)   dV⁻¹/dθ · t ; 0 0 1] with (R, t) = Exp(φ).
    fn right_jacobian_inv(&self) -> DMatrix<f64> {
        let theta = self.angle();
        let element = self.exp();
        let (a, da) = v_inverse_coefficient(theta);
        let b = 0.5 * theta;
        let v_inv = Matrix2::new(a, b, -b, a);
        let dv_inv = Matrix2::new(da, 0.5, -0.5, da);

        let top_left = v_inv * element.rotation.rotation_matrix();
        let top_right = dv_inv * element.translation;

        let mut jac = DMatrix::<f64>::zeros(3, 3);
        jac.view_mut((0, 0), (2, 2)).copy_from(&top_left);
        jac[(0, 2)] = top_right.x;
        jac[(1, 2)] = top_right.y;
        jac[(2, 2)] = 1.0;
        jac
    }

    fn from_vector(vector: &DVector<f64>) -> ManifoldResult<Self> {
        check_tangent_dim(SE2::DOF, vector)?;
        Ok(SE2Tangent::new(vector[0], vector[1], vector[2]))
    }

    fn to_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(self.data.as_slice())
    }
}
