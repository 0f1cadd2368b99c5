//! Manifold representations for variables that do not live in a vector space.
//!
//! Every variable kind supported by the engine is a Lie group with a flat tangent space:
//! - **Rⁿ**: Euclidean vectors (scalars, 2D/3D points), group operation is addition
//! - **SO(2)**: Rotations in 2D
//! - **SE(2)**: Rigid transformations in 2D
//! - **SO(3)**: Rotations in 3D
//!
//! Lie group M,° | dim | X ∈ M             | Exp(T)             | Comp. | Log
//! ------------- | --- | ----------------- | ------------------ | ----- | -----------------
//! n-D vector    | n   | v ∈ Rⁿ            | v                  | v₁+v₂ | v
//! Rotation      | 1   | R ∈ SO(2)         | R = exp([θ]x)      | R₁R₂  | atan2(R₁₀, R₀₀)
//! Rigid motion  | 3   | M = [R t; 0 1]    | Exp([ρ, θ])        | M₁M₂  | [V⁻¹(θ) t, θ]
//! Rotation      | 3   | R ∈ SO(3)         | R = exp([θ]x)      | R₁R₂  | θ·axis
//!
//! The conventions follow the [manif](https://github.com/artivis/manif) C++ library and use
//! right perturbations throughout:
//!
//! ```text
//! X ⊕ δ = X ∘ Exp(δ)            (retract)
//! Y ⊖ X = Log(X⁻¹ ∘ Y)          (local coordinates of Y around X)
//! ```
//!
//! so that `X ⊕ (Y ⊖ X) = Y` exactly, up to floating point.

use nalgebra::{DMatrix, DVector};
use std::fmt::{self, Debug};
use thiserror::Error;

pub mod rn;
pub mod se2;
pub mod so2;
pub mod so3;

/// Angles below this magnitude use Taylor expansions instead of closed forms.
pub(crate) const SMALL_ANGLE_THRESHOLD: f64 = 1e-5;

/// Errors that can occur during manifold operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManifoldError {
    /// Invalid tangent vector dimension
    #[error("Invalid tangent dimension: expected {expected}, got {actual}")]
    InvalidTangentDimension { expected: usize, actual: usize },

    /// Operands of a binary operation are different kinds of manifold
    #[error("Manifold type mismatch: {expected} vs {actual}")]
    TypeMismatch {
        expected: ManifoldType,
        actual: ManifoldType,
    },

    /// Numerical instability in computation
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Result type for manifold operations.
pub type ManifoldResult<T> = Result<T, ManifoldError>;

/// The closed set of manifold kinds a variable may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifoldType {
    /// One-dimensional Euclidean value
    Scalar,
    /// n-dimensional Euclidean vector
    RN,
    SO2,
    SE2,
    SO3,
}

impl fmt::Display for ManifoldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifoldType::Scalar => write!(f, "Scalar"),
            ManifoldType::RN => write!(f, "Rn"),
            ManifoldType::SO2 => write!(f, "SO2"),
            ManifoldType::SE2 => write!(f, "SE2"),
            ManifoldType::SO3 => write!(f, "SO3"),
        }
    }
}

/// Core trait for Lie group operations.
///
/// Only the operations needed to linearize factors are part of the trait: group
/// composition and inverse, the logarithm map, and the adjoint. Plus/minus and between
/// are derived from those.
pub trait LieGroup: Clone + Debug + PartialEq + Send + Sync {
    /// The tangent space vector type
    type TangentVector: Tangent<Self>;

    /// Degrees of freedom - dimension of the tangent space.
    fn tangent_dim(&self) -> usize;

    /// Compute the inverse g⁻¹ such that g ∘ g⁻¹ = e.
    fn inverse(&self) -> Self;

    /// Compose this element with another (group multiplication) g₁ ∘ g₂.
    fn compose(&self, other: &Self) -> Self;

    /// Logarithmic map from manifold to tangent space.
    fn log(&self) -> Self::TangentVector;

    /// Adjoint matrix Ad(g), with g ∘ Exp(φ) ∘ g⁻¹ = Exp(Ad(g) φ).
    fn adjoint(&self) -> DMatrix<f64>;

    /// Check whether two elements agree within `tolerance`.
    fn is_approx(&self, other: &Self, tolerance: f64) -> bool;

    /// Right plus operation: g ⊞ φ = g ∘ exp(φ^∧).
    fn plus(&self, tangent: &Self::TangentVector) -> Self {
        self.compose(&tangent.exp())
    }

    /// Right minus operation: g₁ ⊟ g₂ = log(g₂⁻¹ ∘ g₁)^∨.
    fn minus(&self, other: &Self) -> Self::TangentVector {
        other.between(self).log()
    }

    /// Compute g₁⁻¹ ∘ g₂ (relative transformation).
    fn between(&self, other: &Self) -> Self {
        self.inverse().compose(other)
    }
}

/// Trait for tangent space (Lie algebra) vectors of a Lie group `G`.
pub trait Tangent<G: LieGroup>: Clone + Debug + PartialEq {
    /// Exponential map to the Lie group: exp(φ^∧).
    fn exp(&self) -> G;

    /// Inverse of the right Jacobian Jr⁻¹(φ).
    ///
    /// For X = Exp(φ) this is ∂Log(X ∘ Exp(δ))/∂δ at δ = 0, the derivative of the local
    /// coordinates with respect to a right perturbation.
    fn right_jacobian_inv(&self) -> DMatrix<f64>;

    /// Build a tangent vector from its coordinate vector.
    fn from_vector(vector: &DVector<f64>) -> ManifoldResult<Self>;

    /// Coordinate vector of this tangent element.
    fn to_vector(&self) -> DVector<f64>;
}

/// Check a coordinate vector against the expected tangent dimension; entries must be
/// finite.
pub(crate) fn check_tangent_dim(expected: usize, vector: &DVector<f64>) -> ManifoldResult<()> {
    if vector.len() != expected {
        return Err(ManifoldError::InvalidTangentDimension {
            expected,
            actual: vector.len(),
        });
    }
    if let Some(bad) = vector.iter().find(|x| !x.is_finite()) {
        return Err(ManifoldError::NumericalInstability(format!(
            "non-finite tangent coordinate {bad}"
        )));
    }
    Ok(())
}

/// Skew-symmetric matrix [v]x of a 3-vector.
pub(crate) fn skew(v: &nalgebra::Vector3<f64>) -> nalgebra::Matrix3<f64> {
    nalgebra::Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}
