//! Manifold-valued variables.
//!
//! [`Value`] is the closed set of variable kinds the engine linearizes over. Each variant
//! wraps a Lie group element; retract and local coordinates dispatch to the group's
//! right plus/minus so that `x.retract(&x.local_coordinates(&y)?)? == y`.

use crate::manifold::rn::{Rn, RnTangent};
use crate::manifold::se2::{SE2, SE2Tangent};
use crate::manifold::so2::{SO2, SO2Tangent};
use crate::manifold::so3::{SO3, SO3Tangent};
use crate::manifold::{
    LieGroup, ManifoldError, ManifoldResult, ManifoldType, Tangent, check_tangent_dim,
};
use nalgebra::{DMatrix, DVector, Vector2, Vector3};
use std::fmt;

/// Represents the different types of values a variable can hold
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Single real number (Lie scalar)
    Scalar(f64),
    /// Euclidean vector, including 2D and 3D points
    Vector(Rn),
    /// SO(2) - 2D rotations
    SO2(SO2),
    /// SE(2) - 2D rigid transformations
    SE2(SE2),
    /// SO(3) - 3D rotations
    SO3(SO3),
}

/// Dispatch a binary group operation over two values of the same kind.
macro_rules! same_kind {
    ($lhs:expr, $rhs:expr, |$a:ident, $b:ident| $body:expr) => {
        match ($lhs, $rhs) {
            (Value::Scalar(x), Value::Scalar(y)) => {
                let $a = &Rn::from_slice(&[*x]);
                let $b = &Rn::from_slice(&[*y]);
                Ok($body)
            }
            (Value::Vector($a), Value::Vector($b)) if $a.tangent_dim() == $b.tangent_dim() => {
                Ok($body)
            }
            (Value::Vector(a), Value::Vector(b)) => Err(ManifoldError::InvalidTangentDimension {
                expected: a.tangent_dim(),
                actual: b.tangent_dim(),
            }),
            (Value::SO2($a), Value::SO2($b)) => Ok($body),
            (Value::SE2($a), Value::SE2($b)) => Ok($body),
            (Value::SO3($a), Value::SO3($b)) => Ok($body),
            (a, b) => Err(ManifoldError::TypeMismatch {
                expected: a.manifold_type(),
                actual: b.manifold_type(),
            }),
        }
    };
}

fn minus_parts<G: LieGroup>(a: &G, b: &G) -> (DVector<f64>, DMatrix<f64>) {
    let tangent = a.minus(b);
    let jac = tangent.right_jacobian_inv();
    (tangent.to_vector(), jac)
}

impl Value {
    /// Convenience constructor for a 2D point.
    pub fn point2(x: f64, y: f64) -> Self {
        Value::Vector(Rn::from_slice(&[x, y]))
    }

    /// Convenience constructor for a 3D point.
    pub fn point3(x: f64, y: f64, z: f64) -> Self {
        Value::Vector(Rn::from_slice(&[x, y, z]))
    }

    pub fn vector(values: &[f64]) -> Self {
        Value::Vector(Rn::from_slice(values))
    }

    pub fn manifold_type(&self) -> ManifoldType {
        match self {
            Value::Scalar(_) => ManifoldType::Scalar,
            Value::Vector(_) => ManifoldType::RN,
            Value::SO2(_) => ManifoldType::SO2,
            Value::SE2(_) => ManifoldType::SE2,
            Value::SO3(_) => ManifoldType::SO3,
        }
    }

    /// Tangent space dimension
    pub fn dim(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Vector(v) => v.tangent_dim(),
            Value::SO2(_) => SO2::DOF,
            Value::SE2(_) => SE2::DOF,
            Value::SO3(_) => SO3::DOF,
        }
    }

    /// Apply a tangent perturbation: self ⊕ δ.
    pub fn retract(&self, delta: &DVector<f64>) -> ManifoldResult<Value> {
        check_tangent_dim(self.dim(), delta)?;
        let value = match self {
            Value::Scalar(x) => Value::Scalar(x + delta[0]),
            Value::Vector(v) => {
                Value::Vector(v.plus(&<RnTangent as Tangent<Rn>>::from_vector(delta)?))
            }
            Value::SO2(r) => {
                Value::SO2(r.plus(&<SO2Tangent as Tangent<SO2>>::from_vector(delta)?))
            }
            Value::SE2(p) => {
                Value::SE2(p.plus(&<SE2Tangent as Tangent<SE2>>::from_vector(delta)?))
            }
            Value::SO3(r) => {
                Value::SO3(r.plus(&<SO3Tangent as Tangent<SO3>>::from_vector(delta)?))
            }
        };
        Ok(value)
    }

    /// Tangent vector δ such that `self.retract(δ) == other`.
    pub fn local_coordinates(&self, other: &Value) -> ManifoldResult<DVector<f64>> {
        same_kind!(self, other, |a, b| b.minus(a).to_vector())
    }

    /// Local coordinates of `other` around `self` together with their derivative with
    /// respect to a right perturbation of `other`, i.e. Jr⁻¹ of the result.
    pub fn local_coordinates_with_jacobian(
        &self,
        other: &Value,
    ) -> ManifoldResult<(DVector<f64>, DMatrix<f64>)> {
        same_kind!(self, other, |a, b| minus_parts(b, a))
    }

    /// Relative element self⁻¹ ∘ other, of the same kind.
    pub fn between(&self, other: &Value) -> ManifoldResult<Value> {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(b - a)),
            _ => same_kind!(self, other, |a, b| a.between(b).into_value()),
        }
    }

    /// Adjoint matrix of the underlying group element.
    pub fn adjoint(&self) -> DMatrix<f64> {
        match self {
            Value::Scalar(_) => DMatrix::identity(1, 1),
            Value::Vector(v) => v.adjoint(),
            Value::SO2(r) => r.adjoint(),
            Value::SE2(p) => p.adjoint(),
            Value::SO3(r) => r.adjoint(),
        }
    }

    /// Check whether two values are of the same kind and agree within `tolerance`.
    pub fn is_approx(&self, other: &Value, tolerance: f64) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => (a - b).abs() <= tolerance,
            (Value::Vector(a), Value::Vector(b)) => a.is_approx(b, tolerance),
            (Value::SO2(a), Value::SO2(b)) => a.is_approx(b, tolerance),
            (Value::SE2(a), Value::SE2(b)) => a.is_approx(b, tolerance),
            (Value::SO3(a), Value::SO3(b)) => a.is_approx(b, tolerance),
            _ => false,
        }
    }

    /// Euclidean coordinates of a `Vector` or `Scalar` value.
    pub fn as_vector(&self) -> Option<DVector<f64>> {
        match self {
            Value::Scalar(x) => Some(DVector::from_element(1, *x)),
            Value::Vector(v) => Some(v.data().clone()),
            _ => None,
        }
    }

    /// Flat parameters: entries for scalars and vectors, `[θ]` for SO2, `[x, y, θ]` for
    /// SE2 and `[w, x, y, z]` for SO3.
    pub fn coefficients(&self) -> DVector<f64> {
        match self {
            Value::Scalar(x) => DVector::from_element(1, *x),
            Value::Vector(v) => v.data().clone(),
            Value::SO2(r) => DVector::from_element(1, r.angle()),
            Value::SE2(p) => DVector::from_vec(vec![p.x(), p.y(), p.angle()]),
            Value::SO3(r) => {
                let q = r.quaternion();
                DVector::from_vec(vec![q.w, q.i, q.j, q.k])
            }
        }
    }

    pub fn as_point2(&self) -> Option<Vector2<f64>> {
        match self {
            Value::Vector(v) if v.tangent_dim() == 2 => {
                Some(Vector2::new(v.data()[0], v.data()[1]))
            }
            _ => None,
        }
    }

    pub fn as_point3(&self) -> Option<Vector3<f64>> {
        match self {
            Value::Vector(v) if v.tangent_dim() == 3 => {
                Some(Vector3::new(v.data()[0], v.data()[1], v.data()[2]))
            }
            _ => None,
        }
    }
}

/// Conversion of a group element back into the matching [`Value`] variant.
trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Rn {
    fn into_value(self) -> Value {
        Value::Vector(self)
    }
}

impl IntoValue for SO2 {
    fn into_value(self) -> Value {
        Value::SO2(self)
    }
}

impl IntoValue for SE2 {
    fn into_value(self) -> Value {
        Value::SE2(self)
    }
}

impl IntoValue for SO3 {
    fn into_value(self) -> Value {
        Value::SO3(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(x) => write!(f, "Scalar({x})"),
            Value::Vector(v) => write!(f, "{v}"),
            Value::SO2(r) => write!(f, "{r}"),
            Value::SE2(p) => write!(f, "{p}"),
            Value::SO3(r) => write!(f, "{r}"),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<DVector<f64>> for Value {
    fn from(v: DVector<f64>) -> Self {
        Value::Vector(Rn::new(v))
    }
}

impl From<SO2> for Value {
    fn from(r: SO2) -> Self {
        Value::SO2(r)
    }
}

impl From<SE2> for Value {
    fn from(p: SE2) -> Self {
        Value::SE2(p)
    }
}

impl From<SO3> for Value {
    fn from(r: SO3) -> Self {
        Value::SO3(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-9;

    fn random_tangent(rng: &mut StdRng, dim: usize, scale: f64) -> DVector<f64> {
        DVector::from_fn(dim, |_, _| rng.random_range(-scale..scale))
    }

    fn sample_values() -> Vec<Value> {
        vec![
            Value::Scalar(2.0),
            Value::point2(1.0, -2.0),
            Value::point3(0.1, 0.2, 0.3),
            Value::SO2(SO2::from_angle(0.7)),
            Value::SE2(SE2::from_xy_angle(1.0, 2.0, PI / 4.0)),
            Value::SO3(SO3::from_euler_angles(0.1, -0.4, 1.2)),
        ]
    }

    #[test]
    fn test_lie_scalar_construction_and_logmap() -> Result<(), ManifoldError> {
        let lie1 = Value::Scalar(1.0);
        let lie2 = Value::Scalar(3.0);
        assert_eq!(lie1.dim(), 1);
        assert!(Value::Scalar(2.0).is_approx(&Value::Scalar(2.0), 0.0));
        assert_eq!(lie1.local_coordinates(&lie2)?, DVector::from_element(1, 2.0));
        Ok(())
    }

    #[test]
    fn test_retract_local_coordinates_inverse_law() -> Result<(), ManifoldError> {
        let mut rng = StdRng::seed_from_u64(7);
        for value in sample_values() {
            for _ in 0..20 {
                let delta = random_tangent(&mut rng, value.dim(), 1.0);
                let moved = value.retract(&delta)?;
                let recovered = value.local_coordinates(&moved)?;
                assert!(
                    (&recovered - &delta).norm() < TOLERANCE * (1.0 + delta.norm()),
                    "{value}: {delta} vs {recovered}"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_retract_of_local_coordinates_reaches_target() -> Result<(), ManifoldError> {
        let from = Value::SE2(SE2::from_xy_angle(1.0, 2.0, 0.3));
        let to = Value::SE2(SE2::from_xy_angle(-0.5, 4.0, 2.9));
        let delta = from.local_coordinates(&to)?;
        assert!(from.retract(&delta)?.is_approx(&to, TOLERANCE));
        Ok(())
    }

    #[test]
    fn test_kind_mismatch_is_an_error() {
        let a = Value::point2(1.0, 2.0);
        let b = Value::SO2(SO2::from_angle(0.1));
        assert_eq!(
            a.local_coordinates(&b),
            Err(ManifoldError::TypeMismatch {
                expected: ManifoldType::RN,
                actual: ManifoldType::SO2
            })
        );

        let c = Value::point3(1.0, 2.0, 3.0);
        assert!(matches!(
            a.local_coordinates(&c),
            Err(ManifoldError::InvalidTangentDimension { .. })
        ));
    }

    #[test]
    fn test_retract_rejects_wrong_delta_dimension() {
        let pose = Value::SE2(SE2::identity());
        let delta = DVector::from_vec(vec![0.1, 0.2]);
        assert!(pose.retract(&delta).is_err());
    }

    #[test]
    fn test_vector_retract_is_addition() -> Result<(), ManifoldError> {
        let p = Value::point2(1.0, 2.0);
        let moved = p.retract(&DVector::from_vec(vec![0.5, -1.0]))?;
        assert_eq!(moved.as_point2(), Some(Vector2::new(1.5, 1.0)));
        assert_eq!(moved.as_point3(), None);

        let q = Value::point3(1.0, 2.0, 3.0).retract(&DVector::from_vec(vec![0.5, 0.0, -1.0]))?;
        assert_eq!(q.as_point3(), Some(Vector3::new(1.5, 2.0, 2.0)));
        assert_eq!(q.as_point2(), None);
        Ok(())
    }

    #[test]
    fn test_between_matches_group_relative() -> Result<(), ManifoldError> {
        let a = Value::Scalar(1.5);
        let b = Value::Scalar(4.0);
        assert_eq!(a.between(&b)?, Value::Scalar(2.5));

        let p = Value::point2(1.0, 1.0);
        let q = Value::point2(3.0, -1.0);
        assert_eq!(p.between(&q)?.as_point2(), Some(Vector2::new(2.0, -2.0)));
        Ok(())
    }

    #[test]
    fn test_zero_dimensional_vector() -> Result<(), ManifoldError> {
        let empty = Value::vector(&[]);
        assert_eq!(empty.dim(), 0);
        let moved = empty.retract(&DVector::zeros(0))?;
        assert!(moved.is_approx(&empty, 0.0));
        Ok(())
    }
}
