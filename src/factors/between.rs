//! Relative measurement between two variables of the same kind.

use crate::core::factors::{Evaluation, NonlinearFactor, check_scope};
use crate::core::key::Key;
use crate::core::noise_model::NoiseModel;
use crate::core::variable::Value;
use crate::error::{ApexError, ApexResult};
use nalgebra::DMatrix;

/// Between factor for any manifold value kind.
///
/// # Mathematical Formulation
///
/// Given two variables `x_i` and `x_j` and a measurement `z` of their relative value,
/// the residual is
///
/// ```text
/// r = log(z⁻¹ ∘ x_i⁻¹ ∘ x_j)
/// ```
///
/// For scalars and vectors this reduces to `r = (x_j - x_i) - z`, which makes this the
/// odometry and landmark-measurement factor of the simulated 2D world as well as the
/// pose-graph edge for SE(2), SO(2) and SO(3).
///
/// # Jacobian Computation
///
/// With `h = x_i⁻¹ ∘ x_j` and right perturbations `x ⊕ δ`:
///
/// ```text
/// ∂r/∂δ_j = Jr⁻¹(r)
/// ∂r/∂δ_i = -Jr⁻¹(r) · Ad(h⁻¹)
/// ```
///
/// The stacked Jacobian is `[∂r/∂δ_i | ∂r/∂δ_j]`, `dim × 2·dim`. On vector spaces both
/// `Jr⁻¹` and `Ad` are the identity, giving `[-I | I]`.
///
/// # Example
///
/// ```
/// use apex_linearization::core::key::Key;
/// use apex_linearization::core::noise_model::NoiseModel;
/// use apex_linearization::core::variable::Value;
/// use apex_linearization::factors::BetweenFactor;
///
/// // robot moved 1.5m along x, measured with 0.1m noise
/// let odometry = BetweenFactor::new(
///     Key::new('x', 1),
///     Key::new('x', 2),
///     Value::point2(1.5, 0.0),
///     NoiseModel::isotropic(2, 0.1).unwrap(),
/// )
/// .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BetweenFactor {
    keys: [Key; 2],
    measured: Value,
    noise_model: NoiseModel,
}

impl BetweenFactor {
    /// Relative measurement `measured` of `to` as seen from `from`.
    pub fn new(from: Key, to: Key, measured: Value, noise_model: NoiseModel) -> ApexResult<Self> {
        check_scope(&[from, to])?;
        if noise_model.dim() != measured.dim() {
            return Err(ApexError::DimensionMismatch {
                context: format!("between factor {from}-{to} noise model"),
                expected: measured.dim(),
                actual: noise_model.dim(),
            });
        }
        Ok(Self {
            keys: [from, to],
            measured,
            noise_model,
        })
    }

    pub fn measured(&self) -> &Value {
        &self.measured
    }
}

impl NonlinearFactor for BetweenFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    fn kind(&self) -> &'static str {
        "BetweenFactor"
    }

    fn measurement(&self) -> nalgebra::DVector<f64> {
        self.measured.coefficients()
    }

    fn evaluate(&self, values: &[&Value], compute_jacobian: bool) -> ApexResult<Evaluation> {
        let [x_i, x_j] = values else {
            return Err(ApexError::DimensionMismatch {
                context: "between factor arguments".to_string(),
                expected: 2,
                actual: values.len(),
            });
        };

        let predicted = x_i.between(x_j)?;
        if !compute_jacobian {
            return Ok((self.measured.local_coordinates(&predicted)?, None));
        }

        let (residual, jr_inv) = self.measured.local_coordinates_with_jacobian(&predicted)?;
        let adjoint_h_inv = x_j.between(x_i)?.adjoint();

        let dim = residual.len();
        let mut jacobian = DMatrix::<f64>::zeros(dim, 2 * dim);
        jacobian
            .view_mut((0, 0), (dim, dim))
            .copy_from(&(-&jr_inv * adjoint_h_inv));
        jacobian.view_mut((0, dim), (dim, dim)).copy_from(&jr_inv);

        Ok((residual, Some(jacobian)))
    }
}
