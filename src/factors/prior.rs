//! Unary prior on a single variable.

use crate::core::factors::{Evaluation, NonlinearFactor};
use crate::core::key::Key;
use crate::core::noise_model::NoiseModel;
use crate::core::variable::Value;
use crate::error::{ApexError, ApexResult};
use nalgebra::DVector;

/// Prior factor `r = log(z⁻¹ ∘ x)`, i.e. `x - z` on vector spaces.
///
/// The Jacobian with respect to a right perturbation of `x` is `Jr⁻¹(r)`, the identity on
/// vector spaces. With a constrained noise model this is how hard equality constraints
/// on a variable are expressed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorFactor {
    keys: [Key; 1],
    prior: Value,
    noise_model: NoiseModel,
}

impl PriorFactor {
    pub fn new(key: Key, prior: Value, noise_model: NoiseModel) -> ApexResult<Self> {
        if noise_model.dim() != prior.dim() {
            return Err(ApexError::DimensionMismatch {
                context: format!("prior on {key} noise model"),
                expected: prior.dim(),
                actual: noise_model.dim(),
            });
        }
        Ok(Self {
            keys: [key],
            prior,
            noise_model,
        })
    }

    pub fn prior(&self) -> &Value {
        &self.prior
    }
}

impl NonlinearFactor for PriorFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    fn kind(&self) -> &'static str {
        "PriorFactor"
    }

    fn measurement(&self) -> DVector<f64> {
        self.prior.coefficients()
    }

    fn evaluate(&self, values: &[&Value], compute_jacobian: bool) -> ApexResult<Evaluation> {
        let [x] = values else {
            return Err(ApexError::DimensionMismatch {
                context: "prior factor arguments".to_string(),
                expected: 1,
                actual: values.len(),
            });
        };

        if compute_jacobian {
            let (residual, jacobian) = self.prior.local_coordinates_with_jacobian(x)?;
            Ok((residual, Some(jacobian)))
        } else {
            Ok((self.prior.local_coordinates(x)?, None))
        }
    }
}
