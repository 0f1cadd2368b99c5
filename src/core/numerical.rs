//! Central-difference Jacobians through the manifold retraction.
//!
//! Used to check analytic factor Jacobians: column `j` of the block for variable `i` is
//!
//! ```text
//! ( r(x_i ⊕ ε·e_j) ⊖ r(x_i ⊕ -ε·e_j) ) / 2ε
//! ```
//!
//! with the residual difference taken in plain vector space.

use crate::core::factors::NonlinearFactor;
use crate::core::variable::Value;
use crate::error::ApexResult;
use nalgebra::{DMatrix, DVector};

/// Step used by [`numerical_jacobian`] when none is given.
pub const DEFAULT_STEP: f64 = 1e-6;

/// Stacked numerical Jacobian of `factor` at `values` (scope order).
pub fn numerical_jacobian(
    factor: &dyn NonlinearFactor,
    values: &[&Value],
    step: f64,
) -> ApexResult<DMatrix<f64>> {
    let total: usize = values.iter().map(|v| v.dim()).sum();
    let mut jacobian = DMatrix::zeros(factor.dim(), total);

    let mut col = 0;
    for (i, value) in values.iter().enumerate() {
        for j in 0..value.dim() {
            let mut delta = DVector::zeros(value.dim());
            delta[j] = step;
            let plus = value.retract(&delta)?;
            let minus = value.retract(&(-delta))?;

            let residual_plus = residual_with(factor, values, i, &plus)?;
            let residual_minus = residual_with(factor, values, i, &minus)?;
            jacobian
                .column_mut(col)
                .copy_from(&((residual_plus - residual_minus) / (2.0 * step)));
            col += 1;
        }
    }
    Ok(jacobian)
}

fn residual_with(
    factor: &dyn NonlinearFactor,
    values: &[&Value],
    position: usize,
    replacement: &Value,
) -> ApexResult<DVector<f64>> {
    let mut perturbed = values.to_vec();
    perturbed[position] = replacement;
    Ok(factor.evaluate(&perturbed, false)?.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::Key;
    use crate::core::noise_model::NoiseModel;
    use crate::factors::BetweenFactor;
    use crate::manifold::se2::SE2;

    #[test]
    fn test_numerical_matches_analytic_on_poses() -> ApexResult<()> {
        let factor = BetweenFactor::new(
            Key::new('x', 1),
            Key::new('x', 2),
            SE2::from_xy_angle(1.0, 0.2, 0.3).into(),
            NoiseModel::isotropic(3, 0.1)?,
        )?;
        let a = Value::from(SE2::from_xy_angle(0.1, -0.3, 0.7));
        let b = Value::from(SE2::from_xy_angle(1.2, 0.4, 1.1));

        let (_, analytic) = factor.evaluate(&[&a, &b], true)?;
        let numerical = numerical_jacobian(&factor, &[&a, &b], DEFAULT_STEP)?;
        let analytic = analytic.ok_or(crate::error::ApexError::LinearAlgebra(
            "missing Jacobian".to_string(),
        ))?;
        assert_eq!(numerical.shape(), (3, 6));
        assert!((analytic - numerical).norm() < 1e-6);
        Ok(())
    }
}
