//! Simulated 2D world: poses and landmarks are plain 2D points.
//!
//! Poses live under the `x` symbol and landmarks under `l`. All factors are vector-space
//! [`PriorFactor`]s and [`BetweenFactor`]s on [`Value::point2`] variables.

use crate::core::key::Key;
use crate::core::noise_model::NoiseModel;
use crate::core::variable::Value;
use crate::error::ApexResult;
use crate::factors::{BetweenFactor, PriorFactor};
use nalgebra::Vector2;

pub const POSE_SYMBOL: char = 'x';
pub const POINT_SYMBOL: char = 'l';

pub fn pose_key(i: u64) -> Key {
    Key::new(POSE_SYMBOL, i)
}

pub fn point_key(j: u64) -> Key {
    Key::new(POINT_SYMBOL, j)
}

fn point(z: Vector2<f64>) -> Value {
    Value::point2(z.x, z.y)
}

/// Prior `x_i ≈ z`.
pub fn prior(z: Vector2<f64>, model: NoiseModel, i: u64) -> ApexResult<PriorFactor> {
    PriorFactor::new(pose_key(i), point(z), model)
}

/// Odometry `x_j - x_i ≈ z`.
pub fn odometry(z: Vector2<f64>, model: NoiseModel, i: u64, j: u64) -> ApexResult<BetweenFactor> {
    BetweenFactor::new(pose_key(i), pose_key(j), point(z), model)
}

/// Landmark measurement `l_j - x_i ≈ z`.
pub fn measurement(
    z: Vector2<f64>,
    model: NoiseModel,
    i: u64,
    j: u64,
) -> ApexResult<BetweenFactor> {
    BetweenFactor::new(pose_key(i), point_key(j), point(z), model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::factors::NonlinearFactor;

    #[test]
    fn test_keys() {
        assert_eq!(pose_key(1).to_string(), "x1");
        assert_eq!(point_key(3).to_string(), "l3");
    }

    #[test]
    fn test_measurement_equals() -> ApexResult<()> {
        let sigma = NoiseModel::isotropic(2, 1.0)?;
        let f0 = measurement(Vector2::new(0.0, -1.0), sigma.clone(), 1, 1)?;
        let f1 = measurement(Vector2::new(-1.5, -1.0), sigma.clone(), 2, 1)?;
        assert!(f0.equals(&f0, 1e-9));
        assert!(!f0.equals(&f1, 1e-9));
        assert!(!f1.equals(&f0, 1e-9));

        // a scope repeating x1 is rejected
        let odo = odometry(Vector2::new(0.0, -1.0), sigma, 1, 1);
        assert!(odo.is_err());
        Ok(())
    }
}
