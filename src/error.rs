//! Error types for the apex-linearization library
//!
//! This module provides the main error and result types used throughout the library.
//! All errors use the `thiserror` crate for automatic trait implementations.

use crate::core::key::Key;
use crate::manifold::ManifoldError;
use thiserror::Error;

/// Main result type used throughout the apex-linearization library
pub type ApexResult<T> = Result<T, ApexError>;

/// Main error type for the apex-linearization library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApexError {
    /// A key was looked up in a container that does not hold it
    #[error("Unknown variable {key} in {container}")]
    UnknownVariable { key: Key, container: &'static str },

    /// A key was inserted into a container that already holds it
    #[error("Duplicate variable {key} in {container}")]
    DuplicateVariable { key: Key, container: &'static str },

    /// Non-positive dimension, negative or non-finite sigma
    #[error("Invalid noise model: {0}")]
    InvalidNoiseModel(String),

    /// Residual, Jacobian, tangent or noise model sizes disagree
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// First error raised while linearizing a factor graph
    #[error("Linearization of factor {factor_index} failed: {source}")]
    LinearizationFailure {
        factor_index: usize,
        #[source]
        source: Box<ApexError>,
    },

    /// First error raised while evaluating the cost of a factor graph
    #[error("Error evaluation of factor {factor_index} failed: {source}")]
    ErrorEvaluationFailure {
        factor_index: usize,
        #[source]
        source: Box<ApexError>,
    },

    /// Manifold operation errors
    #[error("Manifold error: {0}")]
    Manifold(#[from] ManifoldError),

    /// Sparse assembly errors
    #[error("Linear algebra error: {0}")]
    LinearAlgebra(String),
}

impl ApexError {
    /// Wrap an error raised by the factor at `factor_index`.
    pub fn linearization_failure(factor_index: usize, source: ApexError) -> Self {
        ApexError::LinearizationFailure {
            factor_index,
            source: Box::new(source),
        }
    }

    /// Wrap an error raised while evaluating the factor at `factor_index`.
    pub fn error_evaluation_failure(factor_index: usize, source: ApexError) -> Self {
        ApexError::ErrorEvaluationFailure {
            factor_index,
            source: Box::new(source),
        }
    }

    /// Position of the failing factor for graph-level failures.
    pub fn factor_index(&self) -> Option<usize> {
        match self {
            ApexError::LinearizationFailure { factor_index, .. }
            | ApexError::ErrorEvaluationFailure { factor_index, .. } => Some(*factor_index),
            _ => None,
        }
    }

    /// Innermost error, looking through graph-level wrapping.
    pub fn root_cause(&self) -> &ApexError {
        match self {
            ApexError::LinearizationFailure { source, .. }
            | ApexError::ErrorEvaluationFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apex_error_display() {
        let error = ApexError::UnknownVariable {
            key: Key::new('x', 3),
            container: "ordering",
        };
        assert_eq!(error.to_string(), "Unknown variable x3 in ordering");
    }

    #[test]
    fn test_apex_error_from_manifold() {
        let manifold_error = ManifoldError::InvalidTangentDimension {
            expected: 3,
            actual: 2,
        };
        let apex_error = ApexError::from(manifold_error);

        match apex_error {
            ApexError::Manifold(ManifoldError::InvalidTangentDimension { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            _ => panic!("Expected Manifold error"),
        }
    }

    #[test]
    fn test_linearization_failure_root_cause() {
        let inner = ApexError::InvalidNoiseModel("sigma must be positive".to_string());
        let wrapped = ApexError::linearization_failure(2, inner.clone());

        assert!(wrapped.to_string().contains("factor 2"));
        assert_eq!(wrapped.root_cause(), &inner);
        assert!(std::error::Error::source(&wrapped).is_some());
        assert_eq!(wrapped.factor_index(), Some(2));
    }

    #[test]
    fn test_error_evaluation_failure_root_cause() {
        let inner = ApexError::UnknownVariable {
            key: Key::new('l', 1),
            container: "values",
        };
        let wrapped = ApexError::error_evaluation_failure(4, inner.clone());

        assert_eq!(
            wrapped.to_string(),
            "Error evaluation of factor 4 failed: Unknown variable l1 in values"
        );
        assert_eq!(wrapped.root_cause(), &inner);
        assert_eq!(wrapped.factor_index(), Some(4));
        assert_eq!(inner.factor_index(), None);
    }
}
