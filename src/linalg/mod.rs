//! Linear side of the engine.
//!
//! Linearizing a nonlinear factor graph yields a [`LinearFactorGraph`] of whitened
//! [`JacobianFactor`]s. Together with the [`Ordering`](crate::core::ordering::Ordering)
//! used to produce it, this graph is the whole handoff to a sparse solver, which can take
//! it factor by factor or as one stacked system via
//! [`LinearFactorGraph::sparse_system`]:
//! - Sparse matrices use faer
//! - Dense blocks use nalgebra

pub mod jacobian_factor;
pub mod linear_graph;

pub use jacobian_factor::JacobianFactor;
pub use linear_graph::LinearFactorGraph;

/// Type alias for sparse matrices using faer
pub type SparseMatrix = faer::sparse::SparseColMat<usize, f64>;

/// Type alias for faer matrices (used for vectors)
pub type FaerMatrix = faer::Mat<f64>;
