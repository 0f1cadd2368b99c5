//! Core components of the linearization engine
//!
//! This module contains the nonlinear side of the problem:
//! - Variable keys, manifold values and the value store
//! - Variable orderings
//! - Noise models
//! - The nonlinear factor trait and factor graph
//! - Numerical Jacobians for verification

pub mod factors;
pub mod graph;
pub mod key;
pub mod noise_model;
pub mod numerical;
pub mod ordering;
pub mod values;
pub mod variable;
