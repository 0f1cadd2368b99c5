//! Factor implementations for the factor graph
//!
//! # Module Structure
//!
//! - `prior`: unary prior on any manifold value
//! - `between`: relative measurement between two values of the same kind
//! - `simulated2d`: constructors for the simulated 2D world (points as poses/landmarks)
//! - `small_example`: the four-factor reference problem built from `simulated2d`

pub mod between;
pub mod prior;
pub mod simulated2d;
pub mod small_example;

pub use between::BetweenFactor;
pub use prior::PriorFactor;
