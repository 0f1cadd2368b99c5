//! Linearization engine for nonlinear factor graphs.
//!
//! Variables live on manifolds ([`Value`]), factors constrain them through residuals and
//! noise models ([`NonlinearFactor`](crate::core::factors::NonlinearFactor)), and a
//! [`NonlinearFactorGraph`] is linearized around a [`Values`] estimate into a
//! [`LinearFactorGraph`](crate::linalg::LinearFactorGraph) whose blocks are laid out by
//! an [`Ordering`].

pub mod core;
pub mod error;
pub mod factors;
pub mod linalg;
pub mod logger;
pub mod manifold;

pub use crate::core::graph::{LinearizeConfig, NonlinearFactorGraph};
pub use crate::core::key::Key;
pub use crate::core::noise_model::NoiseModel;
pub use crate::core::ordering::Ordering;
pub use crate::core::values::{DuplicatePolicy, Values, ValuesConfig};
pub use crate::core::variable::Value;
pub use error::{ApexError, ApexResult};
pub use logger::{init_logger, init_logger_with_level};
