//! Discrete potential algebra for Bayesian networks and influence diagrams.
//!
//! This crate is the numeric kernel of exact inference over finite-state
//! variables. It multiplies, sums, marginalizes (sum-out and max-out),
//! divides, normalizes and reorders dense probability and utility tables, and
//! keeps conditional tables consistent with link restrictions.
//!
//! # Core Concepts
//!
//! - **Table potentials**: dense tables over an ordered list of variables, first
//!   variable fastest
//! - **Accumulated offsets**: every operator is one linear scan over its output
//!   with a running position per operand
//! - **Fused elimination**: multiply-and-marginalize never materializes the
//!   product
//! - **Choices**: max-out records the tied maximizing states of the eliminated
//!   variable
//!
//! # Architecture
//!
//! ```text
//! Potential ──► PotentialOperations ──► algebra ──► TablePotential
//!                  │  (kind checks,          │          ChoiceTable
//!                  │   AlgebraConfig)        └── addressing (offsets, odometer)
//!                  └──► parallel (rayon, large outputs)
//!
//! RestrictedNode + LinkRestriction ──► link_restriction ──► TablePotential
//! ```
//!
//! # Example
//!
//! ```
//! use discrete_potentials::{algebra, PotentialRole, TablePotential, Variable};
//!
//! let a = Variable::new("A", ["yes", "no"]);
//! let b = Variable::new("B", ["yes", "no"]);
//! let prior = TablePotential::from_values(
//!     vec![a.clone()],
//!     PotentialRole::ConditionalProbability,
//!     vec![0.4, 0.6],
//! )?;
//! let likelihood = TablePotential::from_values(
//!     vec![b.clone(), a.clone()],
//!     PotentialRole::ConditionalProbability,
//!     vec![0.9, 0.1, 0.3, 0.7],
//! )?;
//!
//! let marginal = algebra::multiply_and_marginalize(&[&prior, &likelihood], &[b], &[a])?;
//! assert!((marginal.values()[0] - 0.54).abs() < 1e-12);
//! # Ok::<(), discrete_potentials::PotentialError>(())
//! ```

pub mod addressing;
pub mod algebra;
mod choice;
mod config;
mod error;
pub mod facade;
pub mod link_restriction;
pub mod parallel;
pub mod scope;
mod table;
mod uncertainty;
mod variable;

pub use choice::{Choice, ChoiceTable};
pub use config::{AlgebraConfig, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_TIE_TOLERANCE};
pub use error::{PotentialError, Result};
pub use facade::{Potential, PotentialKind, PotentialOperations};
pub use link_restriction::{
    LinkRestriction, NodeKind, RedistributionOutcome, RedistributionReport, RestrictedNode,
};
pub use table::{PotentialRole, TablePotential};
pub use uncertainty::{UncertainDistribution, UncertainValue};
pub use variable::{Variable, VariableType};
