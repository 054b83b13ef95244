//! Algebra of dense table potentials.
//!
//! Every operator here is a single linear scan over its output cells driven by
//! accumulated offsets (see [`crate::addressing`]). The operators only accept
//! [`TablePotential`](crate::TablePotential)s; kind checks on general
//! potentials happen in [`crate::facade`].

mod divide;
mod marginalize;
mod maximize;
mod normalize;
mod product;
mod reorder;
pub(crate) mod scan;

pub use divide::divide;
pub use marginalize::{
    marginalize, marginalize_variable, multiply_and_eliminate, multiply_and_marginalize,
    multiply_and_marginalize_to,
};
pub use maximize::{
    maximize, multiply_and_maximize, multiply_and_maximize_uniformly,
    multiply_and_maximize_uniformly_variable, multiply_and_maximize_variable,
};
pub use normalize::{normalize, normalize_in_place};
pub use product::{multiply, sum};
pub use reorder::{reorder, reorder_states};

pub(crate) use maximize::{
    choice_from_ties, kept_variables, max_scan, max_with_ties, uniform_value_role,
    write_uniform_policy,
};
