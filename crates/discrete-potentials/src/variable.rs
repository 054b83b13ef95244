//! Discrete variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Kind of values a variable takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    /// Finite set of named states
    FiniteStates,
    /// Continuous range split into named intervals
    Discretized,
    /// Continuous variable; never valid in a table
    Numeric,
}

impl VariableType {
    /// Whether tables can be indexed by variables of this type.
    pub fn is_finite(self) -> bool {
        matches!(self, Self::FiniteStates | Self::Discretized)
    }
}

/// A random, decision or utility variable.
///
/// Two variables are equal when their names are equal, regardless of their
/// states, so a variable keeps its identity after its states are reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    name: String,
    states: Vec<String>,
    variable_type: VariableType,
}

impl Variable {
    /// Create a finite-state variable from state names.
    pub fn new<S: Into<String>>(name: impl Into<String>, states: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            states: states.into_iter().map(Into::into).collect(),
            variable_type: VariableType::FiniteStates,
        }
    }

    /// Create a finite-state variable whose states are named `"0"`, `"1"`, ...
    pub fn with_num_states(name: impl Into<String>, num_states: usize) -> Self {
        Self::new(name, (0..num_states).map(|i| i.to_string()))
    }

    /// Create a discretized variable from interval names.
    pub fn discretized<S: Into<String>>(
        name: impl Into<String>,
        intervals: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            variable_type: VariableType::Discretized,
            ..Self::new(name, intervals)
        }
    }

    /// Create a continuous variable.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            variable_type: VariableType::Numeric,
        }
    }

    /// The same variable with its states in a different order.
    pub fn with_states<S: Into<String>>(&self, states: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: self.name.clone(),
            states: states.into_iter().map(Into::into).collect(),
            variable_type: self.variable_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn variable_type(&self) -> VariableType {
        self.variable_type
    }

    pub fn is_finite(&self) -> bool {
        self.variable_type.is_finite()
    }

    /// Index of the state with the given name.
    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|s| s == state)
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
