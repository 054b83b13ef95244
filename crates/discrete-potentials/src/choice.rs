//! Arg-max bookkeeping produced by max-out.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::addressing;
use crate::variable::Variable;

/// The state(s) of an eliminated variable that attain the maximum in one cell.
///
/// Ties are kept in increasing state order; the first tie is the canonical
/// choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    variable: Variable,
    ties: Vec<usize>,
}

impl Choice {
    pub fn new(variable: Variable, state: usize) -> Self {
        Self {
            variable,
            ties: vec![state],
        }
    }

    /// Drop every tie and make `state` the only choice.
    pub fn replace(&mut self, state: usize) {
        self.ties.clear();
        self.ties.push(state);
    }

    /// Record another state attaining the maximum.
    pub fn add_tie(&mut self, state: usize) {
        debug_assert!(self.ties.last().map_or(true, |&last| last < state));
        self.ties.push(state);
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn ties(&self) -> &[usize] {
        &self.ties
    }

    /// Canonical choice: the lowest tied state.
    pub fn chosen(&self) -> usize {
        self.ties[0]
    }

    pub fn num_ties(&self) -> usize {
        self.ties.len()
    }

    pub fn contains(&self, state: usize) -> bool {
        self.ties.contains(&state)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |s: usize| {
            self.variable
                .states()
                .get(s)
                .cloned()
                .unwrap_or_else(|| s.to_string())
        };
        if let [single] = self.ties.as_slice() {
            write!(f, "{}={}", self.variable, name(*single))
        } else {
            let names: Vec<String> = self.ties.iter().map(|&s| name(s)).collect();
            write!(f, "{}={{{}}}", self.variable, names.join(","))
        }
    }
}

/// One `Choice` per configuration of the kept variables, laid out like a
/// table over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceTable {
    variables: Vec<Variable>,
    dimensions: Vec<usize>,
    offsets: Vec<usize>,
    choices: Vec<Choice>,
}

impl ChoiceTable {
    pub(crate) fn new(variables: Vec<Variable>, choices: Vec<Choice>) -> Self {
        let dimensions = addressing::dimensions(&variables);
        let offsets = addressing::offsets(&dimensions);
        debug_assert_eq!(choices.len(), dimensions.iter().product::<usize>());
        Self {
            variables,
            dimensions,
            offsets,
            choices,
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Choice for a configuration of the kept variables.
    ///
    /// # Panics
    ///
    /// Panics if a state is out of range.
    pub fn get(&self, coordinates: &[usize]) -> &Choice {
        &self.choices[addressing::position(&self.offsets, &self.dimensions, coordinates)]
    }

    pub fn at(&self, position: usize) -> &Choice {
        &self.choices[position]
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Choice> {
        self.choices.iter()
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChoiceTable {
    type Item = &'a Choice;
    type IntoIter = std::slice::Iter<'a, Choice>;

    fn into_iter(self) -> Self::IntoIter {
        self.choices.iter()
    }
}
