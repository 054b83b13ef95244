//! Dense table potentials.

use scirs2_core::ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::addressing::{self, Odometer};
use crate::error::{PotentialError, Result};
use crate::uncertainty::UncertainValue;
use crate::variable::Variable;

/// What the numbers of a table mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotentialRole {
    /// P(first variable | remaining variables)
    ConditionalProbability,
    /// P(all variables)
    JointProbability,
    /// Utility as a function of the variables
    Utility,
    /// Decision table (policy) of the first variable
    Decision,
    /// Compatibility (1) or prohibition (0) of parent/child state pairs
    LinkRestriction,
}

impl PotentialRole {
    pub fn is_utility(self) -> bool {
        self == Self::Utility
    }
}

/// A dense function from the states of a list of finite-state variables to
/// real numbers.
///
/// Values are stored in a flat array in which the first variable varies
/// fastest: the value of configuration `c` lives at `Σ c[i] * offsets[i]`.
/// A table with no variables is a *constant* and holds exactly one value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableRecord", into = "TableRecord")]
pub struct TablePotential {
    variables: Vec<Variable>,
    values: Vec<f64>,
    role: PotentialRole,
    dimensions: Vec<usize>,
    offsets: Vec<usize>,
    uncertain_values: Option<Vec<Option<UncertainValue>>>,
    utility_variable: Option<Variable>,
}

impl TablePotential {
    /// Create a table with the default contents for its role.
    ///
    /// Conditional and decision tables start uniform over the first variable,
    /// joint tables uniform over all cells, utility tables at zero and
    /// link-restriction tables fully compatible.
    pub fn new(variables: Vec<Variable>, role: PotentialRole) -> Result<Self> {
        validate_variables(&variables)?;
        let size = addressing::table_size(&variables);
        let fill = match (variables.first(), role) {
            (None, PotentialRole::JointProbability) => 1.0,
            (None, _) => 0.0,
            (Some(first), PotentialRole::ConditionalProbability | PotentialRole::Decision) => {
                1.0 / first.num_states() as f64
            }
            (Some(_), PotentialRole::JointProbability) => 1.0 / size as f64,
            (Some(_), PotentialRole::Utility) => 0.0,
            (Some(_), PotentialRole::LinkRestriction) => 1.0,
        };
        Ok(Self::from_parts(variables, role, vec![fill; size]))
    }

    /// Create a table from its values, first variable fastest.
    pub fn from_values(
        variables: Vec<Variable>,
        role: PotentialRole,
        values: Vec<f64>,
    ) -> Result<Self> {
        validate_variables(&variables)?;
        let size = addressing::table_size(&variables);
        if values.len() != size {
            return Err(PotentialError::DimensionMismatch {
                expected: vec![size],
                got: vec![values.len()],
            });
        }
        Ok(Self::from_parts(variables, role, values))
    }

    /// A table with no variables.
    pub fn constant(value: f64, role: PotentialRole) -> Self {
        Self::from_parts(Vec::new(), role, vec![value])
    }

    /// Conditional table over `variable` with probability 1 on `state`.
    pub fn delta(variable: &Variable, state: usize) -> Result<Self> {
        validate_variables(std::slice::from_ref(variable))?;
        check_state(variable, state)?;
        let mut values = vec![0.0; variable.num_states()];
        values[state] = 1.0;
        Ok(Self::from_parts(
            vec![variable.clone()],
            PotentialRole::ConditionalProbability,
            values,
        ))
    }

    /// Create a table from an ndarray whose axis `i` indexes `variables[i]`.
    pub fn from_array(
        variables: Vec<Variable>,
        role: PotentialRole,
        array: &ArrayD<f64>,
    ) -> Result<Self> {
        validate_variables(&variables)?;
        let dimensions = addressing::dimensions(&variables);
        if array.shape() != dimensions.as_slice() {
            return Err(PotentialError::DimensionMismatch {
                expected: dimensions,
                got: array.shape().to_vec(),
            });
        }
        // Reversing the axes makes the first variable the fastest-moving one
        // in logical iteration order.
        let values = array.t().iter().copied().collect();
        Ok(Self::from_parts(variables, role, values))
    }

    /// Build a table whose variables are already known to be valid.
    pub(crate) fn from_parts(variables: Vec<Variable>, role: PotentialRole, values: Vec<f64>) -> Self {
        let dimensions = addressing::dimensions(&variables);
        let offsets = addressing::offsets(&dimensions);
        debug_assert_eq!(values.len(), dimensions.iter().product::<usize>());
        Self {
            variables,
            values,
            role,
            dimensions,
            offsets,
            uncertain_values: None,
            utility_variable: None,
        }
    }

    /// Link a utility table to the utility node it belongs to.
    pub fn with_utility_variable(mut self, variable: Variable) -> Self {
        self.utility_variable = Some(variable);
        self
    }

    /// Attach one uncertainty annotation slot per cell.
    pub fn with_uncertain_values(mut self, annotations: Vec<Option<UncertainValue>>) -> Result<Self> {
        if annotations.len() != self.values.len() {
            return Err(PotentialError::DimensionMismatch {
                expected: vec![self.values.len()],
                got: vec![annotations.len()],
            });
        }
        self.uncertain_values = Some(annotations);
        Ok(self)
    }

    pub(crate) fn set_uncertain_values(&mut self, annotations: Option<Vec<Option<UncertainValue>>>) {
        debug_assert!(annotations
            .as_ref()
            .map_or(true, |a| a.len() == self.values.len()));
        self.uncertain_values = annotations;
    }

    pub(crate) fn set_utility_variable(&mut self, variable: Option<Variable>) {
        self.utility_variable = variable;
    }

    pub(crate) fn replace_variable(&mut self, index: usize, variable: Variable) {
        debug_assert_eq!(self.variables[index].num_states(), variable.num_states());
        self.variables[index] = variable;
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn role(&self) -> PotentialRole {
        self.role
    }

    pub fn is_utility(&self) -> bool {
        self.role.is_utility()
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn table_size(&self) -> usize {
        self.values.len()
    }

    /// Whether the table depends on no variable.
    pub fn is_constant(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn utility_variable(&self) -> Option<&Variable> {
        self.utility_variable.as_ref()
    }

    pub fn uncertain_values(&self) -> Option<&[Option<UncertainValue>]> {
        self.uncertain_values.as_deref()
    }

    pub fn is_uncertain(&self) -> bool {
        self.uncertain_values.is_some()
    }

    pub fn index_of(&self, variable: &Variable) -> Option<usize> {
        self.variables.iter().position(|v| v == variable)
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.index_of(variable).is_some()
    }

    /// Linear position of a configuration given in table order.
    ///
    /// # Panics
    ///
    /// Panics if the configuration has the wrong length or a state is out of range.
    pub fn position(&self, coordinates: &[usize]) -> usize {
        addressing::position(&self.offsets, &self.dimensions, coordinates)
    }

    /// Configuration (in table order) stored at a linear position.
    pub fn configuration(&self, position: usize) -> Vec<usize> {
        assert!(
            position < self.values.len(),
            "position {} out of range for a table of {} cells",
            position,
            self.values.len()
        );
        addressing::configuration(&self.offsets, position)
    }

    pub fn value(&self, coordinates: &[usize]) -> f64 {
        self.values[self.position(coordinates)]
    }

    pub fn set_value(&mut self, coordinates: &[usize], value: f64) {
        let position = self.position(coordinates);
        self.values[position] = value;
    }

    /// Value for states given in the caller's variable order.
    ///
    /// Variables of `variables` that the table does not contain are ignored.
    pub fn value_at(&self, variables: &[Variable], states: &[usize]) -> f64 {
        self.values[self.position_of(variables, states)]
    }

    /// Overwrite the value for states given in the caller's variable order.
    pub fn set_value_at(&mut self, variables: &[Variable], states: &[usize], value: f64) {
        let position = self.position_of(variables, states);
        self.values[position] = value;
    }

    fn position_of(&self, variables: &[Variable], states: &[usize]) -> usize {
        assert_eq!(variables.len(), states.len());
        variables
            .iter()
            .zip(states)
            .filter_map(|(v, &s)| {
                self.index_of(v).map(|idx| {
                    assert!(
                        s < self.dimensions[idx],
                        "state {} out of range for variable {}",
                        s,
                        v
                    );
                    s * self.offsets[idx]
                })
            })
            .sum()
    }

    /// Accumulated offsets of this table for an odometer running over `target`.
    pub fn accumulated_offsets(&self, target: &[Variable]) -> Vec<isize> {
        addressing::accumulated_offsets(target, &self.variables)
    }

    /// Sum of all values.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Restrict the table to the configurations compatible with `evidence`.
    ///
    /// Observed variables are removed from the result; evidence about
    /// variables the table does not contain is ignored. Uncertainty
    /// annotations and the utility variable are carried over.
    pub fn project(&self, evidence: &[(Variable, usize)]) -> Result<Self> {
        let mut first_position = 0;
        let mut observed = HashSet::new();
        for (variable, state) in evidence {
            if let Some(idx) = self.index_of(variable) {
                check_state(&self.variables[idx], *state)?;
                first_position += state * self.offsets[idx];
                observed.insert(idx);
            }
        }
        if observed.is_empty() {
            return Ok(self.clone());
        }

        let unobserved: Vec<Variable> = self
            .variables
            .iter()
            .enumerate()
            .filter(|(idx, _)| !observed.contains(idx))
            .map(|(_, v)| v.clone())
            .collect();
        let size = addressing::table_size(&unobserved);
        let accumulated = self.accumulated_offsets(&unobserved);
        let mut odometer = Odometer::new(addressing::dimensions(&unobserved));

        let mut values = Vec::with_capacity(size);
        let mut annotations = self.uncertain_values.as_ref().map(|_| Vec::with_capacity(size));
        let mut position = first_position;
        for _ in 0..size {
            values.push(self.values[position]);
            if let (Some(dst), Some(src)) = (annotations.as_mut(), self.uncertain_values.as_ref()) {
                dst.push(src[position].clone());
            }
            if let Some(axis) = odometer.advance() {
                position = position.wrapping_add_signed(accumulated[axis]);
            }
        }

        let mut projected = Self::from_parts(unobserved, self.role, values);
        projected.uncertain_values = annotations;
        projected.utility_variable = self.utility_variable.clone();
        Ok(projected)
    }

    /// Fix one variable to a state and drop it from the table.
    pub fn reduce(&self, variable: &Variable, state: usize) -> Result<Self> {
        if !self.contains(variable) {
            return Err(PotentialError::VariableNotFound(variable.name().to_string()));
        }
        self.project(&[(variable.clone(), state)])
    }

    /// Copy the values into an ndarray whose axis `i` indexes variable `i`.
    pub fn to_array(&self) -> ArrayD<f64> {
        let reversed: Vec<usize> = self.dimensions.iter().rev().copied().collect();
        ArrayD::from_shape_vec(IxDyn(&reversed), self.values.clone())
            .expect("table size matches its dimensions")
            .reversed_axes()
    }
}

pub(crate) fn validate_variables(variables: &[Variable]) -> Result<()> {
    let mut seen = HashSet::new();
    for variable in variables {
        if !variable.is_finite() {
            return Err(PotentialError::unsupported(
                "table construction",
                format!("{:?} variable {}", variable.variable_type(), variable),
            ));
        }
        if variable.num_states() == 0 {
            return Err(PotentialError::unsupported(
                "table construction",
                format!("variable {} without states", variable),
            ));
        }
        if !seen.insert(variable.name()) {
            return Err(PotentialError::DuplicateVariable(variable.name().to_string()));
        }
    }
    Ok(())
}

pub(crate) fn check_state(variable: &Variable, state: usize) -> Result<()> {
    if state >= variable.num_states() {
        return Err(PotentialError::StateOutOfRange {
            variable: variable.name().to_string(),
            state,
            num_states: variable.num_states(),
        });
    }
    Ok(())
}

/// Serialized form of a table; derived fields are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct TableRecord {
    variables: Vec<Variable>,
    role: PotentialRole,
    values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uncertain_values: Option<Vec<Option<UncertainValue>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utility_variable: Option<Variable>,
}

impl TryFrom<TableRecord> for TablePotential {
    type Error = PotentialError;

    fn try_from(record: TableRecord) -> Result<Self> {
        let mut table = Self::from_values(record.variables, record.role, record.values)?;
        if let Some(annotations) = record.uncertain_values {
            table = table.with_uncertain_values(annotations)?;
        }
        table.utility_variable = record.utility_variable;
        Ok(table)
    }
}

impl From<TablePotential> for TableRecord {
    fn from(table: TablePotential) -> Self {
        Self {
            variables: table.variables,
            role: table.role,
            values: table.values,
            uncertain_values: table.uncertain_values,
            utility_variable: table.utility_variable,
        }
    }
}
