//! Changing the storage layout of a table.

use std::collections::HashSet;

use crate::addressing::{self, Odometer};
use crate::error::{PotentialError, Result};
use crate::table::TablePotential;
use crate::variable::Variable;

/// Copy of `potential` with its variables stored in `new_order`.
///
/// Uncertainty annotations follow their cells and the utility variable is
/// kept. `new_order` must be a permutation of the table's variables.
pub fn reorder(potential: &TablePotential, new_order: &[Variable]) -> Result<TablePotential> {
    let variables = check_permutation(potential, new_order)?;
    let accumulated = potential.accumulated_offsets(&variables);
    let mut odometer = Odometer::new(addressing::dimensions(&variables));

    let source = potential.values();
    let annotations = potential.uncertain_values();
    let mut values = Vec::with_capacity(source.len());
    let mut moved = annotations.map(|_| Vec::with_capacity(source.len()));
    let mut position = 0usize;
    for _ in 0..source.len() {
        values.push(source[position]);
        if let (Some(dst), Some(src)) = (moved.as_mut(), annotations) {
            dst.push(src[position].clone());
        }
        if let Some(axis) = odometer.advance() {
            position = position.wrapping_add_signed(accumulated[axis]);
        }
    }

    let mut reordered = TablePotential::from_parts(variables, potential.role(), values);
    reordered.set_uncertain_values(moved);
    reordered.set_utility_variable(potential.utility_variable().cloned());
    Ok(reordered)
}

/// The table's own variables in the requested order.
fn check_permutation(potential: &TablePotential, new_order: &[Variable]) -> Result<Vec<Variable>> {
    let mismatch = || {
        let names = |vars: &[Variable]| {
            vars.iter()
                .map(|v| v.name().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        PotentialError::VariableMismatch(format!(
            "[{}] is not a permutation of [{}]",
            names(new_order),
            names(potential.variables())
        ))
    };
    if new_order.len() != potential.num_variables() {
        return Err(mismatch());
    }
    let mut seen = HashSet::new();
    new_order
        .iter()
        .map(|v| match potential.index_of(v) {
            Some(idx) if seen.insert(idx) => Ok(potential.variables()[idx].clone()),
            _ => Err(mismatch()),
        })
        .collect()
}

/// Copy of `potential` in which the states of `variable` follow `new_states`.
///
/// Every value moves along the variable's axis to the new index of its
/// state; the result holds the variable with its new state order.
pub fn reorder_states<S: AsRef<str>>(
    potential: &TablePotential,
    variable: &Variable,
    new_states: &[S],
) -> Result<TablePotential> {
    let axis = potential
        .index_of(variable)
        .ok_or_else(|| PotentialError::VariableNotFound(variable.name().to_string()))?;
    let current = &potential.variables()[axis];
    let displacements = state_displacements(current, new_states)?;

    let num_states = current.num_states();
    let offset = potential.offsets()[axis];
    let destination = |index: usize| {
        let state = (index / offset) % num_states;
        index.wrapping_add_signed(displacements[state] * offset as isize)
    };

    let source = potential.values();
    let mut values = vec![0.0; source.len()];
    for (index, &value) in source.iter().enumerate() {
        values[destination(index)] = value;
    }
    let moved = potential.uncertain_values().map(|annotations| {
        let mut moved = vec![None; annotations.len()];
        for (index, annotation) in annotations.iter().enumerate() {
            moved[destination(index)] = annotation.clone();
        }
        moved
    });

    let mut reordered = potential.clone();
    reordered.values_mut().copy_from_slice(&values);
    reordered.set_uncertain_values(moved);
    reordered.replace_variable(
        axis,
        current.with_states(new_states.iter().map(|s| s.as_ref().to_string())),
    );
    Ok(reordered)
}

/// Signed move `new - old` of every old state index.
fn state_displacements<S: AsRef<str>>(variable: &Variable, new_states: &[S]) -> Result<Vec<isize>> {
    let invalid = || {
        PotentialError::InvalidStateOrder(format!(
            "new state order of {} is not a permutation of [{}]",
            variable,
            variable.states().join(", ")
        ))
    };
    if new_states.len() != variable.num_states() {
        return Err(invalid());
    }
    let mut displacements = vec![None; variable.num_states()];
    for (new_index, state) in new_states.iter().enumerate() {
        let old_index = variable.state_index(state.as_ref()).ok_or_else(invalid)?;
        if displacements[old_index].is_some() {
            return Err(invalid());
        }
        displacements[old_index] = Some(new_index as isize - old_index as isize);
    }
    displacements.into_iter().map(|d| d.ok_or_else(invalid)).collect()
}
