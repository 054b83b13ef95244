//! Fused multiply-and-maximize (max-out).
//!
//! The eliminated variable is scanned in increasing state order while a
//! running maximum is kept. A candidate greater than `max + tolerance`
//! replaces the maximum and the tie set; a candidate within `tolerance` of the
//! maximum joins the tie set. The reported value is the running maximum.

use std::borrow::Borrow;

use tracing::trace;

use super::scan::{check_partition, FusedScan};
use crate::choice::{Choice, ChoiceTable};
use crate::error::{PotentialError, Result};
use crate::scope;
use crate::table::{PotentialRole, TablePotential};
use crate::variable::Variable;

/// Maximum of `candidates`, with the indices tying for it written to `ties`.
pub(crate) fn max_with_ties(candidates: &[f64], tolerance: f64, ties: &mut Vec<usize>) -> f64 {
    ties.clear();
    let mut max = f64::NEG_INFINITY;
    for (state, &candidate) in candidates.iter().enumerate() {
        if ties.is_empty() || candidate > max + tolerance {
            max = candidate;
            ties.clear();
            ties.push(state);
        } else if (candidate - max).abs() <= tolerance {
            ties.push(state);
        }
    }
    max
}

/// Fill one policy block with `1/|ties|` on the tied states.
pub(crate) fn write_uniform_policy(block: &mut [f64], ties: &[usize]) {
    let mass = 1.0 / ties.len() as f64;
    block.fill(0.0);
    for &state in ties {
        block[state] = mass;
    }
}

/// Role of the value table of the uniform-policy form.
pub(crate) fn uniform_value_role<P: Borrow<TablePotential>>(potentials: &[P]) -> PotentialRole {
    if scope::has_utility(potentials) {
        PotentialRole::Utility
    } else {
        PotentialRole::ConditionalProbability
    }
}

/// Validate a max-out request and set up its scan.
pub(crate) fn max_scan<'a, P: Borrow<TablePotential>>(
    potentials: &'a [P],
    keep: &[Variable],
    eliminate: &Variable,
) -> Result<FusedScan<'a>> {
    let operands = scope::proper_potentials(potentials);
    check_partition(&operands, keep, std::slice::from_ref(eliminate))?;
    Ok(FusedScan::new(
        operands,
        keep,
        std::slice::from_ref(eliminate),
        scope::constant_factor(potentials),
    ))
}

/// Kept variables when only the eliminated one is named.
pub(crate) fn kept_variables<P: Borrow<TablePotential>>(
    potentials: &[P],
    eliminate: &Variable,
) -> Result<Vec<Variable>> {
    scope::check_operand_state_counts(potentials)?;
    Ok(scope::difference(
        &scope::union_variables(potentials),
        std::slice::from_ref(eliminate),
    ))
}

/// Multiply the operands and maximize out `eliminate`, recording the
/// maximizing state(s) of every kept configuration.
pub fn multiply_and_maximize<P: Borrow<TablePotential>>(
    potentials: &[P],
    keep: &[Variable],
    eliminate: &Variable,
    tolerance: f64,
) -> Result<(TablePotential, ChoiceTable)> {
    let scan = max_scan(potentials, keep, eliminate)?;
    let mut values = Vec::with_capacity(scan.num_cells());
    let mut choices = Vec::with_capacity(scan.num_cells());
    let mut ties = Vec::with_capacity(scan.inner_size());
    scan.run(0..scan.num_cells(), |candidates| {
        values.push(max_with_ties(candidates, tolerance, &mut ties));
        choices.push(choice_from_ties(eliminate, &ties));
    });
    trace!(
        operands = potentials.len(),
        eliminated = %eliminate,
        cells = values.len(),
        "multiplied and maximized"
    );
    Ok((
        TablePotential::from_parts(keep.to_vec(), scope::result_role(potentials), values),
        ChoiceTable::new(keep.to_vec(), choices),
    ))
}

/// Multiply the operands and maximize out `eliminate`, keeping every other
/// variable in order of first appearance.
pub fn multiply_and_maximize_variable<P: Borrow<TablePotential>>(
    potentials: &[P],
    eliminate: &Variable,
    tolerance: f64,
) -> Result<(TablePotential, ChoiceTable)> {
    let keep = kept_variables(potentials, eliminate)?;
    multiply_and_maximize(potentials, &keep, eliminate, tolerance)
}

/// Maximize a single variable out of `potential`.
pub fn maximize(
    potential: &TablePotential,
    variable: &Variable,
    tolerance: f64,
) -> Result<(TablePotential, ChoiceTable)> {
    if !potential.contains(variable) {
        return Err(PotentialError::VariableNotFound(variable.name().to_string()));
    }
    multiply_and_maximize_variable(std::slice::from_ref(potential), variable, tolerance)
}

/// Multiply the operands and maximize out `eliminate`, spreading probability
/// uniformly over the maximizing states.
///
/// Returns the value table over `keep` and a conditional policy over
/// `eliminate ++ keep` holding `1/|ties|` on every tied state.
pub fn multiply_and_maximize_uniformly<P: Borrow<TablePotential>>(
    potentials: &[P],
    keep: &[Variable],
    eliminate: &Variable,
    tolerance: f64,
) -> Result<(TablePotential, TablePotential)> {
    let scan = max_scan(potentials, keep, eliminate)?;
    let num_states = scan.inner_size();
    let mut values = Vec::with_capacity(scan.num_cells());
    let mut policy = vec![0.0; scan.num_cells() * num_states];
    let mut ties = Vec::with_capacity(num_states);
    let mut blocks = policy.chunks_mut(num_states);
    scan.run(0..scan.num_cells(), |candidates| {
        values.push(max_with_ties(candidates, tolerance, &mut ties));
        if let Some(block) = blocks.next() {
            write_uniform_policy(block, &ties);
        }
    });
    trace!(
        operands = potentials.len(),
        eliminated = %eliminate,
        cells = values.len(),
        "computed uniform policy"
    );

    let policy_variables: Vec<Variable> = std::iter::once(eliminate.clone())
        .chain(keep.iter().cloned())
        .collect();
    Ok((
        TablePotential::from_parts(keep.to_vec(), uniform_value_role(potentials), values),
        TablePotential::from_parts(
            policy_variables,
            PotentialRole::ConditionalProbability,
            policy,
        ),
    ))
}

/// Uniform-policy max-out keeping every other variable in order of first
/// appearance.
pub fn multiply_and_maximize_uniformly_variable<P: Borrow<TablePotential>>(
    potentials: &[P],
    eliminate: &Variable,
    tolerance: f64,
) -> Result<(TablePotential, TablePotential)> {
    let keep = kept_variables(potentials, eliminate)?;
    multiply_and_maximize_uniformly(potentials, &keep, eliminate, tolerance)
}

pub(crate) fn choice_from_ties(variable: &Variable, ties: &[usize]) -> Choice {
    let mut choice = Choice::new(variable.clone(), ties[0]);
    for &state in &ties[1..] {
        choice.add_tie(state);
    }
    choice
}
