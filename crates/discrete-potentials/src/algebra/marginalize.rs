//! Fused multiply-and-marginalize (sum-out).

use std::borrow::Borrow;

use tracing::trace;

use super::scan::{check_partition, FusedScan};
use crate::error::{PotentialError, Result};
use crate::scope;
use crate::table::TablePotential;
use crate::variable::Variable;

/// Multiply the operands and sum out `eliminate`, without materializing the
/// product.
///
/// The result is a table over `keep`, in the given order. Every variable of
/// every operand must be either kept or eliminated; kept or eliminated
/// variables that no operand contains are broadcast. When every operand is a
/// constant each output cell holds the constant factor times the number of
/// eliminated configurations.
pub fn multiply_and_marginalize<P: Borrow<TablePotential>>(
    potentials: &[P],
    keep: &[Variable],
    eliminate: &[Variable],
) -> Result<TablePotential> {
    let operands = scope::proper_potentials(potentials);
    check_partition(&operands, keep, eliminate)?;
    let scan = FusedScan::new(
        operands,
        keep,
        eliminate,
        scope::constant_factor(potentials),
    );

    let mut values = Vec::with_capacity(scan.num_cells());
    scan.run(0..scan.num_cells(), |inner| values.push(inner.iter().sum()));
    trace!(
        operands = potentials.len(),
        kept = keep.len(),
        eliminated = eliminate.len(),
        cells = values.len(),
        "multiplied and marginalized"
    );
    Ok(TablePotential::from_parts(
        keep.to_vec(),
        scope::result_role(potentials),
        values,
    ))
}

/// Multiply the operands keeping only `variables_of_interest`.
///
/// The union of the operands' variables is split into kept and eliminated
/// variables; kept variables stay in order of first appearance.
pub fn multiply_and_marginalize_to<P: Borrow<TablePotential>>(
    potentials: &[P],
    variables_of_interest: &[Variable],
) -> Result<TablePotential> {
    scope::check_operand_state_counts(potentials)?;
    let (keep, eliminate): (Vec<Variable>, Vec<Variable>) = scope::union_variables(potentials)
        .into_iter()
        .partition(|v| variables_of_interest.contains(v));
    multiply_and_marginalize(potentials, &keep, &eliminate)
}

/// Multiply the operands and sum out `eliminate`, keeping everything else.
pub fn multiply_and_eliminate<P: Borrow<TablePotential>>(
    potentials: &[P],
    eliminate: &[Variable],
) -> Result<TablePotential> {
    scope::check_operand_state_counts(potentials)?;
    let keep = scope::difference(&scope::union_variables(potentials), eliminate);
    multiply_and_marginalize(potentials, &keep, eliminate)
}

/// Sum out every variable of `potential` that is not of interest.
pub fn marginalize(
    potential: &TablePotential,
    variables_of_interest: &[Variable],
) -> Result<TablePotential> {
    multiply_and_marginalize_to(std::slice::from_ref(potential), variables_of_interest)
}

/// Sum out a single variable of `potential`.
pub fn marginalize_variable(
    potential: &TablePotential,
    variable: &Variable,
) -> Result<TablePotential> {
    if !potential.contains(variable) {
        return Err(PotentialError::VariableNotFound(variable.name().to_string()));
    }
    let keep = scope::difference(potential.variables(), std::slice::from_ref(variable));
    multiply_and_marginalize(
        std::slice::from_ref(potential),
        &keep,
        std::slice::from_ref(variable),
    )
}
