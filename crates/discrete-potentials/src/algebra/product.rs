//! Pointwise product and sum of tables.

use std::borrow::Borrow;

use tracing::trace;

use super::scan::{FusedScan, OperandCursor};
use crate::addressing::{self, Odometer};
use crate::scope;
use crate::table::TablePotential;

/// Pointwise product over the union of the operands' variables.
///
/// Constant operands are folded into a scalar factor. The result is laid
/// out in order of first appearance of the variables. An empty list yields
/// the constant 1 and a single operand is returned as a copy.
///
/// # Panics
///
/// Panics if same-named variables of two operands differ in state count.
pub fn multiply<P: Borrow<TablePotential>>(potentials: &[P]) -> TablePotential {
    if let [single] = potentials {
        return single.borrow().clone();
    }
    let role = scope::result_role(potentials);
    let union = scope::union_variables(potentials);
    let scan = FusedScan::new(
        scope::proper_potentials(potentials),
        &union,
        &[],
        scope::constant_factor(potentials),
    );

    let mut values = Vec::with_capacity(scan.num_cells());
    scan.run(0..scan.num_cells(), |inner| values.push(inner[0]));
    trace!(
        operands = potentials.len(),
        variables = union.len(),
        cells = values.len(),
        "multiplied potentials"
    );
    TablePotential::from_parts(union, role, values)
}

/// Pointwise sum over the union of the operands' variables.
///
/// Constant operands are added to every cell. An empty list yields the
/// constant 0 and a single operand is returned as a copy.
///
/// # Panics
///
/// Panics if same-named variables of two operands differ in state count.
pub fn sum<P: Borrow<TablePotential>>(potentials: &[P]) -> TablePotential {
    if let [single] = potentials {
        return single.borrow().clone();
    }
    let role = scope::result_role(potentials);
    let union = scope::union_variables(potentials);
    let bias = scope::constant_bias(potentials);
    let operands = scope::proper_potentials(potentials);

    let size = addressing::table_size(&union);
    let mut cursor = OperandCursor::new(&operands, &union);
    let mut odometer = Odometer::new(addressing::dimensions(&union));
    let mut values = Vec::with_capacity(size);
    for _ in 0..size {
        values.push(bias + cursor.sum());
        if let Some(axis) = odometer.advance() {
            cursor.advance(axis);
        }
    }
    trace!(
        operands = potentials.len(),
        cells = values.len(),
        "summed potentials"
    );
    TablePotential::from_parts(union, role, values)
}
