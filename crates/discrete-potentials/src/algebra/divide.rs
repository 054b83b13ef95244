//! Pointwise quotient of two tables.

use tracing::trace;

use super::scan::OperandCursor;
use crate::addressing::{self, Odometer};
use crate::scope;
use crate::table::{PotentialRole, TablePotential};
use crate::variable::Variable;

/// Divide `numerator` by `denominator` cell by cell.
///
/// The quotient is a joint table over the numerator's variables followed by
/// the denominator's remaining ones. A zero denominator gives exactly 0.
///
/// # Panics
///
/// Panics if a variable of both tables has a different state count in each.
pub fn divide(numerator: &TablePotential, denominator: &TablePotential) -> TablePotential {
    scope::assert_state_counts(&[numerator.variables(), denominator.variables()]);
    let mut variables: Vec<Variable> = numerator.variables().to_vec();
    variables.extend(scope::difference(
        denominator.variables(),
        numerator.variables(),
    ));

    let size = addressing::table_size(&variables);
    let mut cursor = OperandCursor::new(&[numerator, denominator], &variables);
    let mut odometer = Odometer::new(addressing::dimensions(&variables));
    let mut values = Vec::with_capacity(size);
    for _ in 0..size {
        let divisor = cursor.value(1);
        values.push(if divisor == 0.0 {
            0.0
        } else {
            cursor.value(0) / divisor
        });
        if let Some(axis) = odometer.advance() {
            cursor.advance(axis);
        }
    }
    trace!(cells = values.len(), "divided potentials");
    TablePotential::from_parts(variables, PotentialRole::JointProbability, values)
}
