//! Linear scans over the cells of a target variable order.
//!
//! An [`OperandCursor`] keeps one running position per operand table and moves
//! them all by the operands' accumulated offsets whenever the target odometer
//! steps. A [`FusedScan`] runs that cursor over `eliminate ++ keep`, handing
//! each output cell the products of its `inner_size` eliminated
//! configurations.

use std::ops::Range;

use crate::addressing::{self, Odometer};
use crate::error::{PotentialError, Result};
use crate::scope;
use crate::table::TablePotential;
use crate::variable::Variable;

/// Running positions of several operand tables for one target order.
#[derive(Debug, Clone)]
pub(crate) struct OperandCursor<'a> {
    values: Vec<&'a [f64]>,
    strides: Vec<Vec<usize>>,
    accumulated: Vec<Vec<isize>>,
    positions: Vec<usize>,
}

impl<'a> OperandCursor<'a> {
    pub(crate) fn new(operands: &[&'a TablePotential], target: &[Variable]) -> Self {
        let strides = operands
            .iter()
            .map(|p| {
                target
                    .iter()
                    .map(|v| p.index_of(v).map_or(0, |idx| p.offsets()[idx]))
                    .collect()
            })
            .collect();
        Self {
            values: operands.iter().map(|p| p.values()).collect(),
            strides,
            accumulated: operands
                .iter()
                .map(|p| p.accumulated_offsets(target))
                .collect(),
            positions: vec![0; operands.len()],
        }
    }

    /// Follow an odometer step that incremented coordinate `axis`.
    #[inline]
    pub(crate) fn advance(&mut self, axis: usize) {
        for (position, accumulated) in self.positions.iter_mut().zip(&self.accumulated) {
            *position = position.wrapping_add_signed(accumulated[axis]);
        }
    }

    /// Jump to the positions of a target configuration.
    pub(crate) fn seek(&mut self, coordinate: &[usize]) {
        for (position, strides) in self.positions.iter_mut().zip(&self.strides) {
            *position = coordinate.iter().zip(strides).map(|(c, s)| c * s).sum();
        }
    }

    #[inline]
    pub(crate) fn value(&self, operand: usize) -> f64 {
        self.values[operand][self.positions[operand]]
    }

    #[inline]
    pub(crate) fn product(&self) -> f64 {
        self.values
            .iter()
            .zip(&self.positions)
            .map(|(values, &p)| values[p])
            .product()
    }

    #[inline]
    pub(crate) fn sum(&self) -> f64 {
        self.values
            .iter()
            .zip(&self.positions)
            .map(|(values, &p)| values[p])
            .sum()
    }
}

/// Product of operands over `eliminate ++ keep`, grouped by output cell.
#[derive(Debug, Clone)]
pub(crate) struct FusedScan<'a> {
    operands: Vec<&'a TablePotential>,
    order: Vec<Variable>,
    inner_size: usize,
    num_cells: usize,
    factor: f64,
}

impl<'a> FusedScan<'a> {
    /// `operands` must not contain constants; their product is `factor`.
    pub(crate) fn new(
        operands: Vec<&'a TablePotential>,
        keep: &[Variable],
        eliminate: &[Variable],
        factor: f64,
    ) -> Self {
        let order: Vec<Variable> = eliminate.iter().chain(keep).cloned().collect();
        Self {
            operands,
            order,
            inner_size: addressing::table_size(eliminate),
            num_cells: addressing::table_size(keep),
            factor,
        }
    }

    pub(crate) fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub(crate) fn inner_size(&self) -> usize {
        self.inner_size
    }

    /// Visit the output cells of `cells` in order.
    ///
    /// The sink receives, for each cell, the scaled product of the operands
    /// for every configuration of the eliminated variables (first eliminated
    /// variable fastest).
    pub(crate) fn run<F: FnMut(&[f64])>(&self, cells: Range<usize>, mut sink: F) {
        if cells.is_empty() {
            return;
        }
        let mut odometer = Odometer::new(addressing::dimensions(&self.order));
        let mut cursor = OperandCursor::new(&self.operands, &self.order);
        odometer.seek(cells.start * self.inner_size);
        cursor.seek(odometer.coordinate());

        let mut buffer = vec![0.0; self.inner_size];
        for _ in cells {
            for slot in buffer.iter_mut() {
                *slot = self.factor * cursor.product();
                if let Some(axis) = odometer.advance() {
                    cursor.advance(axis);
                }
            }
            sink(&buffer);
        }
    }
}

/// Check that `keep` and `eliminate` partition the operands' variables.
///
/// Both lists may name variables no operand contains; those are broadcast.
/// Same-named variables must agree on their state count everywhere.
pub(crate) fn check_partition(
    operands: &[&TablePotential],
    keep: &[Variable],
    eliminate: &[Variable],
) -> Result<()> {
    for variable in keep.iter().chain(eliminate) {
        if !variable.is_finite() || variable.num_states() == 0 {
            return Err(PotentialError::unsupported(
                "marginalization",
                format!("{:?} variable {}", variable.variable_type(), variable),
            ));
        }
    }
    let mut lists: Vec<&[Variable]> = operands.iter().map(|p| p.variables()).collect();
    lists.push(keep);
    lists.push(eliminate);
    scope::check_state_counts(&lists)?;
    if let Some(v) = scope::first_duplicate(keep).or_else(|| scope::first_duplicate(eliminate)) {
        return Err(PotentialError::DuplicateVariable(v.name().to_string()));
    }
    if let Some(v) = scope::first_common(keep, eliminate) {
        return Err(PotentialError::InvalidPartition(format!(
            "variable {} is both kept and eliminated",
            v
        )));
    }
    for operand in operands {
        if let Some(v) = operand
            .variables()
            .iter()
            .find(|v| !keep.contains(v) && !eliminate.contains(v))
        {
            return Err(PotentialError::VariableMismatch(format!(
                "variable {} is neither kept nor eliminated",
                v
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::PotentialRole;

    fn var(name: &str, n: usize) -> Variable {
        Variable::with_num_states(name, n)
    }

    #[test]
    fn test_cursor_tracks_each_operand() {
        let (a, b) = (var("a", 2), var("b", 3));
        let pa = TablePotential::from_values(
            vec![a.clone()],
            PotentialRole::JointProbability,
            vec![1.0, 2.0],
        )
        .unwrap();
        let pb = TablePotential::from_values(
            vec![b.clone()],
            PotentialRole::JointProbability,
            vec![10.0, 20.0, 30.0],
        )
        .unwrap();
        let target = vec![a, b];
        let mut cursor = OperandCursor::new(&[&pa, &pb], &target);
        let mut odometer = Odometer::new(vec![2, 3]);

        let mut sums = Vec::new();
        loop {
            sums.push(cursor.sum());
            match odometer.advance() {
                Some(axis) => cursor.advance(axis),
                None => break,
            }
        }
        assert_eq!(sums, vec![11.0, 12.0, 21.0, 22.0, 31.0, 32.0]);

        cursor.seek(&[1, 2]);
        assert_eq!(cursor.value(0), 2.0);
        assert_eq!(cursor.value(1), 30.0);
        assert_eq!(cursor.product(), 60.0);
    }

    #[test]
    fn test_fused_scan_from_any_start_cell() {
        let (a, b, c) = (var("a", 2), var("b", 3), var("c", 2));
        let values: Vec<f64> = (1..=12).map(f64::from).collect();
        let table = TablePotential::from_values(
            vec![a.clone(), b.clone(), c.clone()],
            PotentialRole::JointProbability,
            values,
        )
        .unwrap();
        let keep = vec![c.clone(), a.clone()];
        let scan = FusedScan::new(vec![&table], &keep, &[b.clone()], 1.0);
        assert_eq!(scan.num_cells(), 4);
        assert_eq!(scan.inner_size(), 3);

        let mut full = Vec::new();
        scan.run(0..4, |inner| full.push(inner.to_vec()));

        // cell (c=1, a=0) is output position 1; its inner values walk b
        let expected: Vec<f64> = (0..3).map(|bs| table.value(&[0, bs, 1])).collect();
        assert_eq!(full[1], expected);

        let mut tail = Vec::new();
        scan.run(2..4, |inner| tail.push(inner.to_vec()));
        assert_eq!(tail, full[2..].to_vec());
    }

    #[test]
    fn test_partition_checks() {
        let (a, b) = (var("a", 2), var("b", 2));
        let table = TablePotential::new(vec![a.clone(), b.clone()], PotentialRole::JointProbability)
            .unwrap();

        assert!(check_partition(&[&table], &[a.clone()], &[b.clone()]).is_ok());
        assert!(matches!(
            check_partition(&[&table], &[a.clone()], &[a.clone(), b.clone()]),
            Err(PotentialError::InvalidPartition(_))
        ));
        assert!(matches!(
            check_partition(&[&table], &[a.clone()], &[]),
            Err(PotentialError::VariableMismatch(_))
        ));
        assert!(matches!(
            check_partition(&[&table], &[a, b, Variable::numeric("t")], &[]),
            Err(PotentialError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_partition_rejects_conflicting_state_counts() {
        let (x2, x3) = (var("x", 2), var("x", 3));
        let table = TablePotential::from_values(
            vec![x3.clone()],
            PotentialRole::JointProbability,
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();

        assert!(check_partition(&[&table], &[], &[x3]).is_ok());
        assert!(matches!(
            check_partition(&[&table], &[], &[x2.clone()]),
            Err(PotentialError::VariableMismatch(_))
        ));
        assert!(matches!(
            crate::algebra::multiply_and_marginalize(&[&table], &[], &[x2]),
            Err(PotentialError::VariableMismatch(_))
        ));
    }
}
