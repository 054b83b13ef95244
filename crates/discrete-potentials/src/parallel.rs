//! Data-parallel fused operators using rayon.
//!
//! The output cells of a fused scan are independent: each one only reads the
//! operand tables and keeps its own running sum or maximum. The cells are
//! split into contiguous ranges, the scan is seeked to the start of each
//! range, and the ranges run on the rayon pool. Results are identical to the
//! sequential operators in [`crate::algebra`].

use std::borrow::Borrow;

use rayon::prelude::*;
use tracing::trace;

use crate::algebra::scan::{check_partition, FusedScan};
use crate::algebra::{
    choice_from_ties, kept_variables, max_scan, max_with_ties, uniform_value_role,
    write_uniform_policy,
};
use crate::choice::{Choice, ChoiceTable};
use crate::error::Result;
use crate::scope;
use crate::table::{PotentialRole, TablePotential};
use crate::variable::Variable;

/// Number of output cells handed to one rayon task.
fn chunk_len(num_cells: usize) -> usize {
    let tasks = rayon::current_num_threads() * 4;
    num_cells.div_ceil(tasks).max(1)
}

/// Parallel [`multiply_and_marginalize`](crate::algebra::multiply_and_marginalize).
pub fn par_multiply_and_marginalize<P: Borrow<TablePotential>>(
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

    let chunk = chunk_len(scan.num_cells());
    let mut values = vec![0.0; scan.num_cells()];
    values
        .par_chunks_mut(chunk)
        .enumerate()
        .for_each(|(index, out)| {
            let start = index * chunk;
            let end = start + out.len();
            let mut cells = out.iter_mut();
            scan.run(start..end, |inner| {
                if let Some(cell) = cells.next() {
                    *cell = inner.iter().sum();
                }
            });
        });
    trace!(
        cells = values.len(),
        chunk,
        "multiplied and marginalized in parallel"
    );
    Ok(TablePotential::from_parts(
        keep.to_vec(),
        scope::result_role(potentials),
        values,
    ))
}

/// Parallel [`multiply_and_maximize`](crate::algebra::multiply_and_maximize).
pub fn par_multiply_and_maximize<P: Borrow<TablePotential>>(
    potentials: &[P],
    keep: &[Variable],
    eliminate: &Variable,
    tolerance: f64,
) -> Result<(TablePotential, ChoiceTable)> {
    let scan = max_scan(potentials, keep, eliminate)?;
    let num_cells = scan.num_cells();
    let chunk = chunk_len(num_cells);

    let parts: Vec<(Vec<f64>, Vec<Choice>)> = (0..num_cells.div_ceil(chunk))
        .into_par_iter()
        .map(|index| {
            let start = index * chunk;
            let end = (start + chunk).min(num_cells);
            let mut values = Vec::with_capacity(end - start);
            let mut choices = Vec::with_capacity(end - start);
            let mut ties = Vec::with_capacity(scan.inner_size());
            scan.run(start..end, |candidates| {
                values.push(max_with_ties(candidates, tolerance, &mut ties));
                choices.push(choice_from_ties(eliminate, &ties));
            });
            (values, choices)
        })
        .collect();

    let mut values = Vec::with_capacity(num_cells);
    let mut choices = Vec::with_capacity(num_cells);
    for (part_values, part_choices) in parts {
        values.extend(part_values);
        choices.extend(part_choices);
    }
    trace!(cells = values.len(), chunk, "maximized in parallel");
    Ok((
        TablePotential::from_parts(keep.to_vec(), scope::result_role(potentials), values),
        ChoiceTable::new(keep.to_vec(), choices),
    ))
}

/// Parallel [`multiply_and_maximize_uniformly`](crate::algebra::multiply_and_maximize_uniformly).
pub fn par_multiply_and_maximize_uniformly<P: Borrow<TablePotential>>(
    potentials: &[P],
    keep: &[Variable],
    eliminate: &Variable,
    tolerance: f64,
) -> Result<(TablePotential, TablePotential)> {
    let scan = max_scan(potentials, keep, eliminate)?;
    let num_states = scan.inner_size();
    let chunk = chunk_len(scan.num_cells());

    let mut values = vec![0.0; scan.num_cells()];
    let mut policy = vec![0.0; scan.num_cells() * num_states];
    values
        .par_chunks_mut(chunk)
        .zip(policy.par_chunks_mut(chunk * num_states))
        .enumerate()
        .for_each(|(index, (out, policy_out))| {
            let start = index * chunk;
            let end = start + out.len();
            let mut cells = out.iter_mut();
            let mut blocks = policy_out.chunks_mut(num_states);
            let mut ties = Vec::with_capacity(num_states);
            scan.run(start..end, |candidates| {
                let max = max_with_ties(candidates, tolerance, &mut ties);
                if let (Some(cell), Some(block)) = (cells.next(), blocks.next()) {
                    *cell = max;
                    write_uniform_policy(block, &ties);
                }
            });
        });
    trace!(cells = values.len(), chunk, "computed uniform policy in parallel");

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

/// Parallel max-out keeping every variable but `eliminate`.
pub fn par_multiply_and_maximize_variable<P: Borrow<TablePotential>>(
    potentials: &[P],
    eliminate: &Variable,
    tolerance: f64,
) -> Result<(TablePotential, ChoiceTable)> {
    let keep = kept_variables(potentials, eliminate)?;
    par_multiply_and_maximize(potentials, &keep, eliminate, tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra;
    use approx::assert_abs_diff_eq;

    fn var(name: &str, n: usize) -> Variable {
        Variable::with_num_states(name, n)
    }

    fn operands() -> (Vec<Variable>, Vec<TablePotential>) {
        let vars = vec![var("a", 3), var("b", 4), var("c", 5), var("d", 2)];
        let p1 = TablePotential::from_values(
            vec![vars[0].clone(), vars[1].clone(), vars[2].clone()],
            PotentialRole::JointProbability,
            (0..60).map(|i| ((i * 7) % 11) as f64 + 0.5).collect(),
        )
        .unwrap();
        let p2 = TablePotential::from_values(
            vec![vars[3].clone(), vars[1].clone()],
            PotentialRole::Utility,
            (0..8).map(|i| ((i * 5) % 3) as f64).collect(),
        )
        .unwrap();
        (vars, vec![p1, p2])
    }

    #[test]
    fn test_parallel_marginalize_matches_sequential() {
        let (vars, potentials) = operands();
        let keep = vec![vars[3].clone(), vars[0].clone(), vars[2].clone()];
        let eliminate = vec![vars[1].clone()];

        let seq = algebra::multiply_and_marginalize(&potentials, &keep, &eliminate).unwrap();
        let par = par_multiply_and_marginalize(&potentials, &keep, &eliminate).unwrap();
        assert_eq!(seq.variables(), par.variables());
        assert_eq!(seq.role(), par.role());
        for (s, p) in seq.values().iter().zip(par.values()) {
            assert_abs_diff_eq!(*s, *p, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_parallel_maximize_matches_sequential() {
        let (vars, potentials) = operands();
        let eliminate = &vars[1];

        let (seq_values, seq_choices) =
            algebra::multiply_and_maximize_variable(&potentials, eliminate, 1e-5).unwrap();
        let (par_values, par_choices) =
            par_multiply_and_maximize_variable(&potentials, eliminate, 1e-5).unwrap();
        assert_eq!(seq_values, par_values);
        assert_eq!(seq_choices, par_choices);
    }

    #[test]
    fn test_parallel_uniform_policy_matches_sequential() {
        let (vars, potentials) = operands();
        let keep = vec![vars[0].clone(), vars[2].clone(), vars[3].clone()];

        let seq =
            algebra::multiply_and_maximize_uniformly(&potentials, &keep, &vars[1], 1e-5).unwrap();
        let par = par_multiply_and_maximize_uniformly(&potentials, &keep, &vars[1], 1e-5).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_chunk_len_is_positive() {
        assert!(chunk_len(0) >= 1);
        assert!(chunk_len(1) >= 1);
    }
}
