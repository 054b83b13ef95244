//! Normalization of probability tables.

use crate::error::{PotentialError, Result};
use crate::table::{PotentialRole, TablePotential};

/// Size of the blocks that must each sum to one, if the role has any.
///
/// A conditional table holds one distribution over its first variable per
/// configuration of the others; a joint table is a single distribution.
fn block_size(potential: &TablePotential) -> Option<usize> {
    match potential.role() {
        PotentialRole::ConditionalProbability => Some(
            potential
                .variables()
                .first()
                .map_or(1, |first| first.num_states()),
        ),
        PotentialRole::JointProbability => Some(potential.table_size()),
        _ => None,
    }
}

/// Normalized copy of `potential`.
///
/// Tables that are neither conditional nor joint are returned unchanged.
pub fn normalize(potential: &TablePotential) -> Result<TablePotential> {
    let mut normalized = potential.clone();
    normalize_in_place(&mut normalized)?;
    Ok(normalized)
}

/// Normalize `potential` in place.
///
/// Every block is checked before any value is written, so a
/// [`PotentialError::NullVector`] leaves the table untouched. A constant is
/// only checked: a zero constant is rejected, any other is kept as it is.
pub fn normalize_in_place(potential: &mut TablePotential) -> Result<()> {
    let Some(block) = block_size(potential) else {
        return Ok(());
    };
    let sums: Vec<f64> = potential
        .values()
        .chunks(block)
        .map(|chunk| chunk.iter().sum())
        .collect();
    if let Some(index) = sums.iter().position(|&sum| sum == 0.0) {
        let names: Vec<&str> = potential.variables().iter().map(|v| v.name()).collect();
        return Err(PotentialError::NullVector(format!(
            "block {} of the table over [{}] sums to 0",
            index,
            names.join(", ")
        )));
    }
    if potential.is_constant() {
        return Ok(());
    }
    for (chunk, sum) in potential.values_mut().chunks_mut(block).zip(sums) {
        for value in chunk {
            *value /= sum;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;
    use approx::assert_abs_diff_eq;

    fn var(name: &str, n: usize) -> Variable {
        Variable::with_num_states(name, n)
    }

    #[test]
    fn test_conditional_blocks() {
        let (b, a) = (var("b", 3), var("a", 2));
        let cpt = TablePotential::from_values(
            vec![b, a],
            PotentialRole::ConditionalProbability,
            vec![1.0, 1.0, 2.0, 5.0, 0.0, 5.0],
        )
        .unwrap();

        let normalized = normalize(&cpt).unwrap();
        assert_eq!(normalized.values(), &[0.25, 0.25, 0.5, 0.5, 0.0, 0.5]);
        // pure form leaves its input alone
        assert_eq!(cpt.values()[0], 1.0);
    }

    #[test]
    fn test_joint_whole_table() {
        let a = var("a", 4);
        let mut joint = TablePotential::from_values(
            vec![a],
            PotentialRole::JointProbability,
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        normalize_in_place(&mut joint).unwrap();
        assert_abs_diff_eq!(joint.total(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(joint.values()[3], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_block_fails_without_writing() {
        let (b, a) = (var("b", 2), var("a", 2));
        let mut cpt = TablePotential::from_values(
            vec![b, a],
            PotentialRole::ConditionalProbability,
            vec![2.0, 2.0, 0.0, 0.0],
        )
        .unwrap();

        let err = normalize_in_place(&mut cpt).unwrap_err();
        assert!(matches!(err, PotentialError::NullVector(_)));
        assert_eq!(cpt.values(), &[2.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_other_roles_untouched() {
        let a = var("a", 2);
        let utility =
            TablePotential::from_values(vec![a], PotentialRole::Utility, vec![0.0, 0.0]).unwrap();
        assert_eq!(normalize(&utility).unwrap(), utility);
    }

    #[test]
    fn test_constant_is_kept_unless_zero() {
        let c = TablePotential::constant(4.0, PotentialRole::ConditionalProbability);
        assert_eq!(normalize(&c).unwrap().values(), &[4.0]);

        let mut joint = TablePotential::constant(0.25, PotentialRole::JointProbability);
        normalize_in_place(&mut joint).unwrap();
        assert_eq!(joint.values(), &[0.25]);

        let zero = TablePotential::constant(0.0, PotentialRole::ConditionalProbability);
        assert!(matches!(normalize(&zero), Err(PotentialError::NullVector(_))));
    }
}
