//! Variable-set and operand helpers shared by the algebra.

use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::error::{PotentialError, Result};
use crate::table::{PotentialRole, TablePotential};
use crate::variable::Variable;

/// Union of the operands' variables, in order of first appearance.
///
/// # Panics
///
/// Panics if two operands hold same-named variables with different state
/// counts; fallible callers run [`check_operand_state_counts`] first.
pub fn union_variables<P: Borrow<TablePotential>>(potentials: &[P]) -> Vec<Variable> {
    assert_state_counts(&operand_variables(potentials));
    let mut seen = HashSet::new();
    let mut union = Vec::new();
    for potential in potentials {
        for variable in potential.borrow().variables() {
            if seen.insert(variable.name()) {
                union.push(variable.clone());
            }
        }
    }
    union
}

/// Variable list of every operand.
pub fn operand_variables<P: Borrow<TablePotential>>(potentials: &[P]) -> Vec<&[Variable]> {
    potentials.iter().map(|p| p.borrow().variables()).collect()
}

/// First pair of same-named variables whose state counts differ.
pub fn state_count_conflict<'a>(lists: &[&'a [Variable]]) -> Option<(&'a Variable, &'a Variable)> {
    let mut seen: HashMap<&str, &Variable> = HashMap::new();
    for &list in lists {
        for variable in list {
            match seen.entry(variable.name()) {
                Entry::Occupied(first) if first.get().num_states() != variable.num_states() => {
                    return Some((*first.get(), variable));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(variable);
                }
            }
        }
    }
    None
}

fn conflict_message(first: &Variable, second: &Variable) -> String {
    format!(
        "variable {} appears with {} and with {} states",
        first,
        first.num_states(),
        second.num_states()
    )
}

/// Require every same-named variable across `lists` to have one state count.
pub fn check_state_counts(lists: &[&[Variable]]) -> Result<()> {
    match state_count_conflict(lists) {
        Some((first, second)) => Err(PotentialError::VariableMismatch(conflict_message(
            first, second,
        ))),
        None => Ok(()),
    }
}

/// [`check_state_counts`] over the operands' variable lists.
pub fn check_operand_state_counts<P: Borrow<TablePotential>>(potentials: &[P]) -> Result<()> {
    check_state_counts(&operand_variables(potentials))
}

/// Panicking form of [`check_state_counts`] for the infallible operators.
pub(crate) fn assert_state_counts(lists: &[&[Variable]]) {
    if let Some((first, second)) = state_count_conflict(lists) {
        panic!("{}", conflict_message(first, second));
    }
}

/// Operands that depend on at least one variable.
pub fn proper_potentials<P: Borrow<TablePotential>>(potentials: &[P]) -> Vec<&TablePotential> {
    potentials
        .iter()
        .map(Borrow::borrow)
        .filter(|p| !p.is_constant())
        .collect()
}

/// Product of the values of the constant operands (1 if there are none).
pub fn constant_factor<P: Borrow<TablePotential>>(potentials: &[P]) -> f64 {
    potentials
        .iter()
        .map(Borrow::borrow)
        .filter(|p| p.is_constant())
        .map(|p| p.values()[0])
        .product()
}

/// Sum of the values of the constant operands (0 if there are none).
pub fn constant_bias<P: Borrow<TablePotential>>(potentials: &[P]) -> f64 {
    potentials
        .iter()
        .map(Borrow::borrow)
        .filter(|p| p.is_constant())
        .map(|p| p.values()[0])
        .sum()
}

/// Index the variables by name.
pub fn variables_by_name(variables: &[Variable]) -> HashMap<&str, &Variable> {
    variables.iter().map(|v| (v.name(), v)).collect()
}

/// Look variables up by name, keeping the order of `names`.
///
/// Returns `None` for the first name that is not present.
pub fn lookup_variables(variables: &[Variable], names: &[&str]) -> Option<Vec<Variable>> {
    let by_name = variables_by_name(variables);
    names
        .iter()
        .map(|name| by_name.get(name).map(|v| (*v).clone()))
        .collect()
}

/// Whether any operand is a utility table.
pub fn has_utility<P: Borrow<TablePotential>>(potentials: &[P]) -> bool {
    potentials.iter().any(|p| p.borrow().is_utility())
}

/// Role of a product or sum of the operands.
///
/// Utility wins over joint probability, which wins over conditional
/// probability.
pub fn result_role<P: Borrow<TablePotential>>(potentials: &[P]) -> PotentialRole {
    if has_utility(potentials) {
        PotentialRole::Utility
    } else if potentials
        .iter()
        .any(|p| p.borrow().role() == PotentialRole::JointProbability)
    {
        PotentialRole::JointProbability
    } else {
        PotentialRole::ConditionalProbability
    }
}

/// Variables of `variables` that are not in `excluded`, in their original order.
pub fn difference(variables: &[Variable], excluded: &[Variable]) -> Vec<Variable> {
    variables
        .iter()
        .filter(|v| !excluded.contains(v))
        .cloned()
        .collect()
}

/// First variable present in both lists.
pub fn first_common<'a>(a: &'a [Variable], b: &[Variable]) -> Option<&'a Variable> {
    a.iter().find(|v| b.contains(v))
}

/// First variable that occurs twice in the list.
pub fn first_duplicate(variables: &[Variable]) -> Option<&Variable> {
    let mut seen = HashSet::new();
    variables.iter().find(|v| !seen.insert(v.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Variable {
        Variable::with_num_states(name, 2)
    }

    fn table(names: &[&str], role: PotentialRole) -> TablePotential {
        TablePotential::new(names.iter().map(|n| var(n)).collect(), role).unwrap()
    }

    #[test]
    fn test_union_is_first_appearance() {
        let p1 = table(&["b", "a"], PotentialRole::ConditionalProbability);
        let p2 = table(&["c", "a", "d"], PotentialRole::ConditionalProbability);
        let names: Vec<String> = union_variables(&[p1, p2])
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(names, ["b", "a", "c", "d"]);
    }

    #[test]
    fn test_constant_helpers() {
        let c1 = TablePotential::constant(2.0, PotentialRole::JointProbability);
        let c2 = TablePotential::constant(3.0, PotentialRole::Utility);
        let p = table(&["a"], PotentialRole::ConditionalProbability);
        let operands = [&c1, &p, &c2];

        assert_eq!(constant_factor(&operands), 6.0);
        assert_eq!(constant_bias(&operands), 5.0);
        assert_eq!(proper_potentials(&operands).len(), 1);
        assert_eq!(constant_factor::<&TablePotential>(&[]), 1.0);
    }

    #[test]
    fn test_result_role() {
        let cond = table(&["a"], PotentialRole::ConditionalProbability);
        let joint = table(&["a"], PotentialRole::JointProbability);
        let util = table(&["a"], PotentialRole::Utility);

        assert_eq!(result_role(&[&cond]), PotentialRole::ConditionalProbability);
        assert_eq!(result_role(&[&cond, &joint]), PotentialRole::JointProbability);
        assert_eq!(result_role(&[&joint, &util]), PotentialRole::Utility);
        assert!(has_utility(&[&cond, &util]));
    }

    #[test]
    fn test_lookup_and_sets() {
        let vars = vec![var("a"), var("b"), var("c")];
        let found = lookup_variables(&vars, &["c", "a"]).unwrap();
        assert_eq!(found, vec![var("c"), var("a")]);
        assert!(lookup_variables(&vars, &["z"]).is_none());

        assert_eq!(difference(&vars, &[var("b")]), vec![var("a"), var("c")]);
        assert_eq!(first_common(&vars, &[var("z"), var("c")]), Some(&var("c")));
        assert_eq!(first_duplicate(&[var("a"), var("b"), var("a")]), Some(&var("a")));
        assert!(first_duplicate(&vars).is_none());
    }

    #[test]
    fn test_state_count_conflicts() {
        let binary = vec![var("x"), var("y")];
        let ternary = vec![Variable::with_num_states("x", 3)];
        assert!(check_state_counts(&[&binary[..], &binary[..1]]).is_ok());

        let (first, second) = state_count_conflict(&[&binary[..], &ternary[..]]).unwrap();
        assert_eq!((first.num_states(), second.num_states()), (2, 3));
        assert!(matches!(
            check_state_counts(&[&binary[..], &ternary[..]]),
            Err(PotentialError::VariableMismatch(_))
        ));
    }

    #[test]
    #[should_panic(expected = "variable x appears with 2 and with 3 states")]
    fn test_union_rejects_conflicting_state_counts() {
        let p = table(&["x"], PotentialRole::JointProbability);
        let q = TablePotential::new(
            vec![Variable::with_num_states("x", 3)],
            PotentialRole::JointProbability,
        )
        .unwrap();
        union_variables(&[&p, &q]);
    }
}
