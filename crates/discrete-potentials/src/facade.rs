//! Typed entry point for the algebra.
//!
//! Callers hold [`Potential`]s of any kind; [`PotentialOperations`] checks
//! that every operand is a dense table over finite-state variables before
//! handing it to [`crate::algebra`], and threads an [`AlgebraConfig`] through
//! the operations that need one.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::addressing;
use crate::algebra;
use crate::choice::ChoiceTable;
use crate::config::AlgebraConfig;
use crate::error::{PotentialError, Result};
use crate::parallel;
use crate::scope;
use crate::table::{PotentialRole, TablePotential};
use crate::variable::Variable;

/// Kind tag of a [`Potential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotentialKind {
    Table,
    Uniform,
    Delta,
    Gaussian,
}

impl fmt::Display for PotentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Uniform => "uniform",
            Self::Delta => "delta",
            Self::Gaussian => "gaussian",
        };
        write!(f, "{}", name)
    }
}

/// A potential of any supported representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Potential {
    /// Dense table; the only kind the algebra computes with
    Table(TablePotential),
    /// Uniform potential with the default contents of its role
    Uniform {
        variables: Vec<Variable>,
        role: PotentialRole,
    },
    /// Probability 1 on one state of a variable
    Delta { variable: Variable, state: usize },
    /// Normal density over a continuous variable
    Gaussian {
        variable: Variable,
        mean: f64,
        variance: f64,
    },
}

impl Potential {
    pub fn kind(&self) -> PotentialKind {
        match self {
            Self::Table(_) => PotentialKind::Table,
            Self::Uniform { .. } => PotentialKind::Uniform,
            Self::Delta { .. } => PotentialKind::Delta,
            Self::Gaussian { .. } => PotentialKind::Gaussian,
        }
    }

    pub fn variables(&self) -> &[Variable] {
        match self {
            Self::Table(table) => table.variables(),
            Self::Uniform { variables, .. } => variables,
            Self::Delta { variable, .. } | Self::Gaussian { variable, .. } => {
                std::slice::from_ref(variable)
            }
        }
    }

    pub fn as_table(&self) -> Option<&TablePotential> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Materialize the potential as a dense table.
    ///
    /// Gaussian potentials have no table form.
    pub fn to_table(&self) -> Result<TablePotential> {
        match self {
            Self::Table(table) => Ok(table.clone()),
            Self::Uniform { variables, role } => TablePotential::new(variables.clone(), *role),
            Self::Delta { variable, state } => TablePotential::delta(variable, *state),
            Self::Gaussian { variable, .. } => Err(PotentialError::unsupported(
                "table conversion",
                format!("gaussian potential over {}", variable),
            )),
        }
    }
}

impl From<TablePotential> for Potential {
    fn from(table: TablePotential) -> Self {
        Self::Table(table)
    }
}

fn table<'a>(operation: &str, potential: &'a Potential) -> Result<&'a TablePotential> {
    match potential {
        Potential::Table(table) => Ok(table),
        other => Err(PotentialError::unsupported(
            operation,
            format!("{} potential", other.kind()),
        )),
    }
}

fn tables<'a>(operation: &str, potentials: &'a [Potential]) -> Result<Vec<&'a TablePotential>> {
    potentials.iter().map(|p| table(operation, p)).collect()
}

fn check_finite(operation: &str, variables: &[Variable]) -> Result<()> {
    match variables.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(PotentialError::unsupported(
            operation,
            format!("{:?} variable {}", v.variable_type(), v),
        )),
        None => Ok(()),
    }
}

/// Operations on [`Potential`]s, configured by an [`AlgebraConfig`].
#[derive(Debug, Clone, Default)]
pub struct PotentialOperations {
    config: AlgebraConfig,
}

impl PotentialOperations {
    pub fn new(config: AlgebraConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AlgebraConfig {
        &self.config
    }

    pub fn multiply(&self, potentials: &[Potential]) -> Result<TablePotential> {
        let operands = tables("multiply", potentials)?;
        scope::check_operand_state_counts(&operands)?;
        let result = algebra::multiply(&operands);
        debug!(
            operation = "multiply",
            operands = operands.len(),
            cells = result.table_size(),
            "potential operation"
        );
        Ok(result)
    }

    pub fn sum(&self, potentials: &[Potential]) -> Result<TablePotential> {
        let operands = tables("sum", potentials)?;
        scope::check_operand_state_counts(&operands)?;
        let result = algebra::sum(&operands);
        debug!(
            operation = "sum",
            operands = operands.len(),
            cells = result.table_size(),
            "potential operation"
        );
        Ok(result)
    }

    /// Sum `eliminate` out of the product of `potentials`, keeping `keep`.
    pub fn multiply_and_marginalize(
        &self,
        potentials: &[Potential],
        keep: &[Variable],
        eliminate: &[Variable],
    ) -> Result<TablePotential> {
        const OPERATION: &str = "multiply and marginalize";
        let operands = tables(OPERATION, potentials)?;
        check_finite(OPERATION, keep)?;
        check_finite(OPERATION, eliminate)?;

        let cells = addressing::table_size(keep);
        let in_parallel = self.config.runs_parallel(cells);
        debug!(
            operation = OPERATION,
            operands = operands.len(),
            kept = keep.len(),
            eliminated = eliminate.len(),
            cells,
            in_parallel,
            "potential operation"
        );
        if in_parallel {
            parallel::par_multiply_and_marginalize(&operands, keep, eliminate)
        } else {
            algebra::multiply_and_marginalize(&operands, keep, eliminate)
        }
    }

    /// Keep only `variables_of_interest` of the product of `potentials`.
    pub fn multiply_and_marginalize_to(
        &self,
        potentials: &[Potential],
        variables_of_interest: &[Variable],
    ) -> Result<TablePotential> {
        let operands = tables("multiply and marginalize", potentials)?;
        scope::check_operand_state_counts(&operands)?;
        let (keep, eliminate): (Vec<Variable>, Vec<Variable>) = scope::union_variables(&operands)
            .into_iter()
            .partition(|v| variables_of_interest.contains(v));
        self.multiply_and_marginalize(potentials, &keep, &eliminate)
    }

    /// Sum `eliminate` out of the product of `potentials`, keeping the rest.
    pub fn multiply_and_eliminate(
        &self,
        potentials: &[Potential],
        eliminate: &[Variable],
    ) -> Result<TablePotential> {
        let operands = tables("multiply and eliminate", potentials)?;
        scope::check_operand_state_counts(&operands)?;
        let keep = scope::difference(&scope::union_variables(&operands), eliminate);
        self.multiply_and_marginalize(potentials, &keep, eliminate)
    }

    pub fn marginalize(
        &self,
        potential: &Potential,
        variables_of_interest: &[Variable],
    ) -> Result<TablePotential> {
        self.multiply_and_marginalize_to(std::slice::from_ref(potential), variables_of_interest)
    }

    pub fn marginalize_variable(
        &self,
        potential: &Potential,
        variable: &Variable,
    ) -> Result<TablePotential> {
        let operand = table("marginalize", potential)?;
        check_finite("marginalize", std::slice::from_ref(variable))?;
        algebra::marginalize_variable(operand, variable)
    }

    /// Maximize `eliminate` out of the product of `potentials`, keeping `keep`.
    pub fn multiply_and_maximize(
        &self,
        potentials: &[Potential],
        keep: &[Variable],
        eliminate: &Variable,
    ) -> Result<(TablePotential, ChoiceTable)> {
        const OPERATION: &str = "multiply and maximize";
        let operands = tables(OPERATION, potentials)?;
        check_finite(OPERATION, keep)?;
        check_finite(OPERATION, std::slice::from_ref(eliminate))?;

        let cells = addressing::table_size(keep);
        let in_parallel = self.config.runs_parallel(cells);
        debug!(
            operation = OPERATION,
            operands = operands.len(),
            eliminated = %eliminate,
            cells,
            in_parallel,
            "potential operation"
        );
        let tolerance = self.config.tie_tolerance;
        if in_parallel {
            parallel::par_multiply_and_maximize(&operands, keep, eliminate, tolerance)
        } else {
            algebra::multiply_and_maximize(&operands, keep, eliminate, tolerance)
        }
    }

    /// Maximize `eliminate` out of the product, keeping every other variable.
    pub fn multiply_and_maximize_variable(
        &self,
        potentials: &[Potential],
        eliminate: &Variable,
    ) -> Result<(TablePotential, ChoiceTable)> {
        let operands = tables("multiply and maximize", potentials)?;
        let keep = algebra::kept_variables(&operands, eliminate)?;
        self.multiply_and_maximize(potentials, &keep, eliminate)
    }

    /// Max-out returning a policy uniform over the maximizing states.
    pub fn multiply_and_maximize_uniformly(
        &self,
        potentials: &[Potential],
        keep: &[Variable],
        eliminate: &Variable,
    ) -> Result<(TablePotential, TablePotential)> {
        const OPERATION: &str = "multiply and maximize uniformly";
        let operands = tables(OPERATION, potentials)?;
        check_finite(OPERATION, keep)?;
        check_finite(OPERATION, std::slice::from_ref(eliminate))?;

        let cells = addressing::table_size(keep);
        let in_parallel = self.config.runs_parallel(cells);
        debug!(
            operation = OPERATION,
            operands = operands.len(),
            eliminated = %eliminate,
            cells,
            in_parallel,
            "potential operation"
        );
        let tolerance = self.config.tie_tolerance;
        if in_parallel {
            parallel::par_multiply_and_maximize_uniformly(&operands, keep, eliminate, tolerance)
        } else {
            algebra::multiply_and_maximize_uniformly(&operands, keep, eliminate, tolerance)
        }
    }

    pub fn multiply_and_maximize_uniformly_variable(
        &self,
        potentials: &[Potential],
        eliminate: &Variable,
    ) -> Result<(TablePotential, TablePotential)> {
        let operands = tables("multiply and maximize uniformly", potentials)?;
        let keep = algebra::kept_variables(&operands, eliminate)?;
        self.multiply_and_maximize_uniformly(potentials, &keep, eliminate)
    }

    pub fn maximize(
        &self,
        potential: &Potential,
        variable: &Variable,
    ) -> Result<(TablePotential, ChoiceTable)> {
        let operand = table("maximize", potential)?;
        check_finite("maximize", std::slice::from_ref(variable))?;
        algebra::maximize(operand, variable, self.config.tie_tolerance)
    }

    pub fn divide(&self, numerator: &Potential, denominator: &Potential) -> Result<TablePotential> {
        let (numerator, denominator) = (table("divide", numerator)?, table("divide", denominator)?);
        scope::check_operand_state_counts(&[numerator, denominator])?;
        let result = algebra::divide(numerator, denominator);
        debug!(
            operation = "divide",
            cells = result.table_size(),
            "potential operation"
        );
        Ok(result)
    }

    /// Normalized copy of `potential`.
    pub fn normalize(&self, potential: &Potential) -> Result<TablePotential> {
        let operand = table("normalize", potential)?;
        debug!(
            operation = "normalize",
            role = ?operand.role(),
            cells = operand.table_size(),
            "potential operation"
        );
        algebra::normalize(operand)
    }

    /// Normalize a table in place.
    pub fn normalize_in_place(&self, potential: &mut Potential) -> Result<()> {
        match potential {
            Potential::Table(table) => algebra::normalize_in_place(table),
            other => Err(PotentialError::unsupported(
                "normalize",
                format!("{} potential", other.kind()),
            )),
        }
    }

    pub fn reorder(&self, potential: &Potential, new_order: &[Variable]) -> Result<TablePotential> {
        let operand = table("reorder", potential)?;
        check_finite("reorder", new_order)?;
        debug!(
            operation = "reorder",
            cells = operand.table_size(),
            "potential operation"
        );
        algebra::reorder(operand, new_order)
    }

    pub fn reorder_states<S: AsRef<str>>(
        &self,
        potential: &Potential,
        variable: &Variable,
        new_states: &[S],
    ) -> Result<TablePotential> {
        let operand = table("reorder states", potential)?;
        check_finite("reorder states", std::slice::from_ref(variable))?;
        debug!(
            operation = "reorder states",
            variable = %variable,
            "potential operation"
        );
        algebra::reorder_states(operand, variable, new_states)
    }

    /// Restrict a table to the configurations compatible with `evidence`.
    pub fn project(
        &self,
        potential: &Potential,
        evidence: &[(Variable, usize)],
    ) -> Result<TablePotential> {
        let operand = table("project", potential)?;
        debug!(
            operation = "project",
            observed = evidence.len(),
            "potential operation"
        );
        operand.project(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn var(name: &str, n: usize) -> Variable {
        Variable::with_num_states(name, n)
    }

    fn cpt(vars: &[&Variable], values: Vec<f64>) -> Potential {
        TablePotential::from_values(
            vars.iter().map(|v| (*v).clone()).collect(),
            PotentialRole::ConditionalProbability,
            values,
        )
        .unwrap()
        .into()
    }

    #[test]
    fn test_kinds_and_materialization() {
        let x = var("x", 3);
        let uniform = Potential::Uniform {
            variables: vec![x.clone()],
            role: PotentialRole::ConditionalProbability,
        };
        assert_eq!(uniform.kind(), PotentialKind::Uniform);
        assert!(uniform.as_table().is_none());
        let table = uniform.to_table().unwrap();
        assert_abs_diff_eq!(table.values()[0], 1.0 / 3.0, epsilon = 1e-12);

        let delta = Potential::Delta {
            variable: x.clone(),
            state: 2,
        };
        assert_eq!(delta.variables(), &[x.clone()]);
        assert_eq!(delta.to_table().unwrap().values(), &[0.0, 0.0, 1.0]);

        let gaussian = Potential::Gaussian {
            variable: Variable::numeric("t"),
            mean: 0.0,
            variance: 1.0,
        };
        assert!(matches!(
            gaussian.to_table(),
            Err(PotentialError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_non_table_operands_rejected() {
        let ops = PotentialOperations::default();
        let x = var("x", 2);
        let table = cpt(&[&x], vec![0.5, 0.5]);
        let gaussian = Potential::Gaussian {
            variable: Variable::numeric("t"),
            mean: 1.0,
            variance: 2.0,
        };

        let err = ops.multiply(&[table.clone(), gaussian.clone()]).unwrap_err();
        match err {
            PotentialError::UnsupportedType { operation, found } => {
                assert_eq!(operation, "multiply");
                assert!(found.contains("gaussian"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(ops.normalize(&gaussian).is_err());
        assert!(ops.divide(&table, &gaussian).is_err());
    }

    #[test]
    fn test_numeric_variables_rejected() {
        let ops = PotentialOperations::default();
        let x = var("x", 2);
        let table = cpt(&[&x], vec![0.5, 0.5]);
        let result = ops.multiply_and_marginalize(&[table], &[Variable::numeric("t")], &[x]);
        assert!(matches!(result, Err(PotentialError::UnsupportedType { .. })));
    }

    #[test]
    fn test_sum_out_through_facade() {
        let ops = PotentialOperations::default();
        let (a, b) = (var("A", 2), var("B", 2));
        let potentials = vec![
            cpt(&[&a], vec![0.4, 0.6]),
            cpt(&[&b, &a], vec![0.9, 0.1, 0.3, 0.7]),
        ];

        let pb = ops.multiply_and_eliminate(&potentials, &[a.clone()]).unwrap();
        assert_abs_diff_eq!(pb.values()[0], 0.54, epsilon = 1e-12);
        let same = ops.multiply_and_marginalize_to(&potentials, &[b]).unwrap();
        assert_eq!(pb, same);
        assert!(matches!(
            ops.multiply_and_marginalize(&potentials, &[a.clone()], &[a]),
            Err(PotentialError::InvalidPartition(_))
        ));
    }

    #[test]
    fn test_parallel_dispatch_matches_sequential() {
        let (a, b, c) = (var("A", 4), var("B", 3), var("C", 5));
        let values: Vec<f64> = (0..60).map(|i| (i % 7) as f64).collect();
        let potentials = vec![Potential::from(
            TablePotential::from_values(
                vec![a.clone(), b.clone(), c.clone()],
                PotentialRole::Utility,
                values,
            )
            .unwrap(),
        )];

        let sequential = PotentialOperations::default();
        let parallel = PotentialOperations::new(
            AlgebraConfig::new()
                .with_parallelism(true)
                .with_parallel_threshold(1),
        )
        .unwrap();

        let keep = [c.clone(), a.clone()];
        assert_eq!(
            sequential.multiply_and_maximize(&potentials, &keep, &b).unwrap(),
            parallel.multiply_and_maximize(&potentials, &keep, &b).unwrap()
        );
        assert_eq!(
            sequential
                .multiply_and_maximize_uniformly(&potentials, &keep, &b)
                .unwrap(),
            parallel
                .multiply_and_maximize_uniformly(&potentials, &keep, &b)
                .unwrap()
        );
        let seq_sum = sequential.multiply_and_marginalize(&potentials, &keep, &[b.clone()]).unwrap();
        let par_sum = parallel.multiply_and_marginalize(&potentials, &keep, &[b]).unwrap();
        for (s, p) in seq_sum.values().iter().zip(par_sum.values()) {
            assert_abs_diff_eq!(*s, *p, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tolerance_comes_from_config() {
        let d = var("D", 2);
        let utility: Potential =
            TablePotential::from_values(vec![d.clone()], PotentialRole::Utility, vec![1.0, 1.05])
                .unwrap()
                .into();

        let strict = PotentialOperations::default();
        let (_, choices) = strict.maximize(&utility, &d).unwrap();
        assert_eq!(choices.at(0).ties(), &[1]);

        let loose =
            PotentialOperations::new(AlgebraConfig::new().with_tie_tolerance(0.1)).unwrap();
        let (_, choices) = loose.maximize(&utility, &d).unwrap();
        assert_eq!(choices.at(0).ties(), &[0, 1]);

        assert!(PotentialOperations::new(AlgebraConfig::new().with_tie_tolerance(-0.1)).is_err());
    }

    #[test]
    fn test_normalize_in_place_and_project() {
        let ops = PotentialOperations::default();
        let (a, b) = (var("A", 2), var("B", 2));
        let mut joint: Potential = TablePotential::from_values(
            vec![a.clone(), b.clone()],
            PotentialRole::JointProbability,
            vec![1.0, 1.0, 1.0, 5.0],
        )
        .unwrap()
        .into();

        ops.normalize_in_place(&mut joint).unwrap();
        assert_abs_diff_eq!(joint.as_table().unwrap().total(), 1.0, epsilon = 1e-12);

        let slice = ops.project(&joint, &[(b, 1)]).unwrap();
        assert_eq!(slice.variables(), &[a]);
        assert_abs_diff_eq!(slice.values()[1], 0.625, epsilon = 1e-12);
    }

    #[test]
    fn test_conflicting_state_counts_are_errors() {
        let ops = PotentialOperations::default();
        let p: Potential = TablePotential::new(vec![var("x", 2)], PotentialRole::JointProbability)
            .unwrap()
            .into();
        let q: Potential = TablePotential::new(vec![var("x", 3)], PotentialRole::JointProbability)
            .unwrap()
            .into();
        let operands = [p.clone(), q.clone()];

        for result in [
            ops.multiply(&operands),
            ops.sum(&operands),
            ops.multiply_and_marginalize_to(&operands, &[]),
            ops.multiply_and_eliminate(&operands, &[var("x", 2)]),
            ops.divide(&p, &q),
        ] {
            assert!(matches!(result, Err(PotentialError::VariableMismatch(_))));
        }
        assert!(matches!(
            ops.multiply_and_maximize_variable(&operands, &var("x", 2)),
            Err(PotentialError::VariableMismatch(_))
        ));
    }
}
