//! Link restrictions and probability redistribution.
//!
//! A link restriction on a parent → child edge forbids some (parent state,
//! child state) pairs. Keeping the child's conditional table consistent with
//! it means zeroing every cell that pairs a forbidden combination and, for
//! chance nodes, rescaling the remaining states of the child in that block so
//! they sum to one again.
//!
//! When the remaining states of a block carry no mass at all, a binary child
//! gets probability 1 on its remaining state. For a child with more states no
//! rule is applied: the block is left as is, reported in
//! [`RedistributionReport::unresolved`], and a warning is logged.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{PotentialError, Result};
use crate::table::{check_state, PotentialRole, TablePotential};
use crate::variable::Variable;

/// Kind of the node whose table is being restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Chance,
    Decision,
    Utility,
}

/// Compatibility table of a parent → child link.
///
/// The table is over `[parent, child]`; a value of 0 forbids the pair and any
/// other value allows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LinkRestrictionRecord", into = "LinkRestrictionRecord")]
pub struct LinkRestriction {
    table: TablePotential,
}

impl LinkRestriction {
    /// A restriction that still allows every pair.
    pub fn new(parent: Variable, child: Variable) -> Result<Self> {
        Ok(Self {
            table: TablePotential::new(vec![parent, child], PotentialRole::LinkRestriction)?,
        })
    }

    /// Wrap an existing compatibility table over `[parent, child]`.
    pub fn from_table(table: TablePotential) -> Result<Self> {
        if table.num_variables() != 2 {
            return Err(PotentialError::VariableMismatch(format!(
                "a link restriction is over [parent, child], got {} variables",
                table.num_variables()
            )));
        }
        Ok(Self { table })
    }

    pub fn parent(&self) -> &Variable {
        &self.table.variables()[0]
    }

    pub fn child(&self) -> &Variable {
        &self.table.variables()[1]
    }

    pub fn table(&self) -> &TablePotential {
        &self.table
    }

    /// Forbid a (parent state, child state) pair.
    ///
    /// # Panics
    ///
    /// Panics if a state is out of range.
    pub fn forbid(&mut self, parent_state: usize, child_state: usize) {
        self.table.set_value(&[parent_state, child_state], 0.0);
    }

    /// Allow a (parent state, child state) pair again.
    pub fn allow(&mut self, parent_state: usize, child_state: usize) {
        self.table.set_value(&[parent_state, child_state], 1.0);
    }

    pub fn is_compatible(&self, parent_state: usize, child_state: usize) -> bool {
        self.table.value(&[parent_state, child_state]) != 0.0
    }

    /// Forbidden pairs, parent state outermost.
    pub fn forbidden_pairs(&self) -> Vec<(usize, usize)> {
        let (parents, children) = (self.parent().num_states(), self.child().num_states());
        (0..parents)
            .flat_map(|p| (0..children).map(move |c| (p, c)))
            .filter(|&(p, c)| !self.is_compatible(p, c))
            .collect()
    }

    /// Whether any pair is forbidden.
    pub fn has_restrictions(&self) -> bool {
        self.table.values().iter().any(|&v| v == 0.0)
    }
}

/// A node together with the restrictions on its parent links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RestrictedNodeRecord", into = "RestrictedNodeRecord")]
pub struct RestrictedNode {
    variable: Variable,
    kind: NodeKind,
    parent_links: Vec<LinkRestriction>,
}

impl RestrictedNode {
    pub fn new(variable: Variable, kind: NodeKind) -> Self {
        Self {
            variable,
            kind,
            parent_links: Vec::new(),
        }
    }

    /// Attach the restriction of an incoming link.
    pub fn with_link_restriction(mut self, restriction: LinkRestriction) -> Result<Self> {
        self.add_link_restriction(restriction)?;
        Ok(self)
    }

    /// Attach the restriction of an incoming link, replacing any previous one
    /// from the same parent.
    pub fn add_link_restriction(&mut self, restriction: LinkRestriction) -> Result<()> {
        if restriction.child() != &self.variable {
            return Err(PotentialError::VariableMismatch(format!(
                "restriction on link {} -> {} does not end at {}",
                restriction.parent(),
                restriction.child(),
                self.variable
            )));
        }
        self.parent_links
            .retain(|link| link.parent() != restriction.parent());
        self.parent_links.push(restriction);
        Ok(())
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Parent links forbidding at least one pair.
    pub fn parent_links_with_restriction(&self) -> Vec<&LinkRestriction> {
        self.parent_links
            .iter()
            .filter(|link| link.has_restrictions())
            .collect()
    }

    pub fn has_link_restriction(&self) -> bool {
        self.parent_links.iter().any(LinkRestriction::has_restrictions)
    }
}

/// Serialized forms; loading goes through the validating constructors.
#[derive(Serialize, Deserialize)]
struct LinkRestrictionRecord {
    table: TablePotential,
}

impl TryFrom<LinkRestrictionRecord> for LinkRestriction {
    type Error = PotentialError;

    fn try_from(record: LinkRestrictionRecord) -> Result<Self> {
        Self::from_table(record.table)
    }
}

impl From<LinkRestriction> for LinkRestrictionRecord {
    fn from(restriction: LinkRestriction) -> Self {
        Self {
            table: restriction.table,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RestrictedNodeRecord {
    variable: Variable,
    kind: NodeKind,
    #[serde(default)]
    parent_links: Vec<LinkRestriction>,
}

impl TryFrom<RestrictedNodeRecord> for RestrictedNode {
    type Error = PotentialError;

    fn try_from(record: RestrictedNodeRecord) -> Result<Self> {
        let mut node = Self::new(record.variable, record.kind);
        for link in record.parent_links {
            node.add_link_restriction(link)?;
        }
        Ok(node)
    }
}

impl From<RestrictedNode> for RestrictedNodeRecord {
    fn from(node: RestrictedNode) -> Self {
        Self {
            variable: node.variable,
            kind: node.kind,
            parent_links: node.parent_links,
        }
    }
}

/// Every configuration of a table with two axes held at fixed states.
///
/// Produced by an explicit mixed-radix counter over the free axes, first axis
/// fastest.
#[derive(Debug, Clone)]
pub struct StateCombinations {
    dimensions: Vec<usize>,
    fixed: [usize; 2],
    next: Option<Vec<usize>>,
}

impl Iterator for StateCombinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut successor = current.clone();
        for axis in 0..successor.len() {
            if self.fixed.contains(&axis) {
                continue;
            }
            successor[axis] += 1;
            if successor[axis] < self.dimensions[axis] {
                self.next = Some(successor);
                break;
            }
            successor[axis] = 0;
        }
        Some(current)
    }
}

/// Enumerate the configurations of `variables` with `fixed_a = (axis, state)`
/// and `fixed_b = (axis, state)`.
///
/// # Panics
///
/// Panics if an axis or state is out of range or both pairs name the same axis.
pub fn state_combinations(
    variables: &[Variable],
    fixed_a: (usize, usize),
    fixed_b: (usize, usize),
) -> StateCombinations {
    assert_ne!(fixed_a.0, fixed_b.0, "fixed axes must differ");
    let dimensions: Vec<usize> = variables.iter().map(Variable::num_states).collect();
    let mut start = vec![0; dimensions.len()];
    for (axis, state) in [fixed_a, fixed_b] {
        assert!(
            state < dimensions[axis],
            "state {} out of range for variable {}",
            state,
            variables[axis]
        );
        start[axis] = state;
    }
    StateCombinations {
        dimensions,
        fixed: [fixed_a.0, fixed_b.0],
        next: Some(start),
    }
}

/// What redistribution did to one block of the node's axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedistributionOutcome {
    /// The node has a single state
    Untouched,
    /// The allowed states were rescaled to sum to one
    Rescaled,
    /// No mass was left and the remaining state of a binary node was set to one
    ForcedToOne,
    /// No mass was left on a node with more than two states
    Unresolved,
}

/// Summary of a link-restriction update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedistributionReport {
    /// Number of cells set to zero
    pub zeroed: usize,
    /// Number of blocks rescaled
    pub rescaled: usize,
    /// Number of binary blocks forced to probability one
    pub forced: usize,
    /// Configurations whose block had no mass left to redistribute
    pub unresolved: Vec<Vec<usize>>,
}

impl RedistributionReport {
    fn record(&mut self, configuration: &[usize], outcome: RedistributionOutcome) {
        match outcome {
            RedistributionOutcome::Untouched => {}
            RedistributionOutcome::Rescaled => self.rescaled += 1,
            RedistributionOutcome::ForcedToOne => self.forced += 1,
            RedistributionOutcome::Unresolved => self.unresolved.push(configuration.to_vec()),
        }
    }

    fn merge(&mut self, other: RedistributionReport) {
        self.zeroed += other.zeroed;
        self.rescaled += other.rescaled;
        self.forced += other.forced;
        self.unresolved.extend(other.unresolved);
    }

    /// Whether every touched block still sums to one.
    pub fn is_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

fn axis_of(potential: &TablePotential, variable: &Variable) -> Result<usize> {
    potential
        .index_of(variable)
        .ok_or_else(|| PotentialError::VariableNotFound(variable.name().to_string()))
}

/// Configurations of the node's table implied by every forbidden pair of
/// every restricted parent link.
pub fn state_combinations_with_link_restriction(
    node: &RestrictedNode,
    potential: &TablePotential,
) -> Result<Vec<Vec<usize>>> {
    let mut combinations = Vec::new();
    for link in node.parent_links_with_restriction() {
        let parent_axis = axis_of(potential, link.parent())?;
        let child_axis = axis_of(potential, link.child())?;
        for (p, c) in link.forbidden_pairs() {
            combinations.extend(state_combinations(
                potential.variables(),
                (parent_axis, p),
                (child_axis, c),
            ));
        }
    }
    Ok(combinations)
}

/// Rescale the node's block containing `configuration` so that the states
/// allowed by every parent restriction sum to one.
///
/// # Panics
///
/// Panics if `configuration` does not address a cell of `potential`.
pub fn redistribute_probabilities_in_place(
    node: &RestrictedNode,
    potential: &mut TablePotential,
    configuration: &[usize],
) -> Result<RedistributionOutcome> {
    let axis = axis_of(potential, node.variable())?;
    let links = node
        .parent_links_with_restriction()
        .into_iter()
        .map(|link| Ok((axis_of(potential, link.parent())?, link)))
        .collect::<Result<Vec<_>>>()?;

    let num_states = potential.dimensions()[axis];
    if num_states <= 1 {
        return Ok(RedistributionOutcome::Untouched);
    }
    let offset = potential.offsets()[axis];
    let base = potential.position(configuration) - configuration[axis] * offset;

    let modifiable: Vec<usize> = (0..num_states)
        .filter(|&state| {
            links
                .iter()
                .all(|(parent_axis, link)| link.is_compatible(configuration[*parent_axis], state))
        })
        .collect();
    let values = potential.values_mut();
    let mass: f64 = modifiable.iter().map(|&s| values[base + s * offset]).sum();

    if mass > 0.0 {
        for &state in &modifiable {
            values[base + state * offset] /= mass;
        }
        Ok(RedistributionOutcome::Rescaled)
    } else if num_states == 2 {
        for &state in &modifiable {
            values[base + state * offset] = 1.0;
        }
        Ok(RedistributionOutcome::ForcedToOne)
    } else {
        warn!(
            node = %node.variable(),
            configuration = ?configuration,
            states = num_states,
            "no probability mass left to redistribute"
        );
        Ok(RedistributionOutcome::Unresolved)
    }
}

/// Pure form of [`redistribute_probabilities_in_place`].
pub fn redistribute_probabilities(
    node: &RestrictedNode,
    potential: &TablePotential,
    configuration: &[usize],
) -> Result<(TablePotential, RedistributionOutcome)> {
    let mut updated = potential.clone();
    let outcome = redistribute_probabilities_in_place(node, &mut updated, configuration)?;
    Ok((updated, outcome))
}

/// Zero the cells of one forbidden pair and rebalance chance nodes.
fn apply_pair(
    node: &RestrictedNode,
    potential: &mut TablePotential,
    (parent_axis, parent_state): (usize, usize),
    (child_axis, child_state): (usize, usize),
    report: &mut RedistributionReport,
) -> Result<()> {
    let combinations: Vec<Vec<usize>> = state_combinations(
        potential.variables(),
        (parent_axis, parent_state),
        (child_axis, child_state),
    )
    .collect();
    for configuration in combinations {
        potential.set_value(&configuration, 0.0);
        report.zeroed += 1;
        if node.kind() == NodeKind::Chance {
            let outcome = redistribute_probabilities_in_place(node, potential, &configuration)?;
            report.record(&configuration, outcome);
        }
    }
    Ok(())
}

fn link_axes(
    node: &RestrictedNode,
    restriction: &LinkRestriction,
    potential: &TablePotential,
) -> Result<(usize, usize)> {
    if restriction.child() != node.variable() {
        return Err(PotentialError::VariableMismatch(format!(
            "restriction on link {} -> {} does not end at {}",
            restriction.parent(),
            restriction.child(),
            node.variable()
        )));
    }
    Ok((
        axis_of(potential, restriction.parent())?,
        axis_of(potential, restriction.child())?,
    ))
}

/// Enforce every forbidden pair of `restriction` on the node's table.
pub fn update_potential_by_link_restriction_in_place(
    node: &RestrictedNode,
    restriction: &LinkRestriction,
    potential: &mut TablePotential,
) -> Result<RedistributionReport> {
    let (parent_axis, child_axis) = link_axes(node, restriction, potential)?;
    let mut report = RedistributionReport::default();
    for (p, c) in restriction.forbidden_pairs() {
        apply_pair(node, potential, (parent_axis, p), (child_axis, c), &mut report)?;
    }
    trace!(
        node = %node.variable(),
        parent = %restriction.parent(),
        zeroed = report.zeroed,
        "applied link restriction"
    );
    Ok(report)
}

/// Pure form of [`update_potential_by_link_restriction_in_place`].
pub fn update_potential_by_link_restriction(
    node: &RestrictedNode,
    restriction: &LinkRestriction,
    potential: &TablePotential,
) -> Result<(TablePotential, RedistributionReport)> {
    let mut updated = potential.clone();
    let report = update_potential_by_link_restriction_in_place(node, restriction, &mut updated)?;
    Ok((updated, report))
}

/// Enforce one newly forbidden pair of `restriction` on the node's table.
pub fn update_potential_by_add_link_restriction_in_place(
    node: &RestrictedNode,
    restriction: &LinkRestriction,
    parent_state: usize,
    child_state: usize,
    potential: &mut TablePotential,
) -> Result<RedistributionReport> {
    let (parent_axis, child_axis) = link_axes(node, restriction, potential)?;
    check_state(restriction.parent(), parent_state)?;
    check_state(restriction.child(), child_state)?;
    let mut report = RedistributionReport::default();
    apply_pair(
        node,
        potential,
        (parent_axis, parent_state),
        (child_axis, child_state),
        &mut report,
    )?;
    Ok(report)
}

/// Pure form of [`update_potential_by_add_link_restriction_in_place`].
pub fn update_potential_by_add_link_restriction(
    node: &RestrictedNode,
    restriction: &LinkRestriction,
    parent_state: usize,
    child_state: usize,
    potential: &TablePotential,
) -> Result<(TablePotential, RedistributionReport)> {
    let mut updated = potential.clone();
    let report = update_potential_by_add_link_restriction_in_place(
        node,
        restriction,
        parent_state,
        child_state,
        &mut updated,
    )?;
    Ok((updated, report))
}

/// Enforce the restrictions of every restricted parent link in turn.
pub fn update_potential_by_link_restrictions_in_place(
    node: &RestrictedNode,
    potential: &mut TablePotential,
) -> Result<RedistributionReport> {
    let mut report = RedistributionReport::default();
    for link in node.parent_links_with_restriction() {
        report.merge(update_potential_by_link_restriction_in_place(
            node, link, potential,
        )?);
    }
    Ok(report)
}

/// Pure form of [`update_potential_by_link_restrictions_in_place`].
pub fn update_potential_by_link_restrictions(
    node: &RestrictedNode,
    potential: &TablePotential,
) -> Result<(TablePotential, RedistributionReport)> {
    let mut updated = potential.clone();
    let report = update_potential_by_link_restrictions_in_place(node, &mut updated)?;
    Ok((updated, report))
}
