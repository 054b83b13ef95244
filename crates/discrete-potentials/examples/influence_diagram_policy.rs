//! Influence Diagram Example: Test-and-Treat Decision
//!
//! Computes the optimal (randomized) therapy policy of a one-decision
//! influence diagram, then constrains the disease model with a link
//! restriction and shows the redistributed conditional table.

use discrete_potentials::link_restriction::update_potential_by_link_restrictions;
use discrete_potentials::{
    AlgebraConfig, LinkRestriction, NodeKind, Potential, PotentialOperations, PotentialRole,
    RestrictedNode, TablePotential, Variable,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Influence Diagram: Test and Treat ===\n");

    let disease = Variable::new("Disease", ["present", "absent"]);
    let result = Variable::new("Result", ["positive", "negative"]);
    let therapy = Variable::new("Therapy", ["yes", "no"]);

    let p_disease = TablePotential::from_values(
        vec![disease.clone()],
        PotentialRole::ConditionalProbability,
        vec![0.14, 0.86],
    )?;
    let p_result = TablePotential::from_values(
        vec![result.clone(), disease.clone()],
        PotentialRole::ConditionalProbability,
        vec![
            0.91, 0.09, // present
            0.03, 0.97, // absent
        ],
    )?;
    let health = TablePotential::from_values(
        vec![therapy.clone(), disease.clone()],
        PotentialRole::Utility,
        vec![
            8.0, 3.0, // present
            9.0, 10.0, // absent
        ],
    )?;

    let ops = PotentialOperations::new(AlgebraConfig::new().with_tie_tolerance(1e-9))?;

    // Expected utility of every (therapy, result) pair
    let model: Vec<Potential> = vec![p_disease.into(), p_result.clone().into(), health.into()];
    let expected_utility =
        ops.multiply_and_marginalize(&model, &[therapy.clone(), result.clone()], &[disease.clone()])?;
    println!("Expected utility table role: {:?}", expected_utility.role());

    // Optimal policy: maximize out the decision, spreading ties uniformly
    let (best, policy) = ops.multiply_and_maximize_uniformly(
        &[expected_utility.clone().into()],
        &[result.clone()],
        &therapy,
    )?;
    for (r, state) in result.states().iter().enumerate() {
        let treat = policy.value(&[0, r]);
        println!(
            "  Result={:<8} -> P(Therapy=yes) = {:.2}, expected utility {:.3}",
            state,
            treat,
            best.values()[r]
        );
    }

    let (_, choices) = ops.multiply_and_maximize(
        &[expected_utility.into()],
        &[result.clone()],
        &therapy,
    )?;
    for choice in &choices {
        println!("  choice: {}", choice);
    }
    println!();

    // === Link restriction ===
    println!("=== Link restriction: an absent disease never tests positive ===");
    let mut restriction = LinkRestriction::new(disease.clone(), result.clone())?;
    restriction.forbid(1, 0);
    let node = RestrictedNode::new(result.clone(), NodeKind::Chance).with_link_restriction(restriction)?;

    let (restricted, report) = update_potential_by_link_restrictions(&node, &p_result)?;
    println!(
        "  zeroed {} cell(s), rescaled {} block(s), forced {} block(s)",
        report.zeroed,
        report.rescaled,
        report.forced
    );
    for (d, state) in disease.states().iter().enumerate() {
        println!(
            "  P(Result | Disease={}) = [{:.2}, {:.2}]",
            state,
            restricted.value(&[0, d]),
            restricted.value(&[1, d])
        );
    }

    println!("\n=== Summary ===");
    println!("✓ Expected utilities by fused sum-out with a utility operand");
    println!("✓ Uniform policy and recorded choices by max-out");
    println!("✓ Conditional table kept consistent with a link restriction");

    Ok(())
}
