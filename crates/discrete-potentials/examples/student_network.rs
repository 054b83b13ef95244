//! Bayesian Network Example: Student Performance Model
//!
//! Exact inference on a small Bayesian network by hand-driven variable
//! elimination: every query is one fused multiply-and-marginalize (or
//! maximize) over the network's conditional tables.

use discrete_potentials::{
    algebra, Potential, PotentialOperations, PotentialRole, TablePotential, Variable,
};

fn cpt(variables: &[&Variable], values: Vec<f64>) -> discrete_potentials::Result<TablePotential> {
    TablePotential::from_values(
        variables.iter().map(|v| (*v).clone()).collect(),
        PotentialRole::ConditionalProbability,
        values,
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Bayesian Network: Student Performance Model ===\n");

    // Structure: Difficulty → Grade ← Intelligence
    //                          ↓
    //                        SAT
    let difficulty = Variable::new("Difficulty", ["easy", "hard"]);
    let intelligence = Variable::new("Intelligence", ["low", "high"]);
    let grade = Variable::new("Grade", ["A", "B", "C"]);
    let sat = Variable::new("SAT", ["low", "high"]);

    let p_difficulty = cpt(&[&difficulty], vec![0.6, 0.4])?;
    let p_intelligence = cpt(&[&intelligence], vec![0.7, 0.3])?;
    // Conditioned variable first; parents vary slower, Difficulty before Intelligence
    let p_grade = cpt(
        &[&grade, &difficulty, &intelligence],
        vec![
            0.3, 0.4, 0.3, // easy, low
            0.05, 0.25, 0.7, // hard, low
            0.9, 0.08, 0.02, // easy, high
            0.5, 0.3, 0.2, // hard, high
        ],
    )?;
    let p_sat = cpt(
        &[&sat, &intelligence],
        vec![
            0.95, 0.05, // low
            0.2, 0.8, // high
        ],
    )?;
    let network = [&p_difficulty, &p_intelligence, &p_grade, &p_sat];
    println!("Built {} conditional tables\n", network.len());

    // === Query 1: Marginal over grades ===
    println!("=== Query 1: What's the probability distribution over Grades? ===");
    let grade_marginal =
        algebra::multiply_and_marginalize_to(&network, std::slice::from_ref(&grade))?;
    for (state, p) in grade.states().iter().zip(grade_marginal.values()) {
        println!("  P(Grade={}) = {:.3}", state, p);
    }
    println!();

    // === Query 2: Conditional with evidence ===
    println!("=== Query 2: If we observe SAT=high, what's the distribution over Intelligence? ===");
    let evidence = [(sat.clone(), 1)];
    let projected = network
        .iter()
        .map(|p| p.project(&evidence))
        .collect::<discrete_potentials::Result<Vec<_>>>()?;
    let unnormalized =
        algebra::multiply_and_marginalize_to(&projected, std::slice::from_ref(&intelligence))?;
    println!("  P(SAT=high) = {:.3}", unnormalized.total());
    let posterior = algebra::normalize(&unnormalized)?;
    for (state, p) in intelligence.states().iter().zip(posterior.values()) {
        println!("  P(Intelligence={} | SAT=high) = {:.3}", state, p);
    }
    println!();

    // === Query 3: Most probable explanation of an A grade ===
    println!("=== Query 3: Given Grade=A, which difficulty is most likely? ===");
    let ops = PotentialOperations::default();
    let given_a = [(grade.clone(), 0)];
    let joint = network
        .iter()
        .map(|p| p.project(&given_a).map(Potential::from))
        .collect::<discrete_potentials::Result<Vec<_>>>()?;
    let difficulty_joint = ops.multiply_and_marginalize_to(&joint, &[difficulty.clone()])?;
    let (best, choices) = ops.maximize(&Potential::from(difficulty_joint), &difficulty)?;
    println!(
        "  argmax: {} (joint mass {:.4})",
        choices.at(0),
        best.values()[0]
    );
    println!();

    // === Query 4: Full joint ===
    println!("=== Query 4: Computing the joint distribution ===");
    let full = algebra::multiply(&network);
    println!("Joint table has {} cells", full.table_size());
    println!(
        "Joint distribution sums to: {:.6} (should be ~1.0)\n",
        full.total()
    );

    println!("=== Summary ===");
    println!("✓ Marginal inference by fused sum-out");
    println!("✓ Evidence by projection, then normalization");
    println!("✓ Max-out with recorded maximizing states");

    Ok(())
}
