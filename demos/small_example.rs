//! Linearize the small simulated-2D example and take one Gauss-Newton step.
//!
//! ```bash
//! RUST_LOG=apex_linearization=debug cargo run --example small_example -- --parallel
//! ```

use apex_linearization::factors::small_example;
use apex_linearization::{LinearizeConfig, init_logger};
use clap::Parser;
use nalgebra::{DMatrix, DVector};
use tracing::info;

#[derive(Parser)]
#[command(name = "small_example")]
#[command(about = "Linearize the two-pose, one-landmark example and step to the solution")]
struct Args {
    /// Linearize on the rayon thread pool
    #[arg(short, long)]
    parallel: bool,

    /// Print every Jacobian block
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logger();

    let graph = small_example::nonlinear_factor_graph()?;
    let values = small_example::noisy_values()?;
    let ordering = values.ordering_arbitrary();
    info!("{}", graph.statistics());

    let config = LinearizeConfig::new()
        .with_parallel(args.parallel)
        .with_min_factors_for_parallel(1);
    let linear = graph.linearize_with_config(&values, &ordering, &config)?;

    for (i, factor) in linear.iter().enumerate() {
        info!(
            "f{}: keys {:?}, b = {:?}",
            i + 1,
            factor.keys().iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            factor.b().as_slice()
        );
        if args.verbose {
            for (key, block) in factor.keys().iter().zip(factor.blocks()) {
                info!("  A[{key}] = {block}");
            }
        }
    }

    let reference = small_example::linear_factor_graph(&ordering)?;
    info!("Matches reference linear graph: {}", linear.equals(&reference, 1e-8));

    // The solver side: normal equations on the stacked sparse system.
    let (a, b) = linear.sparse_system(&ordering)?;
    let dense = a.as_ref().to_dense();
    let a = DMatrix::from_fn(dense.nrows(), dense.ncols(), |r, c| dense[(r, c)]);
    let b = DVector::from_fn(b.nrows(), |r, _| b[(r, 0)]);
    let delta = (a.transpose() * &a)
        .cholesky()
        .ok_or("normal equations are not positive definite")?
        .solve(&(a.transpose() * b));

    let updated = values.retract(&delta, &ordering)?;
    info!(
        "Error before step: {:.6}, after step: {:.3e}",
        graph.error(&values)?,
        graph.error(&updated)?
    );
    for (key, value) in updated.iter() {
        info!("{key} = {value}");
    }
    Ok(())
}
