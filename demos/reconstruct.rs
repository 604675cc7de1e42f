//! Train the autoencoder to fill in a partially observed ratings matrix.
//!
//! Run with `RUST_LOG=rust_autoencoder=debug` to see per-step loss events.

use ndarray::{Array2, array};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use rust_autoencoder::{AutoencoderBuilder, Batch, Mode, evaluation, inference, training};

fn main() -> rust_autoencoder::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Ratings on a 1..5 scale; 0.0 marks an unobserved rating.
    let ratings = array![
        [5.0_f32, 3.0, 0.0, 1.0],
        [4.0, 0.0, 0.0, 1.0],
        [1.0, 1.0, 0.0, 5.0],
        [1.0, 0.0, 0.0, 4.0],
        [0.0, 1.0, 5.0, 4.0]
    ];
    let observed: Array2<bool> = ratings.mapv(|r| r > 0.0);
    let batch = Batch::reconstruction(ratings.clone(), &observed)?;

    let mut model = AutoencoderBuilder::new(4)?
        .hidden_units(8, 3)?
        .keep_prob(0.8)?
        .build_with_seed(0)?;

    let mut train_op = training(0.01)?;
    let mut rng = StdRng::seed_from_u64(0);
    for epoch in 0..500 {
        let report = train_op.run(&mut model, &batch, &mut rng)?;
        if epoch % 100 == 0 {
            println!("step={} loss={:.4}", report.global_step, report.loss);
        }
    }

    let logits = inference(&model, &ratings, Mode::Eval, &mut rng)?;
    let eval = evaluation(&logits, &ratings, &observed)?;
    println!(
        "observed entries within rounding: {}/{}",
        eval.correct, eval.total
    );
    println!("reconstruction:\n{logits:.2}");
    Ok(())
}
