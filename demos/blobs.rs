//! Train a perceptron on three Gaussian blobs and report held-out accuracy.
//!
//! Run with: cargo run --example blobs [-- path/to/config.json]

use std::env;

use ndarray::{Array1, Array2};
use ndarray_rand::{
    rand::{rngs::StdRng, SeedableRng},
    rand_distr::{Distribution, Normal},
};
use perceptron::{
    data::DataLoader,
    metrics::{accuracy, confusion_matrix},
    trainer::Trainer,
    utils::train_test_split,
    Mlp, MlpConfig, Result,
};

const CENTERS: [[f64; 2]; 3] = [[-2.0, 0.0], [2.0, 0.0], [0.0, 2.5]];

fn generate_blobs(per_class: usize, seed: u64) -> (Array2<f64>, Array1<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.7).expect("valid standard deviation");
    let mut xs = Vec::with_capacity(per_class * CENTERS.len() * 2);
    let mut ys = Vec::with_capacity(per_class * CENTERS.len());
    for (label, center) in CENTERS.iter().enumerate() {
        for _ in 0..per_class {
            xs.push(center[0] + noise.sample(&mut rng));
            xs.push(center[1] + noise.sample(&mut rng));
            ys.push(label);
        }
    }
    let input = Array2::from_shape_vec((ys.len(), 2), xs).expect("two features per example");
    (input, Array1::from(ys))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => MlpConfig::from_path(path)?,
        None => MlpConfig::new(vec![2, 16, CENTERS.len()], 0.5)
            .with_num_epochs(40)
            .with_batch_size(30),
    };
    config.ensure_fits(2, CENTERS.len())?;

    let (xs, ys) = generate_blobs(200, config.random_seed);
    let (x_train, y_train, x_test, y_test) =
        train_test_split(xs.view(), ys.view(), 0.25, config.random_seed)?;

    let mut model = Mlp::new(&config)?;
    let mut loader = DataLoader::new(x_train, y_train)?.shuffle(config.random_seed);
    let reports = Trainer::new(&config)?.train(&mut model, &mut loader)?;
    if let Some(last) = reports.last() {
        println!("final training loss = {:.4}", last.loss);
    }

    let y_pred = model.predict(x_test.view())?;
    println!("accuracy: {}", accuracy(y_test.view(), y_pred.view()));
    println!(
        "{:?}",
        confusion_matrix(y_test.view(), y_pred.view(), CENTERS.len())
    );
    Ok(())
}
