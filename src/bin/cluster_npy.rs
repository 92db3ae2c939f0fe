//! Cluster a batch stored in a .npy file and save the final centroids.
//!
//! The input is an `n x (d + 1)` float64 array whose last column is the
//! identifier tag. Every progress report is logged; set `RUST_LOG=debug` to
//! also see the engine's per-pass logs.
//!
//! Usage: `cluster-npy <input.npy> <centroids.npy> <k> [seed] [max_iters]`

use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use std::env;
use std::fs::File;
use std::io::BufReader;
use stepkmeans::{KMeans, KMeansConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if !(4..=6).contains(&args.len()) {
        eprintln!(
            "Usage: {} <input.npy> <centroids.npy> <k> [seed] [max_iters]",
            args[0]
        );
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let k: usize = args[3].parse()?;
    if k == 0 {
        return Err("k must be greater than 0".into());
    }

    let mut config = KMeansConfig::new(k);
    if let Some(seed) = args.get(4) {
        config = config.with_seed(seed.parse()?);
    }
    if let Some(max_iters) = args.get(5) {
        config = config.with_max_iters(max_iters.parse()?);
    }

    // Read input data
    let reader = BufReader::new(File::open(input_path)?);
    let data: Array2<f64> = Array2::read_npy(reader)?;

    info!(
        samples = data.nrows(),
        arity = data.ncols(),
        k,
        seed = ?config.seed,
        max_iters = config.max_iters,
        "loaded batch"
    );

    let mut kmeans = KMeans::with_config(config);
    let last = kmeans.fit(&data.view(), |p| {
        let sizes: Vec<usize> = p.clusters.iter().map(Vec::len).collect();
        info!(
            iteration = p.iteration,
            finished = p.finished,
            centroids = p.centroids.nrows(),
            cluster_sizes = ?sizes,
            "progress"
        );
    })?;

    if !last.converged {
        warn!(iterations = last.iteration, "did not converge");
    }

    let writer = File::create(output_path)?;
    last.centroids.write_npy(writer)?;

    info!(path = %output_path, shape = ?last.centroids.shape(), "saved centroids");

    Ok(())
}
