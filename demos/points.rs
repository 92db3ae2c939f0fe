//! Cluster a 2-D point cloud through the offloaded worker
//!
//! Run with: cargo run --example points --release

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stepkmeans::points::{blobs, sort_centroids};
use stepkmeans::vector::batch_from_rows;
use stepkmeans::worker::{self, Request, WorkerOptions};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    // 4 blobs on a 480x480 canvas, as drawn by a scatter plot
    let size = 480.0;
    let centers = [
        [0.25 * size, 0.25 * size],
        [0.75 * size, 0.25 * size],
        [0.25 * size, 0.75 * size],
        [0.75 * size, 0.75 * size],
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let data = blobs(&centers, 320, 200.0, &mut rng);

    println!("True centers:");
    for (i, center) in centers.iter().enumerate() {
        println!("  Center {}: ({:.0}, {:.0})", i + 1, center[0], center[1]);
    }
    println!();

    let request = Request {
        input: data.outer_iter().map(|row| row.to_vec()).collect(),
        k: 4,
        iteration_limit: None,
    };
    let handle = worker::spawn(request, WorkerOptions::default().with_report_every(1));

    for message in handle {
        let response = message?;
        let sizes: Vec<usize> = response.clusters.iter().map(Vec::len).collect();
        info!(
            iteration = response.iteration,
            finished = response.finished,
            sizes = ?sizes,
            "progress"
        );

        if response.finished {
            if !response.converged {
                println!("Did not converge");
            }
            let centroids = batch_from_rows(&response.centroids)?;
            println!("Centroids after {} iterations:", response.iteration);
            for (i, c) in sort_centroids(&centroids.view())?.iter().enumerate() {
                println!("  Centroid {}: {:.0}, {:.0}", i + 1, c[0], c[1]);
            }
        }
    }

    Ok(())
}
