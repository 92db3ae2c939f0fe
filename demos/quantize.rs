//! Quantize a synthetic RGBA image down to a small palette
//!
//! Run with: cargo run --example quantize --release

use std::time::Instant;
use stepkmeans::quantize::{palette, pixels_to_batch, render};
use stepkmeans::{KMeans, KMeansConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let (width, height) = (64usize, 48usize);

    // Diagonal gradient with a blue square in the middle
    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let inside = (16..48).contains(&x) && (12..36).contains(&y);
            let (r, g, b) = if inside {
                (20, 40, 220)
            } else {
                ((x * 255 / width) as u8, (y * 255 / height) as u8, 96)
            };
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }

    let data = pixels_to_batch(&rgba);
    let start = Instant::now();

    let mut kmeans = KMeans::with_config(KMeansConfig::new(8).with_seed(3));
    let last = kmeans.fit(&data.view(), |p| {
        if p.iteration % 10 == 0 || p.finished {
            println!("iteration {} ({} colors)", p.iteration, p.centroids.nrows());
        }
    })?;

    println!(
        "Processed in {} milliseconds, {} iterations, converged: {}",
        start.elapsed().as_millis(),
        last.iteration,
        last.converged
    );

    println!("Palette:");
    for [r, g, b] in palette(&last)? {
        println!("  #{:02x}{:02x}{:02x}", r, g, b);
    }

    let out = render(&last, &data.view(), width, height)?;
    let painted = out.chunks_exact(4).filter(|px| px[3] == 255).count();
    println!("Painted {} of {} pixels", painted, width * height);

    Ok(())
}
