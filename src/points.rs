//! 2-D point cloud glue: `(x, y, index)` vectors for scatter plots.

use crate::error::{KMeansError, Result};
use ndarray::{Array2, ArrayView2};
use rand::Rng;

/// Scatter `n` tagged points around `centers`.
///
/// Points are split evenly and in order across the centers; each coordinate
/// gets uniform noise in `[-noise / 2, noise / 2)`. The tag of point `i` is `i`.
pub fn blobs<R: Rng>(centers: &[[f64; 2]], n: usize, noise: f64, rng: &mut R) -> Array2<f64> {
    if centers.is_empty() {
        return Array2::zeros((0, 3));
    }

    let mut data = Array2::<f64>::zeros((n, 3));
    for i in 0..n {
        let center = centers[i * centers.len() / n];
        data[[i, 0]] = center[0] + (rng.gen::<f64>() - 0.5) * noise;
        data[[i, 1]] = center[1] + (rng.gen::<f64>() - 0.5) * noise;
        data[[i, 2]] = i as f64;
    }

    data
}

/// Centroid positions ordered by x, then y
pub fn sort_centroids(centroids: &ArrayView2<f64>) -> Result<Vec<[f64; 2]>> {
    if centroids.ncols() < 3 {
        return Err(KMeansError::InvalidDimensions(format!(
            "Point centroids need x, y and the tag, got arity {}",
            centroids.ncols()
        )));
    }

    let mut sorted: Vec<[f64; 2]> = centroids.outer_iter().map(|c| [c[0], c[1]]).collect();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));

    Ok(sorted)
}
