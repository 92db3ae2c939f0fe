//! Color quantization glue.
//!
//! Pixels become `(r, g, b, pixel_index)` vectors, so the tag of every
//! cluster member points straight back at its position in the image.

use crate::algorithm::Progress;
use crate::error::{KMeansError, Result};
use ndarray::{Array2, ArrayView2};

/// One `(r, g, b, pixel_index)` row per RGBA pixel. Alpha is ignored, as is
/// a trailing partial pixel.
pub fn pixels_to_batch(rgba: &[u8]) -> Array2<f64> {
    let n_pixels = rgba.len() / 4;

    Array2::from_shape_fn((n_pixels, 4), |(i, j)| {
        if j == 3 {
            i as f64
        } else {
            f64::from(rgba[i * 4 + j])
        }
    })
}

#[inline]
fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Centroid colors, rounded and clamped to bytes
pub fn palette(progress: &Progress) -> Result<Vec<[u8; 3]>> {
    if progress.centroids.ncols() < 4 {
        return Err(KMeansError::InvalidDimensions(format!(
            "Color centroids need 3 channels plus the tag, got arity {}",
            progress.centroids.ncols()
        )));
    }

    Ok(progress
        .centroids
        .outer_iter()
        .map(|c| [channel(c[0]), channel(c[1]), channel(c[2])])
        .collect())
}

/// Paint every clustered pixel with its centroid color.
///
/// Returns an RGBA buffer of `width * height` pixels. Pixels that belong to
/// no reported cluster stay transparent black; tags outside the image are
/// skipped.
pub fn render(
    progress: &Progress,
    data: &ArrayView2<f64>,
    width: usize,
    height: usize,
) -> Result<Vec<u8>> {
    let colors = palette(progress)?;
    let n_pixels = width * height;
    let mut out = vec![0u8; n_pixels * 4];

    for (cluster, color) in colors.iter().enumerate().take(progress.clusters.len()) {
        for member in progress.members(*data, cluster) {
            let tag = member[member.len() - 1];
            if !(0.0..n_pixels as f64).contains(&tag) {
                continue;
            }

            let px = tag as usize * 4;
            out[px..px + 3].copy_from_slice(color);
            out[px + 3] = 255;
        }
    }

    Ok(out)
}
