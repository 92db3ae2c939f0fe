//! # stepkmeans
//!
//! Step-by-step k-means clustering for interactive visualizations, built
//! on ndarray.
//!
//! ## Features
//!
//! - **Observable runs**: every pass that moves the centroids yields a
//!   progress report, followed by exactly one final report
//! - **Tagged vectors**: the last column of each row is an identifier that is
//!   carried through but never used in distances or averages
//! - **Lazy or callback driven**: pull reports from a [`KMeansRun`] iterator
//!   or pass a callback to [`KMeans::fit`] / [`cluster`]
//! - **Offloading**: [`worker::spawn`] runs the engine on its own thread and
//!   streams sampled reports over a channel, with cooperative cancellation
//! - **Reproducible**: seed the initialization through [`KMeansConfig`]
//!
//! ## Example
//!
//! ```rust
//! use stepkmeans::{cluster, KMeansError};
//! use ndarray::array;
//!
//! // x, y, identifier
//! let data = array![
//!     [0.0, 0.0, 0.0],
//!     [0.0, 1.0, 1.0],
//!     [10.0, 10.0, 2.0],
//!     [10.0, 11.0, 3.0],
//! ];
//!
//! let last = cluster(&data.view(), 2, 100, |centroids, clusters, iteration, finished, _| {
//!     if !finished {
//!         assert_eq!(centroids.nrows(), clusters.len());
//!         println!("pass {}: {} centroids", iteration, centroids.nrows());
//!     }
//! })?;
//!
//! assert!(last.converged);
//! assert_eq!(last.clusters.iter().map(Vec::len).sum::<usize>(), 4);
//! # Ok::<(), KMeansError>(())
//! ```
//!
//! ## Pulling Reports
//!
//! ```rust
//! use stepkmeans::{KMeans, KMeansConfig};
//! use ndarray::array;
//!
//! let data = array![[5.0, 5.0, 0.0], [5.0, 5.0, 1.0], [5.0, 5.0, 2.0]];
//!
//! let kmeans = KMeans::with_config(KMeansConfig::new(1).with_seed(42));
//! let reports: Vec<_> = kmeans.run(&data.view()).unwrap().collect();
//!
//! assert_eq!(reports.len(), 1);
//! let last = reports[0].as_ref().unwrap();
//! assert!(last.finished && last.converged);
//! ```

mod algorithm;
mod config;
mod error;
mod kmeans;
pub mod points;
pub mod quantize;
pub mod vector;
pub mod worker;

pub use algorithm::{
    assign, centroids_converged, initialize_centroids, predict_labels, update_centroids,
    validate, KMeansRun, Progress,
};
pub use config::KMeansConfig;
pub use error::{KMeansError, Result};
pub use kmeans::{cluster, KMeans};
