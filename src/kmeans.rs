use crate::algorithm::{predict_labels, KMeansRun, Progress};
use crate::config::KMeansConfig;
use crate::error::{KMeansError, Result};
use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Step-by-step k-means clustering over tagged vectors.
///
/// Every input row holds the features first and an identifier tag last. The
/// tag travels with the row but takes no part in distances or averages, so
/// callers can map clusters back to pixels or points.
///
/// # Example
///
/// ```
/// use stepkmeans::KMeans;
/// use ndarray::array;
///
/// let data = array![[0.0, 0.0, 0.0], [0.0, 1.0, 1.0], [10.0, 10.0, 2.0], [10.0, 11.0, 3.0]];
///
/// let mut kmeans = KMeans::new(2);
/// let last = kmeans.fit(&data.view(), |_| {}).unwrap();
///
/// assert!(last.finished);
/// assert_eq!(last.clusters.len(), 2);
/// ```
pub struct KMeans {
    /// Model configuration
    config: KMeansConfig,

    /// Final centroids of the last fit (None if not yet fitted)
    centroids: Option<Array2<f64>>,
}

impl KMeans {
    /// Create a new KMeans instance with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if `k` is 0.
    pub fn new(k: usize) -> Self {
        assert!(k > 0, "k must be greater than 0");

        Self {
            config: KMeansConfig::new(k),
            centroids: None,
        }
    }

    /// Create a new KMeans instance with custom configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.k` is 0.
    pub fn with_config(config: KMeansConfig) -> Self {
        assert!(config.k > 0, "k must be greater than 0");

        Self {
            config,
            centroids: None,
        }
    }

    /// Start a run seeded from the configuration.
    ///
    /// The run is lazy: nothing beyond validation and centroid sampling
    /// happens until the returned iterator is pulled.
    pub fn run<'a>(&self, data: &ArrayView2<'a, f64>) -> Result<KMeansRun<'a>> {
        let mut rng = seeded_rng(self.config.seed);
        self.run_with_rng(data, &mut rng)
    }

    /// Start a run drawing its initial centroids from `rng`
    pub fn run_with_rng<'a, R: Rng>(
        &self,
        data: &ArrayView2<'a, f64>,
        rng: &mut R,
    ) -> Result<KMeansRun<'a>> {
        KMeansRun::new(*data, &self.config, rng)
    }

    /// Run to completion, calling `on_progress` for every report.
    ///
    /// The final report (`finished = true`) is passed to `on_progress` as
    /// well and then returned. Its centroids are kept for [`KMeans::predict`].
    ///
    /// # Errors
    ///
    /// Returns an error if the input fails validation or if vectors of
    /// different arity meet during the run.
    pub fn fit<F>(&mut self, data: &ArrayView2<f64>, mut on_progress: F) -> Result<Progress>
    where
        F: FnMut(&Progress),
    {
        for report in self.run(data)? {
            let report = report?;
            on_progress(&report);

            if report.finished {
                self.centroids = Some(report.centroids.clone());
                return Ok(report);
            }
        }

        unreachable!("a k-means run always ends with a finished report")
    }

    /// Label each row with the index of its nearest fitted centroid.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model has not been fitted yet
    /// - Rows don't have the arity of the training data
    pub fn predict(&self, data: &ArrayView2<f64>) -> Result<Vec<usize>> {
        let centroids = self.centroids.as_ref().ok_or(KMeansError::NotFitted)?;
        predict_labels(data, &centroids.view())
    }

    /// Get the centroids of the last fit.
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    /// Get the number of clusters.
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Get the configuration.
    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }
}

/// Build the run RNG: seeded when asked, from OS entropy otherwise
pub(crate) fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Cluster `input` into `k` groups, reporting every step to `on_progress`.
///
/// The callback receives `(centroids, clusters, iteration, finished, converged)`
/// once per pass that moved the centroids and exactly once more with
/// `finished = true`. The final report is also returned.
pub fn cluster<F>(
    input: &ArrayView2<f64>,
    k: usize,
    iteration_limit: usize,
    mut on_progress: F,
) -> Result<Progress>
where
    F: FnMut(&ArrayView2<f64>, &[Vec<usize>], usize, bool, bool),
{
    if k == 0 {
        return Err(KMeansError::InvalidK(
            "k must be greater than 0".to_string(),
        ));
    }

    let mut kmeans = KMeans::with_config(KMeansConfig::new(k).with_max_iters(iteration_limit));
    kmeans.fit(input, |p| {
        on_progress(
            &p.centroids.view(),
            &p.clusters,
            p.iteration,
            p.finished,
            p.converged,
        )
    })
}
