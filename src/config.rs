/// Configuration for a k-means run
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,

    /// Maximum number of assignment/update passes. A run that reaches this
    /// limit finishes with `converged = false`.
    pub max_iters: usize,

    /// Random seed for centroid initialization.
    /// `None` seeds from OS entropy, so every run samples differently.
    pub seed: Option<u64>,

    /// Maximum number of rejection-sampling draws per centroid before
    /// initialization falls back to shuffling the remaining distinct vectors.
    pub max_init_attempts: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 8,
            max_iters: 1000,
            seed: None,
            max_init_attempts: 64,
        }
    }
}

impl KMeansConfig {
    /// Create a new configuration with the specified number of clusters
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    /// Set the maximum number of iterations
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the per-centroid cap on rejection-sampling draws
    pub fn with_max_init_attempts(mut self, attempts: usize) -> Self {
        self.max_init_attempts = attempts;
        self
    }
}
