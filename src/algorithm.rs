use crate::config::KMeansConfig;
use crate::error::{KMeansError, Result};
use crate::vector::{add_features, distance, divide_features, features, features_equal};
use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use std::iter::FusedIterator;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One progress report of a k-means run
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Centroids, one per row, with the same arity as the input. The tag
    /// column is zero.
    pub centroids: Array2<f64>,

    /// Row indices into the input batch, grouped by cluster.
    /// `clusters[i]` belongs to `centroids[i]`.
    pub clusters: Vec<Vec<usize>>,

    /// Pass index for intermediate reports, number of passes performed for
    /// the final one
    pub iteration: usize,

    /// Set only on the last report of a run
    pub finished: bool,

    /// Whether the centroid set stopped changing before the iteration limit
    pub converged: bool,
}

impl Progress {
    /// Resolve the members of one cluster back to rows of `data`
    ///
    /// # Panics
    ///
    /// Panics if `cluster >= self.clusters.len()`, or if a member index is
    /// out of bounds for `data` (a batch other than the one that was run).
    pub fn members<'s, 'a: 's>(
        &'s self,
        data: ArrayView2<'a, f64>,
        cluster: usize,
    ) -> impl Iterator<Item = ArrayView1<'a, f64>> + 's {
        self.clusters[cluster]
            .iter()
            .map(move |&i| data.index_axis_move(Axis(0), i))
    }
}

/// A single k-means run, exposed as a lazy sequence of progress reports.
///
/// Each call to `next` performs at most one assignment/update pass. A pass
/// that changes the centroid set yields an intermediate report; the run then
/// yields exactly one report with `finished = true` and ends. The sequence
/// cannot be restarted.
pub struct KMeansRun<'a> {
    data: ArrayView2<'a, f64>,
    centroids: Array2<f64>,
    clusters: Vec<Vec<usize>>,
    max_iters: usize,
    passes: usize,
    converged: bool,
    done: bool,
    started: Instant,
}

impl<'a> KMeansRun<'a> {
    /// Validate the input and sample the initial centroids
    pub fn new<R: Rng>(
        data: ArrayView2<'a, f64>,
        config: &KMeansConfig,
        rng: &mut R,
    ) -> Result<Self> {
        validate(&data, config.k)?;

        debug!(
            samples = data.nrows(),
            features = data.ncols() - 1,
            k = config.k,
            max_iters = config.max_iters,
            "starting k-means run"
        );

        let centroids = initialize_centroids(&data, config.k, config.max_init_attempts, rng)?;

        Ok(Self::start(data, centroids, config.max_iters))
    }

    /// Start from caller-chosen centroids instead of sampling them.
    ///
    /// The centroids must have the batch's arity and be feature-distinct.
    /// Their tags are reset to zero. Unlike sampled centroids, they need not
    /// be data points, so clusters can already empty out on the first pass.
    pub fn from_centroids(
        data: ArrayView2<'a, f64>,
        mut centroids: Array2<f64>,
        max_iters: usize,
    ) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(KMeansError::EmptyInput);
        }

        if centroids.nrows() == 0 {
            return Err(KMeansError::InvalidK(
                "at least one initial centroid is required".to_string(),
            ));
        }

        if data.ncols() < 2 {
            return Err(KMeansError::InvalidDimensions(format!(
                "Vectors need at least one feature plus the identifier, got arity {}",
                data.ncols()
            )));
        }

        if centroids.ncols() != data.ncols() {
            return Err(KMeansError::ArityMismatch {
                expected: data.ncols(),
                found: centroids.ncols(),
            });
        }

        for (i, centroid) in centroids.outer_iter().enumerate() {
            if centroids
                .outer_iter()
                .take(i)
                .any(|earlier| features_equal(&earlier, &centroid))
            {
                return Err(KMeansError::InvalidK(format!(
                    "initial centroid {} duplicates an earlier one",
                    i
                )));
            }
        }

        let last = centroids.ncols() - 1;
        centroids.column_mut(last).fill(0.0);

        debug!(
            samples = data.nrows(),
            features = data.ncols() - 1,
            k = centroids.nrows(),
            max_iters,
            "starting k-means run from given centroids"
        );

        Ok(Self::start(data, centroids, max_iters))
    }

    fn start(data: ArrayView2<'a, f64>, centroids: Array2<f64>, max_iters: usize) -> Self {
        Self {
            data,
            centroids,
            clusters: Vec::new(),
            max_iters,
            passes: 0,
            converged: false,
            done: false,
            started: Instant::now(),
        }
    }

    /// Current centroid set
    pub fn centroids(&self) -> ArrayView2<'_, f64> {
        self.centroids.view()
    }

    /// Number of passes performed so far
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Perform one pass. Returns `None` once the loop is over.
    fn step(&mut self) -> Result<Option<Progress>> {
        if self.converged || self.passes >= self.max_iters {
            return Ok(None);
        }

        let pass = self.passes;
        self.passes += 1;

        let clusters = assign(&self.data, &self.centroids.view())?;
        let next = update_centroids(&self.data, &clusters)?;

        if centroids_converged(&self.centroids.view(), &next.view()) {
            // The previous centroids stay final; keep the partition they produced.
            self.clusters = clusters;
            self.converged = true;
            return Ok(None);
        }

        // Empty clusters produced no centroid, drop them so indices line up.
        self.clusters = clusters.into_iter().filter(|c| !c.is_empty()).collect();
        self.centroids = next;

        debug!(
            iteration = pass,
            centroids = self.centroids.nrows(),
            "k-means pass complete"
        );

        Ok(Some(self.report(pass, false)))
    }

    fn finish(&mut self) -> Progress {
        self.done = true;
        let elapsed = self.started.elapsed().as_secs_f64();

        if self.converged {
            info!(
                iterations = self.passes,
                elapsed_secs = elapsed,
                "k-means converged"
            );
        } else {
            warn!(
                iterations = self.passes,
                elapsed_secs = elapsed,
                "k-means stopped at the iteration limit without converging"
            );
        }

        self.report(self.passes, true)
    }

    fn report(&self, iteration: usize, finished: bool) -> Progress {
        Progress {
            centroids: self.centroids.clone(),
            clusters: self.clusters.clone(),
            iteration,
            finished,
            converged: self.converged,
        }
    }
}

impl Iterator for KMeansRun<'_> {
    type Item = Result<Progress>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.step() {
            Ok(Some(progress)) => Some(Ok(progress)),
            Ok(None) => Some(Ok(self.finish())),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for KMeansRun<'_> {}

/// Check the preconditions of a run before any sampling happens
pub fn validate(data: &ArrayView2<f64>, k: usize) -> Result<()> {
    if data.nrows() == 0 {
        return Err(KMeansError::EmptyInput);
    }

    if k == 0 {
        return Err(KMeansError::InvalidK(
            "k must be greater than 0".to_string(),
        ));
    }

    if data.ncols() < 2 {
        return Err(KMeansError::InvalidDimensions(format!(
            "Vectors need at least one feature plus the identifier, got arity {}",
            data.ncols()
        )));
    }

    // Stop scanning as soon as k distinct vectors have been seen.
    let mut distinct: Vec<ArrayView1<f64>> = Vec::with_capacity(k);
    for row in data.outer_iter() {
        if distinct.iter().all(|d| !features_equal(d, &row)) {
            distinct.push(row);
            if distinct.len() == k {
                return Ok(());
            }
        }
    }

    Err(KMeansError::InsufficientData(format!(
        "Number of distinct vectors ({}) is less than k ({})",
        distinct.len(),
        k
    )))
}

/// Initialize centroids by randomly sampling k feature-distinct data points.
///
/// Each slot draws uniformly with replacement and rejects duplicates of an
/// already chosen centroid, up to `max_attempts` draws. If a slot runs out
/// of draws, the remaining slots are filled by walking a shuffled order of
/// all rows and keeping the ones that are not duplicates.
pub fn initialize_centroids<R: Rng>(
    data: &ArrayView2<f64>,
    k: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let n_samples = data.nrows();
    let n_features = data.ncols().saturating_sub(1);
    if n_samples == 0 {
        return Err(KMeansError::EmptyInput);
    }

    let is_fresh = |chosen: &[usize], idx: usize| {
        chosen
            .iter()
            .all(|&c| !features_equal(&data.row(c), &data.row(idx)))
    };

    let mut chosen: Vec<usize> = Vec::with_capacity(k);
    'slots: for _ in 0..k {
        for _ in 0..max_attempts {
            let idx = rng.gen_range(0..n_samples);
            if is_fresh(&chosen, idx) {
                chosen.push(idx);
                continue 'slots;
            }
        }
        break;
    }

    if chosen.len() < k {
        warn!(
            sampled = chosen.len(),
            k, max_attempts, "rejection sampling exhausted, falling back to shuffled scan"
        );

        let mut order: Vec<usize> = (0..n_samples).collect();
        order.shuffle(rng);
        for idx in order {
            if chosen.len() == k {
                break;
            }
            if is_fresh(&chosen, idx) {
                chosen.push(idx);
            }
        }
    }

    if chosen.len() < k {
        return Err(KMeansError::InsufficientData(format!(
            "Found only {} distinct vectors for k ({})",
            chosen.len(),
            k
        )));
    }

    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));
    for (centroid_idx, &data_idx) in chosen.iter().enumerate() {
        centroids
            .slice_mut(s![centroid_idx, ..n_features])
            .assign(&features(&data.row(data_idx)));
    }

    Ok(centroids)
}

/// Index of the centroid nearest to `point`. Ties go to the lowest index.
fn nearest(point: &ArrayView1<f64>, centroids: &ArrayView2<f64>) -> Result<Option<usize>> {
    let mut best: Option<(usize, f64)> = None;

    for (j, centroid) in centroids.outer_iter().enumerate() {
        let d = distance(point, &centroid)?;
        if best.map_or(true, |(_, min)| d < min) {
            best = Some((j, d));
        }
    }

    Ok(best.map(|(j, _)| j))
}

/// Partition the batch by nearest centroid.
///
/// The result has one cluster per centroid, in centroid order; members are
/// listed in input order and a cluster may be empty.
pub fn assign(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Result<Vec<Vec<usize>>> {
    let mut clusters = vec![Vec::new(); centroids.nrows()];

    for (i, point) in data.outer_iter().enumerate() {
        if let Some(j) = nearest(&point, centroids)? {
            clusters[j].push(i);
        }
    }

    Ok(clusters)
}

/// Mean of every non-empty cluster. Empty clusters contribute no centroid.
pub fn update_centroids(data: &ArrayView2<f64>, clusters: &[Vec<usize>]) -> Result<Array2<f64>> {
    let non_empty: Vec<&Vec<usize>> = clusters.iter().filter(|c| !c.is_empty()).collect();
    let mut centroids = Array2::<f64>::zeros((non_empty.len(), data.ncols()));

    for (centroid_idx, members) in non_empty.iter().enumerate() {
        let mut acc = centroids.row_mut(centroid_idx);
        for &m in members.iter() {
            add_features(&mut acc, &data.row(m))?;
        }
        divide_features(&mut acc, members.len() as f64);
    }

    Ok(centroids)
}

/// Set comparison: every previous centroid has an exact match among the new ones
pub fn centroids_converged(prev: &ArrayView2<f64>, next: &ArrayView2<f64>) -> bool {
    prev.outer_iter()
        .all(|p| next.outer_iter().any(|q| features_equal(&p, &q)))
}

/// Label each row of `data` with the index of its nearest centroid
pub fn predict_labels(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Result<Vec<usize>> {
    let mut labels = Vec::with_capacity(data.nrows());

    for point in data.outer_iter() {
        let label = nearest(&point, centroids)?.ok_or_else(|| {
            KMeansError::InvalidDimensions(
                "cannot predict against an empty centroid set".to_string(),
            )
        })?;
        labels.push(label);
    }

    Ok(labels)
}
