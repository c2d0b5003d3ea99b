//! Stratified train/test split shared by every row-aligned array.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::encode::FeatureMatrix;
use crate::error::DataError;
use crate::grouping::Grouping;

/// Train and test row indices, each in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    /// Rows assigned to the training side.
    pub train: Vec<usize>,
    /// Rows assigned to the test side.
    pub test: Vec<usize>,
}

/// Compute a stratified train/test split.
///
/// The global test count is `ceil(test_fraction * n)`, apportioned across
/// classes by largest remainder so each class keeps its proportion.
/// Indices are grouped by class, shuffled within each class with a
/// seeded RNG, and the first share of each class goes to the test side.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DataError::InvalidTestFraction`] | `test_fraction` not in (0.0, 1.0) |
/// | [`DataError::EmptySplit`] | Train or test side would be empty |
/// | [`DataError::TooFewSamplesForSplit`] | A class has a single sample |
#[instrument(skip(labels), fields(n_samples = labels.len()))]
pub fn stratified_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices, DataError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidTestFraction {
            fraction: test_fraction,
        });
    }

    let n_samples = labels.len();
    let n_test = (test_fraction * n_samples as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(DataError::EmptySplit { n_samples, n_test });
    }

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
    let mut class_indices: Vec<Vec<usize>> = vec![vec![]; n_classes];
    for (i, &label) in labels.iter().enumerate() {
        class_indices[label].push(i);
    }

    for (class, indices) in class_indices.iter().enumerate() {
        if indices.len() == 1 {
            return Err(DataError::TooFewSamplesForSplit { class, count: 1 });
        }
    }

    // Largest-remainder apportionment of n_test across classes.
    let exact: Vec<f64> = class_indices
        .iter()
        .map(|idx| n_test as f64 * idx.len() as f64 / n_samples as f64)
        .collect();
    let mut per_class: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut remaining = n_test - per_class.iter().sum::<usize>();
    let mut by_remainder: Vec<usize> = (0..n_classes).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &class in by_remainder.iter().cycle().take(n_classes * 2) {
        if remaining == 0 {
            break;
        }
        if per_class[class] < class_indices[class].len() {
            per_class[class] += 1;
            remaining -= 1;
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_samples - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (indices, &take) in class_indices.iter_mut().zip(&per_class) {
        indices.shuffle(&mut rng);
        test.extend_from_slice(&indices[..take]);
        train.extend_from_slice(&indices[take..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    debug!(
        n_train = train.len(),
        n_test = test.len(),
        ?per_class,
        "stratified split computed"
    );

    Ok(SplitIndices { train, test })
}

/// Row-aligned train/test partitions of features, labels, sensitive
/// grouping and optional control grouping.
///
/// All four partitions are sliced with the same [`SplitIndices`], so row
/// `i` of `x_test` corresponds to `y_test[i]`, `a_test` row `i` and
/// `cf_test` row `i`.
#[derive(Debug, Clone)]
pub struct SplitData {
    /// Training features.
    pub x_train: FeatureMatrix,
    /// Test features.
    pub x_test: FeatureMatrix,
    /// Training labels.
    pub y_train: Vec<usize>,
    /// Test labels.
    pub y_test: Vec<usize>,
    /// Training sensitive grouping.
    pub a_train: Grouping,
    /// Test sensitive grouping.
    pub a_test: Grouping,
    /// Training control grouping, if a control attribute is configured.
    pub cf_train: Option<Grouping>,
    /// Test control grouping, if a control attribute is configured.
    pub cf_test: Option<Grouping>,
}

impl SplitData {
    /// Slice every parallel array with `indices`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MisalignedRows`] if `features`, `sensitive` or
    /// `control` do not have one row per label.
    pub fn new(
        indices: &SplitIndices,
        features: &FeatureMatrix,
        labels: &[usize],
        sensitive: &Grouping,
        control: Option<&Grouping>,
    ) -> Result<Self, DataError> {
        let expected = labels.len();
        let check = |what: &'static str, got: usize| {
            if got == expected {
                Ok(())
            } else {
                Err(DataError::MisalignedRows {
                    what,
                    expected,
                    got,
                })
            }
        };
        check("features", features.n_samples())?;
        check("sensitive grouping", sensitive.len())?;
        if let Some(control) = control {
            check("control grouping", control.len())?;
        }

        let pick = |rows: &[usize]| rows.iter().map(|&i| labels[i]).collect::<Vec<_>>();

        Ok(Self {
            x_train: features.select(&indices.train),
            x_test: features.select(&indices.test),
            y_train: pick(&indices.train),
            y_test: pick(&indices.test),
            a_train: sensitive.select(&indices.train),
            a_test: sensitive.select(&indices.test),
            cf_train: control.map(|c| c.select(&indices.train)),
            cf_test: control.map(|c| c.select(&indices.test)),
        })
    }
}
