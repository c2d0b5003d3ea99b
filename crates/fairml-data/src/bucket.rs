//! Percentile bucketization of numeric attributes.

use tracing::debug;

use crate::column::Column;
use crate::error::DataError;

/// Compute the `q`-th percentile (`q` in `[0, 100]`) of `sorted`.
///
/// Linear interpolation between the two nearest order statistics:
/// `pos = q / 100 * (n - 1)`. `sorted` must be ascending and non-empty.
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty(), "percentile of an empty slice");
    let pos = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Reduce a numeric attribute to `n_buckets` representative values.
///
/// Categorical columns, and numeric columns with at most `n_buckets`
/// distinct values, are returned unchanged. Otherwise `2k + 1` cut points
/// are taken at percentiles `0, step, 2·step, …, 100` with
/// `step = 100 / (2k)` (integer division; the last cut point is always
/// the 100th percentile). Bucket `i` covers `(P[2i], P[2i+2]]`, bucket 0
/// is also closed on the left, and every member is replaced by the
/// bucket's midpoint cut point `P[2i+1]`.
///
/// # Errors
///
/// Returns [`DataError::InvalidBucketCount`] if `n_buckets` is zero.
pub fn reduce_groups(column: &Column, n_buckets: usize) -> Result<Column, DataError> {
    if n_buckets == 0 {
        return Err(DataError::InvalidBucketCount { n_buckets });
    }

    let values = match column {
        Column::Categorical(_) => return Ok(column.clone()),
        Column::Numeric(values) => values,
    };

    let n_unique = column.n_unique();
    if n_unique <= n_buckets {
        return Ok(column.clone());
    }

    let mut sorted = values.clone();
    sorted.sort_unstable_by(f64::total_cmp);

    let step = 100 / (2 * n_buckets);
    let cuts: Vec<f64> = (0..=2 * n_buckets)
        .map(|g| {
            let q = if g == 2 * n_buckets { 100 } else { g * step };
            percentile(&sorted, q as f64)
        })
        .collect();

    debug!(n_unique, n_buckets, ?cuts, "bucketizing numeric attribute");

    let bucketized = values
        .iter()
        .map(|&v| {
            // First bucket whose upper bound reaches v; the last upper bound is the max.
            let bucket = (0..n_buckets)
                .find(|&i| v <= cuts[2 * i + 2])
                .unwrap_or(n_buckets - 1);
            cuts[2 * bucket + 1]
        })
        .collect();

    Ok(Column::Numeric(bucketized))
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn distinct_values(column: &Column) -> Vec<f64> {
        let Column::Numeric(values) = column else {
            panic!("expected numeric column");
        };
        let mut v = values.clone();
        v.sort_unstable_by(f64::total_cmp);
        v.dedup();
        v
    }

    #[test]
    fn percentile_matches_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 0.0) - 1.0).abs() < 1e-12);
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&sorted, 100.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn two_buckets_use_quartile_midpoints() {
        // 1..=9: P25 = 3, P50 = 5, P75 = 7
        let column = Column::numeric((1..=9).map(f64::from).collect());
        let out = reduce_groups(&column, 2).unwrap();
        let Column::Numeric(values) = &out else {
            panic!("expected numeric column");
        };
        assert_eq!(values[..5], [3.0; 5]);
        assert_eq!(values[5..], [7.0; 4]);
    }

    #[test]
    fn k_distinct_values_from_cut_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let raw: Vec<f64> = (0..200).map(|_| rng.gen_range(18.0..80.0)).collect();
        let column = Column::numeric(raw.clone());

        for k in [2, 3, 4] {
            let out = reduce_groups(&column, k).unwrap();
            let distinct = distinct_values(&out);
            assert_eq!(distinct.len(), k, "k = {k}");

            let mut sorted = raw.clone();
            sorted.sort_unstable_by(f64::total_cmp);
            let step = 100 / (2 * k);
            for (i, value) in distinct.iter().enumerate() {
                let expected = percentile(&sorted, ((2 * i + 1) * step) as f64);
                assert!((value - expected).abs() < 1e-9, "k = {k}, bucket {i}");
            }
        }
    }

    #[test]
    fn buckets_partition_the_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let raw: Vec<f64> = (0..150).map(|_| rng.r#gen::<f64>() * 100.0).collect();
        let out = reduce_groups(&Column::numeric(raw.clone()), 3).unwrap();
        let Column::Numeric(values) = &out else {
            panic!("expected numeric column");
        };
        assert_eq!(values.len(), raw.len());

        // Order is preserved: a larger raw value never maps to a smaller representative.
        let mut pairs: Vec<(f64, f64)> = raw.iter().copied().zip(values.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn few_unique_values_unchanged() {
        let column = Column::numeric(vec![1.0, 2.0, 1.0, 2.0]);
        assert_eq!(reduce_groups(&column, 2).unwrap(), column);

        let constant = Column::numeric(vec![5.0; 10]);
        assert_eq!(reduce_groups(&constant, 2).unwrap(), constant);
    }

    #[test]
    fn categorical_unchanged() {
        let column = Column::categorical(["a", "b", "c", "d"]);
        assert_eq!(reduce_groups(&column, 2).unwrap(), column);
    }

    #[test]
    fn zero_buckets_rejected() {
        let err = reduce_groups(&Column::numeric(vec![1.0]), 0).unwrap_err();
        assert!(matches!(err, DataError::InvalidBucketCount { n_buckets: 0 }));
    }
}
