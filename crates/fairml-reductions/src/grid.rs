//! Integer grid of Lagrange multiplier coefficients.

/// Number of integer vectors in `dim` dimensions with L1 norm at most `radius`.
fn ball_size(dim: usize, radius: usize) -> usize {
    // counts[r] = number of points with L1 norm <= r over the dimensions seen so far.
    let mut counts = vec![1usize; radius + 1];
    for _ in 0..dim {
        let prev = counts.clone();
        for r in 0..=radius {
            let mut total = prev[r];
            for x in 1..=r {
                total = total.saturating_add(prev[r - x].saturating_mul(2));
            }
            counts[r] = total;
        }
    }
    counts[radius]
}

fn accumulate(entry: &mut Vec<i64>, dim: usize, remaining: i64, out: &mut Vec<Vec<i64>>) {
    if entry.len() == dim {
        out.push(entry.clone());
        return;
    }
    for value in -remaining..=remaining {
        entry.push(value);
        accumulate(entry, dim, remaining - value.abs(), out);
        entry.pop();
    }
}

/// Generate `grid_size` coefficient vectors of dimension `dim`.
///
/// Picks the smallest radius `r` whose L1 ball of integer points (negative
/// coordinates allowed) holds at least `grid_size` points, orders the points
/// by L1 norm and then lexicographically, keeps the first `grid_size` and
/// scales them by `grid_limit / r`. The origin always comes first. With
/// `dim == 0` the grid is the single empty vector.
#[must_use]
pub fn coefficient_grid(dim: usize, grid_size: usize, grid_limit: f64) -> Vec<Vec<f64>> {
    if dim == 0 || grid_size <= 1 {
        return vec![vec![0.0; dim]];
    }

    let estimate = (grid_size as f64 / 2f64.powi(dim as i32)).powf(1.0 / dim as f64) - 1.0;
    let mut radius = estimate.floor().max(0.0) as usize;
    while ball_size(dim, radius) < grid_size {
        radius += 1;
    }

    let mut points = Vec::new();
    accumulate(&mut Vec::with_capacity(dim), dim, radius as i64, &mut points);
    points.sort_by(|a, b| {
        let na: i64 = a.iter().map(|v| v.abs()).sum();
        let nb: i64 = b.iter().map(|v| v.abs()).sum();
        na.cmp(&nb).then_with(|| a.cmp(b))
    });
    points.truncate(grid_size);

    let scale = grid_limit / radius as f64;
    points
        .into_iter()
        .map(|p| p.into_iter().map(|v| v as f64 * scale).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ball_sizes() {
        assert_eq!(ball_size(1, 35), 71);
        assert_eq!(ball_size(2, 1), 5);
        assert_eq!(ball_size(2, 6), 85);
        assert_eq!(ball_size(3, 1), 7);
    }

    #[test]
    fn one_dimensional_default_grid() {
        let grid = coefficient_grid(1, 71, 2.0);
        assert_eq!(grid.len(), 71);
        assert_eq!(grid[0], vec![0.0]);
        let (lo, hi) = grid
            .iter()
            .map(|p| p[0])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        assert!((lo + 2.0).abs() < 1e-12);
        assert!((hi - 2.0).abs() < 1e-12);
        // Ordered by magnitude, negative first on ties.
        assert!((grid[1][0] + 2.0 / 35.0).abs() < 1e-12);
        assert!((grid[2][0] - 2.0 / 35.0).abs() < 1e-12);
    }

    #[test]
    fn two_dimensional_grid_is_truncated_by_norm() {
        let grid = coefficient_grid(2, 71, 2.0);
        assert_eq!(grid.len(), 71);
        let unit = 2.0 / 6.0;
        let norms: Vec<f64> = grid.iter().map(|p| p.iter().map(|v| v.abs()).sum()).collect();
        assert!(norms.windows(2).all(|w| w[0] <= w[1] + 1e-12));
        // 61 points have norm <= 5; the remaining 10 come from norm 6.
        assert!((norms[70] - 6.0 * unit).abs() < 1e-12);
    }

    #[test]
    fn points_are_distinct() {
        let grid = coefficient_grid(3, 30, 1.0);
        for i in 0..grid.len() {
            for j in (i + 1)..grid.len() {
                assert_ne!(grid[i], grid[j]);
            }
        }
    }

    #[test]
    fn degenerate_grids() {
        assert_eq!(coefficient_grid(0, 71, 2.0), vec![Vec::<f64>::new()]);
        assert_eq!(coefficient_grid(2, 1, 2.0), vec![vec![0.0, 0.0]]);
    }
}
