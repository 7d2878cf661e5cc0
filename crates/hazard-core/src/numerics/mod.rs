//! Small numeric kernels shared by geometry, GSIMs and statistics.

pub mod special;

pub use special::{erf, erfc, ndtr, norm_sf, truncnorm_sf};

pub type Vec3 = [f64; 3];

/// Neumaier-compensated sum.
pub fn compensated_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, compensation) = values
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(sum, compensation), value| {
            let next = sum + value;
            let lost = if sum.abs() >= value.abs() {
                (sum - next) + value
            } else {
                (value - next) + sum
            };
            (next, compensation + lost)
        });
    sum + compensation
}

/// `None` when the lengths differ or the weights add up to zero.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
    if values.len() != weights.len() {
        return None;
    }
    let total = compensated_sum(weights.iter().copied());
    if total == 0.0 {
        return None;
    }
    let weighted = compensated_sum(
        values
            .iter()
            .zip(weights)
            .map(|(value, weight)| value * weight),
    );
    Some(weighted / total)
}

/// Indices that sort `values` by `f64::total_cmp`; ties keep their input order.
pub fn argsort(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&lhs, &rhs| values[lhs].total_cmp(&values[rhs]));
    order
}

/// Piecewise-linear interpolation on a non-decreasing grid, clamped to the
/// end values outside it.
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 || xs.len() != ys.len() || xs.windows(2).any(|pair| pair[1] < pair[0]) {
        return None;
    }
    let last = xs.len() - 1;
    if x <= xs[0] {
        return Some(ys[0]);
    }
    if x >= xs[last] {
        return Some(ys[last]);
    }
    let upper = xs.partition_point(|&known| known < x);
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    if x1 == x0 {
        return Some(ys[upper]);
    }
    Some(ys[upper - 1] + (x - x0) / (x1 - x0) * (ys[upper] - ys[upper - 1]))
}

pub fn dot3(lhs: Vec3, rhs: Vec3) -> f64 {
    lhs.iter().zip(rhs).map(|(a, b)| a * b).sum()
}

pub fn sub3(lhs: Vec3, rhs: Vec3) -> Vec3 {
    std::array::from_fn(|axis| lhs[axis] - rhs[axis])
}

pub fn cross3(lhs: Vec3, rhs: Vec3) -> Vec3 {
    std::array::from_fn(|axis| {
        let (next, after) = ((axis + 1) % 3, (axis + 2) % 3);
        lhs[next] * rhs[after] - lhs[after] * rhs[next]
    })
}

pub fn norm3(vector: Vec3) -> f64 {
    dot3(vector, vector).sqrt()
}

pub fn normalized3(vector: Vec3) -> Vec3 {
    let norm = norm3(vector);
    vector.map(|component| component / norm)
}

#[cfg(test)]
mod tests {
    use super::{
        argsort, compensated_sum, cross3, dot3, interp, norm3, normalized3, sub3, weighted_mean,
    };

    #[test]
    fn compensated_sum_keeps_small_terms() {
        assert_eq!(compensated_sum([1.0e16, 1.0, -1.0e16]), 1.0);
        assert_eq!(compensated_sum([]), 0.0);
    }

    #[test]
    fn weighted_mean_rejects_bad_weights() {
        assert_eq!(weighted_mean(&[1.0, 2.0], &[0.5]), None);
        assert_eq!(weighted_mean(&[1.0, 2.0], &[0.0, 0.0]), None);
        let mean = weighted_mean(&[0.1, 0.2, 0.4], &[1.0, 2.0, 1.0]).expect("mean");
        assert!((mean - 0.225).abs() < 1.0e-15);
    }

    #[test]
    fn argsort_is_stable_on_ties() {
        assert_eq!(
            argsort(&[0.3, 0.1, f64::NAN, 0.1, -0.0, 0.0]),
            vec![4, 5, 1, 3, 0, 2]
        );
    }

    #[test]
    fn interp_clamps_and_handles_flat_steps() {
        let xs = [0.25, 0.5, 0.5, 1.0];
        let ys = [1.0, 2.0, 3.0, 5.0];
        assert_eq!(interp(0.0, &xs, &ys), Some(1.0));
        assert_eq!(interp(2.0, &xs, &ys), Some(5.0));
        assert_eq!(interp(0.375, &xs, &ys), Some(1.5));
        assert_eq!(interp(0.75, &xs, &ys), Some(4.0));
        assert_eq!(interp(0.5, &[0.0], &[1.0]), None);
        assert_eq!(interp(0.5, &[0.0, 1.0, 0.5], &[0.0, 1.0, 2.0]), None);
    }

    #[test]
    fn vector_helpers() {
        assert_eq!(sub3([2.0, 3.0, 6.0], [1.0, 1.0, 1.0]), [1.0, 2.0, 5.0]);
        assert!((norm3([2.0, 3.0, 6.0]) - 7.0).abs() < 1.0e-12);
        assert_eq!(cross3([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
        assert_eq!(cross3([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]), [1.0, 0.0, 0.0]);
        assert_eq!(dot3([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]), 32.0);
        let unit = normalized3([3.0, 0.0, 4.0]);
        assert!((unit[0] - 0.6).abs() < 1.0e-12);
        assert!((unit[2] - 0.8).abs() < 1.0e-12);
    }
}
