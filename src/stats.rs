//! Shared numeric primitives. All functions return `None` on an empty
//! slice rather than a misleading zero.
//!
//! Variance and standard deviation use the sample convention (n−1)
//! throughout the crate; percentiles are nearest-rank while the median
//! interpolates between the two middle elements for even counts.

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

pub fn median(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let sorted = sorted_copy(xs);
    let n = sorted.len();
    #[allow(clippy::manual_is_multiple_of)]
    let median = if n % 2 == 0 {
        let mid = n / 2;
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[n / 2]
    };
    Some(median)
}

/// Nearest-rank percentile. `p` is a fraction in `[0, 1]` (clamped);
/// `percentile(xs, 0.0)` is the minimum and `percentile(xs, 1.0)` the
/// maximum of any non-empty slice.
pub fn percentile(xs: &[f64], p: f64) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let sorted = sorted_copy(xs);
    let p = p.clamp(0.0, 1.0);
    let rank = (p * sorted.len() as f64).ceil() as usize;
    let idx = rank.min(sorted.len()).max(1) - 1;
    Some(sorted[idx])
}

/// Sample variance (n−1). `None` below 2 samples.
pub fn variance(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let sum_sq: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    Some(sum_sq / (xs.len() - 1) as f64)
}

/// Sample standard deviation (n−1). `None` below 2 samples.
pub fn stdev(xs: &[f64]) -> Option<f64> {
    variance(xs).map(f64::sqrt)
}

fn sorted_copy(xs: &[f64]) -> Vec<f64> {
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slices() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(variance(&[]), None);
        assert_eq!(stdev(&[]), None);
    }

    #[test]
    fn test_single_element() {
        // Single element used to underflow the rank index in an earlier
        // percentile helper; keep the regression pinned.
        assert_eq!(mean(&[5.0]), Some(5.0));
        assert_eq!(median(&[5.0]), Some(5.0));
        assert_eq!(percentile(&[5.0], 0.9), Some(5.0));
        assert_eq!(variance(&[5.0]), None);
        assert_eq!(stdev(&[5.0]), None);
    }

    #[test]
    fn test_percentile_bounds_are_min_and_max() {
        let xs = [9.0, 1.0, 4.0, 7.0, 2.0];
        assert_eq!(percentile(&xs, 0.0), Some(1.0));
        assert_eq!(percentile(&xs, 1.0), Some(9.0));
        // Out-of-range fractions clamp rather than panic.
        assert_eq!(percentile(&xs, -0.5), Some(1.0));
        assert_eq!(percentile(&xs, 1.5), Some(9.0));
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let xs: Vec<f64> = (1..=100).map(|i| i as f64).collect();
        assert_eq!(percentile(&xs, 0.85), Some(85.0));
        assert_eq!(percentile(&xs, 0.95), Some(95.0));
        assert_eq!(percentile(&xs, 0.5), Some(50.0));
    }

    #[test]
    fn test_median_interpolates_even_counts() {
        assert_eq!(median(&[3.0, 7.0]), Some(5.0));
        assert_eq!(median(&[1.0, 3.0, 5.0, 7.0, 9.0]), Some(5.0));
        let xs: Vec<f64> = (1..=100).map(|i| i as f64).collect();
        assert_eq!(median(&xs), Some(50.5));
    }

    #[test]
    fn test_sample_variance() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(mean(&xs), Some(3.0));
        assert_eq!(variance(&xs), Some(2.5));
        let sd = stdev(&xs).unwrap();
        assert!((sd - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_input() {
        let xs = [50.0, 10.0, 40.0, 20.0, 30.0];
        assert_eq!(median(&xs), Some(30.0));
        assert_eq!(percentile(&xs, 0.0), Some(10.0));
        assert_eq!(percentile(&xs, 1.0), Some(50.0));
    }
}
