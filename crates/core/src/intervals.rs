//! Runs of usable values in sampled curves, e.g. production profiles where
//! missing samples are stored as infinities or NaN.

/// Maximal runs of finite values as inclusive `(start, end)` index pairs.
/// With `positive_only`, zero and negative values also break a run.
pub fn intervals_of_valid_values(values: &[f64], positive_only: bool) -> Vec<(usize, usize)> {
    let valid = |v: f64| v.is_finite() && (!positive_only || v > 0.0);

    let mut intervals = Vec::new();
    let mut start = None;
    for (index, value) in values.iter().enumerate() {
        match (valid(*value), start) {
            (true, None) => start = Some(index),
            (false, Some(first)) => {
                intervals.push((first, index - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(first) = start {
        intervals.push((first, values.len() - 1));
    }
    intervals
}

/// Values covered by `intervals`, concatenated in interval order.
/// Intervals reaching past the end are clipped.
pub fn values_by_intervals(values: &[f64], intervals: &[(usize, usize)]) -> Vec<f64> {
    intervals
        .iter()
        .filter(|&&(start, end)| start <= end && start < values.len())
        .flat_map(|&(start, end)| values[start..=end.min(values.len() - 1)].iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUGE_VAL: f64 = f64::INFINITY;

    #[test]
    fn single_run_between_missing_samples() {
        let values = [HUGE_VAL, HUGE_VAL, 1.0, 2.0, 3.0, HUGE_VAL];
        let intervals = intervals_of_valid_values(&values, false);
        assert_eq!(intervals, vec![(2, 4)]);
        assert_eq!(values_by_intervals(&values, &intervals), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn runs_touching_both_ends() {
        let values = [1.0, f64::NAN, 2.0, 3.0];
        assert_eq!(intervals_of_valid_values(&values, false), vec![(0, 0), (2, 3)]);
        assert!(intervals_of_valid_values(&[], false).is_empty());
        assert!(intervals_of_valid_values(&[f64::NAN], false).is_empty());
    }

    #[test]
    fn positive_only_splits_on_zero() {
        let values = [1.0, 0.0, 2.0, -1.0, 4.0];
        assert_eq!(
            intervals_of_valid_values(&values, true),
            vec![(0, 0), (2, 2), (4, 4)]
        );
        assert_eq!(intervals_of_valid_values(&values, false), vec![(0, 4)]);
    }

    #[test]
    fn out_of_range_intervals_are_clipped() {
        let values = [1.0, 2.0];
        assert_eq!(values_by_intervals(&values, &[(1, 5), (7, 9)]), vec![2.0]);
    }
}
