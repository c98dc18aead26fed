//! Aggregate weight of a rubric list and the policies that decide whether a list
//! may be saved.

use crate::rubric::RubricItem;
use crate::weight;

/// Adds up the fractional weights of `items`, rounded to two decimal places.
///
/// Rounding absorbs floating-point drift so that `0.33 + 0.33 + 0.34` totals exactly `1.00`.
pub fn compute_sum<'a, V: 'a, I>(items: I) -> f64
where
    I: IntoIterator<Item = &'a RubricItem<V>>,
{
    let raw: f64 = items.into_iter().map(|item| item.weight).sum();
    (raw * 100.0).round() / 100.0
}

/// True when a rounded sum equals 100%.
pub fn is_valid(sum: f64) -> bool {
    (sum * 100.0).round() as i64 == 100
}

/// Total weight of a draft together with its validity, recomputed on every edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSummary {
    pub sum: f64,
    pub valid: bool,
}

impl WeightSummary {
    pub fn of<'a, V: 'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a RubricItem<V>>,
    {
        let sum = compute_sum(items);
        WeightSummary {
            sum,
            valid: is_valid(sum),
        }
    }

    /// Current total as a label, e.g. `"110%"`.
    pub fn percent_label(&self) -> String {
        weight::format_percent(self.sum)
    }

    /// Inline indicator comparing the total with the 100% target.
    pub fn banner(&self) -> String {
        format!("Total: {} / 100%", self.percent_label())
    }
}

/// Decides whether a list with the given total may be submitted.
pub trait SumPolicy {
    fn permits_save(&self, summary: &WeightSummary) -> bool;
}

/// Standard rubrics: saving is blocked until the weights total 100%.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl SumPolicy for Strict {
    fn permits_save(&self, summary: &WeightSummary) -> bool {
        summary.valid
    }
}

/// Daily-work rubrics: the total is shown but never blocks saving.
#[derive(Debug, Clone, Copy, Default)]
pub struct Informational;

impl SumPolicy for Informational {
    fn permits_save(&self, _summary: &WeightSummary) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::{Standard, StandardRubricItem};

    fn items(weights: &[f64]) -> Vec<StandardRubricItem> {
        weights
            .iter()
            .map(|w| RubricItem::<Standard>::blank("MAT-101", *w))
            .collect()
    }

    #[test]
    fn test_two_halves_are_valid() {
        let list = items(&[0.5, 0.5]);
        let sum = compute_sum(&list);
        assert_eq!(sum, 1.0);
        assert!(is_valid(sum));
    }

    #[test]
    fn test_rounding_absorbs_float_drift() {
        let list = items(&[0.33, 0.33, 0.34]);
        let sum = compute_sum(&list);
        assert_eq!(sum, 1.0);
        assert!(is_valid(sum));

        let tenths = items(&[0.1; 10]);
        assert!(is_valid(compute_sum(&tenths)));
    }

    #[test]
    fn test_ninety_percent_is_rejected() {
        let list = items(&[0.5, 0.4]);
        let sum = compute_sum(&list);
        assert_eq!(sum, 0.9);
        assert!(!is_valid(sum));
        assert!(!Strict.permits_save(&WeightSummary::of(&list)));
    }

    #[test]
    fn test_empty_list_totals_zero() {
        let list = items(&[]);
        let summary = WeightSummary::of(&list);
        assert_eq!(summary.sum, 0.0);
        assert!(!summary.valid);
    }

    #[test]
    fn test_informational_policy_never_blocks() {
        let list = items(&[0.4, 0.3]);
        let summary = WeightSummary::of(&list);
        assert_eq!(summary.sum, 0.7);
        assert!(!summary.valid);
        assert!(Informational.permits_save(&summary));
    }

    #[test]
    fn test_banner_shows_current_total() {
        let summary = WeightSummary::of(&items(&[0.6, 0.4, 0.1]));
        assert_eq!(summary.percent_label(), "110%");
        assert_eq!(summary.banner(), "Total: 110% / 100%");
    }
}
