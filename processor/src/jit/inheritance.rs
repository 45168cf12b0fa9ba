//! Metric inheritance rules (§4.8), applied in order against a child's
//! freshly-compiled metrics and the parent block's published metrics.

use wodscript_core::{MetricKind, MetricValue, MetricValues};

#[derive(Debug, Clone)]
pub enum InheritanceRule {
    /// Replace every metric of matching kinds with the provided values.
    Override(MetricValues),
    /// Drop every metric of the given kinds.
    Ignore(Vec<MetricKind>),
    /// Add the given metric only if no value of that kind is already present.
    Inherit(MetricValues),
}

fn retain_other_kinds(values: &mut MetricValues, kinds: &[MetricKind]) {
    values.retain(|v| !kinds.contains(&v.kind));
}

fn kinds_of(values: &[MetricValue]) -> Vec<MetricKind> {
    values.iter().map(|v| v.kind).collect()
}

pub fn apply_rules(mut values: MetricValues, rules: &[InheritanceRule]) -> MetricValues {
    for rule in rules {
        match rule {
            InheritanceRule::Override(replacement) => {
                retain_other_kinds(&mut values, &kinds_of(replacement));
                values.extend(replacement.iter().cloned());
            }
            InheritanceRule::Ignore(kinds) => {
                retain_other_kinds(&mut values, kinds);
            }
            InheritanceRule::Inherit(candidates) => {
                for candidate in candidates {
                    if !values.iter().any(|v| v.kind == candidate.kind) {
                        values.push(candidate.clone());
                    }
                }
            }
        }
    }
    values
}

/// Convenience for the common EffortStrategy case: search the parent's
/// published `metric:reps` memory cell and inherit it as `Repetitions` if
/// the child's own fragments didn't already set one.
pub fn inherit_reps_if_absent(values: MetricValues, parent_reps: Option<u32>) -> MetricValues {
    match parent_reps {
        Some(reps) => apply_rules(
            values,
            &[InheritanceRule::Inherit(vec![MetricValue::repetitions(reps)])],
        ),
        None => values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherit_does_not_overwrite_an_existing_value_of_the_same_kind() {
        let values = vec![MetricValue::repetitions(10)];
        let result = apply_rules(values, &[InheritanceRule::Inherit(vec![MetricValue::repetitions(21)])]);
        assert_eq!(result, vec![MetricValue::repetitions(10)]);
    }

    #[test]
    fn inherit_adds_value_when_kind_absent() {
        let result = inherit_reps_if_absent(Vec::new(), Some(21));
        assert_eq!(result, vec![MetricValue::repetitions(21)]);
    }

    #[test]
    fn override_replaces_matching_kinds_only() {
        let values = vec![MetricValue::repetitions(5), MetricValue::rounds(3)];
        let result =
            apply_rules(values, &[InheritanceRule::Override(vec![MetricValue::repetitions(99)])]);
        assert_eq!(result, vec![MetricValue::rounds(3), MetricValue::repetitions(99)]);
    }

    #[test]
    fn ignore_drops_every_value_of_given_kinds() {
        let values = vec![MetricValue::repetitions(5), MetricValue::rounds(3)];
        let result = apply_rules(values, &[InheritanceRule::Ignore(vec![MetricKind::Rounds])]);
        assert_eq!(result, vec![MetricValue::repetitions(5)]);
    }
}
