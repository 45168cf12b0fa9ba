//! Turns parsed fragments into normalized metric values (§4.8 "Metric
//! extraction during compile"). A pure function: identical fragment slices
//! always produce identical, order-preserving output (spec.md §8).

use wodscript_core::{Fragment, MetricValue, MetricValues, RoundsValue, Unit};

/// `Rounds` fragments behave differently depending on their payload shape:
/// a list becomes a rep scheme (one `repetitions` value per entry, plus the
/// scheme length as `rounds`); a bare count is a multiplier, contributing
/// only a single `repetitions` value (spec.md §4.8: "treated as a
/// multiplier, not a rep scheme").
pub fn compile_fragments(fragments: &[Fragment]) -> MetricValues {
    let mut values = MetricValues::new();
    for fragment in fragments {
        match fragment {
            Fragment::Timer { value_ms, .. } => {
                values.push(MetricValue::time_ms(*value_ms));
            }
            Fragment::Rounds { value, .. } => match value {
                RoundsValue::Scheme(reps) => {
                    values.push(MetricValue::rounds(reps.len() as u32));
                    for r in reps {
                        values.push(MetricValue::repetitions(*r));
                    }
                }
                RoundsValue::Count(n) if *n > 0 => {
                    values.push(MetricValue::repetitions(*n));
                }
                RoundsValue::Count(_) => {}
            },
            Fragment::Repetitions { value } => {
                values.push(MetricValue::repetitions(*value));
            }
            Fragment::Resistance { value, unit } => {
                values.push(MetricValue::new(
                    wodscript_core::MetricKind::Resistance,
                    *value,
                    Unit::from_str(unit),
                ));
            }
            Fragment::Distance { value, unit } => {
                values.push(MetricValue::new(
                    wodscript_core::MetricKind::Distance,
                    *value,
                    Unit::from_str(unit),
                ));
            }
            Fragment::Effort { .. }
            | Fragment::Action { .. }
            | Fragment::Lap { .. }
            | Fragment::Text { .. } => {}
        }
    }
    values
}

/// The first `Effort` fragment becomes the block's `exerciseId` (§4.8).
pub fn exercise_id(fragments: &[Fragment]) -> Option<String> {
    fragments.iter().find_map(|f| match f {
        Fragment::Effort { name } => Some(name.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wodscript_core::MetricKind;

    #[test]
    fn timer_fragment_yields_a_time_metric_in_milliseconds() {
        let fragments = vec![Fragment::Timer { image: "20:00".into(), value_ms: 1_200_000, direction: None }];
        let values = compile_fragments(&fragments);
        assert_eq!(values, vec![MetricValue::time_ms(1_200_000)]);
    }

    #[test]
    fn rounds_scheme_yields_rounds_then_one_repetitions_value_per_entry() {
        let fragments = vec![Fragment::Rounds {
            image: "(21-15-9)".into(),
            value: RoundsValue::Scheme(vec![21, 15, 9]),
        }];
        let values = compile_fragments(&fragments);
        assert_eq!(
            values,
            vec![
                MetricValue::rounds(3),
                MetricValue::repetitions(21),
                MetricValue::repetitions(15),
                MetricValue::repetitions(9),
            ]
        );
    }

    #[test]
    fn rounds_count_is_a_multiplier_not_a_scheme() {
        let fragments = vec![Fragment::Rounds { image: "(5)".into(), value: RoundsValue::Count(5) }];
        let values = compile_fragments(&fragments);
        assert_eq!(values, vec![MetricValue::repetitions(5)]);
    }

    #[test]
    fn compile_is_pure_same_input_same_output() {
        let fragments = vec![Fragment::Repetitions { value: 10 }, Fragment::Effort { name: "Pullups".into() }];
        assert_eq!(compile_fragments(&fragments), compile_fragments(&fragments));
    }

    #[test]
    fn first_effort_fragment_becomes_exercise_id() {
        let fragments =
            vec![Fragment::Effort { name: "Thrusters".into() }, Fragment::Effort { name: "Pullups".into() }];
        assert_eq!(exercise_id(&fragments).as_deref(), Some("Thrusters"));
    }

    #[test]
    fn value_kind_is_preserved_for_resistance_and_distance() {
        let fragments = vec![
            Fragment::Resistance { value: 95.0, unit: "lb".into() },
            Fragment::Distance { value: 400.0, unit: "m".into() },
        ];
        let values = compile_fragments(&fragments);
        assert_eq!(values[0].kind, MetricKind::Resistance);
        assert_eq!(values[1].kind, MetricKind::Distance);
    }
}
