use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The normalized kinds a [`MetricValue`] can carry. Distinct from `Fragment`
/// because several fragment shapes collapse into the same metric kind (e.g. a
/// `Rounds` fragment contributes both a `rounds` value and, for rep schemes,
/// one `repetitions` value per scheme entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MetricKind {
    Time,
    Repetitions,
    Resistance,
    Distance,
    Rounds,
    Calories,
    Timestamp,
    HeartRate,
    Cadence,
    Power,
    Effort,
    Action,
}

/// A physical unit tag carried alongside a metric value. `None` for
/// dimensionless kinds (repetitions, rounds, effort, action).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Unit {
    Milliseconds,
    Pounds,
    Kilograms,
    Meters,
    Kilometers,
    Miles,
    Feet,
    Count,
    Bpm,
    Rpm,
    Watts,
    Named(String),
}

impl Unit {
    pub fn from_str(raw: &str) -> Unit {
        match raw {
            "lb" => Unit::Pounds,
            "kg" => Unit::Kilograms,
            "m" => Unit::Meters,
            "km" => Unit::Kilometers,
            "mi" => Unit::Miles,
            "ft" => Unit::Feet,
            other => Unit::Named(other.to_string()),
        }
    }
}

/// One normalized metric value. `value` is stored as `f64`; kinds that are
/// conceptually integral (repetitions, rounds) round-trip exactly for any
/// value produced by the fragment compiler.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricValue {
    pub kind: MetricKind,
    pub value: f64,
    pub unit: Unit,
}

impl MetricValue {
    pub fn new(kind: MetricKind, value: f64, unit: Unit) -> Self {
        MetricValue { kind, value, unit }
    }

    pub fn time_ms(value_ms: i64) -> Self {
        MetricValue::new(MetricKind::Time, value_ms as f64, Unit::Milliseconds)
    }

    pub fn repetitions(n: u32) -> Self {
        MetricValue::new(MetricKind::Repetitions, n as f64, Unit::Count)
    }

    pub fn rounds(n: u32) -> Self {
        MetricValue::new(MetricKind::Rounds, n as f64, Unit::Count)
    }

    pub fn as_u32(&self) -> u32 {
        self.value.max(0.0).round() as u32
    }
}

/// An order-preserving bag of metric values, as published on a
/// [`RuntimeMetric`]. Authoring order matters (e.g. rep scheme order), so this
/// is a `Vec`, not a map.
pub type MetricValues = Vec<MetricValue>;

/// One open or closed interval of wall-clock execution, as tracked by a
/// [`crate::RuntimeMetric`] or a clock.
#[derive(Debug, Clone, Copy)]
pub struct TimeSpan {
    pub start: Instant,
    pub stop: Option<Instant>,
}

impl TimeSpan {
    pub fn open(start: Instant) -> Self {
        TimeSpan { start, stop: None }
    }

    pub fn is_open(&self) -> bool {
        self.stop.is_none()
    }

    pub fn close(&mut self, at: Instant) {
        if self.stop.is_none() {
            self.stop = Some(at);
        }
    }

    /// Elapsed duration: `stop - start` if closed, `now - start` otherwise.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.stop.unwrap_or(now).saturating_duration_since(self.start)
    }
}

/// One per compiled block: accumulates the metric values and timing spans
/// observed while the block is on the runtime stack.
#[derive(Debug, Clone)]
pub struct RuntimeMetric {
    pub source_id: crate::StatementId,
    pub exercise_id: Option<String>,
    pub values: MetricValues,
    pub time_spans: Vec<TimeSpan>,
}

impl RuntimeMetric {
    pub fn new(source_id: crate::StatementId) -> Self {
        RuntimeMetric { source_id, exercise_id: None, values: Vec::new(), time_spans: Vec::new() }
    }

    pub fn with_values(source_id: crate::StatementId, values: MetricValues) -> Self {
        RuntimeMetric { source_id, exercise_id: None, values, time_spans: Vec::new() }
    }

    pub fn value_of(&self, kind: MetricKind) -> Option<&MetricValue> {
        self.values.iter().find(|v| v.kind == kind)
    }

    pub fn set_value(&mut self, value: MetricValue) {
        if let Some(existing) = self.values.iter_mut().find(|v| v.kind == value.kind) {
            *existing = value;
        } else {
            self.values.push(value);
        }
    }
}
