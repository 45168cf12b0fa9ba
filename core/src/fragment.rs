//! Fragments are the tagged, immutable tokens a (external) parser attaches to
//! a [`crate::Statement`]. The JIT compiler in `wodscript-processor` reads
//! fragments to select a strategy and to derive [`crate::MetricValue`]s.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction a timer fragment counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimerDirection {
    Up,
    Down,
}

/// The value carried by a `Rounds` fragment: either a flat repeat count or an
/// ordered rep scheme such as `21-15-9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoundsValue {
    Count(u32),
    Scheme(Vec<u32>),
}

/// `Lap` fragments describe how a statement's children are laid out relative
/// to round boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LapMode {
    /// Children compose into a single unit (one push per round).
    Compose,
    /// Each child is its own round.
    Round,
    None,
}

/// One parsed token of a workout statement. Fragments are immutable after
/// parse; the compiler only ever reads them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Fragment {
    Timer {
        image: String,
        value_ms: i64,
        direction: Option<TimerDirection>,
    },
    Rounds {
        image: String,
        value: RoundsValue,
    },
    Repetitions {
        value: u32,
    },
    Resistance {
        value: f64,
        unit: String,
    },
    Distance {
        value: f64,
        unit: String,
    },
    Effort {
        name: String,
    },
    Action {
        name: String,
    },
    Lap {
        mode: LapMode,
    },
    Text {
        value: String,
    },
}

impl Fragment {
    pub fn as_timer(&self) -> Option<(i64, Option<TimerDirection>)> {
        match self {
            Fragment::Timer { value_ms, direction, .. } => Some((*value_ms, *direction)),
            _ => None,
        }
    }

    pub fn as_rounds(&self) -> Option<&RoundsValue> {
        match self {
            Fragment::Rounds { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_action_name(&self) -> Option<&str> {
        match self {
            Fragment::Action { name } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn as_effort_name(&self) -> Option<&str> {
        match self {
            Fragment::Effort { name } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_timer(&self) -> bool {
        matches!(self, Fragment::Timer { .. })
    }

    pub fn is_rounds(&self) -> bool {
        matches!(self, Fragment::Rounds { .. })
    }

    /// True if an `Action` fragment's name matches `needle`, case-insensitively.
    pub fn action_is(&self, needle: &str) -> bool {
        self.as_action_name().is_some_and(|n| n.eq_ignore_ascii_case(needle))
    }
}

/// Convenience extension over a fragment slice, used pervasively by the JIT
/// strategy matchers in `wodscript-processor`.
pub trait FragmentSlice {
    fn has_timer(&self) -> bool;
    fn has_rounds(&self) -> bool;
    fn has_action(&self, name: &str) -> bool;
    fn timer(&self) -> Option<&Fragment>;
    fn rounds(&self) -> Option<&Fragment>;
    fn first_effort(&self) -> Option<&str>;
}

impl FragmentSlice for [Fragment] {
    fn has_timer(&self) -> bool {
        self.iter().any(Fragment::is_timer)
    }

    fn has_rounds(&self) -> bool {
        self.iter().any(Fragment::is_rounds)
    }

    fn has_action(&self, name: &str) -> bool {
        self.iter().any(|f| f.action_is(name))
    }

    fn timer(&self) -> Option<&Fragment> {
        self.iter().find(|f| f.is_timer())
    }

    fn rounds(&self) -> Option<&Fragment> {
        self.iter().find(|f| f.is_rounds())
    }

    fn first_effort(&self) -> Option<&str> {
        self.iter().find_map(Fragment::as_effort_name)
    }
}
