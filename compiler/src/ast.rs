// ast.rs — Value nodes and source spans shared by the declaration table and
// the instantiation tree.
//
// A `Value` is one term of an initializer sequence. Parameter references carry
// the referenced parameter's identity (`ParamId`), never a copy of its value.
//
// Preconditions: produced by the model loader (or built directly by callers).
// Postconditions: none (data-only module).
// Failure modes: unknown time-unit spellings are rejected by `TimeUnit::from_str`.
// Side effects: none.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::id::ParamId;

// ── Span ────────────────────────────────────────────────────────────────────

/// Byte-offset range in the program source, used for diagnostics.
///
/// Models built in code (tests, benches) use `Span::default()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "(usize, usize)")]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Span { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ── Time values ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nsec,
    Usec,
    Msec,
    Sec,
    Min,
    Hour,
    Day,
    Week,
}

impl TimeUnit {
    /// Length of one unit in nanoseconds.
    pub fn nanos(self) -> u128 {
        match self {
            TimeUnit::Nsec => 1,
            TimeUnit::Usec => 1_000,
            TimeUnit::Msec => 1_000_000,
            TimeUnit::Sec => 1_000_000_000,
            TimeUnit::Min => 60 * 1_000_000_000,
            TimeUnit::Hour => 3_600 * 1_000_000_000,
            TimeUnit::Day => 86_400 * 1_000_000_000,
            TimeUnit::Week => 604_800 * 1_000_000_000,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s {
            "ns" | "nsec" | "nsecs" => TimeUnit::Nsec,
            "us" | "usec" | "usecs" => TimeUnit::Usec,
            "ms" | "msec" | "msecs" => TimeUnit::Msec,
            "s" | "sec" | "secs" | "second" | "seconds" => TimeUnit::Sec,
            "min" | "mins" | "minute" | "minutes" => TimeUnit::Min,
            "h" | "hour" | "hours" => TimeUnit::Hour,
            "d" | "day" | "days" => TimeUnit::Day,
            "week" | "weeks" => TimeUnit::Week,
            other => return Err(format!("unknown time unit `{}`", other)),
        };
        Ok(unit)
    }
}

/// A time-valued term. `unit` is `None` only for the literal zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeValue {
    pub magnitude: u64,
    pub unit: Option<TimeUnit>,
}

impl TimeValue {
    pub fn new(magnitude: u64, unit: TimeUnit) -> Self {
        TimeValue {
            magnitude,
            unit: Some(unit),
        }
    }

    pub fn zero() -> Self {
        TimeValue {
            magnitude: 0,
            unit: None,
        }
    }

    /// Total length in nanoseconds. Widened to `u128` so no unit overflows.
    pub fn to_nanos(&self) -> u128 {
        let factor = self.unit.map_or(1, TimeUnit::nanos);
        u128::from(self.magnitude) * factor
    }
}

// ── Literals and values ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Verbatim target-language code.
    Code(String),
}

/// One initializer term.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    Time(TimeValue),
    ParamRef(ParamId),
}

impl Value {
    pub fn int(v: i64) -> Self {
        Value::Literal(Literal::Int(v))
    }

    pub fn float(v: f64) -> Self {
        Value::Literal(Literal::Float(v))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Value::Literal(Literal::Str(v.into()))
    }

    pub fn time(magnitude: u64, unit: TimeUnit) -> Self {
        Value::Time(TimeValue::new(magnitude, unit))
    }

    pub fn param(id: ParamId) -> Self {
        Value::ParamRef(id)
    }

    pub fn as_param_ref(&self) -> Option<ParamId> {
        match self {
            Value::ParamRef(id) => Some(*id),
            _ => None,
        }
    }
}
