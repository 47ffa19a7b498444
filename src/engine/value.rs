// Copyright © 2024 Pathway

use std::fmt::{self, Display};
use std::str::FromStr;

use arcstr::ArcStr;
use chrono::{NaiveDateTime, NaiveTime};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::error::Error;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    String(ArcStr),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Value {
    /// `None` and a float `NaN` both count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::None => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::None => write!(fmt, "None"),
            Self::Bool(b) => write!(fmt, "{}", if *b { "True" } else { "False" }),
            Self::Int(i) => write!(fmt, "{i}"),
            Self::Float(OrderedFloat(f)) => write!(fmt, "{f:?}"),
            Self::String(s) => write!(fmt, "{s:?}"),
            Self::Time(time) => write!(fmt, "{time}"),
            Self::DateTime(date_time) => write!(fmt, "{date_time}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(OrderedFloat(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<ArcStr> for Value {
    fn from(s: ArcStr) -> Self {
        Self::String(s)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Self::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Self::None,
        }
    }
}

/// Value type of a column, shared by live tables and their metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Real,
    Integer,
    Time,
    DateTime,
    Binominal,
    NonBinominal,
    Text,
}

impl ValueType {
    pub const ALL: [ValueType; 7] = [
        Self::Real,
        Self::Integer,
        Self::Time,
        Self::DateTime,
        Self::Binominal,
        Self::NonBinominal,
        Self::Text,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Integer => "integer",
            Self::Time => "time",
            Self::DateTime => "date_time",
            Self::Binominal => "binominal",
            Self::NonBinominal => "non_binominal",
            Self::Text => "text",
        }
    }

    /// Whether a cell value may be stored in a column of this type. Missing values fit
    /// every type.
    pub fn accepts(self, value: &Value) -> bool {
        if value.is_missing() {
            return true;
        }
        match (self, value) {
            (Self::Real, Value::Float(_) | Value::Int(_))
            | (Self::Integer, Value::Int(_))
            | (Self::Time, Value::Time(_))
            | (Self::DateTime, Value::DateTime(_))
            | (Self::Binominal, Value::Bool(_) | Value::String(_))
            | (Self::NonBinominal | Self::Text, Value::String(_)) => true,
            _ => false,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|value_type| value_type.name() == s)
            .ok_or_else(|| Error::UnknownValueType(s.to_string()))
    }
}
