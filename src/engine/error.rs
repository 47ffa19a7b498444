// Copyright © 2024 Pathway

use std::error;
use std::result;

use super::value::{Value, ValueType};
use crate::ports::PortId;

#[allow(clippy::module_name_repetitions)]
pub type DynError = Box<dyn error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid filter configuration: {0}")]
    InvalidFilterConfiguration(String),

    #[error("invalid regular expression {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown filter name: {0:?}")]
    UnknownFilterName(String),

    #[error("unknown value type: {0:?}")]
    UnknownValueType(String),

    #[error("unknown special column strategy: {0:?}")]
    UnknownSpecialStrategy(String),

    #[error("invalid operator handle")]
    InvalidOperatorHandle,

    #[error("operator {operator:?} has no {direction} port with index {index}")]
    InvalidPortIndex {
        operator: String,
        direction: &'static str,
        index: usize,
    },

    #[error("input port {0} is already connected")]
    InputAlreadyConnected(PortId),

    #[error("operator graph contains a cycle")]
    CycleDetected,

    #[error("column {0:?} is missing")]
    ColumnMissing(String),

    #[error("column {name:?} type mismatch: expected {expected}, got {actual}")]
    ColumnTypeMismatch {
        name: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("duplicate column: {0:?}")]
    DuplicateColumn(String),

    #[error("length mismatch: column {name:?} has {actual} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("value {value} does not fit column {name:?} of type {value_type}")]
    InvalidValue {
        name: String,
        value_type: ValueType,
        value: Value,
    },

    #[error("process stopped")]
    ProcessStopped,

    #[error(transparent)]
    Other(DynError),
}

impl Error {
    /// Whether the error comes from a bad filter configuration rather than from data or the
    /// graph layout.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilterConfiguration(_)
                | Self::InvalidRegex { .. }
                | Self::UnknownFilterName(_)
                | Self::UnknownValueType(_)
                | Self::UnknownSpecialStrategy(_)
        )
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;
