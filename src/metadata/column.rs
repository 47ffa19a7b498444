// Copyright © 2024 Pathway

use std::fmt::{self, Display};
use std::ops::Not;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::engine::{ColumnRole, ValueType};

/// Three-valued answer of a metadata query whose truth may not be known before the data
/// is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaDataInfo {
    Yes,
    No,
    #[default]
    Unknown,
}

impl MetaDataInfo {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl Not for MetaDataInfo {
    type Output = Self;

    /// `Unknown` stays unknown.
    fn not(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
            Self::Unknown => Self::Unknown,
        }
    }
}

impl Display for MetaDataInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => f.write_str("yes"),
            Self::No => f.write_str("no"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Data-free description of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::module_name_repetitions)]
pub struct ColumnMetaData {
    name: ArcStr,
    value_type: ValueType,
    role: Option<ColumnRole>,
    missing_values: MetaDataInfo,
}

impl ColumnMetaData {
    pub fn new(name: impl Into<ArcStr>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            role: None,
            missing_values: MetaDataInfo::Unknown,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn with_missing_values(mut self, missing_values: MetaDataInfo) -> Self {
        self.missing_values = missing_values;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &ArcStr {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: ArcStr) {
        self.name = name;
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn set_value_type(&mut self, value_type: ValueType) {
        self.value_type = value_type;
    }

    pub fn role(&self) -> Option<&ColumnRole> {
        self.role.as_ref()
    }

    pub fn set_role(&mut self, role: Option<ColumnRole>) {
        self.role = role;
    }

    pub fn is_special(&self) -> bool {
        self.role.is_some()
    }

    pub fn has_missing_values(&self) -> MetaDataInfo {
        self.missing_values
    }

    pub fn set_missing_values(&mut self, missing_values: MetaDataInfo) {
        self.missing_values = missing_values;
    }
}
