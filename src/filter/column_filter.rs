// Copyright © 2024 Pathway

use std::collections::HashSet;

use indexmap::IndexSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ColumnSource, Predicate, ScanContext};
use crate::engine::{Error, Result, ValueType};
use crate::metadata::MetaDataInfo;

/// Separates column names or value types packed into one string argument.
pub const ATTRIBUTE_SEPARATOR: char = '|';

/// Declarative filter choice, as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum FilterKind {
    All,
    Single { column: String },
    Subset { columns: Vec<String> },
    Regex { pattern: String },
    ValueType { types: Vec<ValueType> },
    NoMissingValues,
}

impl FilterKind {
    pub const NAMES: [&'static str; 6] = [
        "all",
        "single",
        "subset",
        "regex",
        "value_type",
        "no_missing_values",
    ];

    /// Builds a filter choice from its name and a single string argument. The argument is
    /// the column name, the `|`-separated column names, the regular expression or the
    /// `|`-separated value type names, depending on the filter; it is ignored by filters
    /// that take none.
    pub fn from_name(name: &str, argument: &str) -> Result<Self> {
        let split = || {
            argument
                .split(ATTRIBUTE_SEPARATOR)
                .map(str::trim)
                .filter(|part| !part.is_empty())
        };
        match name {
            "all" => Ok(Self::All),
            "single" => Ok(Self::Single {
                column: argument.to_string(),
            }),
            "subset" => Ok(Self::Subset {
                columns: split().map(str::to_string).collect(),
            }),
            "regex" => Ok(Self::Regex {
                pattern: argument.to_string(),
            }),
            "value_type" => Ok(Self::ValueType {
                types: split().map(str::parse).collect::<Result<_>>()?,
            }),
            "no_missing_values" => Ok(Self::NoMissingValues),
            _ => Err(Error::UnknownFilterName(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Single { .. } => "single",
            Self::Subset { .. } => "subset",
            Self::Regex { .. } => "regex",
            Self::ValueType { .. } => "value_type",
            Self::NoMissingValues => "no_missing_values",
        }
    }

    /// Whether the filter looks at cell values rather than at names and types only.
    pub fn depends_on_values(&self) -> bool {
        matches!(self, Self::NoMissingValues)
    }

    pub fn resolve(&self) -> Result<ColumnFilter> {
        match self {
            Self::All => Ok(ColumnFilter::All),
            Self::Single { column } => {
                if column.is_empty() {
                    return Err(Error::InvalidFilterConfiguration(
                        "single column filter needs a column name".to_string(),
                    ));
                }
                Ok(ColumnFilter::Single(column.clone()))
            }
            Self::Subset { columns } => {
                if columns.is_empty() {
                    return Err(Error::InvalidFilterConfiguration(
                        "subset filter needs at least one column name".to_string(),
                    ));
                }
                Ok(ColumnFilter::Subset(columns.iter().cloned().collect()))
            }
            Self::Regex { pattern } => {
                if pattern.is_empty() {
                    return Err(Error::InvalidFilterConfiguration(
                        "regular expression filter needs a pattern".to_string(),
                    ));
                }
                let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                    Error::InvalidRegex {
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
                Ok(ColumnFilter::Regex(regex))
            }
            Self::ValueType { types } => {
                if types.is_empty() {
                    return Err(Error::InvalidFilterConfiguration(
                        "value type filter needs at least one value type".to_string(),
                    ));
                }
                Ok(ColumnFilter::ValueTypes(types.iter().copied().collect()))
            }
            Self::NoMissingValues => Ok(ColumnFilter::NoMissingValues),
        }
    }
}

/// A filter choice resolved into a ready-to-evaluate form.
#[derive(Debug, Clone)]
pub enum ColumnFilter {
    All,
    Single(String),
    /// Names not present in the filtered source are ignored.
    Subset(IndexSet<String>),
    /// Anchored on both ends, i.e. the whole name has to match.
    Regex(Regex),
    ValueTypes(HashSet<ValueType>),
    NoMissingValues,
}

impl ColumnFilter {
    pub fn predicate<'a, S: ColumnSource>(
        &'a self,
        source: &'a S,
        scan: &ScanContext<'_>,
    ) -> Result<Predicate<'a>> {
        let predicate: Predicate<'a> = match self {
            Self::All => Box::new(|_: &str| MetaDataInfo::Yes),
            Self::Single(column) => {
                Box::new(move |name: &str| MetaDataInfo::from_bool(name == column.as_str()))
            }
            Self::Subset(columns) => {
                Box::new(move |name: &str| MetaDataInfo::from_bool(columns.contains(name)))
            }
            Self::Regex(regex) => {
                Box::new(move |name: &str| MetaDataInfo::from_bool(regex.is_match(name)))
            }
            Self::ValueTypes(types) => Box::new(move |name: &str| {
                MetaDataInfo::from_bool(
                    source
                        .value_type(name)
                        .is_some_and(|value_type| types.contains(&value_type)),
                )
            }),
            Self::NoMissingValues => {
                let missing_values = source.missing_values(scan)?;
                Box::new(move |name: &str| {
                    !missing_values
                        .get(name)
                        .copied()
                        .unwrap_or(MetaDataInfo::Unknown)
                })
            }
        };
        Ok(predicate)
    }
}
