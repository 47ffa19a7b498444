// Copyright © 2024 Pathway

//! Column filters that select the same columns from a live [`Table`] and from its
//! [`TableMetaData`].
//!
//! Every filter is phrased in terms of column names and descriptors through
//! [`ColumnSource`]. The only mode-specific piece is the question "does this column
//! contain missing values": a table answers it by scanning, metadata by looking at the
//! descriptors, where the answer may be unknown. Predicates are three-valued and only
//! columns answered with a definite `Yes` are selected, so a metadata pass never
//! selects a column the data pass would reject, inverted or not.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::{
    ConcurrencyContext, Error, OperatorContext, Result, SequentialContext, Table, ValueType,
};
use crate::metadata::{MetaDataInfo, TableMetaData};

pub mod column_filter;
pub use column_filter::{ColumnFilter, FilterKind, ATTRIBUTE_SEPARATOR};

pub mod default_filters;
pub use default_filters::add_default_filters;

pub mod missing;

pub mod selector;
pub use selector::{SubsetSelectorConfig, TableSubsetSelector};

/// Answers whether a column is selected. `Unknown` is never selected.
pub type Predicate<'a> = Box<dyn Fn(&str) -> MetaDataInfo + 'a>;

/// How filters treat columns that carry a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialFilterStrategy {
    /// Role-bearing columns are selected whatever the filter says.
    #[default]
    KeepSpecial,
    /// Role-bearing columns are never selected.
    RemoveSpecial,
    /// Role-bearing columns go through the filter like any other column.
    FilterSpecial,
}

impl SpecialFilterStrategy {
    pub fn name(self) -> &'static str {
        match self {
            Self::KeepSpecial => "keep_special",
            Self::RemoveSpecial => "remove_special",
            Self::FilterSpecial => "filter_special",
        }
    }
}

impl Display for SpecialFilterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpecialFilterStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [Self::KeepSpecial, Self::RemoveSpecial, Self::FilterSpecial]
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| Error::UnknownSpecialStrategy(s.to_string()))
    }
}

/// Collaborators of a full-column scan. Missing collaborators fall back to a sequential
/// scan without stop checks.
#[derive(Clone, Copy, Default)]
pub struct ScanContext<'a> {
    pub concurrency: Option<&'a dyn ConcurrencyContext>,
    pub operator: Option<&'a dyn OperatorContext>,
}

impl fmt::Debug for ScanContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanContext")
            .field("concurrency", &self.concurrency.is_some())
            .field("operator", &self.operator.is_some())
            .finish()
    }
}

impl ScanContext<'_> {
    pub(crate) fn run_chunks(
        &self,
        range: std::ops::Range<usize>,
        action: &(dyn Fn(std::ops::Range<usize>) + Sync),
    ) {
        match self.concurrency {
            Some(concurrency) => concurrency.for_each_chunk(range, action),
            None => SequentialContext::default().for_each_chunk(range, action),
        }
    }
}

/// Something filters can select columns from: a live table or its metadata.
pub trait ColumnSource: Sized {
    /// Column names in column order.
    fn labels(&self) -> Vec<&str>;

    fn value_type(&self, name: &str) -> Option<ValueType>;

    fn is_special(&self, name: &str) -> bool;

    /// Missing value status of every column, by name.
    fn missing_values(&self, scan: &ScanContext<'_>) -> Result<HashMap<String, MetaDataInfo>>;

    /// Projection onto `names`, keeping the given order.
    fn project(&self, names: &[&str]) -> Result<Self>;

    /// Keeps the columns matching `predicate`, in column order.
    fn select(&self, predicate: &dyn Fn(&str) -> bool) -> Result<Self> {
        let names: Vec<&str> = self
            .labels()
            .into_iter()
            .filter(|name| predicate(name))
            .collect();
        self.project(&names)
    }
}

impl ColumnSource for Table {
    fn labels(&self) -> Vec<&str> {
        Table::labels(self)
    }

    fn value_type(&self, name: &str) -> Option<ValueType> {
        self.column(name).map(crate::engine::Column::value_type)
    }

    fn is_special(&self, name: &str) -> bool {
        self.column(name).is_some_and(|column| column.role().is_some())
    }

    fn missing_values(&self, scan: &ScanContext<'_>) -> Result<HashMap<String, MetaDataInfo>> {
        let contains_missing = missing::scan_missing_values(self, scan)?;
        Ok(Table::labels(self)
            .into_iter()
            .zip(contains_missing)
            .map(|(name, contains_missing)| {
                (name.to_string(), MetaDataInfo::from_bool(contains_missing))
            })
            .collect())
    }

    fn project(&self, names: &[&str]) -> Result<Self> {
        self.columns(names)
    }
}

impl ColumnSource for TableMetaData {
    fn labels(&self) -> Vec<&str> {
        TableMetaData::labels(self)
    }

    fn value_type(&self, name: &str) -> Option<ValueType> {
        self.column(name)
            .map(crate::metadata::ColumnMetaData::value_type)
    }

    fn is_special(&self, name: &str) -> bool {
        self.column(name).is_some_and(|column| column.is_special())
    }

    fn missing_values(&self, _scan: &ScanContext<'_>) -> Result<HashMap<String, MetaDataInfo>> {
        Ok(self
            .iter_columns()
            .map(|column| (column.name().to_string(), column.has_missing_values()))
            .collect())
    }

    fn project(&self, names: &[&str]) -> Result<Self> {
        self.columns(names)
    }
}

/// Applies a resolved filter together with the default filters.
pub fn apply_filter<S: ColumnSource>(
    source: &S,
    filter: &ColumnFilter,
    strategy: SpecialFilterStrategy,
    invert: bool,
    scan: &ScanContext<'_>,
) -> Result<S> {
    let predicate = filter.predicate(source, scan)?;
    let predicate = add_default_filters(source, strategy, invert, predicate);
    source.select(&|name: &str| predicate(name) == MetaDataInfo::Yes)
}
