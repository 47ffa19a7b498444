// Copyright © 2024 Pathway

use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{apply_filter, ColumnSource, FilterKind, ScanContext, SpecialFilterStrategy};
use crate::engine::{ConcurrencyContext, Error, OperatorContext, Result, Table, ValueType};
use crate::metadata::TableMetaData;

/// User configuration of a [`TableSubsetSelector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetSelectorConfig {
    #[serde(flatten)]
    pub filter: FilterKind,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub special_strategy: SpecialFilterStrategy,
}

impl SubsetSelectorConfig {
    pub fn new(filter: FilterKind) -> Self {
        Self {
            filter,
            invert: false,
            special_strategy: SpecialFilterStrategy::default(),
        }
    }

    #[must_use]
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    #[must_use]
    pub fn with_special_strategy(mut self, special_strategy: SpecialFilterStrategy) -> Self {
        self.special_strategy = special_strategy;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidFilterConfiguration(e.to_string()))
    }
}

impl Default for SubsetSelectorConfig {
    fn default() -> Self {
        Self::new(FilterKind::All)
    }
}

/// Selects a column subset of a live table or of its metadata with the same
/// configuration.
///
/// A selector can be restricted to a set of value types: columns of other types are
/// dropped before the configured filter runs, whatever their role.
#[derive(Clone, Default)]
pub struct TableSubsetSelector {
    config: SubsetSelectorConfig,
    value_types: Option<Vec<ValueType>>,
    concurrency: Option<Arc<dyn ConcurrencyContext>>,
    operator: Option<Arc<dyn OperatorContext>>,
}

impl fmt::Debug for TableSubsetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSubsetSelector")
            .field("config", &self.config)
            .field("value_types", &self.value_types)
            .field("concurrency", &self.concurrency.is_some())
            .field("operator", &self.operator.is_some())
            .finish()
    }
}

impl TableSubsetSelector {
    pub fn new(config: SubsetSelectorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_value_types(mut self, value_types: impl IntoIterator<Item = ValueType>) -> Self {
        self.value_types = Some(value_types.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: Arc<dyn ConcurrencyContext>) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    #[must_use]
    pub fn with_operator(mut self, operator: Arc<dyn OperatorContext>) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn config(&self) -> &SubsetSelectorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SubsetSelectorConfig) {
        self.config = config;
    }

    pub fn value_types(&self) -> Option<&[ValueType]> {
        self.value_types.as_deref()
    }

    /// Filters a live table. The missing values filter scans the data.
    pub fn get_subset(&self, table: &Table) -> Result<Table> {
        self.select(table)
    }

    /// Filters metadata. Where the data would have to be seen to decide, the column is left
    /// out.
    pub fn get_metadata_subset(&self, metadata: &TableMetaData) -> Result<TableMetaData> {
        self.select(metadata)
    }

    fn select<S: ColumnSource>(&self, source: &S) -> Result<S> {
        let filter = self.config.filter.resolve()?;
        let scan = ScanContext {
            concurrency: self.concurrency.as_deref(),
            operator: self.operator.as_deref(),
        };
        let restricted;
        let source = match &self.value_types {
            Some(value_types) => {
                restricted = source.select(&|name: &str| {
                    source
                        .value_type(name)
                        .is_some_and(|value_type| value_types.contains(&value_type))
                })?;
                &restricted
            }
            None => source,
        };
        let selected = apply_filter(
            source,
            &filter,
            self.config.special_strategy,
            self.config.invert,
            &scan,
        )?;
        debug!(
            "Filter {} selected {} of {} columns",
            self.config.filter.name(),
            selected.labels().len(),
            source.labels().len()
        );
        Ok(selected)
    }
}
