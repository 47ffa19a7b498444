// Copyright © 2024 Pathway

use std::fmt::{self, Display};

use arcstr::ArcStr;
use indexmap::IndexMap;
use log::debug;

use super::column::{ColumnMetaData, MetaDataInfo};
use super::history::History;
use crate::engine::{Error, Result, Table};
use crate::ports::PortId;

/// Estimate of a table's row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowCount {
    #[default]
    Unknown,
    Equal(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl RowCount {
    pub fn number(self) -> Option<usize> {
        match self {
            Self::Unknown => None,
            Self::Equal(n) | Self::AtLeast(n) | Self::AtMost(n) => Some(n),
        }
    }

    /// Whether a table with `rows` rows is consistent with the estimate.
    pub fn admits(self, rows: usize) -> bool {
        match self {
            Self::Unknown => true,
            Self::Equal(n) => rows == n,
            Self::AtLeast(n) => rows >= n,
            Self::AtMost(n) => rows <= n,
        }
    }
}

impl Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("?"),
            Self::Equal(n) => write!(f, "= {n}"),
            Self::AtLeast(n) => write!(f, ">= {n}"),
            Self::AtMost(n) => write!(f, "<= {n}"),
        }
    }
}

/// Schema-only twin of a [`Table`]: ordered column descriptors plus table-level
/// annotations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct TableMetaData {
    columns: IndexMap<ArcStr, ColumnMetaData>,
    history: History,
    row_count: RowCount,
}

impl TableMetaData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: impl IntoIterator<Item = ColumnMetaData>) -> Result<Self> {
        let mut metadata = Self::new();
        for column in columns {
            metadata.add_column(column)?;
        }
        Ok(metadata)
    }

    /// Infers the schema of a live table. With `infer_missing` every column is scanned for
    /// missing values; otherwise their status stays unknown.
    pub fn from_table(table: &Table, infer_missing: bool) -> Self {
        let columns = table
            .iter_columns()
            .map(|column| {
                let mut metadata = ColumnMetaData::new(column.name(), column.value_type());
                metadata.set_role(column.role().cloned());
                if infer_missing {
                    metadata.set_missing_values(MetaDataInfo::from_bool(
                        column.contains_missing_values(),
                    ));
                }
                (metadata.name_arc().clone(), metadata)
            })
            .collect();
        Self {
            columns,
            history: History::new(),
            row_count: RowCount::Equal(table.height()),
        }
    }

    pub fn add_column(&mut self, column: ColumnMetaData) -> Result<()> {
        if self.columns.contains_key(column.name()) {
            return Err(Error::DuplicateColumn(column.name().to_string()));
        }
        self.columns.insert(column.name_arc().clone(), column);
        Ok(())
    }

    /// Removes a column, keeping the order of the others.
    pub fn remove_column(&mut self, name: &str) -> Option<ColumnMetaData> {
        self.columns.shift_remove(name)
    }

    /// Renames a column in place; its position does not change.
    pub fn rename_column(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return self
                .columns
                .contains_key(old_name)
                .then_some(())
                .ok_or_else(|| Error::ColumnMissing(old_name.to_string()));
        }
        if self.columns.contains_key(new_name) {
            return Err(Error::DuplicateColumn(new_name.to_string()));
        }
        let Some(index) = self.columns.get_index_of(old_name) else {
            return Err(Error::ColumnMissing(old_name.to_string()));
        };
        let new_name = ArcStr::from(new_name);
        let columns = std::mem::take(&mut self.columns);
        self.columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, (name, mut column))| {
                if i == index {
                    column.set_name(new_name.clone());
                    (new_name.clone(), column)
                } else {
                    (name, column)
                }
            })
            .collect();
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetaData> {
        self.columns.get(name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnMetaData> {
        self.columns.get_mut(name)
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = &ColumnMetaData> {
        self.columns.values()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.keys().map(ArcStr::as_str).collect()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Projects the metadata onto `names`, in the order given. History and row count are
    /// kept.
    pub fn columns<S: AsRef<str>>(&self, names: &[S]) -> Result<TableMetaData> {
        let mut columns = IndexMap::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let column = self
                .columns
                .get(name)
                .ok_or_else(|| Error::ColumnMissing(name.to_string()))?;
            if columns
                .insert(column.name_arc().clone(), column.clone())
                .is_some()
            {
                return Err(Error::DuplicateColumn(name.to_string()));
            }
        }
        Ok(TableMetaData {
            columns,
            history: self.history.clone(),
            row_count: self.row_count,
        })
    }

    /// `Yes` if some column is known to contain missing values, `No` if all columns are
    /// known not to, `Unknown` otherwise.
    pub fn has_missing_values(&self) -> MetaDataInfo {
        let mut result = MetaDataInfo::No;
        for column in self.columns.values() {
            match column.has_missing_values() {
                MetaDataInfo::Yes => return MetaDataInfo::Yes,
                MetaDataInfo::Unknown => result = MetaDataInfo::Unknown,
                MetaDataInfo::No => {}
            }
        }
        result
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn with_history_appended(mut self, port: PortId) -> Self {
        self.history = self.history.appended(port);
        self
    }

    pub fn row_count(&self) -> RowCount {
        self.row_count
    }

    pub fn set_row_count(&mut self, row_count: RowCount) {
        self.row_count = row_count;
    }

    /// Checks that a table which arrived at execution time matches this metadata: every
    /// described column exists with the described type, and the row count fits the
    /// estimate. Extra columns in the table are fine.
    pub fn check_table(&self, table: &Table) -> Result<()> {
        for expected in self.columns.values() {
            let actual = table
                .column(expected.name())
                .ok_or_else(|| Error::ColumnMissing(expected.name().to_string()))?;
            if actual.value_type() != expected.value_type() {
                return Err(Error::ColumnTypeMismatch {
                    name: expected.name().to_string(),
                    expected: expected.value_type(),
                    actual: actual.value_type(),
                });
            }
        }
        if !self.row_count.admits(table.height()) {
            debug!(
                "Row count {} of the table does not match the estimate {}",
                table.height(),
                self.row_count
            );
        }
        Ok(())
    }
}
