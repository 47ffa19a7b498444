// Copyright © 2024 Pathway

use std::collections::HashSet;
use std::fmt::{self, Display};
use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::value::{Value, ValueType};

/// Semantic role of a column, e.g. the label a learner is trained on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnRole(ArcStr);

impl ColumnRole {
    pub const LABEL: &'static str = "label";
    pub const ID: &'static str = "id";
    pub const PREDICTION: &'static str = "prediction";
    pub const WEIGHT: &'static str = "weight";
    pub const CLUSTER: &'static str = "cluster";

    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self(name.into())
    }

    pub fn label() -> Self {
        Self::new(Self::LABEL)
    }

    pub fn id() -> Self {
        Self::new(Self::ID)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: ArcStr,
    value_type: ValueType,
    role: Option<ColumnRole>,
    values: Arc<[Value]>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn role(&self) -> Option<&ColumnRole> {
        self.role.as_ref()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scans every value of the column.
    pub fn contains_missing_values(&self) -> bool {
        self.values.iter().any(Value::is_missing)
    }
}

/// A live, column-oriented table, indexed by column name in column order. Cloning and
/// projecting share the column buffers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    height: usize,
    columns: IndexMap<ArcStr, Arc<Column>>,
}

impl Table {
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.keys().map(ArcStr::as_str).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name).map(AsRef::as_ref)
    }

    pub fn column_by_index(&self, index: usize) -> Option<&Column> {
        self.columns
            .get_index(index)
            .map(|(_, column)| column.as_ref())
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values().map(AsRef::as_ref)
    }

    /// Projects the table onto `names`, in the order given.
    pub fn columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let mut seen = HashSet::with_capacity(names.len());
        let columns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                if !seen.insert(name) {
                    return Err(Error::DuplicateColumn(name.to_string()));
                }
                self.columns
                    .get_key_value(name)
                    .map(|(key, column)| (key.clone(), Arc::clone(column)))
                    .ok_or_else(|| Error::ColumnMissing(name.to_string()))
            })
            .try_collect()?;
        Ok(Table {
            height: self.height,
            columns,
        })
    }
}

/// Builds a [`Table`] column by column; every column must have `height` values.
#[derive(Debug)]
pub struct TableBuilder {
    height: usize,
    columns: Vec<Column>,
}

impl TableBuilder {
    pub fn new(height: usize) -> Self {
        Self {
            height,
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_column(
        mut self,
        name: impl Into<ArcStr>,
        value_type: ValueType,
        values: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.columns.push(Column {
            name: name.into(),
            value_type,
            role: None,
            values: values.into_iter().collect(),
        });
        self
    }

    /// Adds a column whose values are produced by `generator` for each row index.
    #[must_use]
    pub fn add_generated<V: Into<Value>>(
        self,
        name: impl Into<ArcStr>,
        value_type: ValueType,
        generator: impl Fn(usize) -> V,
    ) -> Self {
        let height = self.height;
        self.add_column(name, value_type, (0..height).map(|i| generator(i).into()))
    }

    /// Assigns `role` to the column added last under `name`. Unknown names are ignored.
    #[must_use]
    pub fn with_role(mut self, name: &str, role: ColumnRole) -> Self {
        if let Some(column) = self.columns.iter_mut().rev().find(|c| c.name() == name) {
            column.role = Some(role);
        }
        self
    }

    pub fn build(self) -> Result<Table> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if !seen.insert(column.name.clone()) {
                return Err(Error::DuplicateColumn(column.name.to_string()));
            }
            if column.len() != self.height {
                return Err(Error::LengthMismatch {
                    name: column.name.to_string(),
                    expected: self.height,
                    actual: column.len(),
                });
            }
            if let Some(value) = column.values.iter().find(|v| !column.value_type.accepts(v)) {
                return Err(Error::InvalidValue {
                    name: column.name.to_string(),
                    value_type: column.value_type,
                    value: value.clone(),
                });
            }
        }
        Ok(Table {
            height: self.height,
            columns: self
                .columns
                .into_iter()
                .map(|column| (column.name.clone(), Arc::new(column)))
                .collect(),
        })
    }
}
