// Copyright © 2024 Pathway

pub mod error;
pub use self::error::{Error, Result};

pub mod value;
pub use self::value::{Value, ValueType};

pub mod table;
pub use table::{Column, ColumnRole, Table, TableBuilder};

pub mod operator;
pub use operator::OperatorContext;

pub mod concurrency;
pub use concurrency::{ConcurrencyContext, RayonContext, ScanConfig, SequentialContext};

pub mod graph;
pub use graph::{OperatorGraph, OperatorHandle, OperatorState};
