// Copyright © 2024 Pathway

pub mod column;
pub use column::{ColumnMetaData, MetaDataInfo};

pub mod history;
pub use history::History;

pub mod table;
pub use table::{RowCount, TableMetaData};
