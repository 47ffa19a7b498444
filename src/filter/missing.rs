// Copyright © 2024 Pathway

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use log::debug;

use super::ScanContext;
use crate::engine::operator::{check_for_stop, report_progress};
use crate::engine::{Error, Result, Table};

/// Scans every column of `table` for missing values, chunk by chunk over the columns.
///
/// Returns one flag per column, in column order. Chunks produce partial results that are
/// merged once all of them completed. A stop request seen by any chunk fails the whole
/// scan.
pub fn scan_missing_values(table: &Table, scan: &ScanContext<'_>) -> Result<Vec<bool>> {
    let width = table.width();
    check_for_stop(scan.operator)?;

    let partials: Mutex<Vec<Vec<(usize, bool)>>> = Mutex::new(Vec::new());
    let failure: Mutex<Option<Error>> = Mutex::new(None);
    let completed = AtomicUsize::new(0);

    let action = |chunk: Range<usize>| {
        if let Err(error) = check_for_stop(scan.operator) {
            failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get_or_insert(error);
            return;
        }
        let chunk_len = chunk.len();
        let partial: Vec<(usize, bool)> = chunk
            .filter_map(|index| table.column_by_index(index).map(|c| (index, c)))
            .map(|(index, column)| (index, column.contains_missing_values()))
            .collect();
        partials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(partial);
        let done = completed.fetch_add(chunk_len, Ordering::Relaxed) + chunk_len;
        report_progress(scan.operator, done, width);
    };
    scan.run_chunks(0..width, &action);

    if let Some(error) = failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
        debug!("Missing value scan interrupted: {error}");
        return Err(error);
    }

    let mut contains_missing = vec![false; width];
    for (index, flag) in partials
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .into_iter()
        .flatten()
    {
        contains_missing[index] = flag;
    }
    Ok(contains_missing)
}
