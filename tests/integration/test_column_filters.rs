// Copyright © 2024 Pathway

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;

use metaprop_engine::engine::{
    ConcurrencyContext, Error, RayonContext, ScanConfig, SequentialContext, Table, TableBuilder,
    Value, ValueType,
};
use metaprop_engine::filter::missing::scan_missing_values;
use metaprop_engine::filter::{
    apply_filter, ColumnFilter, FilterKind, ScanContext, SpecialFilterStrategy,
    SubsetSelectorConfig, TableSubsetSelector,
};

use super::helpers::{create_metadata, create_table, labels, names, MockOperator};

const WIDE_TABLE_WIDTH: usize = 37;

/// Every third column has a single missing cell.
fn create_wide_table() -> Table {
    let mut builder = TableBuilder::new(5);
    for index in 0..WIDE_TABLE_WIDTH {
        builder = builder.add_generated(format!("c{index}"), ValueType::Integer, move |row| {
            if index % 3 == 0 && row == 4 {
                None
            } else {
                Some(row as i64)
            }
        });
    }
    builder.build().expect("wide table should build")
}

fn expected_missing_flags() -> Vec<bool> {
    (0..WIDE_TABLE_WIDTH).map(|index| index % 3 == 0).collect()
}

fn no_missing_values() -> SubsetSelectorConfig {
    SubsetSelectorConfig::new(FilterKind::NoMissingValues)
}

#[test]
fn test_scan_without_collaborators() -> eyre::Result<()> {
    let flags = scan_missing_values(&create_wide_table(), &ScanContext::default())?;
    assert_eq!(flags, expected_missing_flags());
    Ok(())
}

#[test]
fn test_scan_results_do_not_depend_on_chunking() -> eyre::Result<()> {
    let table = create_wide_table();
    let contexts: Vec<Box<dyn ConcurrencyContext>> = vec![
        Box::new(SequentialContext::new(1)),
        Box::new(SequentialContext::new(5)),
        Box::new(SequentialContext::new(100)),
        Box::new(RayonContext::new(&ScanConfig {
            chunk_size: 2,
            threads: Some(4),
        })?),
        Box::new(RayonContext::new(&ScanConfig::default())?),
    ];
    for concurrency in &contexts {
        let scan = ScanContext {
            concurrency: Some(concurrency.as_ref()),
            operator: None,
        };
        assert_eq!(scan_missing_values(&table, &scan)?, expected_missing_flags());
    }
    Ok(())
}

#[test]
fn test_selector_with_rayon_pool() -> eyre::Result<()> {
    let table = create_table();
    let sequential = TableSubsetSelector::new(no_missing_values()).get_subset(&table)?;
    let parallel = TableSubsetSelector::new(no_missing_values())
        .with_concurrency(Arc::new(RayonContext::new(&ScanConfig {
            chunk_size: 3,
            threads: Some(3),
        })?))
        .get_subset(&table)?;
    assert_eq!(sequential, parallel);
    Ok(())
}

#[test]
fn test_scan_of_empty_table() -> eyre::Result<()> {
    let table = TableBuilder::new(3).build()?;
    assert!(scan_missing_values(&table, &ScanContext::default())?.is_empty());

    let subset = TableSubsetSelector::new(no_missing_values()).get_subset(&table)?;
    assert_eq!(subset.width(), 0);
    Ok(())
}

#[test]
fn test_nan_counts_as_missing() -> eyre::Result<()> {
    let table = TableBuilder::new(2)
        .add_column("nan", ValueType::Real, [Value::from(1.0_f64), Value::from(f64::NAN)])
        .add_column("finite", ValueType::Real, [Value::from(1.0_f64), Value::from(2.0_f64)])
        .build()?;
    let subset = TableSubsetSelector::new(no_missing_values()).get_subset(&table)?;
    assert_eq!(labels(&subset), names(&["finite"]));
    Ok(())
}

#[test]
fn test_stop_before_scan() {
    let mut operator = MockOperator::new();
    operator
        .expect_check_for_stop()
        .times(1)
        .returning(|| Err(Error::ProcessStopped));
    operator.expect_report_progress().never();

    let selector = TableSubsetSelector::new(no_missing_values()).with_operator(Arc::new(operator));
    assert_matches!(
        selector.get_subset(&create_table()),
        Err(Error::ProcessStopped)
    );
}

#[test]
fn test_stop_during_scan() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut operator = MockOperator::new();
    operator.expect_check_for_stop().returning({
        let calls = calls.clone();
        move || {
            if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                Ok(())
            } else {
                Err(Error::ProcessStopped)
            }
        }
    });
    operator.expect_report_progress().return_const(());

    let scan_operator = Arc::new(operator);
    let concurrency = SequentialContext::new(4);
    let scan = ScanContext {
        concurrency: Some(&concurrency),
        operator: Some(scan_operator.as_ref()),
    };
    assert_matches!(
        scan_missing_values(&create_wide_table(), &scan),
        Err(Error::ProcessStopped)
    );
    assert!(calls.load(Ordering::SeqCst) > 3);
}

#[test]
fn test_stop_is_reported_from_parallel_chunks() -> eyre::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut operator = MockOperator::new();
    operator.expect_check_for_stop().returning({
        let calls = calls.clone();
        move || {
            if calls.fetch_add(1, Ordering::SeqCst) == 5 {
                Err(Error::ProcessStopped)
            } else {
                Ok(())
            }
        }
    });
    operator.expect_report_progress().return_const(());

    let selector = TableSubsetSelector::new(no_missing_values())
        .with_operator(Arc::new(operator))
        .with_concurrency(Arc::new(RayonContext::new(&ScanConfig {
            chunk_size: 1,
            threads: Some(4),
        })?));
    assert_matches!(
        selector.get_subset(&create_wide_table()),
        Err(Error::ProcessStopped)
    );
    Ok(())
}

#[test]
fn test_progress_reaches_table_width() -> eyre::Result<()> {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let mut operator = MockOperator::new();
    operator.expect_check_for_stop().returning(|| Ok(()));
    operator.expect_report_progress().returning({
        let reported = reported.clone();
        move |completed, total| {
            reported.lock().unwrap().push((completed, total));
        }
    });

    let concurrency = SequentialContext::new(10);
    let scan = ScanContext {
        concurrency: Some(&concurrency),
        operator: Some(&operator),
    };
    scan_missing_values(&create_wide_table(), &scan)?;

    let reported = reported.lock().unwrap();
    assert_eq!(
        *reported,
        vec![
            (10, WIDE_TABLE_WIDTH),
            (20, WIDE_TABLE_WIDTH),
            (30, WIDE_TABLE_WIDTH),
            (WIDE_TABLE_WIDTH, WIDE_TABLE_WIDTH),
        ]
    );
    Ok(())
}

#[test]
fn test_metadata_mode_never_scans() -> eyre::Result<()> {
    let mut operator = MockOperator::new();
    operator.expect_check_for_stop().never();
    operator.expect_report_progress().never();

    let subset = TableSubsetSelector::new(no_missing_values())
        .with_operator(Arc::new(operator))
        .get_metadata_subset(&create_metadata())?;
    assert!(subset.width() > 0);
    Ok(())
}

#[test]
fn test_name_filters_skip_the_scan() -> eyre::Result<()> {
    let mut operator = MockOperator::new();
    operator.expect_check_for_stop().never();

    let filter = FilterKind::Regex {
        pattern: "real.*".to_string(),
    }
    .resolve()?;
    let scan = ScanContext {
        concurrency: None,
        operator: Some(&operator),
    };
    let subset = apply_filter(
        &create_table(),
        &filter,
        SpecialFilterStrategy::RemoveSpecial,
        false,
        &scan,
    )?;
    assert_eq!(labels(&subset), names(&["real", "realMissing"]));
    Ok(())
}

#[test]
fn test_value_type_filter() -> eyre::Result<()> {
    let filter = ColumnFilter::ValueTypes([ValueType::Binominal].into_iter().collect());
    let subset = apply_filter(
        &create_table(),
        &filter,
        SpecialFilterStrategy::FilterSpecial,
        false,
        &ScanContext::default(),
    )?;
    assert_eq!(labels(&subset), names(&["binominal", "binominalMissing"]));
    Ok(())
}

#[test]
fn test_selected_columns_share_data() -> eyre::Result<()> {
    let table = create_table();
    let subset = TableSubsetSelector::new(SubsetSelectorConfig::new(FilterKind::Single {
        column: "real".to_string(),
    }))
    .get_subset(&table)?;
    assert_eq!(subset.height(), table.height());
    assert_eq!(
        subset.column("real").map(|column| column.values().to_vec()),
        table.column("real").map(|column| column.values().to_vec())
    );
    assert!(subset.column("special").is_some());
    Ok(())
}
