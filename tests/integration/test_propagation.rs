// Copyright © 2024 Pathway

use assert_matches::assert_matches;

use metaprop_engine::engine::{Error, ValueType};
use metaprop_engine::filter::{
    FilterKind, SpecialFilterStrategy, SubsetSelectorConfig, TableSubsetSelector,
};
use metaprop_engine::metadata::{ColumnMetaData, MetaDataInfo, RowCount, TableMetaData};
use metaprop_engine::ports::{
    pass_through, GenerateNewMetaDataRule, ManyToManyPassThroughRule, PassThroughRule, PortDirection,
    PortSet, PropagationRule, SubsetPassThroughRule,
};

use super::helpers::{create_metadata, labels, names, simple_metadata};

fn port_names(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|index| format!("{prefix}{index}")).collect()
}

/// An operator's port sets where input `i` carries a single column `col{i}`.
fn create_ports(input_count: usize, output_count: usize) -> (PortSet, PortSet) {
    let mut inputs = PortSet::with_ports("op", PortDirection::In, &port_names("in", input_count));
    let outputs = PortSet::with_ports("op", PortDirection::Out, &port_names("out", output_count));
    for (index, port) in inputs.iter_mut().enumerate() {
        port.deliver(Some(simple_metadata(&[format!("col{index}").as_str()])));
    }
    (inputs, outputs)
}

fn add_column(name: &'static str) -> impl Fn(TableMetaData) -> TableMetaData {
    move |mut metadata| {
        metadata
            .add_column(ColumnMetaData::new(name, ValueType::Integer))
            .expect("column should be new");
        metadata
    }
}

#[test]
fn test_many_to_many_pairs_ports_by_index() {
    for input_count in 0..=3 {
        for output_count in 0..=3 {
            let (inputs, mut outputs) = create_ports(input_count, output_count);
            ManyToManyPassThroughRule::new().transform(&inputs, &mut outputs);

            for (index, port) in outputs.iter().enumerate() {
                if index < input_count {
                    let metadata = port.metadata().unwrap();
                    assert_eq!(labels(metadata), vec![format!("col{index}")]);
                } else {
                    assert!(!port.is_delivered(), "{input_count} -> {output_count}");
                }
            }
            for (index, port) in inputs.iter().enumerate() {
                assert_eq!(
                    labels(port.metadata().unwrap()),
                    vec![format!("col{index}")],
                    "inputs are left alone"
                );
            }
        }
    }
}

#[test]
fn test_absent_metadata_is_delivered_as_absent() {
    let mut inputs = PortSet::with_ports("op", PortDirection::In, &["a", "b"]);
    let mut outputs = PortSet::with_ports("op", PortDirection::Out, &["a", "b"]);
    inputs[0].deliver(None);
    inputs[1].deliver(Some(simple_metadata(&["x"])));

    ManyToManyPassThroughRule::new().transform(&inputs, &mut outputs);

    assert!(outputs[0].is_delivered());
    assert!(outputs[0].metadata().is_none());
    assert!(outputs[1].metadata().is_some());
}

#[test]
fn test_pass_through_appends_output_to_history() {
    let (inputs, mut outputs) = create_ports(1, 1);
    pass_through(&inputs[0], &mut outputs[0], Some);

    let history = outputs[0].metadata().unwrap().history();
    assert_eq!(history.last(), Some(outputs[0].id()));
    assert_eq!(history.len(), 1);
    assert!(inputs[0].metadata().unwrap().history().is_empty());
}

#[test]
fn test_pass_through_modifier_may_drop_metadata() {
    let (inputs, mut outputs) = create_ports(1, 1);
    pass_through(&inputs[0], &mut outputs[0], |_| None);
    assert!(outputs[0].is_delivered());
    assert!(outputs[0].metadata().is_none());
}

#[test]
fn test_modifier_works_on_a_copy() {
    let (inputs, mut outputs) = create_ports(2, 2);
    ManyToManyPassThroughRule::with_modifier(add_column("generated")).transform(&inputs, &mut outputs);

    for (index, port) in outputs.iter().enumerate() {
        assert_eq!(
            labels(port.metadata().unwrap()),
            vec![format!("col{index}"), "generated".to_string()]
        );
    }
    for port in inputs.iter() {
        assert!(port.metadata().unwrap().column("generated").is_none());
    }
}

#[test]
fn test_single_pass_through() {
    let (inputs, mut outputs) = create_ports(2, 2);
    PassThroughRule::new(1, 0)
        .with_modifier(|mut metadata| {
            metadata.set_row_count(RowCount::AtMost(10));
            metadata
        })
        .transform(&inputs, &mut outputs);

    let metadata = outputs[0].metadata().unwrap();
    assert_eq!(labels(metadata), names(&["col1"]));
    assert_eq!(metadata.row_count(), RowCount::AtMost(10));
    assert!(!outputs[1].is_delivered());
}

#[test]
fn test_pass_through_of_absent_input() {
    let inputs = PortSet::with_ports("op", PortDirection::In, &["in"]);
    let mut outputs = PortSet::with_ports("op", PortDirection::Out, &["out"]);
    PassThroughRule::new(0, 0).transform(&inputs, &mut outputs);
    assert!(outputs[0].is_delivered());
    assert!(outputs[0].metadata().is_none());
    assert!(outputs[0].error().is_none());
}

#[test]
fn test_rule_with_unknown_ports_does_nothing() {
    let (inputs, mut outputs) = create_ports(1, 1);
    PassThroughRule::new(3, 0).transform(&inputs, &mut outputs);
    PassThroughRule::new(0, 3).transform(&inputs, &mut outputs);
    GenerateNewMetaDataRule::new(5, simple_metadata(&["x"])).transform(&inputs, &mut outputs);
    assert!(!outputs[0].is_delivered());
}

#[test]
fn test_generated_metadata() {
    let inputs = PortSet::new("reader", PortDirection::In);
    let mut outputs = PortSet::with_ports("reader", PortDirection::Out, &["out"]);
    let rule = GenerateNewMetaDataRule::new(0, create_metadata());

    rule.transform(&inputs, &mut outputs);
    let first = outputs[0].metadata().cloned().unwrap();
    assert_eq!(labels(&first), labels(&create_metadata()));
    assert_eq!(first.history().to_vec(), vec![outputs[0].id().clone()]);

    rule.transform(&inputs, &mut outputs);
    assert_eq!(
        outputs[0].metadata().unwrap().history().len(),
        1,
        "every run starts from the stored metadata"
    );
}

#[test]
fn test_subset_pass_through() {
    let mut inputs = PortSet::with_ports("select", PortDirection::In, &["in"]);
    let mut outputs = PortSet::with_ports("select", PortDirection::Out, &["out"]);
    inputs[0].deliver(Some(create_metadata()));

    let selector = TableSubsetSelector::new(
        SubsetSelectorConfig::new(FilterKind::NoMissingValues)
            .with_special_strategy(SpecialFilterStrategy::RemoveSpecial),
    );
    let rule = SubsetPassThroughRule::new(0, 0, selector);
    rule.transform(&inputs, &mut outputs);

    let metadata = outputs[0].metadata().unwrap();
    assert_eq!(
        labels(metadata),
        names(&["real", "integer", "time", "datetime", "binominal", "nonBinominal"])
    );
    assert!(metadata
        .iter_columns()
        .all(|column| column.has_missing_values() == MetaDataInfo::No));
    assert_eq!(metadata.history().last(), Some(outputs[0].id()));
    assert_eq!(rule.selector().config().filter, FilterKind::NoMissingValues);
}

#[test]
fn test_subset_pass_through_with_invalid_configuration() {
    let mut inputs = PortSet::with_ports("select", PortDirection::In, &["in"]);
    let mut outputs = PortSet::with_ports("select", PortDirection::Out, &["out"]);
    inputs[0].deliver(Some(create_metadata()));

    let selector = TableSubsetSelector::new(SubsetSelectorConfig::new(FilterKind::Regex {
        pattern: "(".to_string(),
    }));
    SubsetPassThroughRule::new(0, 0, selector).transform(&inputs, &mut outputs);

    assert!(outputs[0].is_delivered());
    assert!(outputs[0].metadata().is_none());
    assert_matches!(outputs[0].error(), Some(Error::InvalidRegex { .. }));

    inputs[0].deliver(None);
    SubsetPassThroughRule::new(0, 0, TableSubsetSelector::default()).transform(&inputs, &mut outputs);
    assert!(outputs[0].is_delivered());
    assert!(outputs[0].error().is_none());

    outputs[0].fail(Error::ProcessStopped);
    outputs[0].clear();
    assert!(!outputs[0].is_delivered());
    assert!(outputs[0].error().is_none());
}

#[test]
fn test_port_set_lookup() {
    let mut ports = PortSet::new("op", PortDirection::Out);
    assert!(ports.is_empty());
    assert_eq!(ports.create_port("first"), 0);
    assert_eq!(ports.create_port("second"), 1);
    assert_eq!(ports.index_of("second"), Some(1));
    assert_eq!(ports.index_of("third"), None);
    assert_eq!(ports[1].id().to_string(), "op.second");
    assert_eq!(ports.direction(), PortDirection::Out);

    ports[0].deliver(Some(TableMetaData::new()));
    assert!(ports[0].is_delivered());
    ports.clear();
    assert!(!ports[0].is_delivered());
    assert_eq!(ports.len(), 2);
}
