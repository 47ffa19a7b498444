// Copyright © 2024 Pathway

use std::fmt;

use log::warn;

use super::port::Port;
use super::port_set::PortSet;
use crate::filter::TableSubsetSelector;
use crate::metadata::TableMetaData;

pub type Modifier = Box<dyn Fn(TableMetaData) -> TableMetaData>;

/// Computes output metadata of an operator from its input metadata.
///
/// A rule only touches the ports it was built for; several rules registered on one
/// operator may cover disjoint parts of its ports.
pub trait PropagationRule {
    fn transform(&self, inputs: &PortSet, outputs: &mut PortSet);
}

impl fmt::Debug for dyn PropagationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PropagationRule")
    }
}

/// Passes the metadata of `input` to `output`.
///
/// Present metadata is copied, gets `output` appended to its history and is handed to
/// `modify`; `None` from `modify` and absent input metadata are both delivered as absent
/// metadata.
pub fn pass_through(
    input: &Port,
    output: &mut Port,
    modify: impl FnOnce(TableMetaData) -> Option<TableMetaData>,
) {
    let metadata = input
        .metadata()
        .cloned()
        .map(|metadata| metadata.with_history_appended(output.id().clone()))
        .and_then(modify);
    output.deliver(metadata);
}

/// Pairs the `i`-th input with the `i`-th output for every index both sides have.
/// Surplus ports on either side are left alone.
pub struct ManyToManyPassThroughRule {
    modify: Option<Modifier>,
}

impl ManyToManyPassThroughRule {
    pub fn new() -> Self {
        Self { modify: None }
    }

    pub fn with_modifier(modify: impl Fn(TableMetaData) -> TableMetaData + 'static) -> Self {
        Self {
            modify: Some(Box::new(modify)),
        }
    }
}

impl Default for ManyToManyPassThroughRule {
    fn default() -> Self {
        Self::new()
    }
}

impl PropagationRule for ManyToManyPassThroughRule {
    fn transform(&self, inputs: &PortSet, outputs: &mut PortSet) {
        for (input, output) in inputs.iter().zip(outputs.iter_mut()) {
            pass_through(input, output, |metadata| {
                Some(match &self.modify {
                    Some(modify) => modify(metadata),
                    None => metadata,
                })
            });
        }
    }
}

/// Passes one input to one output. Absent input metadata is passed on as absent; use
/// [`OperatorGraph::set_required_inputs`](crate::engine::OperatorGraph::set_required_inputs)
/// to hold the operator back until the input is delivered.
pub struct PassThroughRule {
    input: usize,
    output: usize,
    modify: Option<Modifier>,
}

impl PassThroughRule {
    pub fn new(input: usize, output: usize) -> Self {
        Self {
            input,
            output,
            modify: None,
        }
    }

    #[must_use]
    pub fn with_modifier(
        mut self,
        modify: impl Fn(TableMetaData) -> TableMetaData + 'static,
    ) -> Self {
        self.modify = Some(Box::new(modify));
        self
    }
}

impl PropagationRule for PassThroughRule {
    fn transform(&self, inputs: &PortSet, outputs: &mut PortSet) {
        let (Some(input), Some(output)) = (inputs.get(self.input), outputs.get_mut(self.output))
        else {
            warn!(
                "Pass-through rule refers to ports {} -> {} which do not exist",
                self.input, self.output
            );
            return;
        };
        pass_through(input, output, |metadata| {
            Some(match &self.modify {
                Some(modify) => modify(metadata),
                None => metadata,
            })
        });
    }
}

/// Delivers fixed metadata to one output, e.g. for operators that read data from
/// outside the graph.
pub struct GenerateNewMetaDataRule {
    output: usize,
    metadata: TableMetaData,
}

impl GenerateNewMetaDataRule {
    pub fn new(output: usize, metadata: TableMetaData) -> Self {
        Self { output, metadata }
    }
}

impl PropagationRule for GenerateNewMetaDataRule {
    fn transform(&self, _inputs: &PortSet, outputs: &mut PortSet) {
        let Some(output) = outputs.get_mut(self.output) else {
            warn!("Generate rule refers to output {} which does not exist", self.output);
            return;
        };
        let metadata = self.metadata.clone().with_history_appended(output.id().clone());
        output.deliver(Some(metadata));
    }
}

/// Passes one input to one output, keeping only the columns a subset selector picks.
///
/// A selector configuration error yields absent metadata and is recorded on the output
/// port; the same error is raised again when the selector runs on the actual table.
pub struct SubsetPassThroughRule {
    input: usize,
    output: usize,
    selector: TableSubsetSelector,
}

impl SubsetPassThroughRule {
    pub fn new(input: usize, output: usize, selector: TableSubsetSelector) -> Self {
        Self {
            input,
            output,
            selector,
        }
    }

    pub fn selector(&self) -> &TableSubsetSelector {
        &self.selector
    }
}

impl PropagationRule for SubsetPassThroughRule {
    fn transform(&self, inputs: &PortSet, outputs: &mut PortSet) {
        let (Some(input), Some(output)) = (inputs.get(self.input), outputs.get_mut(self.output))
        else {
            warn!(
                "Subset rule refers to ports {} -> {} which do not exist",
                self.input, self.output
            );
            return;
        };
        let mut failure = None;
        pass_through(input, output, |metadata| {
            match self.selector.get_metadata_subset(&metadata) {
                Ok(subset) => Some(subset),
                Err(error) => {
                    failure = Some(error);
                    None
                }
            }
        });
        if let Some(error) = failure {
            warn!("Cannot compute metadata of {}: {error}", output.id());
            output.fail(error);
        }
    }
}
