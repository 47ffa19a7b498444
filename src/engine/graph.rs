// Copyright © 2024 Pathway

use std::collections::{HashMap, VecDeque};
use std::fmt;

use arcstr::ArcStr;
use id_arena::{Arena, ArenaBehavior};
use log::{debug, error};

use super::error::{Error, Result};
use crate::metadata::TableMetaData;
use crate::ports::{PortDirection, PortId, PortSet, PropagationRule};

macro_rules! define_handle {
    ($handle:ident) => {
        #[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
        pub struct $handle {
            arena_id: u32,
            index: u32,
        }

        impl ArenaBehavior for $handle {
            type Id = Self;

            fn new_id(arena_id: u32, index: usize) -> Self {
                let index = index.try_into().expect("arena index should fit in u32");
                Self { arena_id, index }
            }

            fn arena_id(handle: Self) -> u32 {
                handle.arena_id
            }

            fn index(handle: Self) -> usize {
                handle.index as usize
            }
        }
    };
}

define_handle!(OperatorHandle);

/// Where an operator stands in the current propagation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorState {
    /// Waiting for its required inputs.
    Pending,
    /// All required inputs delivered, rules not run yet.
    Ready,
    /// Rules ran, outputs delivered.
    Propagated,
    /// Own configuration or something upstream changed since the last run.
    Stale,
}

struct Operator {
    name: ArcStr,
    inputs: PortSet,
    outputs: PortSet,
    rules: Vec<Box<dyn PropagationRule>>,
    required_inputs: Vec<usize>,
    state: OperatorState,
}

impl Operator {
    fn reset(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
        self.state = OperatorState::Pending;
    }

    fn is_ready(&self) -> bool {
        self.required_inputs
            .iter()
            .all(|&index| self.inputs.get(index).is_some_and(|port| port.is_delivered()))
    }

    fn run_rules(&mut self) {
        let Self {
            inputs,
            outputs,
            rules,
            ..
        } = self;
        for rule in rules.iter() {
            rule.transform(inputs, outputs);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PortRef {
    operator: OperatorHandle,
    index: usize,
}

/// Operators connected output-to-input. Metadata is propagated in topological order;
/// any change invalidates the changed operator and everything downstream of it.
///
/// The graph is not synchronized; callers serialize changes and propagation.
pub struct OperatorGraph {
    operators: Arena<Operator, OperatorHandle>,
    // input -> the output feeding it
    connections: HashMap<PortRef, PortRef>,
    needs_propagation: bool,
}

impl fmt::Debug for OperatorGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorGraph")
            .field("operators", &self.operators.len())
            .field("connections", &self.connections.len())
            .field("needs_propagation", &self.needs_propagation)
            .finish()
    }
}

impl Default for OperatorGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorGraph {
    pub fn new() -> Self {
        Self {
            operators: Arena::new(),
            connections: HashMap::new(),
            needs_propagation: false,
        }
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.len() == 0
    }

    pub fn needs_propagation(&self) -> bool {
        self.needs_propagation
    }

    /// Adds an operator with the given port names. All inputs are required until
    /// [`OperatorGraph::set_required_inputs`] says otherwise.
    pub fn add_operator(
        &mut self,
        name: &str,
        input_names: &[&str],
        output_names: &[&str],
    ) -> OperatorHandle {
        let name = ArcStr::from(name);
        let inputs = PortSet::with_ports(name.clone(), PortDirection::In, input_names);
        let outputs = PortSet::with_ports(name.clone(), PortDirection::Out, output_names);
        let required_inputs = (0..inputs.len()).collect();
        self.needs_propagation = true;
        self.operators.alloc(Operator {
            name,
            inputs,
            outputs,
            rules: Vec::new(),
            required_inputs,
            state: OperatorState::Pending,
        })
    }

    fn operator(&self, handle: OperatorHandle) -> Result<&Operator> {
        self.operators
            .get(handle)
            .ok_or(Error::InvalidOperatorHandle)
    }

    fn operator_mut(&mut self, handle: OperatorHandle) -> Result<&mut Operator> {
        self.operators
            .get_mut(handle)
            .ok_or(Error::InvalidOperatorHandle)
    }

    fn check_port(
        &self,
        handle: OperatorHandle,
        direction: PortDirection,
        index: usize,
    ) -> Result<()> {
        let operator = self.operator(handle)?;
        let ports = match direction {
            PortDirection::In => &operator.inputs,
            PortDirection::Out => &operator.outputs,
        };
        if index < ports.len() {
            Ok(())
        } else {
            Err(Error::InvalidPortIndex {
                operator: operator.name.to_string(),
                direction: direction.name(),
                index,
            })
        }
    }

    pub fn operator_name(&self, handle: OperatorHandle) -> Result<&str> {
        Ok(&self.operator(handle)?.name)
    }

    pub fn state(&self, handle: OperatorHandle) -> Result<OperatorState> {
        Ok(self.operator(handle)?.state)
    }

    pub fn inputs(&self, handle: OperatorHandle) -> Result<&PortSet> {
        Ok(&self.operator(handle)?.inputs)
    }

    pub fn outputs(&self, handle: OperatorHandle) -> Result<&PortSet> {
        Ok(&self.operator(handle)?.outputs)
    }

    pub fn input_metadata(
        &self,
        handle: OperatorHandle,
        index: usize,
    ) -> Result<Option<&TableMetaData>> {
        self.check_port(handle, PortDirection::In, index)?;
        Ok(self.operator(handle)?.inputs[index].metadata())
    }

    pub fn output_metadata(
        &self,
        handle: OperatorHandle,
        index: usize,
    ) -> Result<Option<&TableMetaData>> {
        self.check_port(handle, PortDirection::Out, index)?;
        Ok(self.operator(handle)?.outputs[index].metadata())
    }

    /// Why the output carries no metadata, if a rule failed to compute it.
    pub fn output_error(&self, handle: OperatorHandle, index: usize) -> Result<Option<&Error>> {
        self.check_port(handle, PortDirection::Out, index)?;
        Ok(self.operator(handle)?.outputs[index].error())
    }

    /// Every output whose metadata could not be computed in the last pass.
    pub fn errors(&self) -> Vec<(&PortId, &Error)> {
        self.operators
            .iter()
            .flat_map(|(_, operator)| operator.outputs.iter())
            .filter_map(|port| port.error().map(|error| (port.id(), error)))
            .collect()
    }

    /// Registers a rule; rules run in registration order.
    pub fn add_rule(
        &mut self,
        handle: OperatorHandle,
        rule: impl PropagationRule + 'static,
    ) -> Result<()> {
        self.operator_mut(handle)?.rules.push(Box::new(rule));
        self.invalidate(handle)
    }

    /// Replaces the operator's rules, e.g. after its parameters changed.
    pub fn configure(
        &mut self,
        handle: OperatorHandle,
        rules: Vec<Box<dyn PropagationRule>>,
    ) -> Result<()> {
        self.operator_mut(handle)?.rules = rules;
        self.invalidate(handle)
    }

    pub fn set_required_inputs(&mut self, handle: OperatorHandle, indices: &[usize]) -> Result<()> {
        for &index in indices {
            self.check_port(handle, PortDirection::In, index)?;
        }
        self.operator_mut(handle)?.required_inputs = indices.to_vec();
        self.invalidate(handle)
    }

    /// Connects an output to an input. An input takes at most one connection, an output
    /// may feed any number of inputs. Connections closing a cycle are refused.
    pub fn connect(
        &mut self,
        from: OperatorHandle,
        output: usize,
        to: OperatorHandle,
        input: usize,
    ) -> Result<()> {
        self.check_port(from, PortDirection::Out, output)?;
        self.check_port(to, PortDirection::In, input)?;
        let input_ref = PortRef {
            operator: to,
            index: input,
        };
        if self.connections.contains_key(&input_ref) {
            return Err(Error::InputAlreadyConnected(
                self.operator(to)?.inputs[input].id().clone(),
            ));
        }
        if from == to || self.downstream_of(to).contains(&from) {
            return Err(Error::CycleDetected);
        }
        self.connections.insert(
            input_ref,
            PortRef {
                operator: from,
                index: output,
            },
        );
        self.invalidate(to)
    }

    /// Removes the connection feeding an input. Returns whether there was one.
    pub fn disconnect(&mut self, to: OperatorHandle, input: usize) -> Result<bool> {
        self.check_port(to, PortDirection::In, input)?;
        let removed = self
            .connections
            .remove(&PortRef {
                operator: to,
                index: input,
            })
            .is_some();
        if removed {
            self.invalidate(to)?;
        }
        Ok(removed)
    }

    fn successors(&self, handle: OperatorHandle) -> impl Iterator<Item = OperatorHandle> + '_ {
        self.connections
            .iter()
            .filter(move |(_, from)| from.operator == handle)
            .map(|(to, _)| to.operator)
    }

    /// `handle` and every operator reachable from it.
    fn downstream_of(&self, handle: OperatorHandle) -> Vec<OperatorHandle> {
        let mut visited = vec![handle];
        let mut queue = VecDeque::from([handle]);
        while let Some(current) = queue.pop_front() {
            for next in self.successors(current) {
                if !visited.contains(&next) {
                    visited.push(next);
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Marks `handle` and everything downstream of it as stale.
    pub fn invalidate(&mut self, handle: OperatorHandle) -> Result<()> {
        self.operator(handle)?;
        for affected in self.downstream_of(handle) {
            let operator = self.operator_mut(affected)?;
            if operator.state != OperatorState::Pending {
                debug!("Operator {} is stale", operator.name);
                operator.state = OperatorState::Stale;
            }
        }
        self.needs_propagation = true;
        Ok(())
    }

    fn topological_order(&self) -> Result<Vec<OperatorHandle>> {
        let mut in_degree: HashMap<OperatorHandle, usize> =
            self.operators.iter().map(|(handle, _)| (handle, 0)).collect();
        for to in self.connections.keys() {
            *in_degree.entry(to.operator).or_default() += 1;
        }
        // arena order keeps the result deterministic
        let mut queue: VecDeque<OperatorHandle> = self
            .operators
            .iter()
            .map(|(handle, _)| handle)
            .filter(|handle| in_degree[handle] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.operators.len());
        while let Some(handle) = queue.pop_front() {
            order.push(handle);
            let mut successors: Vec<OperatorHandle> = self.successors(handle).collect();
            successors.sort_by_key(|&successor| <OperatorHandle as ArenaBehavior>::index(successor));
            for successor in successors {
                let degree = in_degree
                    .get_mut(&successor)
                    .ok_or(Error::InvalidOperatorHandle)?;
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(successor);
                }
            }
        }
        if order.len() == self.operators.len() {
            Ok(order)
        } else {
            error!("Operator graph contains a cycle, metadata cannot be propagated");
            Err(Error::CycleDetected)
        }
    }

    /// Propagates metadata through every operator not up to date.
    pub fn propagate(&mut self) -> Result<()> {
        let order = self.topological_order()?;
        for handle in order {
            if self.operator(handle)?.state == OperatorState::Propagated {
                continue;
            }
            let deliveries = self.collect_inputs(handle)?;
            let operator = self.operator_mut(handle)?;
            operator.reset();
            for (index, delivery) in deliveries {
                if let Some(metadata) = delivery {
                    operator.inputs[index].deliver(metadata);
                }
            }
            if !operator.is_ready() {
                debug!("Operator {} is waiting for inputs", operator.name);
                continue;
            }
            operator.state = OperatorState::Ready;
            operator.run_rules();
            operator.state = OperatorState::Propagated;
            debug!("Operator {} propagated", operator.name);
        }
        self.needs_propagation = false;
        Ok(())
    }

    /// Runs [`OperatorGraph::propagate`] only if something changed since the last pass.
    /// Returns whether a pass ran.
    pub fn propagate_if_needed(&mut self) -> Result<bool> {
        if !self.needs_propagation {
            return Ok(false);
        }
        self.propagate()?;
        Ok(true)
    }

    /// For each input: `None` if nothing arrives there, otherwise what its upstream
    /// output holds.
    #[allow(clippy::type_complexity)]
    fn collect_inputs(
        &self,
        handle: OperatorHandle,
    ) -> Result<Vec<(usize, Option<Option<TableMetaData>>)>> {
        let operator = self.operator(handle)?;
        (0..operator.inputs.len())
            .map(|index| {
                let Some(source) = self.connections.get(&PortRef {
                    operator: handle,
                    index,
                }) else {
                    return Ok((index, None));
                };
                let upstream = &self.operator(source.operator)?.outputs[source.index];
                let delivery = upstream
                    .is_delivered()
                    .then(|| upstream.metadata().cloned());
                Ok((index, delivery))
            })
            .collect()
    }
}
