// Copyright © 2024 Pathway

use std::ops::{Index, IndexMut};

use arcstr::ArcStr;

use super::port::{Port, PortDirection, PortId};

/// The ordered ports of one side of one operator. Positions are stable for the lifetime
/// of a graph configuration.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct PortSet {
    operator: ArcStr,
    direction: PortDirection,
    ports: Vec<Port>,
}

impl PortSet {
    pub fn new(operator: impl Into<ArcStr>, direction: PortDirection) -> Self {
        Self {
            operator: operator.into(),
            direction,
            ports: Vec::new(),
        }
    }

    pub fn with_ports<S: AsRef<str>>(
        operator: impl Into<ArcStr>,
        direction: PortDirection,
        names: &[S],
    ) -> Self {
        let mut ports = Self::new(operator, direction);
        for name in names {
            ports.create_port(name.as_ref());
        }
        ports
    }

    /// Appends a port and returns its index.
    pub fn create_port(&mut self, name: &str) -> usize {
        let id = PortId::new(self.operator.clone(), self.direction, name);
        self.ports.push(Port::new(id));
        self.ports.len() - 1
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Port> {
        self.ports.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Port> {
        self.ports.get_mut(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.ports.iter().position(|port| port.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.ports.iter_mut()
    }

    pub fn clear(&mut self) {
        self.ports.iter_mut().for_each(Port::clear);
    }
}

impl Index<usize> for PortSet {
    type Output = Port;

    fn index(&self, index: usize) -> &Port {
        &self.ports[index]
    }
}

impl IndexMut<usize> for PortSet {
    fn index_mut(&mut self, index: usize) -> &mut Port {
        &mut self.ports[index]
    }
}
