// Copyright © 2024 Pathway

use std::fmt::{self, Display};
use std::sync::Arc;

use arcstr::ArcStr;
use log::trace;

use crate::engine::Error;
use crate::metadata::TableMetaData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    In,
    Out,
}

impl PortDirection {
    pub fn name(self) -> &'static str {
        match self {
            Self::In => "input",
            Self::Out => "output",
        }
    }
}

/// Identifies a port by its operator, side and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortId {
    pub operator: ArcStr,
    pub direction: PortDirection,
    pub name: ArcStr,
}

impl PortId {
    pub fn new(operator: impl Into<ArcStr>, direction: PortDirection, name: impl Into<ArcStr>) -> Self {
        Self {
            operator: operator.into(),
            direction,
            name: name.into(),
        }
    }
}

impl Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.operator, self.name)
    }
}

/// A named slot holding the metadata it last received (inputs) or produced (outputs).
///
/// `delivered` separates "nothing arrived yet" from an explicit delivery of absent
/// metadata. An output whose metadata could not be computed keeps the error next to
/// its absent metadata until the next delivery.
#[derive(Debug, Clone)]
pub struct Port {
    id: PortId,
    metadata: Option<TableMetaData>,
    delivered: bool,
    error: Option<Arc<Error>>,
}

impl Port {
    pub fn new(id: PortId) -> Self {
        Self {
            id,
            metadata: None,
            delivered: false,
            error: None,
        }
    }

    pub fn id(&self) -> &PortId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn direction(&self) -> PortDirection {
        self.id.direction
    }

    pub fn metadata(&self) -> Option<&TableMetaData> {
        self.metadata.as_ref()
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    pub fn deliver(&mut self, metadata: Option<TableMetaData>) {
        trace!(
            "{} <- {}",
            self.id,
            if metadata.is_some() { "metadata" } else { "no metadata" }
        );
        self.metadata = metadata;
        self.delivered = true;
        self.error = None;
    }

    /// Delivers absent metadata and records why it is absent.
    pub fn fail(&mut self, error: Error) {
        trace!("{} <- error: {error}", self.id);
        self.metadata = None;
        self.delivered = true;
        self.error = Some(Arc::new(error));
    }

    /// The error recorded by the last delivery, if it failed.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_deref()
    }

    /// Forgets the last delivery.
    pub fn clear(&mut self) {
        self.metadata = None;
        self.delivered = false;
        self.error = None;
    }
}
