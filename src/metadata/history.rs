// Copyright © 2024 Pathway

use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::ports::PortId;

/// Output ports a piece of metadata passed through, oldest first.
///
/// Appending returns a new history sharing its prefix with the old one, so sibling
/// branches of a fan-out never observe each other's entries.
#[derive(Clone, Default)]
pub struct History(Option<Arc<Node>>);

struct Node {
    port: PortId,
    previous: History,
    len: usize,
}

impl History {
    pub fn new() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn appended(&self, port: PortId) -> Self {
        Self(Some(Arc::new(Node {
            port,
            previous: self.clone(),
            len: self.len() + 1,
        })))
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |node| node.len)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn last(&self) -> Option<&PortId> {
        self.0.as_ref().map(|node| &node.port)
    }

    pub fn contains(&self, port: &PortId) -> bool {
        self.iter_newest_first().any(|p| p == port)
    }

    fn iter_newest_first(&self) -> impl Iterator<Item = &PortId> {
        let mut current = self.0.as_deref();
        std::iter::from_fn(move || {
            let node = current?;
            current = node.previous.0.as_deref();
            Some(&node.port)
        })
    }

    pub fn to_vec(&self) -> Vec<PortId> {
        let mut ports: Vec<PortId> = self.iter_newest_first().cloned().collect();
        ports.reverse();
        ports
    }
}

impl PartialEq for History {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter_newest_first().eq(other.iter_newest_first())
    }
}

impl Eq for History {}

impl Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

impl FromIterator<PortId> for History {
    fn from_iter<I: IntoIterator<Item = PortId>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |history, port| history.appended(port))
    }
}
