//! # Identifier Registry
//!
//! A ledger of assigned identifiers and their running maximum.
//!
//! One registry exists per identifier namespace. The namespaces are kept apart
//! at the type level: an `IdRegistry<NodeId>` cannot accept a `LinkId`.

use crate::primitives::EMPTY_LEDGER_MAX;
use crate::{HydronetError, LinkId, NodeId};
use std::collections::BTreeSet;

/// An identifier type that can be tracked by an [`IdRegistry`].
pub trait RegistryId: Copy + Ord {
    fn from_raw(raw: u32) -> Self;
    fn raw(self) -> u32;
}

impl RegistryId for NodeId {
    fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    fn raw(self) -> u32 {
        self.0
    }
}

impl RegistryId for LinkId {
    fn from_raw(raw: u32) -> Self {
        LinkId(raw)
    }

    fn raw(self) -> u32 {
        self.0
    }
}

/// Tracks assigned identifiers and issues the next free one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRegistry<I> {
    ids: BTreeSet<I>,
    max: u32,
}

impl<I: RegistryId> Default for IdRegistry<I> {
    fn default() -> Self {
        Self {
            ids: BTreeSet::new(),
            max: EMPTY_LEDGER_MAX,
        }
    }
}

impl<I: RegistryId> IdRegistry<I> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier one above the running maximum.
    ///
    /// This does not register the identifier.
    pub fn new_id(&self) -> Result<I, HydronetError> {
        self.max
            .checked_add(1)
            .map(I::from_raw)
            .ok_or(HydronetError::IdSpaceExhausted(self.max))
    }

    /// Register an identifier and raise the running maximum if needed.
    pub fn add(&mut self, id: I) {
        self.ids.insert(id);
        self.max = self.max.max(id.raw());
    }

    #[must_use]
    pub fn contains(&self, id: I) -> bool {
        self.ids.contains(&id)
    }

    /// The running maximum (0 for an empty registry).
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Registered identifiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = I> + '_ {
        self.ids.iter().copied()
    }
}

impl<I: RegistryId> FromIterator<I> for IdRegistry<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        let mut registry = Self::new();
        for id in iter {
            registry.add(id);
        }
        registry
    }
}

// =============================================================================
// TESTS
// =============================================================================
