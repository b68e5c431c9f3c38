//! # Node Catalog
//!
//! Per-kind collections of node records and their attribute tables, plus a
//! shared index from node identifier to the kind that currently owns it.
//!
//! Node identifiers are unique across every kind. Adding a node with an
//! identifier that is already registered is an error; replacing a node is a
//! separate, explicit operation ([`NodeCatalog::replace_node`]) that purges
//! the prior node and all of its attribute records from whichever kind owns
//! it before inserting the new one.
//!
//! Both operations validate every supplied attribute row before touching
//! any state, so a failed call leaves the catalog unchanged.

use crate::registry::IdRegistry;
use crate::rules;
use crate::{
    AttributeRecord, AttributeRow, HydronetError, Node, NodeId, NodeInput, NodeKind, NodeRef,
};
use std::collections::BTreeMap;

/// Nodes of one kind together with that kind's attribute tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KindCollection {
    nodes: BTreeMap<NodeId, Node>,
    tables: BTreeMap<String, Vec<AttributeRecord>>,
}

impl KindCollection {
    /// Nodes of this kind in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Records of one attribute table, ordered by node identifier.
    #[must_use]
    pub fn table(&self, name: &str) -> &[AttributeRecord] {
        self.tables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All non-empty attribute tables of this kind.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &[AttributeRecord])> {
        self.tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    fn purge(&mut self, id: NodeId) -> usize {
        self.nodes.remove(&id);
        let mut removed = 0;
        for rows in self.tables.values_mut() {
            let before = rows.len();
            rows.retain(|record| record.node_id != id);
            removed += before - rows.len();
        }
        self.tables.retain(|_, rows| !rows.is_empty());
        removed
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.tables.is_empty()
    }
}

/// The node catalog of one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeCatalog {
    collections: BTreeMap<NodeKind, KindCollection>,
    index: BTreeMap<NodeId, NodeKind>,
    registry: IdRegistry<NodeId>,
}

impl NodeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new node with its attribute rows.
    ///
    /// The identifier is the caller's, or one above the current maximum.
    /// An identifier that is already registered fails with
    /// `DuplicateNodeId`; use [`NodeCatalog::replace_node`] to replace.
    pub fn add(
        &mut self,
        input: NodeInput,
        rows: Vec<AttributeRow>,
    ) -> Result<NodeRef, HydronetError> {
        let id = match input.id {
            Some(id) => {
                if self.registry.contains(id) {
                    return Err(HydronetError::DuplicateNodeId(id));
                }
                id
            }
            None => self.registry.new_id()?,
        };
        Self::check_id(id)?;
        Self::check_geometry(id, &input)?;
        Self::check_rows(input.kind, &rows)?;

        Ok(self.insert(input.into_node(id), rows))
    }

    /// Replace the node registered under the input's identifier.
    ///
    /// The prior node and every attribute record tagged with its identifier
    /// are removed from the kind that owns it; the new node may be of a
    /// different kind. An unregistered identifier is simply added.
    pub fn replace_node(
        &mut self,
        input: NodeInput,
        rows: Vec<AttributeRow>,
    ) -> Result<NodeRef, HydronetError> {
        let id = input.id.ok_or(HydronetError::MissingNodeId)?;
        Self::check_id(id)?;
        Self::check_geometry(id, &input)?;
        Self::check_rows(input.kind, &rows)?;

        if let Some(previous) = self.index.remove(&id) {
            let purged = self
                .collections
                .get_mut(&previous)
                .map(|collection| collection.purge(id))
                .unwrap_or(0);
            if self
                .collections
                .get(&previous)
                .is_some_and(KindCollection::is_empty)
            {
                self.collections.remove(&previous);
            }
            tracing::warn!(
                node_id = id.0,
                previous = %previous,
                replacement = %input.kind,
                purged_rows = purged,
                "replacing existing node"
            );
        }

        Ok(self.insert(input.into_node(id), rows))
    }

    fn check_id(id: NodeId) -> Result<(), HydronetError> {
        if id.0 == 0 {
            return Err(HydronetError::InvalidNodeId(id));
        }
        Ok(())
    }

    fn check_geometry(id: NodeId, input: &NodeInput) -> Result<(), HydronetError> {
        if !input.geometry.is_finite() {
            return Err(HydronetError::NonFiniteNodeGeometry(id));
        }
        Ok(())
    }

    fn check_rows(kind: NodeKind, rows: &[AttributeRow]) -> Result<(), HydronetError> {
        match rows.iter().find(|row| !rules::has_table(kind, &row.table)) {
            Some(row) => Err(HydronetError::UnknownAttributeTable {
                kind,
                table: row.table.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Insert a validated node. Never fails.
    fn insert(&mut self, node: Node, rows: Vec<AttributeRow>) -> NodeRef {
        let reference = node.node_ref();
        let collection = self.collections.entry(node.kind).or_default();

        for row in rows {
            let records = collection.tables.entry(row.table).or_default();
            insert_record(
                records,
                AttributeRecord {
                    node_id: node.id,
                    fields: row.fields,
                },
            );
        }
        collection.nodes.insert(node.id, node);

        self.index.insert(reference.id, reference.kind);
        self.registry.add(reference.id);
        reference
    }

    /// Rebuild a catalog from persisted nodes and attribute records.
    ///
    /// Fails on duplicate or non-positive identifiers, on records that point
    /// at a missing node, and on tables the owning kind does not have.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        records: impl IntoIterator<Item = (NodeKind, String, AttributeRecord)>,
    ) -> Result<Self, HydronetError> {
        let mut catalog = Self::new();
        for node in nodes {
            Self::check_id(node.id)?;
            if !node.geometry.is_finite() {
                return Err(HydronetError::NonFiniteNodeGeometry(node.id));
            }
            if catalog.index.contains_key(&node.id) {
                return Err(HydronetError::DuplicateNodeId(node.id));
            }
            catalog.insert(node, Vec::new());
        }

        for (kind, table, record) in records {
            if catalog.index.get(&record.node_id) != Some(&kind) {
                return Err(HydronetError::NodeNotFound(record.node_id));
            }
            if !rules::has_table(kind, &table) {
                return Err(HydronetError::UnknownAttributeTable { kind, table });
            }
            let records = catalog
                .collections
                .entry(kind)
                .or_default()
                .tables
                .entry(table)
                .or_default();
            insert_record(records, record);
        }

        Ok(catalog)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let kind = self.index.get(&id)?;
        self.collections.get(kind)?.nodes.get(&id)
    }

    #[must_use]
    pub fn node_ref(&self, id: NodeId) -> Option<NodeRef> {
        self.get(id).map(Node::node_ref)
    }

    #[must_use]
    pub fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.index.get(&id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Every node in identifier order, regardless of kind.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.index
            .iter()
            .filter_map(|(id, kind)| self.collections.get(kind)?.nodes.get(id))
    }

    /// Nodes of one kind in identifier order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.collections
            .get(&kind)
            .into_iter()
            .flat_map(KindCollection::nodes)
    }

    /// The collection of one kind, if any node of it was ever added.
    #[must_use]
    pub fn collection(&self, kind: NodeKind) -> Option<&KindCollection> {
        self.collections.get(&kind)
    }

    /// Records of one attribute table of one kind.
    #[must_use]
    pub fn attribute_records(&self, kind: NodeKind, table: &str) -> &[AttributeRecord] {
        self.collections
            .get(&kind)
            .map(|collection| collection.table(table))
            .unwrap_or(&[])
    }

    /// Every attribute record as `(kind, table, record)`, ordered by kind and table.
    pub fn all_records(&self) -> impl Iterator<Item = (NodeKind, &str, &AttributeRecord)> {
        self.collections.iter().flat_map(|(kind, collection)| {
            collection
                .tables()
                .flat_map(move |(table, rows)| rows.iter().map(move |record| (*kind, table, record)))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn registry(&self) -> &IdRegistry<NodeId> {
        &self.registry
    }
}

/// Keep a table ordered by node identifier. Records of one node stay in
/// the order they were supplied.
fn insert_record(records: &mut Vec<AttributeRecord>, record: AttributeRecord) {
    let at = records.partition_point(|existing| existing.node_id <= record.node_id);
    records.insert(at, record);
}

// =============================================================================
// TESTS
// =============================================================================
