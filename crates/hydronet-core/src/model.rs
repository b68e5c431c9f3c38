//! # Network Model
//!
//! A [`Model`] owns one node catalog and one link table, and with them both
//! identifier registries. Nothing is shared between model instances.
//!
//! Construction goes through the incremental checks of the catalog and the
//! link table. [`Model::validate`] is the whole-model check run before a
//! model is handed to the solver: it re-derives every structural rule from
//! the current state and additionally enforces the minimum degree bounds,
//! which are never checked incrementally.

use crate::catalog::NodeCatalog;
use crate::links::LinkTable;
use crate::rules;
use crate::{
    AttributeRecord, AttributeRow, Direction, HydronetError, Link, LinkInput, LinkKind, Node,
    NodeId, NodeInput, NodeKind, NodeRef,
};
use serde::{Deserialize, Serialize};

/// A hydrological network model under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    nodes: NodeCatalog,
    links: LinkTable,
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a model from an existing catalog and link table.
    #[must_use]
    pub fn from_parts(nodes: NodeCatalog, links: LinkTable) -> Self {
        Self { nodes, links }
    }

    pub fn add_node(
        &mut self,
        input: NodeInput,
        rows: Vec<AttributeRow>,
    ) -> Result<NodeRef, HydronetError> {
        self.nodes.add(input, rows)
    }

    /// Replace the node registered under the input's identifier.
    ///
    /// Links are left as drawn; [`Model::validate`] reports any that no
    /// longer fit the replacement's kind.
    pub fn replace_node(
        &mut self,
        input: NodeInput,
        rows: Vec<AttributeRow>,
    ) -> Result<NodeRef, HydronetError> {
        self.nodes.replace_node(input, rows)
    }

    /// Add a link between two node references.
    ///
    /// Both endpoints are looked up again in the catalog, so the checks see
    /// the kind each node has now rather than the one the reference was
    /// taken with.
    pub fn add_link(
        &mut self,
        from: &NodeRef,
        to: &NodeRef,
        input: LinkInput,
    ) -> Result<&Link, HydronetError> {
        self.connect(from.id, to.id, input)
    }

    /// Add a link between two catalogued nodes.
    pub fn connect(
        &mut self,
        from: NodeId,
        to: NodeId,
        input: LinkInput,
    ) -> Result<&Link, HydronetError> {
        let from = self
            .nodes
            .node_ref(from)
            .ok_or(HydronetError::NodeNotFound(from))?;
        let to = self.nodes.node_ref(to).ok_or(HydronetError::NodeNotFound(to))?;
        self.links.add(&from, &to, input)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn nodes(&self) -> &NodeCatalog {
        &self.nodes
    }

    #[must_use]
    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    /// Check every structural rule against the current state.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut issues = Vec::new();
        self.check_links(&mut issues);
        self.check_degrees(&mut issues);
        ValidationReport { issues }
    }

    fn check_links(&self, issues: &mut Vec<HydronetError>) {
        for link in self.links.links() {
            let from = self.nodes.node_ref(link.from_node_id);
            let to = self.nodes.node_ref(link.to_node_id);
            let (from, to) = match (from, to) {
                (Some(from), Some(to)) => (from, to),
                (None, _) => {
                    issues.push(HydronetError::DanglingLink {
                        link: link.id,
                        node: link.from_node_id,
                    });
                    continue;
                }
                (_, None) => {
                    issues.push(HydronetError::DanglingLink {
                        link: link.id,
                        node: link.to_node_id,
                    });
                    continue;
                }
            };

            if !rules::can_connect(from.kind, to.kind) {
                issues.push(HydronetError::Connectivity {
                    from_id: from.id,
                    from_kind: from.kind,
                    to_id: to.id,
                    to_kind: to.kind,
                    permitted: rules::permitted_downstream(from.kind).to_vec(),
                });
            }

            let expected = rules::link_kind_for(from.kind);
            if link.kind != expected {
                issues.push(HydronetError::LinkKindMismatch {
                    link: link.id,
                    stored: link.kind,
                    expected,
                });
            }

            // Report each anti-parallel pair once, from its lower-id side.
            let exempt = rules::rules(from.kind).anti_parallel_exempt
                || rules::rules(to.kind).anti_parallel_exempt;
            if !exempt && from.id < to.id && self.links.contains_pair(to.id, from.id) {
                issues.push(HydronetError::AntiParallelLink {
                    from: to.id,
                    to: from.id,
                });
            }
        }
    }

    fn check_degrees(&self, issues: &mut Vec<HydronetError>) {
        for node in self.nodes.nodes() {
            for link_kind in [LinkKind::Flow, LinkKind::Control] {
                let constraint = rules::degree_constraint(node.kind, link_kind);
                let sides = [
                    (Direction::In, constraint.min_in, constraint.max_in),
                    (Direction::Out, constraint.min_out, constraint.max_out),
                ];
                for (direction, min, max) in sides {
                    let current = self.links.degree(node.id, link_kind, direction);
                    if current < min as usize {
                        issues.push(HydronetError::MinimumDegreeNotMet {
                            node: node.id,
                            kind: node.kind,
                            link_kind,
                            direction,
                            bound: min,
                            current,
                        });
                    }
                    if let rules::DegreeBound::Count(bound) = max {
                        if !max.holds(current) {
                            issues.push(HydronetError::DegreeExceeded {
                                node: node.id,
                                kind: node.kind,
                                link_kind,
                                direction,
                                bound,
                                current,
                            });
                        }
                    }
                }
            }
        }
    }
}

// =============================================================================
// VALIDATION REPORT
// =============================================================================

/// Every structural issue found by [`Model::validate`], in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<HydronetError>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Convert into a result carrying the first issue.
    pub fn into_result(self) -> Result<(), HydronetError> {
        match self.issues.into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }
}

// =============================================================================
// SERIALIZABLE MODEL
// =============================================================================

/// Flat, serializable form of a model.
///
/// Identifier registries are not stored: they are rebuilt from the rows,
/// since every registered identifier is held by exactly one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableModel {
    pub nodes: Vec<Node>,
    pub attributes: Vec<(NodeKind, String, AttributeRecord)>,
    pub links: Vec<Link>,
}

impl From<&Model> for SerializableModel {
    fn from(model: &Model) -> Self {
        Self {
            nodes: model.nodes.nodes().cloned().collect(),
            attributes: model
                .nodes
                .all_records()
                .map(|(kind, table, record)| (kind, table.to_string(), record.clone()))
                .collect(),
            links: model.links.links().cloned().collect(),
        }
    }
}

impl TryFrom<SerializableModel> for Model {
    type Error = HydronetError;

    fn try_from(sm: SerializableModel) -> Result<Self, Self::Error> {
        let nodes = NodeCatalog::from_parts(sm.nodes, sm.attributes)?;
        let links = LinkTable::from_links(sm.links)?;
        Ok(Model::from_parts(nodes, links))
    }
}

// =============================================================================
// TESTS
// =============================================================================
