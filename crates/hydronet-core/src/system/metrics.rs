//! # Model Metrics
//!
//! Summary counts extracted from a model, used by status reporting.

use crate::{Direction, LinkKind, Model, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics extracted from a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Total number of nodes in the catalog.
    pub node_count: usize,
    /// Number of nodes per kind; kinds without nodes are omitted.
    pub nodes_by_kind: BTreeMap<NodeKind, usize>,
    /// Number of flow links.
    pub flow_link_count: usize,
    /// Number of control links.
    pub control_link_count: usize,
    /// Number of attribute records across every kind and table.
    pub attribute_record_count: usize,
    /// Largest flow in-degree of any node.
    pub max_flow_in_degree: usize,
    /// Largest flow out-degree of any node.
    pub max_flow_out_degree: usize,
    /// The identifier `new_id()` would issue next for nodes and links.
    pub next_node_id: Option<u32>,
    pub next_link_id: Option<u32>,
}

impl ModelMetrics {
    /// Compute metrics from a model.
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        let catalog = model.nodes();
        let links = model.links();

        let mut nodes_by_kind = BTreeMap::new();
        for node in catalog.nodes() {
            *nodes_by_kind.entry(node.kind).or_insert(0) += 1;
        }

        let degree_max = |direction: Direction| {
            catalog
                .nodes()
                .map(|node| links.degree(node.id, LinkKind::Flow, direction))
                .max()
                .unwrap_or(0)
        };

        Self {
            node_count: catalog.len(),
            nodes_by_kind,
            flow_link_count: links.links_of_kind(LinkKind::Flow).count(),
            control_link_count: links.links_of_kind(LinkKind::Control).count(),
            attribute_record_count: catalog.all_records().count(),
            max_flow_in_degree: degree_max(Direction::In),
            max_flow_out_degree: degree_max(Direction::Out),
            next_node_id: catalog.registry().new_id().ok().map(|id| id.0),
            next_link_id: links.registry().new_id().ok().map(|id| id.0),
        }
    }

    /// Total number of links of either kind.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.flow_link_count + self.control_link_count
    }
}
