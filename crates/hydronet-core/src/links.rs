//! # Link Table
//!
//! Directed links between node identifiers. The table is the gatekeeper for
//! every incremental structural rule:
//!
//! 1. the downstream kind must be permitted by the upstream kind;
//! 2. a link may not run anti-parallel to an existing one unless an endpoint
//!    is of an exempt kind;
//! 3. the link kind follows from the source kind;
//! 4. neither endpoint may exceed its maximum in/out degree for that kind;
//! 5. identifiers and ordered `(from, to)` pairs are unique;
//! 6. every coordinate of the drawn path is finite.
//!
//! All checks run against the table as it was before the call. A link is
//! inserted only once every check has passed, so the table grows
//! monotonically and a failed `add` leaves it untouched.

use crate::registry::IdRegistry;
use crate::rules::{self, DegreeBound};
use crate::{
    Direction, HydronetError, LineString, Link, LinkId, LinkInput, LinkKind, NodeId, NodeKind,
    NodeRef,
};
use std::collections::{BTreeMap, BTreeSet};

type DegreeKey = (NodeId, LinkKind, Direction);

/// The link table of one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkTable {
    links: BTreeMap<LinkId, Link>,
    pairs: BTreeSet<(NodeId, NodeId)>,
    degrees: BTreeMap<DegreeKey, usize>,
    registry: IdRegistry<LinkId>,
}

impl LinkTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link from `from` to `to`, returning the stored link.
    pub fn add(
        &mut self,
        from: &NodeRef,
        to: &NodeRef,
        input: LinkInput,
    ) -> Result<&Link, HydronetError> {
        if !rules::can_connect(from.kind, to.kind) {
            return Err(HydronetError::Connectivity {
                from_id: from.id,
                from_kind: from.kind,
                to_id: to.id,
                to_kind: to.kind,
                permitted: rules::permitted_downstream(from.kind).to_vec(),
            });
        }

        if self.pairs.contains(&(to.id, from.id)) && !Self::is_exempt(from.kind, to.kind) {
            return Err(HydronetError::AntiParallelLink {
                from: from.id,
                to: to.id,
            });
        }

        let kind = rules::link_kind_for(from.kind);
        self.check_degree(to, kind, Direction::In)?;
        self.check_degree(from, kind, Direction::Out)?;

        let geometry = input
            .geometry
            .unwrap_or_else(|| LineString::segment(from.geometry, to.geometry));

        let id = match input.id {
            Some(id) if self.registry.contains(id) => {
                return Err(HydronetError::DuplicateLinkId(id));
            }
            Some(id) => id,
            None => self.registry.new_id()?,
        };

        if !geometry.is_finite() {
            return Err(HydronetError::NonFiniteLinkGeometry(id));
        }

        if self.pairs.contains(&(from.id, to.id)) {
            return Err(HydronetError::DuplicateLink {
                from: from.id,
                to: to.id,
            });
        }

        tracing::debug!(
            link_id = id.0,
            from = %from,
            to = %to,
            link_kind = %kind,
            "adding link"
        );

        let link = Link {
            id,
            from_node_id: from.id,
            to_node_id: to.id,
            kind,
            name: input.name,
            geometry,
        };
        Ok(self.insert(link))
    }

    fn is_exempt(a: NodeKind, b: NodeKind) -> bool {
        rules::rules(a).anti_parallel_exempt || rules::rules(b).anti_parallel_exempt
    }

    fn check_degree(
        &self,
        node: &NodeRef,
        kind: LinkKind,
        direction: Direction,
    ) -> Result<(), HydronetError> {
        let constraint = rules::degree_constraint(node.kind, kind);
        let bound = match direction {
            Direction::In => constraint.max_in,
            Direction::Out => constraint.max_out,
        };
        let current = self.degree(node.id, kind, direction);

        match bound {
            DegreeBound::Count(max) if !bound.admits_another(current) => {
                Err(HydronetError::DegreeExceeded {
                    node: node.id,
                    kind: node.kind,
                    link_kind: kind,
                    direction,
                    bound: max,
                    current,
                })
            }
            _ => Ok(()),
        }
    }

    /// Insert a link whose checks have passed.
    fn insert(&mut self, link: Link) -> &Link {
        let id = link.id;
        self.pairs.insert((link.from_node_id, link.to_node_id));
        *self
            .degrees
            .entry((link.to_node_id, link.kind, Direction::In))
            .or_insert(0) += 1;
        *self
            .degrees
            .entry((link.from_node_id, link.kind, Direction::Out))
            .or_insert(0) += 1;
        self.registry.add(id);
        self.links.entry(id).or_insert(link)
    }

    /// Rebuild a table from persisted links.
    ///
    /// Only identifier and pair uniqueness are enforced here; the structural
    /// rules are the concern of whole-model validation.
    pub fn from_links(links: impl IntoIterator<Item = Link>) -> Result<Self, HydronetError> {
        let mut table = Self::new();
        for link in links {
            if table.registry.contains(link.id) {
                return Err(HydronetError::DuplicateLinkId(link.id));
            }
            if !link.geometry.is_finite() {
                return Err(HydronetError::NonFiniteLinkGeometry(link.id));
            }
            if table.pairs.contains(&(link.from_node_id, link.to_node_id)) {
                return Err(HydronetError::DuplicateLink {
                    from: link.from_node_id,
                    to: link.to_node_id,
                });
            }
            table.insert(link);
        }
        Ok(table)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn get(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Links in identifier order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Links of one kind in identifier order.
    pub fn links_of_kind(&self, kind: LinkKind) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |link| link.kind == kind)
    }

    #[must_use]
    pub fn contains_pair(&self, from: NodeId, to: NodeId) -> bool {
        self.pairs.contains(&(from, to))
    }

    /// Number of links of `kind` touching `node` in `direction`.
    #[must_use]
    pub fn degree(&self, node: NodeId, kind: LinkKind, direction: Direction) -> usize {
        self.degrees
            .get(&(node, kind, direction))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn in_degree(&self, node: NodeId, kind: LinkKind) -> usize {
        self.degree(node, kind, Direction::In)
    }

    #[must_use]
    pub fn out_degree(&self, node: NodeId, kind: LinkKind) -> usize {
        self.degree(node, kind, Direction::Out)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[must_use]
    pub fn registry(&self) -> &IdRegistry<LinkId> {
        &self.registry
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;

    fn node(id: u32, kind: NodeKind) -> NodeRef {
        NodeRef {
            id: NodeId(id),
            kind,
            geometry: Point::new(id as f64, 0.0),
        }
    }

    #[test]
    fn basin_to_pump_is_a_flow_link() {
        let mut table = LinkTable::new();
        let link = table
            .add(
                &node(1, NodeKind::Basin),
                &node(2, NodeKind::Pump),
                LinkInput::new(),
            )
            .expect("add");

        assert_eq!(link.id, LinkId(1));
        assert_eq!(link.kind, LinkKind::Flow);
        assert_eq!(
            link.geometry,
            LineString::segment(Point::new(1.0, 0.0), Point::new(2.0, 0.0))
        );
    }

    #[test]
    fn controller_emits_control_link() {
        let mut table = LinkTable::new();
        let link = table
            .add(
                &node(1, NodeKind::DiscreteControl),
                &node(2, NodeKind::Pump),
                LinkInput::new(),
            )
            .expect("add");
        assert_eq!(link.kind, LinkKind::Control);
        assert_eq!(table.in_degree(NodeId(2), LinkKind::Control), 1);
        assert_eq!(table.in_degree(NodeId(2), LinkKind::Flow), 0);
    }

    #[test]
    fn connectivity_violation_names_permitted_kinds() {
        let mut table = LinkTable::new();
        let result = table.add(
            &node(3, NodeKind::Terminal),
            &node(1, NodeKind::Basin),
            LinkInput::new(),
        );
        assert_eq!(
            result.map(|l| l.id),
            Err(HydronetError::Connectivity {
                from_id: NodeId(3),
                from_kind: NodeKind::Terminal,
                to_id: NodeId(1),
                to_kind: NodeKind::Basin,
                permitted: vec![],
            })
        );
        assert!(table.is_empty());
    }

    #[test]
    fn anti_parallel_rejected_for_regular_kinds() {
        let mut table = LinkTable::new();
        let basin = node(1, NodeKind::Basin);
        let pump = node(2, NodeKind::Pump);
        table.add(&basin, &pump, LinkInput::new()).expect("add");

        let result = table.add(&pump, &basin, LinkInput::new()).map(|l| l.id);
        assert_eq!(
            result,
            Err(HydronetError::AntiParallelLink {
                from: NodeId(2),
                to: NodeId(1)
            })
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn anti_parallel_allowed_for_user_demand() {
        let mut table = LinkTable::new();
        let basin = node(1, NodeKind::Basin);
        let demand = node(5, NodeKind::UserDemand);
        table.add(&basin, &demand, LinkInput::new()).expect("withdraw");
        table.add(&demand, &basin, LinkInput::new()).expect("return");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn max_out_degree_enforced() {
        let mut table = LinkTable::new();
        let pump = node(2, NodeKind::Pump);
        table
            .add(&pump, &node(3, NodeKind::Basin), LinkInput::new())
            .expect("add");

        let result = table
            .add(&pump, &node(4, NodeKind::Terminal), LinkInput::new())
            .map(|l| l.id);
        assert_eq!(
            result,
            Err(HydronetError::DegreeExceeded {
                node: NodeId(2),
                kind: NodeKind::Pump,
                link_kind: LinkKind::Flow,
                direction: Direction::Out,
                bound: 1,
                current: 1,
            })
        );
    }

    #[test]
    fn max_in_degree_checked_before_out_degree() {
        let mut table = LinkTable::new();
        let outlet = node(2, NodeKind::Outlet);
        table
            .add(&node(1, NodeKind::Basin), &outlet, LinkInput::new())
            .expect("add");

        let err = table
            .add(&node(3, NodeKind::LevelBoundary), &outlet, LinkInput::new())
            .map(|l| l.id)
            .expect_err("second inflow");
        assert!(matches!(
            err,
            HydronetError::DegreeExceeded {
                direction: Direction::In,
                ..
            }
        ));
    }

    #[test]
    fn explicit_id_collision_rejected() {
        let mut table = LinkTable::new();
        table
            .add(
                &node(1, NodeKind::Basin),
                &node(2, NodeKind::Pump),
                LinkInput::new().with_id(10),
            )
            .expect("add");

        let result = table
            .add(
                &node(3, NodeKind::Basin),
                &node(4, NodeKind::Outlet),
                LinkInput::new().with_id(10),
            )
            .map(|l| l.id);
        assert_eq!(result, Err(HydronetError::DuplicateLinkId(LinkId(10))));
        assert_eq!(table.registry().new_id(), Ok(LinkId(11)));
    }

    #[test]
    fn second_inflow_through_single_inlet_rejected() {
        let mut table = LinkTable::new();
        let basin = node(1, NodeKind::Basin);
        let level = node(2, NodeKind::LevelBoundary);
        let resistance = node(3, NodeKind::LinearResistance);
        table.add(&level, &resistance, LinkInput::new()).expect("add");
        table.add(&resistance, &basin, LinkInput::new()).expect("add");

        let err = table
            .add(&level, &resistance, LinkInput::new())
            .map(|l| l.id)
            .expect_err("repeat");
        assert!(matches!(err, HydronetError::DegreeExceeded { .. }));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn from_links_rejects_duplicate_pairs() {
        let link = Link {
            id: LinkId(1),
            from_node_id: NodeId(1),
            to_node_id: NodeId(2),
            kind: LinkKind::Flow,
            name: String::new(),
            geometry: LineString::default(),
        };
        let mut twin = link.clone();
        twin.id = LinkId(2);

        let result = LinkTable::from_links(vec![link, twin]);
        assert_eq!(
            result,
            Err(HydronetError::DuplicateLink {
                from: NodeId(1),
                to: NodeId(2)
            })
        );
    }

    #[test]
    fn zero_link_id_accepted() {
        let mut table = LinkTable::new();
        let link = table
            .add(
                &node(1, NodeKind::Basin),
                &node(2, NodeKind::Pump),
                LinkInput::new().with_id(0),
            )
            .expect("add");
        assert_eq!(link.id, LinkId(0));
    }

    #[test]
    fn custom_geometry_kept() {
        let mut table = LinkTable::new();
        let path = LineString::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.5, 1.0),
            Point::new(1.0, 0.0),
        ]);
        let link = table
            .add(
                &node(1, NodeKind::Basin),
                &node(2, NodeKind::Pump),
                LinkInput::new().with_geometry(path.clone()).with_name("canal"),
            )
            .expect("add");
        assert_eq!(link.geometry, path);
        assert_eq!(link.name, "canal");
    }

    #[test]
    fn from_links_rebuilds_counters() {
        let mut table = LinkTable::new();
        table
            .add(
                &node(1, NodeKind::Basin),
                &node(2, NodeKind::Pump),
                LinkInput::new().with_id(4),
            )
            .expect("add");

        let rebuilt = LinkTable::from_links(table.links().cloned()).expect("rebuild");
        assert_eq!(rebuilt, table);
        assert_eq!(rebuilt.out_degree(NodeId(1), LinkKind::Flow), 1);
        assert_eq!(rebuilt.registry().new_id(), Ok(LinkId(5)));
    }

    #[test]
    fn from_links_rejects_duplicate_ids() {
        let link = Link {
            id: LinkId(1),
            from_node_id: NodeId(1),
            to_node_id: NodeId(2),
            kind: LinkKind::Flow,
            name: String::new(),
            geometry: LineString::default(),
        };
        let mut other = link.clone();
        other.to_node_id = NodeId(3);

        let result = LinkTable::from_links(vec![link, other]);
        assert_eq!(result, Err(HydronetError::DuplicateLinkId(LinkId(1))));
    }

    #[test]
    fn non_finite_path_rejected() {
        let mut table = LinkTable::new();
        let path = LineString::new(vec![Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0)]);
        let result = table
            .add(
                &node(1, NodeKind::Basin),
                &node(2, NodeKind::Pump),
                LinkInput::new().with_geometry(path),
            )
            .map(|l| l.id);
        assert_eq!(result, Err(HydronetError::NonFiniteLinkGeometry(LinkId(1))));
        assert!(table.is_empty());
        assert_eq!(table.out_degree(NodeId(1), LinkKind::Flow), 0);
    }
}
