//! # Topology Scenario Tests (T0-T4)
//!
//! End-to-end construction scenarios against the public API.
//!
//! ## Tiers
//! - T0: Identifier Lifecycle
//! - T1: Link Construction
//! - T2: Node Replacement
//! - T3: Whole-Model Validation
//! - T4: Persistence and Export

use hydronet_core::{
    AttributeRow, Direction, FieldValue, HydronetError, LinkId, LinkInput, LinkKind, Model,
    NodeId, NodeInput, NodeKind, Point,
};

fn node(id: u32, kind: NodeKind) -> NodeInput {
    NodeInput::new(kind, Point::new(f64::from(id), 0.0)).with_id(id)
}

fn model_with(nodes: &[(u32, NodeKind)]) -> Model {
    let mut model = Model::new();
    for &(id, kind) in nodes {
        model.add_node(node(id, kind), vec![]).expect("add node");
    }
    model
}

// =============================================================================
// TIER T0: IDENTIFIER LIFECYCLE
// =============================================================================

mod t0_identifiers {
    use super::*;

    /// T0.1: Automatic identifiers continue from the running maximum.
    #[test]
    fn auto_ids_follow_maximum() {
        let mut model = model_with(&[(4, NodeKind::Basin)]);
        let next = model
            .add_node(NodeInput::new(NodeKind::Basin, Point::default()), vec![])
            .expect("auto id");
        assert_eq!(next.id, NodeId(5));
    }

    /// T0.2: Explicit collisions outside the replacement path are rejected.
    #[test]
    fn explicit_collision_rejected() {
        let mut model = model_with(&[(1, NodeKind::Basin)]);
        let result = model.add_node(node(1, NodeKind::Pump), vec![]);
        assert_eq!(result, Err(HydronetError::DuplicateNodeId(NodeId(1))));
        assert_eq!(model.node(NodeId(1)).map(|n| n.kind), Some(NodeKind::Basin));
    }

    /// T0.3: Node and link namespaces do not share state.
    #[test]
    fn namespaces_independent() {
        let mut model = model_with(&[(40, NodeKind::Basin), (41, NodeKind::Pump)]);
        let link = model
            .connect(NodeId(40), NodeId(41), LinkInput::new())
            .expect("link")
            .id;
        assert_eq!(link, LinkId(1));
    }
}

// =============================================================================
// TIER T1: LINK CONSTRUCTION
// =============================================================================

mod t1_links {
    use super::*;

    /// T1.1: Basin -> Pump is a permitted flow link.
    #[test]
    fn basin_to_pump_succeeds() {
        let mut model = model_with(&[(1, NodeKind::Basin), (2, NodeKind::Pump)]);
        let link = model
            .connect(NodeId(1), NodeId(2), LinkInput::new())
            .expect("basin -> pump");
        assert_eq!(link.kind, LinkKind::Flow);
        assert_eq!(link.from_node_id, NodeId(1));
        assert_eq!(link.to_node_id, NodeId(2));
    }

    /// T1.2: A Terminal has no permitted downstream kind.
    #[test]
    fn terminal_cannot_feed_anything() {
        let mut model = model_with(&[(1, NodeKind::Basin), (3, NodeKind::Terminal)]);
        let result = model
            .connect(NodeId(3), NodeId(1), LinkInput::new())
            .map(|l| l.id);
        assert_eq!(
            result,
            Err(HydronetError::Connectivity {
                from_id: NodeId(3),
                from_kind: NodeKind::Terminal,
                to_id: NodeId(1),
                to_kind: NodeKind::Basin,
                permitted: vec![],
            })
        );
        assert!(model.links().is_empty());
    }

    /// T1.3: A node at its flow out-degree maximum refuses another outflow.
    #[test]
    fn out_degree_maximum_enforced() {
        let mut model = model_with(&[
            (1, NodeKind::Basin),
            (2, NodeKind::Pump),
            (3, NodeKind::Basin),
            (4, NodeKind::Basin),
        ]);
        model
            .connect(NodeId(1), NodeId(2), LinkInput::new())
            .expect("inflow");
        model
            .connect(NodeId(2), NodeId(3), LinkInput::new())
            .expect("first outflow");

        let result = model
            .connect(NodeId(2), NodeId(4), LinkInput::new())
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
        assert_eq!(model.links().len(), 2);
    }

    /// T1.4: UserDemand may sit in a withdrawal-and-return loop.
    #[test]
    fn user_demand_loop_allowed() {
        let mut model = model_with(&[(1, NodeKind::Basin), (5, NodeKind::UserDemand)]);
        model
            .connect(NodeId(1), NodeId(5), LinkInput::new())
            .expect("withdrawal");
        model
            .connect(NodeId(5), NodeId(1), LinkInput::new())
            .expect("return");
        assert_eq!(model.links().len(), 2);
    }

    /// T1.5: The same loop through a non-exempt kind is anti-parallel.
    #[test]
    fn pump_loop_rejected() {
        let mut model = model_with(&[(1, NodeKind::Basin), (5, NodeKind::Pump)]);
        model
            .connect(NodeId(1), NodeId(5), LinkInput::new())
            .expect("first");
        let result = model
            .connect(NodeId(5), NodeId(1), LinkInput::new())
            .map(|l| l.id);
        assert_eq!(
            result,
            Err(HydronetError::AntiParallelLink {
                from: NodeId(5),
                to: NodeId(1),
            })
        );
    }

    /// T1.6: A repeated explicit link identifier is rejected.
    #[test]
    fn repeated_link_id_rejected() {
        let mut model = model_with(&[
            (1, NodeKind::Basin),
            (2, NodeKind::Pump),
            (3, NodeKind::Terminal),
        ]);
        model
            .connect(NodeId(1), NodeId(2), LinkInput::new().with_id(10))
            .expect("first");
        let result = model
            .connect(NodeId(2), NodeId(3), LinkInput::new().with_id(10))
            .map(|l| l.id);
        assert_eq!(result, Err(HydronetError::DuplicateLinkId(LinkId(10))));
        assert_eq!(
            model.links().registry().new_id().map(|id| id.0),
            Ok(11)
        );
    }

    /// T1.7: Controllers produce control links.
    #[test]
    fn controller_emits_control_link() {
        let mut model = model_with(&[
            (1, NodeKind::Basin),
            (2, NodeKind::Outlet),
            (3, NodeKind::DiscreteControl),
        ]);
        let link = model
            .connect(NodeId(3), NodeId(2), LinkInput::new())
            .expect("control");
        assert_eq!(link.kind, LinkKind::Control);
        assert_eq!(model.links().in_degree(NodeId(2), LinkKind::Control), 1);
        assert_eq!(model.links().in_degree(NodeId(2), LinkKind::Flow), 0);
    }
}

// =============================================================================
// TIER T2: NODE REPLACEMENT
// =============================================================================

mod t2_replacement {
    use super::*;

    /// T2.1: Replacing under a new kind leaves one node and no residual rows.
    #[test]
    fn type_change_purges_prior_rows() {
        let mut model = Model::new();
        model
            .add_node(
                node(1, NodeKind::Pump),
                vec![AttributeRow::new("static").field("flow_rate", FieldValue::Float(2.0))],
            )
            .expect("pump");
        model
            .add_node(
                node(2, NodeKind::Pump),
                vec![AttributeRow::new("static").field("flow_rate", FieldValue::Float(3.0))],
            )
            .expect("pump");

        model
            .replace_node(
                node(1, NodeKind::Outlet),
                vec![AttributeRow::new("static").field("flow_rate", FieldValue::Float(4.0))],
            )
            .expect("replace");

        assert_eq!(model.nodes().len(), 2);
        assert_eq!(model.node(NodeId(1)).map(|n| n.kind), Some(NodeKind::Outlet));
        let pump_rows = model.nodes().attribute_records(NodeKind::Pump, "static");
        assert_eq!(pump_rows.len(), 1);
        assert!(pump_rows.iter().all(|r| r.node_id == NodeId(2)));
        assert_eq!(
            model.nodes().attribute_records(NodeKind::Outlet, "static").len(),
            1
        );
    }

    /// T2.2: A replacement with invalid rows leaves the prior node in place.
    #[test]
    fn failed_replacement_is_atomic() {
        let mut model = model_with(&[(1, NodeKind::Basin)]);
        let result = model.replace_node(
            node(1, NodeKind::Pump),
            vec![AttributeRow::new("profile")],
        );
        assert!(matches!(
            result,
            Err(HydronetError::UnknownAttributeTable { .. })
        ));
        assert_eq!(model.node(NodeId(1)).map(|n| n.kind), Some(NodeKind::Basin));
    }
}

// =============================================================================
// TIER T3: WHOLE-MODEL VALIDATION
// =============================================================================

mod t3_validation {
    use super::*;

    /// T3.1: A controlled pump between two basins is valid.
    #[test]
    fn controlled_network_valid() {
        let mut model = model_with(&[
            (1, NodeKind::LevelBoundary),
            (2, NodeKind::Pump),
            (3, NodeKind::Basin),
            (4, NodeKind::TabulatedRatingCurve),
            (5, NodeKind::Terminal),
            (6, NodeKind::PidControl),
        ]);
        for (from, to) in [(1, 2), (2, 3), (3, 4), (4, 5), (6, 2)] {
            model
                .connect(NodeId(from), NodeId(to), LinkInput::new())
                .expect("link");
        }
        let report = model.validate();
        assert!(report.is_valid(), "{:?}", report.issues);
    }

    /// T3.2: Minimum bounds are reported only by validation.
    #[test]
    fn dangling_structure_reported() {
        let model = model_with(&[(1, NodeKind::Outlet)]);
        let issues = model.validate().issues;
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|issue| matches!(
            issue,
            HydronetError::MinimumDegreeNotMet {
                node: NodeId(1),
                link_kind: LinkKind::Flow,
                ..
            }
        )));
    }
}

// =============================================================================
// TIER T4: PERSISTENCE AND EXPORT
// =============================================================================

mod t4_round_trip {
    use super::*;
    use hydronet_core::{export_json, import_json, model_from_bytes, model_to_bytes};

    fn network() -> Model {
        let mut model = Model::new();
        model
            .add_node(
                node(1, NodeKind::Basin).with_name("reservoir"),
                vec![
                    AttributeRow::new("profile")
                        .field("area", FieldValue::Float(0.01))
                        .field("level", FieldValue::Float(0.0)),
                    AttributeRow::new("profile")
                        .field("area", FieldValue::Float(1000.0))
                        .field("level", FieldValue::Float(1.0)),
                ],
            )
            .expect("basin");
        model
            .add_node(node(2, NodeKind::UserDemand), vec![])
            .expect("demand");
        model
            .add_node(node(3, NodeKind::Outlet), vec![])
            .expect("outlet");
        model
            .add_node(node(4, NodeKind::Terminal), vec![])
            .expect("terminal");
        for (from, to) in [(1, 2), (2, 1), (1, 3), (3, 4)] {
            model
                .connect(NodeId(from), NodeId(to), LinkInput::new())
                .expect("link");
        }
        model
    }

    /// T4.1: Binary save then load yields an identical catalog and link table.
    #[test]
    fn binary_round_trip() {
        let model = network();
        let bytes = model_to_bytes(&model).expect("save");
        let loaded = model_from_bytes(&bytes).expect("load");
        assert_eq!(loaded, model);
        assert!(loaded.validate().is_valid());
    }

    /// T4.2: JSON row sets restore the same model.
    #[test]
    fn json_round_trip() {
        let model = network();
        let json = export_json(&model).expect("export");
        let imported = import_json(&json).expect("import");
        assert_eq!(
            model_to_bytes(&imported).expect("bytes"),
            model_to_bytes(&model).expect("bytes")
        );
    }
}
