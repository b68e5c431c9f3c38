//! # Property-Based Tests
//!
//! Structural invariants that must hold after any sequence of construction
//! calls, successful or not.

use hydronet_core::rules::{self, DegreeBound};
use hydronet_core::{
    Direction, IdRegistry, LinkId, LinkInput, LinkKind, Model, NodeId, NodeInput, NodeKind, Point,
    model_from_bytes, model_to_bytes,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn kind_strategy() -> impl Strategy<Value = NodeKind> {
    (0..NodeKind::ALL.len()).prop_map(|i| NodeKind::ALL[i])
}

/// Build a model from node kinds (ids 1..=n) and attempt every requested link.
fn build(kinds: &[NodeKind], attempts: &[(usize, usize)]) -> Model {
    let mut model = Model::new();
    for kind in kinds {
        model
            .add_node(NodeInput::new(*kind, Point::default()), vec![])
            .expect("auto id");
    }
    let n = kinds.len();
    for &(a, b) in attempts {
        let from = NodeId((a % n) as u32 + 1);
        let to = NodeId((b % n) as u32 + 1);
        let _ = model.connect(from, to, LinkInput::new());
    }
    model
}

fn within(bound: DegreeBound, current: usize) -> bool {
    bound.holds(current)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Every stored link satisfies the connectivity table.
    #[test]
    fn stored_links_are_permitted(
        kinds in vec(kind_strategy(), 2..20),
        attempts in vec((0usize..64, 0usize..64), 0..80),
    ) {
        let model = build(&kinds, &attempts);
        for link in model.links().links() {
            let from = model.node(link.from_node_id).expect("from").kind;
            let to = model.node(link.to_node_id).expect("to").kind;
            prop_assert!(rules::can_connect(from, to));
            prop_assert_eq!(link.kind, rules::link_kind_for(from));
        }
    }

    /// No node ever exceeds a maximum degree bound.
    #[test]
    fn degree_maximums_never_exceeded(
        kinds in vec(kind_strategy(), 2..20),
        attempts in vec((0usize..64, 0usize..64), 0..80),
    ) {
        let model = build(&kinds, &attempts);
        for node in model.nodes().nodes() {
            for link_kind in [LinkKind::Flow, LinkKind::Control] {
                let constraint = rules::degree_constraint(node.kind, link_kind);
                let links = model.links();
                prop_assert!(within(constraint.max_in, links.degree(node.id, link_kind, Direction::In)));
                prop_assert!(within(constraint.max_out, links.degree(node.id, link_kind, Direction::Out)));
            }
        }
    }

    /// Anti-parallel pairs only exist through an exempt kind.
    #[test]
    fn anti_parallel_only_when_exempt(
        kinds in vec(kind_strategy(), 2..20),
        attempts in vec((0usize..64, 0usize..64), 0..80),
    ) {
        let model = build(&kinds, &attempts);
        for link in model.links().links() {
            if model.links().contains_pair(link.to_node_id, link.from_node_id) {
                let from = model.node(link.from_node_id).expect("from").kind;
                let to = model.node(link.to_node_id).expect("to").kind;
                prop_assert!(
                    rules::rules(from).anti_parallel_exempt || rules::rules(to).anti_parallel_exempt
                );
            }
        }
    }

    /// Models built only through the incremental API never report
    /// connectivity, kind or maximum-degree issues.
    #[test]
    fn incremental_construction_only_misses_minimums(
        kinds in vec(kind_strategy(), 2..20),
        attempts in vec((0usize..64, 0usize..64), 0..80),
    ) {
        let model = build(&kinds, &attempts);
        for issue in model.validate().issues {
            let is_minimum_degree =
                matches!(issue, hydronet_core::HydronetError::MinimumDegreeNotMet { .. });
            prop_assert!(is_minimum_degree);
        }
    }

    /// `new_id()` always returns the running maximum plus one.
    #[test]
    fn new_id_is_max_plus_one(ids in vec(0u32..100_000, 0..50)) {
        let registry: IdRegistry<LinkId> = ids.iter().map(|&id| LinkId(id)).collect();
        let expected = ids.iter().copied().max().unwrap_or(0) + 1;
        prop_assert_eq!(registry.new_id(), Ok(LinkId(expected)));
    }

    /// Link identifiers stay unique across mixed explicit and automatic ids.
    #[test]
    fn link_ids_unique(
        explicit in vec(proptest::option::of(0u32..20), 1..30),
    ) {
        let mut model = Model::new();
        let mut seen = BTreeSet::new();
        for (i, id) in explicit.iter().enumerate() {
            let basin = model
                .add_node(NodeInput::new(NodeKind::Basin, Point::default()), vec![])
                .expect("basin");
            let pump = model
                .add_node(NodeInput::new(NodeKind::Pump, Point::default()), vec![])
                .expect("pump");
            let input = match id {
                Some(id) => LinkInput::new().with_id(*id),
                None => LinkInput::new().with_name(format!("auto-{}", i)),
            };
            if let Ok(link) = model.add_link(&basin, &pump, input) {
                prop_assert!(seen.insert(link.id));
            }
        }
        prop_assert_eq!(seen.len(), model.links().len());
    }

    /// Identical construction sequences give identical bytes.
    #[test]
    fn determinism_identical_input_produces_identical_bytes(
        kinds in vec(kind_strategy(), 2..12),
        attempts in vec((0usize..32, 0usize..32), 0..40),
    ) {
        let first = model_to_bytes(&build(&kinds, &attempts)).expect("bytes");
        let second = model_to_bytes(&build(&kinds, &attempts)).expect("bytes");
        prop_assert_eq!(&first, &second);

        let reloaded = model_from_bytes(&first).expect("load");
        prop_assert_eq!(model_to_bytes(&reloaded).expect("bytes"), first);
    }
}
