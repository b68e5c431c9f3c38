//! # Core Type Definitions
//!
//! This module contains all core types of the hydronet topology engine:
//! - Identifiers (`NodeId`, `LinkId`)
//! - Node and link kinds (`NodeKind`, `LinkKind`)
//! - Geometry (`Point`, `LineString`)
//! - Records (`Node`, `NodeRef`, `Link`, `AttributeRow`, `AttributeRecord`)
//! - Error types (`HydronetError`)
//!
//! ## Determinism Guarantees
//!
//! Identifiers and kinds implement `Ord` so that every collection in the
//! engine can be a `BTreeMap`/`BTreeSet` with a stable iteration order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a node, unique across every node kind of one model.
///
/// Node identifiers are positive; `NodeId(0)` is never accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Identifier of a link, unique within the link namespace. Zero is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// NODE KIND
// =============================================================================

/// The closed set of node kinds a network model can contain.
///
/// Variant names are the PascalCase names used in model files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Basin,
    ContinuousControl,
    DiscreteControl,
    FlowBoundary,
    FlowDemand,
    LevelBoundary,
    LevelDemand,
    LinearResistance,
    ManningResistance,
    Outlet,
    PidControl,
    Pump,
    TabulatedRatingCurve,
    Terminal,
    UserDemand,
}

impl NodeKind {
    /// Every node kind, in declaration order.
    pub const ALL: [NodeKind; 15] = [
        NodeKind::Basin,
        NodeKind::ContinuousControl,
        NodeKind::DiscreteControl,
        NodeKind::FlowBoundary,
        NodeKind::FlowDemand,
        NodeKind::LevelBoundary,
        NodeKind::LevelDemand,
        NodeKind::LinearResistance,
        NodeKind::ManningResistance,
        NodeKind::Outlet,
        NodeKind::PidControl,
        NodeKind::Pump,
        NodeKind::TabulatedRatingCurve,
        NodeKind::Terminal,
        NodeKind::UserDemand,
    ];

    /// The PascalCase name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Basin => "Basin",
            NodeKind::ContinuousControl => "ContinuousControl",
            NodeKind::DiscreteControl => "DiscreteControl",
            NodeKind::FlowBoundary => "FlowBoundary",
            NodeKind::FlowDemand => "FlowDemand",
            NodeKind::LevelBoundary => "LevelBoundary",
            NodeKind::LevelDemand => "LevelDemand",
            NodeKind::LinearResistance => "LinearResistance",
            NodeKind::ManningResistance => "ManningResistance",
            NodeKind::Outlet => "Outlet",
            NodeKind::PidControl => "PidControl",
            NodeKind::Pump => "Pump",
            NodeKind::TabulatedRatingCurve => "TabulatedRatingCurve",
            NodeKind::Terminal => "Terminal",
            NodeKind::UserDemand => "UserDemand",
        }
    }

    /// The snake_case name of this kind (`tabulated_rating_curve`).
    #[must_use]
    pub fn snake_name(&self) -> String {
        let mut out = String::new();
        for (i, ch) in self.as_str().chars().enumerate() {
            if ch.is_ascii_uppercase() {
                if i > 0 {
                    out.push('_');
                }
                out.push(ch.to_ascii_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = HydronetError;

    /// Accepts both `TabulatedRatingCurve` and `tabulated_rating_curve`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s || kind.snake_name() == s)
            .ok_or_else(|| HydronetError::UnknownNodeType(s.to_string()))
    }
}

// =============================================================================
// LINK KIND
// =============================================================================

/// Whether a link moves water or carries a controller's signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Flow,
    Control,
}

impl LinkKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Flow => "flow",
            LinkKind::Control => "control",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a link relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("in"),
            Direction::Out => f.write_str("out"),
        }
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// A planar point in the model's coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are neither NaN nor infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An ordered sequence of points describing a link's drawn path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineString(pub Vec<Point>);

impl LineString {
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// A straight segment between two points.
    #[must_use]
    pub fn segment(from: Point, to: Point) -> Self {
        Self(vec![from, to])
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(Point::is_finite)
    }
}

// =============================================================================
// NODES
// =============================================================================

/// A node record as held in the shared catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub geometry: Point,
    pub name: String,
    pub subnetwork_id: Option<u32>,
    pub route_priority: Option<u32>,
    pub cyclic_time: bool,
}

impl Node {
    /// The lightweight reference used as a link endpoint.
    #[must_use]
    pub fn node_ref(&self) -> NodeRef {
        NodeRef {
            id: self.id,
            kind: self.kind,
            geometry: self.geometry,
        }
    }
}

/// A lightweight handle on a node: enough to draw and validate a link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: NodeId,
    pub kind: NodeKind,
    pub geometry: Point,
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind, self.id)
    }
}

/// Caller input for a new node. The identifier is resolved by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInput {
    pub id: Option<NodeId>,
    pub kind: NodeKind,
    pub geometry: Point,
    pub name: String,
    pub subnetwork_id: Option<u32>,
    pub route_priority: Option<u32>,
    pub cyclic_time: bool,
}

impl NodeInput {
    #[must_use]
    pub fn new(kind: NodeKind, geometry: Point) -> Self {
        Self {
            id: None,
            kind,
            geometry,
            name: String::new(),
            subnetwork_id: None,
            route_priority: None,
            cyclic_time: false,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(NodeId(id));
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_subnetwork(mut self, subnetwork_id: u32) -> Self {
        self.subnetwork_id = Some(subnetwork_id);
        self
    }

    #[must_use]
    pub fn with_route_priority(mut self, priority: u32) -> Self {
        self.route_priority = Some(priority);
        self
    }

    #[must_use]
    pub fn cyclic(mut self, cyclic_time: bool) -> Self {
        self.cyclic_time = cyclic_time;
        self
    }

    pub(crate) fn into_node(self, id: NodeId) -> Node {
        Node {
            id,
            kind: self.kind,
            geometry: self.geometry,
            name: self.name,
            subnetwork_id: self.subnetwork_id,
            route_priority: self.route_priority,
            cyclic_time: self.cyclic_time,
        }
    }
}

// =============================================================================
// ATTRIBUTE ROWS
// =============================================================================

/// A single cell of a per-kind attribute table.
///
/// Values are carried opaquely; units and ranges are not checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// An attribute row supplied with a node, destined for one of its kind's tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeRow {
    pub table: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl AttributeRow {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// An attribute row after it has been tagged with its owning node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub node_id: NodeId,
    pub fields: BTreeMap<String, FieldValue>,
}

// =============================================================================
// LINKS
// =============================================================================

/// A directed link between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub kind: LinkKind,
    pub name: String,
    pub geometry: LineString,
}

/// Optional caller input for a new link.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkInput {
    pub id: Option<LinkId>,
    pub name: String,
    pub geometry: Option<LineString>,
}

impl LinkInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(LinkId(id));
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: LineString) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the topology engine.
///
/// Construction errors are pre-mutation failures: the call that returns one
/// leaves the catalog and link table exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HydronetError {
    /// The downstream kind is not in the upstream kind's allow-list.
    #[error(
        "Node #{to_id} of type {to_kind} cannot be downstream of node #{from_id} of type {from_kind}. Possible downstream node types: [{}]",
        .permitted.iter().map(NodeKind::as_str).collect::<Vec<_>>().join(", ")
    )]
    Connectivity {
        from_id: NodeId,
        from_kind: NodeKind,
        to_id: NodeId,
        to_kind: NodeKind,
        permitted: Vec<NodeKind>,
    },

    /// The opposite link already exists and neither endpoint is exempt.
    #[error(
        "Link from #{from} to #{to} is not allowed since the opposite link already exists (this is only allowed for anti-parallel exempt node types)"
    )]
    AntiParallelLink { from: NodeId, to: NodeId },

    /// Adding the link would exceed a maximum degree bound.
    #[error(
        "Node {node} ({kind}) can have at most {bound} {link_kind} link {direction}neighbor(s) (got {current})"
    )]
    DegreeExceeded {
        node: NodeId,
        kind: NodeKind,
        link_kind: LinkKind,
        direction: Direction,
        bound: u32,
        current: usize,
    },

    /// A link between the same ordered pair already exists.
    #[error(
        "Links have to be unique, but link with from_node_id {from} to_node_id {to} already exists"
    )]
    DuplicateLink { from: NodeId, to: NodeId },

    /// An explicit link identifier is already registered.
    #[error("Link IDs have to be unique, but {0} already exists")]
    DuplicateLinkId(LinkId),

    /// An explicit node identifier is already registered.
    #[error("Node IDs have to be unique, but {0} already exists (use replace_node to replace it)")]
    DuplicateNodeId(NodeId),

    /// A node type name does not name any known kind.
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Node identifiers must be positive.
    #[error("Node IDs have to be positive, got {0}")]
    InvalidNodeId(NodeId),

    /// The requested node is not in the catalog.
    #[error("Node not found: #{0}")]
    NodeNotFound(NodeId),

    /// An attribute row names a table the node's kind does not have.
    #[error("Node type {kind} has no attribute table '{table}'")]
    UnknownAttributeTable { kind: NodeKind, table: String },

    /// Replacement requires the caller to name the identifier being replaced.
    #[error("Replacing a node requires an explicit node ID")]
    MissingNodeId,

    /// A whole-model check found a node below a minimum degree bound.
    #[error(
        "Node {node} ({kind}) must have at least {bound} {link_kind} link {direction}neighbor(s) (got {current})"
    )]
    MinimumDegreeNotMet {
        node: NodeId,
        kind: NodeKind,
        link_kind: LinkKind,
        direction: Direction,
        bound: u32,
        current: usize,
    },

    /// A link's stored kind disagrees with the kind implied by its source node.
    #[error("Link #{link} has type {stored} but its source node implies {expected}")]
    LinkKindMismatch {
        link: LinkId,
        stored: LinkKind,
        expected: LinkKind,
    },

    /// A link references a node that is not in the catalog.
    #[error("Link #{link} references missing node #{node}")]
    DanglingLink { link: LinkId, node: NodeId },

    /// A node's point has a NaN or infinite coordinate.
    #[error("Node #{0} has a non-finite coordinate")]
    NonFiniteNodeGeometry(NodeId),

    /// A link's path has a NaN or infinite coordinate.
    #[error("Link #{0} has a non-finite coordinate")]
    NonFiniteLinkGeometry(LinkId),

    /// The identifier namespace has no identifier left above its maximum.
    #[error("Identifier space exhausted: no identifier left above {0}")]
    IdSpaceExhausted(u32),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
