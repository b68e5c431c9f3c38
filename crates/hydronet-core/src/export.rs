//! # Row-Set Export
//!
//! The flat, canonically ordered shape in which a model leaves the engine:
//! one node row per node, one link row per link and one attribute row per
//! stored record. This is what an external model writer consumes.
//!
//! Row sets are exchanged as JSON with a small header carrying the row
//! counts and a deterministic checksum. Importing rebuilds a model with the
//! same identifiers and registries; it does not run [`Model::validate`].

use crate::model::SerializableModel;
use crate::primitives::{MAX_IMPORT_LINK_COUNT, MAX_IMPORT_NODE_COUNT};
use crate::{
    AttributeRecord, FieldValue, HydronetError, LineString, Link, LinkId, LinkKind, Model, Node,
    NodeId, NodeKind, Point,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// FORMAT HEADER
// =============================================================================

/// Format tag written into every row-set document.
pub const ROWSET_FORMAT: &str = "hydronet-rows";

/// Current row-set format version.
pub const ROWSET_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowSetHeader {
    pub format: String,
    pub version: u8,
    pub node_count: u64,
    pub link_count: u64,
    pub attribute_count: u64,
    pub checksum: u64,
}

impl RowSetHeader {
    #[must_use]
    pub fn for_rows(rows: &RowSets) -> Self {
        Self {
            format: ROWSET_FORMAT.to_string(),
            version: ROWSET_VERSION,
            node_count: rows.nodes.len() as u64,
            link_count: rows.links.len() as u64,
            attribute_count: rows.attributes.len() as u64,
            checksum: rows.checksum(),
        }
    }

    /// Validate the header.
    ///
    /// Error messages are kept generic.
    pub fn validate(&self) -> Result<(), HydronetError> {
        if self.format != ROWSET_FORMAT {
            return Err(HydronetError::SerializationError(
                "Invalid file format".to_string(),
            ));
        }
        if self.version != ROWSET_VERSION {
            return Err(HydronetError::SerializationError(
                "Unsupported file version".to_string(),
            ));
        }
        if self.node_count > MAX_IMPORT_NODE_COUNT as u64 {
            return Err(HydronetError::SerializationError(format!(
                "Node count {} exceeds maximum allowed {}",
                self.node_count, MAX_IMPORT_NODE_COUNT
            )));
        }
        if self.link_count > MAX_IMPORT_LINK_COUNT as u64 {
            return Err(HydronetError::SerializationError(format!(
                "Link count {} exceeds maximum allowed {}",
                self.link_count, MAX_IMPORT_LINK_COUNT
            )));
        }
        Ok(())
    }
}

// =============================================================================
// ROWS
// =============================================================================

/// One row of the node table. Sorted by `node_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRow {
    pub node_id: u32,
    pub node_type: NodeKind,
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub subnetwork_id: Option<u32>,
    pub route_priority: Option<u32>,
    pub cyclic_time: bool,
}

impl From<&Node> for NodeRow {
    fn from(node: &Node) -> Self {
        Self {
            node_id: node.id.0,
            node_type: node.kind,
            x: node.geometry.x,
            y: node.geometry.y,
            name: node.name.clone(),
            subnetwork_id: node.subnetwork_id,
            route_priority: node.route_priority,
            cyclic_time: node.cyclic_time,
        }
    }
}

impl From<NodeRow> for Node {
    fn from(row: NodeRow) -> Self {
        Node {
            id: NodeId(row.node_id),
            kind: row.node_type,
            geometry: Point::new(row.x, row.y),
            name: row.name,
            subnetwork_id: row.subnetwork_id,
            route_priority: row.route_priority,
            cyclic_time: row.cyclic_time,
        }
    }
}

/// One row of the link table. Sorted by `link_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkRow {
    pub link_id: u32,
    pub from_node_id: u32,
    pub to_node_id: u32,
    pub link_type: LinkKind,
    pub name: String,
    pub geometry: Vec<[f64; 2]>,
}

impl From<&Link> for LinkRow {
    fn from(link: &Link) -> Self {
        Self {
            link_id: link.id.0,
            from_node_id: link.from_node_id.0,
            to_node_id: link.to_node_id.0,
            link_type: link.kind,
            name: link.name.clone(),
            geometry: link.geometry.points().iter().map(|p| [p.x, p.y]).collect(),
        }
    }
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link {
            id: LinkId(row.link_id),
            from_node_id: NodeId(row.from_node_id),
            to_node_id: NodeId(row.to_node_id),
            kind: row.link_type,
            name: row.name,
            geometry: LineString::new(
                row.geometry
                    .into_iter()
                    .map(|[x, y]| Point::new(x, y))
                    .collect(),
            ),
        }
    }
}

/// One row of a per-kind attribute table.
///
/// Sorted by `(node_type, table, node_id)`; rows of the same node keep
/// their insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeTableRow {
    pub node_type: NodeKind,
    pub table: String,
    pub node_id: u32,
    pub fields: BTreeMap<String, FieldValue>,
}

// =============================================================================
// ROW SETS
// =============================================================================

/// The complete flat rendition of a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RowSets {
    pub nodes: Vec<NodeRow>,
    pub links: Vec<LinkRow>,
    pub attributes: Vec<AttributeTableRow>,
}

impl RowSets {
    /// Flatten a model into canonically ordered rows.
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        // Catalog and link table iterate in identifier order already, and
        // attribute records come out by kind, table and node identifier.
        let nodes = model.nodes().nodes().map(NodeRow::from).collect();
        let links = model.links().links().map(LinkRow::from).collect();

        let attributes = model
            .nodes()
            .all_records()
            .map(|(kind, table, record)| AttributeTableRow {
                node_type: kind,
                table: table.to_string(),
                node_id: record.node_id.0,
                fields: record.fields.clone(),
            })
            .collect();

        Self {
            nodes,
            links,
            attributes,
        }
    }

    /// Rebuild a model from rows, restoring identifiers and registries.
    pub fn into_model(self) -> Result<Model, HydronetError> {
        let serializable = SerializableModel {
            nodes: self.nodes.into_iter().map(Node::from).collect(),
            attributes: self
                .attributes
                .into_iter()
                .map(|row| {
                    (
                        row.node_type,
                        row.table,
                        AttributeRecord {
                            node_id: NodeId(row.node_id),
                            fields: row.fields,
                        },
                    )
                })
                .collect(),
            links: self.links.into_iter().map(Link::from).collect(),
        };
        Model::try_from(serializable)
    }

    /// Compute a deterministic checksum of the rows.
    ///
    /// XOR of rotated row components. Floats contribute their bit patterns.
    /// This detects accidental corruption; it is not a cryptographic hash.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hash: u64 = 0;

        for node in &self.nodes {
            hash ^= u64::from(node.node_id).rotate_left(13);
            hash ^= hash_str(node.node_type.as_str(), 7);
            hash ^= node.x.to_bits().rotate_left(3);
            hash ^= node.y.to_bits().rotate_left(5);
            hash ^= hash_str(&node.name, 23);
            hash ^= node.subnetwork_id.map_or(0, u64::from).rotate_left(31);
            hash ^= node.route_priority.map_or(0, u64::from).rotate_left(37);
            hash ^= u64::from(node.cyclic_time).rotate_left(41);
        }

        for link in &self.links {
            hash ^= u64::from(link.link_id).rotate_left(43);
            hash ^= u64::from(link.from_node_id).rotate_left(17);
            hash ^= u64::from(link.to_node_id).rotate_left(11);
            hash ^= hash_str(link.link_type.as_str(), 47);
            hash ^= hash_str(&link.name, 29);
            for [x, y] in &link.geometry {
                hash ^= x.to_bits().rotate_left(53);
                hash ^= y.to_bits().rotate_left(59);
            }
        }

        for row in &self.attributes {
            hash ^= u64::from(row.node_id).rotate_left(19);
            hash ^= hash_str(row.node_type.as_str(), 61);
            hash ^= hash_str(&row.table, 2);
            for (name, value) in &row.fields {
                hash ^= hash_str(name, 9);
                hash ^= hash_field(value);
            }
        }

        hash
    }
}

fn hash_str(s: &str, rotation: u32) -> u64 {
    let mut hash: u64 = 0;
    for (i, byte) in s.bytes().enumerate() {
        hash ^= u64::from(byte).rotate_left(rotation.wrapping_add(i as u32 % 64));
    }
    hash
}

fn hash_field(value: &FieldValue) -> u64 {
    match value {
        FieldValue::Int(v) => (*v as u64).rotate_left(27),
        FieldValue::Float(v) => v.to_bits().rotate_left(33),
        FieldValue::Text(v) => hash_str(v, 39),
        FieldValue::Bool(v) => u64::from(*v).rotate_left(45),
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct RowSetDocument {
    header: RowSetHeader,
    rows: RowSets,
}

/// Export a model as a pretty-printed JSON row-set document.
pub fn export_json(model: &Model) -> Result<String, HydronetError> {
    let rows = RowSets::from_model(model);
    let document = RowSetDocument {
        header: RowSetHeader::for_rows(&rows),
        rows,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| HydronetError::SerializationError(format!("Rows: {}", e)))
}

/// Import a model from a JSON row-set document.
///
/// The header is validated and the checksum and counts are verified before
/// the model is rebuilt.
pub fn import_json(data: &str) -> Result<Model, HydronetError> {
    let document: RowSetDocument = serde_json::from_str(data)
        .map_err(|e| HydronetError::SerializationError(format!("Rows: {}", e)))?;
    let RowSetDocument { header, rows } = document;

    header.validate()?;

    if rows.nodes.len() as u64 != header.node_count
        || rows.links.len() as u64 != header.link_count
        || rows.attributes.len() as u64 != header.attribute_count
    {
        return Err(HydronetError::SerializationError(
            "Row count mismatch".to_string(),
        ));
    }

    let computed = rows.checksum();
    if computed != header.checksum {
        return Err(HydronetError::SerializationError(format!(
            "Checksum mismatch: expected {}, got {}",
            header.checksum, computed
        )));
    }

    rows.into_model()
}

/// Compute the row-set checksum of a model.
///
/// Two models with equal checksums are very likely identical.
#[must_use]
pub fn rows_checksum(model: &Model) -> u64 {
    RowSets::from_model(model).checksum()
}

/// Compute a BLAKE3 hash of the canonical row bytes.
///
/// The rows are encoded with postcard before hashing. Returns the hash as a
/// 64-character hex string.
#[cfg(feature = "crypto-hash")]
pub fn rows_crypto_hash(model: &Model) -> Result<String, HydronetError> {
    let rows = RowSets::from_model(model);
    let bytes = postcard::to_stdvec(&rows)
        .map_err(|e| HydronetError::SerializationError(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================
