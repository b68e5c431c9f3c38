//! # Network Descriptions
//!
//! A TOML file describing a whole network:
//!
//! ```toml
//! [[node]]
//! kind = "Basin"
//! id = 1
//! geometry = [0.0, 0.0]
//! name = "upper"
//!
//! [[node.table]]
//! name = "profile"
//! fields = { area = 0.01, level = 0.0 }
//!
//! [[node]]
//! kind = "pump"
//! id = 2
//!
//! [[link]]
//! from = 1
//! to = 2
//! ```
//!
//! Kinds are accepted in `PascalCase` or `snake_case`. Nodes are added in
//! file order, then links; the first engine error aborts the build.

use hydronet_core::{
    AttributeRow, FieldValue, HydronetError, LineString, LinkInput, Model, NodeId, NodeInput,
    NodeKind, Point,
};
use serde::Deserialize;
use std::collections::BTreeMap;

// =============================================================================
// FILE SHAPE
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NetworkFile {
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeSpec>,
    #[serde(default, rename = "link")]
    pub links: Vec<LinkSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub kind: String,
    pub id: Option<u32>,
    #[serde(default)]
    pub geometry: [f64; 2],
    #[serde(default)]
    pub name: String,
    pub subnetwork_id: Option<u32>,
    pub route_priority: Option<u32>,
    #[serde(default)]
    pub cyclic_time: bool,
    #[serde(default, rename = "table")]
    pub tables: Vec<TableRowSpec>,
}

/// One attribute row: the table it belongs to and its cells.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableRowSpec {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, CellValue>,
}

/// A TOML cell. Converted into the engine's `FieldValue`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl From<CellValue> for FieldValue {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Int(v) => FieldValue::Int(v),
            CellValue::Float(v) => FieldValue::Float(v),
            CellValue::Bool(v) => FieldValue::Bool(v),
            CellValue::Text(v) => FieldValue::Text(v),
        }
    }
}

impl From<TableRowSpec> for AttributeRow {
    fn from(row: TableRowSpec) -> Self {
        AttributeRow {
            table: row.name,
            fields: row
                .fields
                .into_iter()
                .map(|(name, cell)| (name, cell.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LinkSpec {
    pub from: u32,
    pub to: u32,
    pub id: Option<u32>,
    #[serde(default)]
    pub name: String,
    pub geometry: Option<Vec<[f64; 2]>>,
}

// =============================================================================
// PARSING AND BUILDING
// =============================================================================

/// Parse a network description.
pub fn parse_network(text: &str) -> Result<NetworkFile, HydronetError> {
    toml::from_str(text)
        .map_err(|e| HydronetError::SerializationError(format!("Network file: {}", e)))
}

impl NodeSpec {
    fn into_parts(self) -> Result<(NodeInput, Vec<AttributeRow>), HydronetError> {
        let kind: NodeKind = self.kind.parse()?;
        let [x, y] = self.geometry;

        let mut input = NodeInput::new(kind, Point::new(x, y))
            .with_name(self.name)
            .cyclic(self.cyclic_time);
        if let Some(id) = self.id {
            input = input.with_id(id);
        }
        if let Some(subnetwork_id) = self.subnetwork_id {
            input = input.with_subnetwork(subnetwork_id);
        }
        if let Some(priority) = self.route_priority {
            input = input.with_route_priority(priority);
        }

        let rows = self.tables.into_iter().map(AttributeRow::from).collect();

        Ok((input, rows))
    }
}

impl LinkSpec {
    fn input(&self) -> LinkInput {
        let mut input = LinkInput::new().with_name(self.name.clone());
        if let Some(id) = self.id {
            input = input.with_id(id);
        }
        if let Some(points) = &self.geometry {
            input = input.with_geometry(LineString::new(
                points.iter().map(|&[x, y]| Point::new(x, y)).collect(),
            ));
        }
        input
    }
}

/// Construct a model from a parsed description.
pub fn build_model(network: NetworkFile) -> Result<Model, HydronetError> {
    let mut model = Model::new();

    for spec in network.nodes {
        let (input, rows) = spec.into_parts()?;
        model.add_node(input, rows)?;
    }

    for spec in &network.links {
        model.connect(NodeId(spec.from), NodeId(spec.to), spec.input())?;
    }

    tracing::info!(
        nodes = model.nodes().len(),
        links = model.links().len(),
        "network built"
    );

    Ok(model)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RowFields {
    fields: BTreeMap<String, CellValue>,
}

/// Parse one attribute row written as `TABLE` or `TABLE:FIELDS`.
///
/// `FIELDS` is the body of a TOML inline table, e.g.
/// `profile: area = 0.01, level = 0.0`.
pub fn parse_row(text: &str) -> Result<AttributeRow, HydronetError> {
    let (table, fields) = text.split_once(':').unwrap_or((text, ""));
    let table = table.trim();
    if table.is_empty() {
        return Err(HydronetError::SerializationError(format!(
            "Attribute row '{}' has no table name",
            text
        )));
    }

    let cells: RowFields = toml::from_str(&format!("fields = {{ {} }}", fields.trim()))
        .map_err(|e| {
            HydronetError::SerializationError(format!("Attribute row '{}': {}", text, e))
        })?;

    Ok(TableRowSpec {
        name: table.to_string(),
        fields: cells.fields,
    }
    .into())
}

/// Parse and construct in one step.
pub fn load_network(text: &str) -> Result<Model, HydronetError> {
    build_model(parse_network(text)?)
}
