//! # CLI Command Implementations
//!
//! Every command is a load-mutate-save cycle on the model file.

use crate::network;
use hydronet_core::{
    AttributeRow, HydronetError, LinkInput, Model, NodeId, NodeInput, NodeKind, Point,
    export_json, import_json, model_from_bytes, model_to_bytes, rows_checksum, rows_crypto_hash,
    rules::{self, DegreeConstraint},
    system::ModelMetrics,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a TOML network description (50 MB).
const MAX_NETWORK_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Maximum size of a model or row-set file (500 MB).
const MAX_MODEL_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HydronetError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HydronetError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(HydronetError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and ensure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, HydronetError> {
    let canonical = path.canonicalize().map_err(|e| {
        HydronetError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(HydronetError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent directory of an output path.
fn validate_output_path(path: &Path) -> Result<PathBuf, HydronetError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        HydronetError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(HydronetError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| HydronetError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// BUILD COMMAND
// =============================================================================

/// Build a model from a TOML network description.
///
/// Nothing is written unless the whole description builds.
pub fn cmd_build(
    model_path: &Path,
    input: &Path,
    force: bool,
    json_mode: bool,
) -> Result<(), HydronetError> {
    if model_path.exists() && !force {
        return Err(HydronetError::IoError(
            "Model file already exists. Use --force to overwrite.".to_string(),
        ));
    }

    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_NETWORK_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated_path)
        .map_err(|e| HydronetError::IoError(format!("Read file: {}", e)))?;

    tracing::info!("Building network from {:?}", validated_path);
    let model = network::load_network(&text)?;
    save_model(&model, model_path)?;

    if json_mode {
        print_json(&serde_json::json!({
            "model": model_path.to_string_lossy(),
            "nodes": model.nodes().len(),
            "links": model.links().len(),
        }));
    } else {
        println!(
            "Built model: {} nodes, {} links -> {:?}",
            model.nodes().len(),
            model.links().len(),
            model_path
        );
    }

    Ok(())
}

// =============================================================================
// ADD-NODE COMMAND
// =============================================================================

/// Node fields collected from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeArgs {
    pub kind: String,
    pub id: Option<u32>,
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub subnetwork_id: Option<u32>,
    pub route_priority: Option<u32>,
    pub cyclic_time: bool,
    pub rows: Vec<AttributeRow>,
}

impl NodeArgs {
    fn into_parts(self) -> Result<(NodeInput, Vec<AttributeRow>), HydronetError> {
        let kind: NodeKind = self.kind.parse()?;
        let mut input = NodeInput::new(kind, Point::new(self.x, self.y))
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
        Ok((input, self.rows))
    }
}

/// Add a node, or replace one when `replace` is set.
pub fn cmd_add_node(
    model_path: &Path,
    node: NodeArgs,
    replace: bool,
    json_mode: bool,
) -> Result<(), HydronetError> {
    let mut model = load_or_create_model(model_path)?;
    let (input, rows) = node.into_parts()?;
    let row_count = rows.len();

    let added = if replace {
        model.replace_node(input, rows)?
    } else {
        model.add_node(input, rows)?
    };
    save_model(&model, model_path)?;

    if json_mode {
        print_json(&serde_json::json!({
            "node_id": added.id.0,
            "kind": added.kind.as_str(),
            "replaced": replace,
            "rows": row_count,
        }));
    } else {
        println!("{} {}", if replace { "Replaced" } else { "Added" }, added);
    }

    Ok(())
}

// =============================================================================
// ADD-LINK COMMAND
// =============================================================================

/// Add a link between two nodes of the saved model.
pub fn cmd_add_link(
    model_path: &Path,
    from: u32,
    to: u32,
    id: Option<u32>,
    name: &str,
    json_mode: bool,
) -> Result<(), HydronetError> {
    let mut model = load_or_create_model(model_path)?;

    let mut input = LinkInput::new().with_name(name);
    if let Some(id) = id {
        input = input.with_id(id);
    }

    let link = model.connect(NodeId(from), NodeId(to), input)?.clone();
    save_model(&model, model_path)?;

    if json_mode {
        print_json(&serde_json::json!({
            "link_id": link.id.0,
            "from_node_id": link.from_node_id.0,
            "to_node_id": link.to_node_id.0,
            "link_type": link.kind.as_str(),
        }));
    } else {
        println!(
            "Added {} link #{}: {} -> {}",
            link.kind, link.id, link.from_node_id, link.to_node_id
        );
    }

    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Validate the whole model. Fails with the first issue if any are found.
pub fn cmd_validate(
    model_path: &Path,
    json_mode: bool,
    verbose: bool,
) -> Result<(), HydronetError> {
    let model = load_model(model_path)?;
    let report = model.validate();

    if json_mode {
        let issues: Vec<String> = report.issues.iter().map(ToString::to_string).collect();
        print_json(&serde_json::json!({
            "valid": report.is_valid(),
            "issue_count": issues.len(),
            "issues": issues,
        }));
    } else if report.is_valid() {
        println!(
            "Model is valid: {} nodes, {} links",
            model.nodes().len(),
            model.links().len()
        );
    } else {
        println!("Model has {} issue(s):", report.issues.len());
        for issue in &report.issues {
            println!("  - {}", issue);
            if verbose {
                println!("    {:?}", issue);
            }
        }
    }

    report.into_result()
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show model metrics.
pub fn cmd_status(
    model_path: &Path,
    json_mode: bool,
    verbose: bool,
) -> Result<(), HydronetError> {
    let model = load_or_create_model(model_path)?;
    let metrics = ModelMetrics::from_model(&model);

    if json_mode {
        let output = serde_json::json!({
            "model": model_path.to_string_lossy(),
            "metrics": metrics,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Hydronet Model Status");
    println!("=====================");
    println!("Model: {:?}", model_path);
    println!();
    println!("Nodes:             {}", metrics.node_count);
    println!("Flow Links:        {}", metrics.flow_link_count);
    println!("Control Links:     {}", metrics.control_link_count);
    println!("Attribute Rows:    {}", metrics.attribute_record_count);
    println!("Max Flow In:       {}", metrics.max_flow_in_degree);
    println!("Max Flow Out:      {}", metrics.max_flow_out_degree);

    if verbose {
        println!();
        for (kind, count) in &metrics.nodes_by_kind {
            println!("  {:<22} {}", kind.as_str(), count);
        }
        if let Some(next) = metrics.next_node_id {
            println!("Next Node ID:      {}", next);
        }
        if let Some(next) = metrics.next_link_id {
            println!("Next Link ID:      {}", next);
        }
    }

    Ok(())
}

// =============================================================================
// RULES COMMAND
// =============================================================================

fn constraint_json(constraint: DegreeConstraint) -> serde_json::Value {
    serde_json::json!({
        "min_in": constraint.min_in,
        "max_in": constraint.max_in.to_string(),
        "min_out": constraint.min_out,
        "max_out": constraint.max_out.to_string(),
    })
}

fn constraint_text(constraint: DegreeConstraint) -> String {
    format!(
        "in {}..{}, out {}..{}",
        constraint.min_in, constraint.max_in, constraint.min_out, constraint.max_out
    )
}

/// Print the rule rows of one kind, or of every kind.
pub fn cmd_rules(kind: Option<&str>, json_mode: bool) -> Result<(), HydronetError> {
    let kinds: Vec<NodeKind> = match kind {
        Some(name) => vec![name.parse()?],
        None => NodeKind::ALL.to_vec(),
    };

    if json_mode {
        let rows: Vec<serde_json::Value> = kinds
            .iter()
            .map(|&kind| {
                let row = rules::rules(kind);
                serde_json::json!({
                    "kind": kind.as_str(),
                    "downstream": row.downstream.iter().map(NodeKind::as_str).collect::<Vec<_>>(),
                    "link_type": rules::link_kind_for(kind).as_str(),
                    "flow": constraint_json(row.flow),
                    "control": constraint_json(row.control),
                    "anti_parallel_exempt": row.anti_parallel_exempt,
                    "tables": row.tables,
                })
            })
            .collect();
        print_json(&serde_json::Value::Array(rows));
        return Ok(());
    }

    for kind in kinds {
        let row = rules::rules(kind);
        let downstream: Vec<&str> = row.downstream.iter().map(NodeKind::as_str).collect();
        println!("{}", kind);
        println!(
            "  downstream: {}",
            if downstream.is_empty() {
                "(none)".to_string()
            } else {
                downstream.join(", ")
            }
        );
        println!("  emits:      {} links", rules::link_kind_for(kind));
        println!("  flow:       {}", constraint_text(row.flow));
        println!("  control:    {}", constraint_text(row.control));
        println!("  tables:     {}", row.tables.join(", "));
        if row.anti_parallel_exempt {
            println!("  exempt from the anti-parallel rule");
        }
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the model as a JSON row-set document.
pub fn cmd_export(model_path: &Path, output: &Path) -> Result<(), HydronetError> {
    let validated_output = validate_output_path(output)?;

    let model = load_model(model_path)?;
    let data = export_json(&model)?;

    std::fs::write(&validated_output, data.as_bytes())
        .map_err(|e| HydronetError::IoError(format!("Write file: {}", e)))?;

    println!("Checksum: {}", rows_checksum(&model));
    println!("Exported {} bytes to {:?}", data.len(), validated_output);

    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import a model from a JSON row-set document.
pub fn cmd_import(model_path: &Path, input: &Path, force: bool) -> Result<(), HydronetError> {
    if model_path.exists() && !force {
        return Err(HydronetError::IoError(
            "Model file already exists. Use --force to overwrite.".to_string(),
        ));
    }

    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_MODEL_FILE_SIZE)?;

    let data = std::fs::read_to_string(&validated_path)
        .map_err(|e| HydronetError::IoError(format!("Read file: {}", e)))?;

    let model = import_json(&data)?;
    save_model(&model, model_path)?;

    println!(
        "Imported model: {} nodes, {} links",
        model.nodes().len(),
        model.links().len()
    );

    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute the row-set checksum and BLAKE3 hash of the model.
pub fn cmd_hash(model_path: &Path, json_mode: bool) -> Result<(), HydronetError> {
    let model = load_model(model_path)?;
    let checksum = rows_checksum(&model);
    let hash = rows_crypto_hash(&model)?;

    if json_mode {
        print_json(&serde_json::json!({
            "checksum": checksum,
            "blake3": hash,
        }));
    } else {
        println!("Checksum: {}", checksum);
        println!("BLAKE3:   {}", hash);
    }

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load a model file, failing if it does not exist.
pub fn load_model(model_path: &Path) -> Result<Model, HydronetError> {
    let validated_path = validate_file_path(model_path)?;
    validate_file_size(&validated_path, MAX_MODEL_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| HydronetError::IoError(format!("Read model: {}", e)))?;
    model_from_bytes(&data)
}

/// Load a model file, or start an empty model if it does not exist yet.
pub fn load_or_create_model(model_path: &Path) -> Result<Model, HydronetError> {
    if model_path.exists() {
        load_model(model_path)
    } else {
        Ok(Model::new())
    }
}

/// Save a model in the binary format.
pub fn save_model(model: &Model, model_path: &Path) -> Result<(), HydronetError> {
    let data = model_to_bytes(model)?;
    std::fs::write(model_path, &data)
        .map_err(|e| HydronetError::IoError(format!("Write model: {}", e)))?;
    tracing::debug!(bytes = data.len(), "model saved to {:?}", model_path);
    Ok(())
}
