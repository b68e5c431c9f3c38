//! # hydronet-core
//!
//! The topology engine for hydrological network models.
//!
//! A model is a typed multigraph: nodes of a closed set of kinds (basins,
//! boundaries, structures, controllers, demand points) joined by directed
//! flow or control links. This crate owns every structural rule the
//! numerical solver relies on:
//!
//! - identifier lifecycle per namespace (`registry`)
//! - per-kind connectivity and degree tables (`rules`)
//! - the node catalog with explicit replacement (`catalog`)
//! - the link table with incremental checks (`links`)
//! - whole-model validation (`model`)
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no I/O beyond byte buffers
//! - Deterministic: ordered collections only, identical input gives identical bytes
//! - Every failed construction call leaves the model unchanged

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod export;
pub mod formats;
pub mod links;
pub mod model;
pub mod primitives;
pub mod registry;
pub mod rules;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AttributeRecord, AttributeRow, Direction, FieldValue, HydronetError, LineString, Link, LinkId,
    LinkInput, LinkKind, Node, NodeId, NodeInput, NodeKind, NodeRef, Point,
};

// =============================================================================
// RE-EXPORTS: Topology Engine
// =============================================================================

pub use catalog::{KindCollection, NodeCatalog};
pub use export::{
    AttributeTableRow, LinkRow, NodeRow, RowSetHeader, RowSets, export_json, import_json,
    rows_checksum,
};
#[cfg(feature = "crypto-hash")]
pub use export::rows_crypto_hash;
pub use links::LinkTable;
pub use model::{Model, SerializableModel, ValidationReport};
pub use registry::{IdRegistry, RegistryId};
pub use rules::{DegreeBound, DegreeConstraint, KindRules};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, model_from_bytes, model_to_bytes};

// =============================================================================
// RE-EXPORTS: System (from system module)
// =============================================================================

pub use system::ModelMetrics;
