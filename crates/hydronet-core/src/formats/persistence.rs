//! # Persistence Format
//!
//! Binary serialization for hydronet models.
//!
//! Format: Header (5 bytes) + postcard-serialized model rows.
//! - 4 bytes: Magic ("HNET")
//! - 1 byte: Version
//!
//! Decoding validates the size and header before touching the payload, and
//! rebuilds the catalog and link table from the rows, rejecting duplicate
//! identifiers. Structural rules are not re-checked on load; run
//! `Model::validate` for that.

use crate::model::SerializableModel;
use crate::primitives::{self, HEADER_LEN};
use crate::{HydronetError, Model};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum allowed payload size for the persistence format.
///
/// Checked before any deserialization is attempted.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 256 * 1024 * 1024; // 256 MB

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all model data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), HydronetError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(HydronetError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(HydronetError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HydronetError> {
        if bytes.len() < HEADER_LEN {
            return Err(HydronetError::SerializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a model to bytes (header + payload).
pub fn model_to_bytes(model: &Model) -> Result<Vec<u8>, HydronetError> {
    let header = PersistenceHeader::new();
    let serializable = SerializableModel::from(model);

    let payload = postcard::to_stdvec(&serializable)
        .map_err(|e| HydronetError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a model from bytes.
pub fn model_from_bytes(bytes: &[u8]) -> Result<Model, HydronetError> {
    if bytes.len() < HEADER_LEN {
        return Err(HydronetError::SerializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }

    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(HydronetError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let serializable: SerializableModel =
        postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
            HydronetError::SerializationError(format!("Failed to deserialize model data: {}", e))
        })?;

    if serializable.nodes.len() > primitives::MAX_IMPORT_NODE_COUNT
        || serializable.links.len() > primitives::MAX_IMPORT_LINK_COUNT
    {
        return Err(HydronetError::SerializationError(
            "Model exceeds import limits".to_string(),
        ));
    }

    Model::try_from(serializable)
}

// =============================================================================
// TESTS
// =============================================================================
