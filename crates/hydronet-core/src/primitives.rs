//! # Engine Constants
//!
//! Compile-time constants shared by the engine and its file formats.

/// Magic bytes for the hydronet binary model format header.
///
/// - File Header = Magic Bytes ("HNET") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"HNET";

/// Current binary model format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the binary model header (magic + version).
pub const HEADER_LEN: usize = 5;

/// The running maximum of an empty identifier ledger.
///
/// The first identifier issued by `new_id()` is therefore 1.
pub const EMPTY_LEDGER_MAX: u32 = 0;

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum number of nodes accepted from a persisted model or row-set import.
pub const MAX_IMPORT_NODE_COUNT: usize = 1_000_000;

/// Maximum number of links accepted from a persisted model or row-set import.
pub const MAX_IMPORT_LINK_COUNT: usize = 1_000_000;
