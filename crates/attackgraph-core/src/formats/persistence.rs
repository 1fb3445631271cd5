//! # Dataset Format
//!
//! Binary serialization for generated datasets.
//!
//! Format: Header (29 bytes) + postcard-serialized `GeneratedDataset`.
//! - 4 bytes: Magic ("AGDS")
//! - 1 byte: Version
//! - 8 bytes: Node count (little-endian)
//! - 8 bytes: Edge count (little-endian)
//! - 8 bytes: Payload checksum (little-endian)
//!
//! The size limit, header and checksum are all checked before the payload
//! is decoded.

use crate::generator::GeneratedDataset;
use crate::{AttackGraphError, primitives};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted file size.
///
/// Checked before any decoding so a corrupted length cannot drive allocation.
pub const MAX_DATASET_FILE_SIZE: usize = 500 * 1024 * 1024; // 500 MB

/// Size of the fixed header.
pub const HEADER_SIZE: usize = 29;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header that precedes every dataset payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub node_count: u64,
    pub edge_count: u64,
    pub checksum: u64,
}

impl DatasetHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new(node_count: u64, edge_count: u64, checksum: u64) -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
            node_count,
            edge_count,
            checksum,
        }
    }

    /// Validate magic and version.
    pub fn validate(&self) -> Result<(), AttackGraphError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(AttackGraphError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(AttackGraphError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes[5..13].copy_from_slice(&self.node_count.to_le_bytes());
        bytes[13..21].copy_from_slice(&self.edge_count.to_le_bytes());
        bytes[21..29].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AttackGraphError> {
        let header = bytes
            .get(..HEADER_SIZE)
            .ok_or_else(|| AttackGraphError::SerializationError("Header too short".to_string()))?;

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
            node_count: read_u64(&header[5..13]),
            edge_count: read_u64(&header[13..21]),
            checksum: read_u64(&header[21..29]),
        })
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// FNV-1a over the payload. Position-sensitive and deterministic.
#[must_use]
pub fn payload_checksum(payload: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    payload.iter().fold(OFFSET, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a dataset to bytes (header + payload).
///
/// This is a pure transformation - no file I/O.
pub fn dataset_to_bytes(dataset: &GeneratedDataset) -> Result<Vec<u8>, AttackGraphError> {
    let payload = postcard::to_stdvec(dataset)
        .map_err(|e| AttackGraphError::SerializationError(e.to_string()))?;
    let header = DatasetHeader::new(
        dataset.graph.nodes.len() as u64,
        dataset.graph.edges.len() as u64,
        payload_checksum(&payload),
    );

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Read and validate only the header of a dataset file.
pub fn peek_header(bytes: &[u8]) -> Result<DatasetHeader, AttackGraphError> {
    let header = DatasetHeader::from_bytes(bytes)?;
    header.validate()?;
    Ok(header)
}

/// Deserialize a dataset from bytes.
///
/// Validates, in order: file size, header, checksum, then the decoded
/// payload's counts, graph invariants, bundle shape and agreement between
/// the bundle and the graph.
pub fn dataset_from_bytes(bytes: &[u8]) -> Result<GeneratedDataset, AttackGraphError> {
    if bytes.len() < HEADER_SIZE {
        return Err(AttackGraphError::SerializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_SIZE
        )));
    }
    if bytes.len() > MAX_DATASET_FILE_SIZE {
        return Err(AttackGraphError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_DATASET_FILE_SIZE
        )));
    }

    let header = peek_header(bytes)?;
    let payload = &bytes[HEADER_SIZE..];
    if payload_checksum(payload) != header.checksum {
        return Err(AttackGraphError::SerializationError(
            "Checksum mismatch".to_string(),
        ));
    }

    let dataset: GeneratedDataset = postcard::from_bytes(payload).map_err(|e| {
        AttackGraphError::SerializationError(format!("Failed to deserialize dataset: {}", e))
    })?;

    if dataset.graph.nodes.len() as u64 != header.node_count
        || dataset.graph.edges.len() as u64 != header.edge_count
    {
        return Err(AttackGraphError::SerializationError(
            "Header counts do not match payload".to_string(),
        ));
    }
    let graph = dataset.to_graph()?;
    dataset.bundle.validate()?;
    dataset.bundle.check_against(&graph)?;
    Ok(dataset)
}

/// BLAKE3 digest of raw dataset bytes, as 64 hex characters.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn dataset_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================
