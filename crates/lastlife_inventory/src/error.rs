//! # Inventory Error Types
//!
//! All errors that can occur while editing an inventory or decoding a
//! snapshot.

use thiserror::Error;

/// Errors that can occur in the inventory system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Inventory is full, cannot add more items.
    #[error("inventory full: capacity {capacity}, tried to add {amount}")]
    InventoryFull {
        /// Slot capacity.
        capacity: u32,
        /// Amount that did not fit.
        amount: u32,
    },

    /// Tried to remove more items than the inventory holds.
    #[error("insufficient items: need {required} of item {item_id}, have {available}")]
    InsufficientItems {
        /// The item that was missing.
        item_id: u32,
        /// The amount required.
        required: u32,
        /// The amount available.
        available: u32,
    },

    /// Slot index past the end of the inventory.
    #[error("slot {0} out of range")]
    SlotOutOfRange(usize),

    /// Snapshot shorter than its header.
    #[error("snapshot truncated: {len} bytes")]
    SnapshotTruncated {
        /// Length of the blob.
        len: usize,
    },

    /// Snapshot does not start with the expected magic bytes.
    #[error("snapshot has bad magic")]
    BadMagic,

    /// Snapshot was written by an unknown format version.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    /// Stored checksum does not match the payload.
    #[error("snapshot checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum in the header.
        stored: u32,
        /// Checksum of the payload.
        computed: u32,
    },

    /// Payload failed to decompress.
    #[error("snapshot decompression failed: {0}")]
    Decompress(String),

    /// Decompressed payload does not hold the declared slot count.
    #[error("snapshot declares {declared} slots but holds {actual} bytes")]
    SlotCountMismatch {
        /// Slot count in the header.
        declared: u32,
        /// Bytes in the decompressed payload.
        actual: usize,
    },
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;
