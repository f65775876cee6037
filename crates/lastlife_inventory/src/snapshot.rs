//! # Inventory Snapshots
//!
//! At a punitive death the live inventory is captured into an opaque blob
//! stored on the player's record. A completed revive puts it back.
//!
//! ## Format
//!
//! ```text
//! [4 bytes: magic "LLIV"]
//! [4 bytes: version]
//! [4 bytes: slot count]
//! [4 bytes: CRC32 of the payload]
//! [N bytes: payload = LZ4 (size-prepended) of the raw ItemStack array]
//! ```
//!
//! Slots are written as `#[repr(C)]` little-endian `u32` triples. Blobs
//! with fewer slots than the current inventory decode with the trailing
//! slots empty.

use lastlife_shared::{ByteReader, ByteWriter};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::error::{InventoryError, InventoryResult};
use crate::inventory::{Inventory, ItemStack, PLAYER_INVENTORY_SLOTS};

/// Magic bytes identifying an inventory snapshot.
const SNAPSHOT_MAGIC: &[u8; 4] = b"LLIV";

/// Current snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// Header length in bytes.
const HEADER_LEN: usize = 16;

/// Bytes per serialized slot.
const SLOT_BYTES: usize = std::mem::size_of::<ItemStack>();

/// What [`restore`] ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The snapshot was decoded and applied.
    Restored,
    /// There was no snapshot; the inventory was emptied.
    Missing,
    /// The snapshot could not be decoded; the inventory was emptied.
    Corrupt,
}

/// Serializes the full inventory into a snapshot blob.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn capture(inventory: &Inventory) -> Vec<u8> {
    let raw = bytemuck::cast_slice::<ItemStack, u8>(inventory.slots());
    let payload = compress_prepend_size(raw);

    let mut writer = ByteWriter::with_capacity(HEADER_LEN + payload.len());
    writer.put_raw(SNAPSHOT_MAGIC);
    writer.put_u32(SNAPSHOT_VERSION);
    writer.put_u32(inventory.slots().len() as u32);
    writer.put_u32(crc32fast::hash(&payload));
    writer.put_raw(&payload);
    writer.into_inner()
}

/// Decodes a snapshot blob into an inventory.
///
/// # Errors
///
/// Returns an error if the header is malformed, the checksum does not
/// match, or the payload does not hold the declared slots.
pub fn decode(blob: &[u8]) -> InventoryResult<Inventory> {
    if blob.len() < HEADER_LEN {
        return Err(InventoryError::SnapshotTruncated { len: blob.len() });
    }

    let mut reader = ByteReader::new(blob);
    let truncated = |_| InventoryError::SnapshotTruncated { len: blob.len() };

    if reader.take(4).map_err(truncated)? != SNAPSHOT_MAGIC {
        return Err(InventoryError::BadMagic);
    }
    let version = reader.get_u32().map_err(truncated)?;
    if version != SNAPSHOT_VERSION {
        return Err(InventoryError::UnsupportedVersion(version));
    }
    let slot_count = reader.get_u32().map_err(truncated)?;
    let stored_crc = reader.get_u32().map_err(truncated)?;
    let payload = reader.take(reader.remaining()).map_err(truncated)?;

    let computed = crc32fast::hash(payload);
    if computed != stored_crc {
        return Err(InventoryError::ChecksumMismatch {
            stored: stored_crc,
            computed,
        });
    }

    let raw = decompress_size_prepended(payload)
        .map_err(|e| InventoryError::Decompress(e.to_string()))?;

    let declared = slot_count as usize;
    if declared > PLAYER_INVENTORY_SLOTS || raw.len() != declared * SLOT_BYTES {
        return Err(InventoryError::SlotCountMismatch {
            declared: slot_count,
            actual: raw.len(),
        });
    }

    // The decompressed buffer carries no alignment guarantee.
    let slots: Vec<ItemStack> = raw
        .chunks_exact(SLOT_BYTES)
        .map(bytemuck::pod_read_unaligned::<ItemStack>)
        .collect();
    Inventory::from_slots(&slots)
}

/// Replaces the live inventory with the snapshot contents.
///
/// A missing or undecodable snapshot empties the inventory and logs a
/// warning; restoring never fails.
pub fn restore(blob: Option<&[u8]>, inventory: &mut Inventory) -> RestoreOutcome {
    let Some(blob) = blob else {
        tracing::warn!("no saved inventory to restore, clearing live inventory");
        inventory.clear();
        return RestoreOutcome::Missing;
    };

    match decode(blob) {
        Ok(saved) => {
            *inventory = saved;
            RestoreOutcome::Restored
        }
        Err(e) => {
            tracing::warn!(error = %e, "saved inventory is unreadable, clearing live inventory");
            inventory.clear();
            RestoreOutcome::Corrupt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> Inventory {
        let mut inv = Inventory::new();
        inv.add(1, 64, 64).unwrap();
        inv.add(276, 1, 1).unwrap();
        inv.set(40, ItemStack::with_meta(442, 1, 7)).unwrap();
        inv
    }

    #[test]
    fn test_capture_header() {
        let blob = capture(&loaded());
        assert_eq!(&blob[..4], SNAPSHOT_MAGIC);
        assert_eq!(u32::from_le_bytes(blob[4..8].try_into().unwrap()), SNAPSHOT_VERSION);
        assert_eq!(u32::from_le_bytes(blob[8..12].try_into().unwrap()), 41);
    }

    #[test]
    fn test_capture_decode_equal() {
        let inv = loaded();
        assert_eq!(decode(&capture(&inv)).unwrap(), inv);
    }

    #[test]
    fn test_empty_inventory_compresses() {
        let blob = capture(&Inventory::new());
        assert!(blob.len() < HEADER_LEN + PLAYER_INVENTORY_SLOTS * SLOT_BYTES);
        assert!(decode(&blob).unwrap().is_empty());
    }

    #[test]
    fn test_bad_magic() {
        let mut blob = capture(&loaded());
        blob[0] = b'X';
        assert_eq!(decode(&blob), Err(InventoryError::BadMagic));
    }

    #[test]
    fn test_unknown_version() {
        let mut blob = capture(&loaded());
        blob[4..8].copy_from_slice(&9u32.to_le_bytes());
        assert_eq!(decode(&blob), Err(InventoryError::UnsupportedVersion(9)));
    }

    #[test]
    fn test_flipped_payload_bit() {
        let mut blob = capture(&loaded());
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(matches!(decode(&blob), Err(InventoryError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(decode(b"LLIV"), Err(InventoryError::SnapshotTruncated { len: 4 }));
    }

    #[test]
    fn test_short_snapshot_pads_empty_slots() {
        let slots = [ItemStack::new(3, 5), ItemStack::new(4, 6)];
        let payload = compress_prepend_size(bytemuck::cast_slice::<ItemStack, u8>(&slots));
        let mut writer = ByteWriter::new();
        writer.put_raw(SNAPSHOT_MAGIC);
        writer.put_u32(SNAPSHOT_VERSION);
        writer.put_u32(2);
        writer.put_u32(crc32fast::hash(&payload));
        writer.put_raw(&payload);

        let inv = decode(&writer.into_inner()).unwrap();
        assert_eq!(inv.count_item(3), 5);
        assert_eq!(inv.count_item(4), 6);
        assert_eq!(inv.used_slots(), 2);
    }

    #[test]
    fn test_restore_outcomes() {
        let saved = loaded();
        let blob = capture(&saved);

        let mut live = Inventory::new();
        live.add(9, 3, 64).unwrap();
        assert_eq!(restore(Some(&blob), &mut live), RestoreOutcome::Restored);
        assert_eq!(live, saved);

        assert_eq!(restore(None, &mut live), RestoreOutcome::Missing);
        assert!(live.is_empty());

        live.add(9, 3, 64).unwrap();
        assert_eq!(restore(Some(b"garbage bytes here"), &mut live), RestoreOutcome::Corrupt);
        assert!(live.is_empty());
    }
}
