//! # Player Inventory
//!
//! Pre-allocated slots for a player's items: 36 storage slots, 4 armor
//! slots and the off hand. Slot layout is owned by the host; this type only
//! stores what is in each slot.

use bytemuck::{Pod, Zeroable};

use crate::error::{InventoryError, InventoryResult};

/// Unique identifier for an item type. `0` is reserved for "nothing".
pub type ItemId = u32;

/// Slots in a player inventory.
pub const PLAYER_INVENTORY_SLOTS: usize = 41;

/// A stack of items in an inventory slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct ItemStack {
    /// The item type ID, or 0 for empty slot.
    pub item_id: ItemId,
    /// Number of items in this stack.
    pub count: u32,
    /// Host-defined item data (damage, enchantment table index, ...).
    pub meta: u32,
}

impl ItemStack {
    /// Creates an empty item stack.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            item_id: 0,
            count: 0,
            meta: 0,
        }
    }

    /// Creates a new item stack.
    #[inline]
    #[must_use]
    pub const fn new(item_id: ItemId, count: u32) -> Self {
        Self {
            item_id,
            count,
            meta: 0,
        }
    }

    /// Creates a stack carrying item data.
    #[inline]
    #[must_use]
    pub const fn with_meta(item_id: ItemId, count: u32, meta: u32) -> Self {
        Self {
            item_id,
            count,
            meta,
        }
    }

    /// Returns true if this slot is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0 || self.item_id == 0
    }

    /// Clears this slot.
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::empty();
    }
}

/// A player's inventory.
///
/// All slots are allocated at creation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inventory {
    slots: [ItemStack; PLAYER_INVENTORY_SLOTS],
}

impl Inventory {
    /// Creates a new empty inventory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [ItemStack::empty(); PLAYER_INVENTORY_SLOTS],
        }
    }

    /// Builds an inventory from slot contents; missing trailing slots are
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::SlotOutOfRange` if more than
    /// [`PLAYER_INVENTORY_SLOTS`] slots are given.
    pub fn from_slots(slots: &[ItemStack]) -> InventoryResult<Self> {
        if slots.len() > PLAYER_INVENTORY_SLOTS {
            return Err(InventoryError::SlotOutOfRange(slots.len() - 1));
        }
        let mut inventory = Self::new();
        inventory.slots[..slots.len()].copy_from_slice(slots);
        Ok(inventory)
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        PLAYER_INVENTORY_SLOTS
    }

    /// All slots, in host order.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[ItemStack] {
        &self.slots
    }

    /// Number of non-empty slots.
    #[must_use]
    pub fn used_slots(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    /// Returns true if every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(ItemStack::is_empty)
    }

    /// Gets an item stack at a specific slot.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot)
    }

    /// Replaces the contents of one slot.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::SlotOutOfRange` for an invalid slot.
    pub fn set(&mut self, slot: usize, stack: ItemStack) -> InventoryResult<()> {
        let target = self
            .slots
            .get_mut(slot)
            .ok_or(InventoryError::SlotOutOfRange(slot))?;
        *target = stack;
        Ok(())
    }

    /// Counts the total number of a specific item across all slots.
    #[must_use]
    pub fn count_item(&self, item_id: ItemId) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.item_id == item_id)
            .map(|s| s.count)
            .sum()
    }

    /// Finds the first empty slot.
    #[must_use]
    pub fn find_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(ItemStack::is_empty)
    }

    /// Adds items, stacking onto existing stacks first.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InventoryFull` if there's no space. Items
    /// placed before the inventory filled up stay placed.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add(&mut self, item_id: ItemId, count: u32, max_stack: u32) -> InventoryResult<()> {
        let max_stack = max_stack.max(1);
        let mut remaining = count;

        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            if slot.item_id == item_id && slot.count > 0 && slot.count < max_stack {
                let can_add = (max_stack - slot.count).min(remaining);
                slot.count += can_add;
                remaining -= can_add;
            }
        }

        while remaining > 0 {
            let Some(slot_idx) = self.find_empty_slot() else {
                return Err(InventoryError::InventoryFull {
                    capacity: PLAYER_INVENTORY_SLOTS as u32,
                    amount: remaining,
                });
            };
            let add_count = remaining.min(max_stack);
            self.slots[slot_idx] = ItemStack::new(item_id, add_count);
            remaining -= add_count;
        }

        Ok(())
    }

    /// Removes items, draining slots front to back.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InsufficientItems` if not enough items; the
    /// inventory is left untouched in that case.
    pub fn remove(&mut self, item_id: ItemId, count: u32) -> InventoryResult<()> {
        let available = self.count_item(item_id);
        if available < count {
            return Err(InventoryError::InsufficientItems {
                item_id,
                required: count,
                available,
            });
        }

        let mut remaining = count;
        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            if slot.item_id == item_id {
                let remove_count = slot.count.min(remaining);
                slot.count -= remove_count;
                remaining -= remove_count;
                if slot.count == 0 {
                    slot.clear();
                }
            }
        }

        Ok(())
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots = [ItemStack::empty(); PLAYER_INVENTORY_SLOTS];
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_items() {
        let mut inv = Inventory::new();
        inv.add(1, 10, 64).unwrap();
        assert_eq!(inv.count_item(1), 10);
        assert_eq!(inv.used_slots(), 1);
    }

    #[test]
    fn test_add_stacking() {
        let mut inv = Inventory::new();
        inv.add(1, 64, 64).unwrap();
        inv.add(1, 10, 64).unwrap();
        assert_eq!(inv.count_item(1), 74);
        assert_eq!(inv.used_slots(), 2);
    }

    #[test]
    fn test_add_full() {
        let mut inv = Inventory::new();
        // Unstackable tools fill every slot.
        inv.add(7, PLAYER_INVENTORY_SLOTS as u32, 1).unwrap();
        let result = inv.add(8, 1, 64);
        assert_eq!(result, Err(InventoryError::InventoryFull { capacity: 41, amount: 1 }));
    }

    #[test]
    fn test_remove_insufficient_leaves_inventory() {
        let mut inv = Inventory::new();
        inv.add(1, 10, 64).unwrap();
        let before = inv.clone();
        let result = inv.remove(1, 20);
        assert!(matches!(result, Err(InventoryError::InsufficientItems { .. })));
        assert_eq!(inv, before);
    }

    #[test]
    fn test_remove_frees_slots() {
        let mut inv = Inventory::new();
        inv.add(1, 100, 64).unwrap();
        inv.remove(1, 64).unwrap();
        assert_eq!(inv.count_item(1), 36);
        assert_eq!(inv.used_slots(), 1);
    }

    #[test]
    fn test_set_and_clear() {
        let mut inv = Inventory::new();
        inv.set(40, ItemStack::with_meta(442, 1, 3)).unwrap();
        assert_eq!(inv.get(40), Some(&ItemStack::with_meta(442, 1, 3)));
        assert_eq!(inv.set(41, ItemStack::new(1, 1)), Err(InventoryError::SlotOutOfRange(41)));
        inv.clear();
        assert!(inv.is_empty());
    }

    #[test]
    fn test_from_slots() {
        let inv = Inventory::from_slots(&[ItemStack::new(5, 2), ItemStack::empty(), ItemStack::new(6, 1)]).unwrap();
        assert_eq!(inv.count_item(5), 2);
        assert_eq!(inv.get(2), Some(&ItemStack::new(6, 1)));
        assert!(inv.get(3).unwrap().is_empty());

        let too_many = vec![ItemStack::new(1, 1); PLAYER_INVENTORY_SLOTS + 1];
        assert!(Inventory::from_slots(&too_many).is_err());
    }
}
