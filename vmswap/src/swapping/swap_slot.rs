use crate::block::block_core::BlockSector;
use crate::mem::Occupant;
use crate::process::Pid;
use alloc::boxed::Box;

/// Index of a page-sized slot on the swap device.
pub type SlotIndex = usize;

/// One page-sized region of the swap device.
#[derive(Clone, Copy, Debug)]
pub struct SwapSlot {
    /// First sector of the slot on the swap device
    sector: BlockSector,
    /// The page stored here, or `None` if the slot is free
    owner: Option<Occupant>,
}

impl SwapSlot {
    pub fn sector(&self) -> BlockSector {
        self.sector
    }

    pub fn owner(&self) -> Option<Occupant> {
        self.owner
    }

    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }
}

/// Ownership of every slot on the swap device.
///
/// Slot `i` covers sectors `i * sectors_per_page .. (i + 1) * sectors_per_page`. The table is
/// sized once and only the owners change afterwards. Nothing about ownership is stored on the
/// device itself.
pub struct SlotTable {
    slots: Box<[SwapSlot]>,
    sectors_per_page: BlockSector,
}

impl SlotTable {
    pub fn new(num_slots: usize, sectors_per_page: BlockSector) -> Self {
        let slots = (0..)
            .step_by(sectors_per_page as usize)
            .take(num_slots)
            .map(|sector| SwapSlot {
                sector,
                owner: None,
            })
            .collect();

        Self {
            slots,
            sectors_per_page,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn sectors_per_page(&self) -> BlockSector {
        self.sectors_per_page
    }

    pub fn get(&self, slot: SlotIndex) -> Option<&SwapSlot> {
        self.slots.get(slot)
    }

    /// The slot holding `page`, if it has one.
    pub fn find(&self, page: Occupant) -> Option<SlotIndex> {
        self.slots.iter().position(|s| s.owner == Some(page))
    }

    /// The lowest-numbered free slot.
    pub fn find_free(&self) -> Option<SlotIndex> {
        self.slots.iter().position(SwapSlot::is_free)
    }

    /// Give the free slot `slot` to `page`.
    ///
    /// Panics if the slot is taken or out of range.
    pub fn claim(&mut self, slot: SlotIndex, page: Occupant) {
        let entry = &mut self.slots[slot];
        assert!(entry.is_free(), "swap slot {slot} is already taken");
        entry.owner = Some(page);
    }

    /// Mark `slot` free. Returns the page it held.
    pub fn release(&mut self, slot: SlotIndex) -> Option<Occupant> {
        self.slots.get_mut(slot)?.owner.take()
    }

    /// Mark every slot owned by `pid` free. Returns how many were released.
    pub fn release_pid(&mut self, pid: Pid) -> usize {
        let mut released = 0;
        for slot in self.slots.iter_mut() {
            if slot.owner.is_some_and(|o| o.pid == pid) {
                slot.owner = None;
                released += 1;
            }
        }
        released
    }

    pub fn free_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_free()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SwapSlot> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn page(pid: Pid, page: usize) -> Occupant {
        Occupant { pid, page }
    }

    #[test]
    fn slots_are_contiguous_page_sized_runs() {
        let table = SlotTable::new(20, 8);

        assert_eq!(table.len(), 20);
        assert_eq!(table.get(0).unwrap().sector(), 0);
        assert_eq!(table.get(1).unwrap().sector(), 8);
        assert_eq!(table.get(19).unwrap().sector(), 152);
        assert_eq!(table.free_count(), 20);
        assert!(table.get(20).is_none());
    }

    #[test]
    fn claim_first_free_and_find_by_owner_and_page() {
        let mut table = SlotTable::new(3, 8);

        let slot = table.find_free().unwrap();
        table.claim(slot, page(1, 4));
        assert_eq!(slot, 0);

        // Same page number, different process.
        let slot = table.find_free().unwrap();
        table.claim(slot, page(2, 4));
        assert_eq!(slot, 1);

        assert_eq!(table.find(page(1, 4)), Some(0));
        assert_eq!(table.find(page(2, 4)), Some(1));
        assert_eq!(table.find(page(3, 4)), None);
        assert_eq!(table.free_count(), 1);
    }

    #[test]
    #[should_panic(expected = "already taken")]
    fn claiming_a_taken_slot_panics() {
        let mut table = SlotTable::new(1, 8);
        table.claim(0, page(1, 0));
        table.claim(0, page(1, 1));
    }

    #[test]
    fn release_by_slot_and_by_pid() {
        let mut table = SlotTable::new(4, 8);
        table.claim(0, page(1, 0));
        table.claim(1, page(2, 0));
        table.claim(2, page(1, 5));
        table.claim(3, page(1, 6));

        assert_eq!(table.release(3), Some(page(1, 6)));
        assert_eq!(table.release(3), None);
        assert_eq!(table.release(99), None);

        assert_eq!(table.release_pid(1), 2);
        assert_eq!(table.release_pid(1), 0);
        assert_eq!(table.find(page(2, 0)), Some(1));
        assert_eq!(table.find_free(), Some(0));
        assert_eq!(table.free_count(), 3);
    }
}
