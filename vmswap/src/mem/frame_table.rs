use crate::paging::PageNumber;
use crate::process::Pid;
use alloc::boxed::Box;
use vmswap_shared::mem::{frame_address, PhysAddr};

/// Index of a physical frame.
pub type FrameIndex = usize;

/// The page held by a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Occupant {
    pub pid: Pid,
    pub page: PageNumber,
}

#[derive(Clone, Copy, Debug)]
pub struct FrameEntry {
    index: FrameIndex,
    base: PhysAddr,
    occupant: Option<Occupant>,
}

impl FrameEntry {
    pub fn index(&self) -> FrameIndex {
        self.index
    }

    /// Physical address of the first byte of the frame.
    pub fn base(&self) -> PhysAddr {
        self.base
    }

    /// The page resident in this frame, if any.
    pub fn occupant(&self) -> Option<Occupant> {
        self.occupant
    }
}

/// Occupancy of every frame the swapper may evict from.
///
/// Entries are created once and never reallocated; only their occupant changes.
pub struct FrameTable {
    entries: Box<[FrameEntry]>,
}

impl FrameTable {
    /// Frames `0..frame_count`, laid out contiguously from `phys_base`, all free.
    pub fn new(frame_count: usize, phys_base: PhysAddr, page_size: usize) -> Self {
        let entries = (0..frame_count)
            .map(|index| FrameEntry {
                index,
                base: frame_address(phys_base, index, page_size),
                occupant: None,
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, frame: FrameIndex) -> Option<&FrameEntry> {
        self.entries.get(frame)
    }

    /// Record that `frame` now holds `occupant`. Returns the previous occupant.
    ///
    /// Panics if `frame` is out of range.
    pub fn occupy(&mut self, frame: FrameIndex, occupant: Occupant) -> Option<Occupant> {
        self.entries[frame].occupant.replace(occupant)
    }

    /// Record that `frame` holds nothing. Returns the previous occupant.
    ///
    /// Panics if `frame` is out of range.
    pub fn vacate(&mut self, frame: FrameIndex) -> Option<Occupant> {
        self.entries[frame].occupant.take()
    }

    pub fn is_occupied(&self, frame: FrameIndex) -> bool {
        self.entries
            .get(frame)
            .is_some_and(|entry| entry.occupant.is_some())
    }

    pub fn occupied_count(&self) -> usize {
        self.entries.iter().filter(|e| e.occupant.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frames_are_laid_out_from_base() {
        let table = FrameTable::new(4, 0x10_0000, 4096);

        assert_eq!(table.len(), 4);
        assert_eq!(table.lookup(0).unwrap().base(), 0x10_0000);
        assert_eq!(table.lookup(3).unwrap().base(), 0x10_3000);
        assert_eq!(table.lookup(3).unwrap().index(), 3);
        assert!(table.lookup(4).is_none());
        assert!(table.iter().all(|e| e.occupant().is_none()));
    }

    #[test]
    fn occupy_and_vacate() {
        let mut table = FrameTable::new(2, 0, 4096);
        let first = Occupant { pid: 3, page: 7 };
        let second = Occupant { pid: 4, page: 7 };

        assert_eq!(table.occupy(1, first), None);
        assert!(table.is_occupied(1));
        assert!(!table.is_occupied(0));
        assert!(!table.is_occupied(9));

        assert_eq!(table.occupy(1, second), Some(first));
        assert_eq!(table.occupied_count(), 1);

        assert_eq!(table.vacate(1), Some(second));
        assert_eq!(table.vacate(1), None);
        assert_eq!(table.occupied_count(), 0);
    }
}
