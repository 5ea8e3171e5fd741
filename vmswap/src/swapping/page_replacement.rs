use crate::mem::mmu::{Mmu, MmuError};
use crate::mem::{FrameIndex, FrameTable};

pub trait PageReplacementPolicy {
    /// Pick an occupied frame to evict.
    ///
    /// Returns `Ok(None)` if no frame in `frames` holds a page. Frames without a page are never
    /// picked and their usage bits are left alone.
    fn select_victim<M: Mmu + ?Sized>(
        &mut self,
        frames: &FrameTable,
        mmu: &mut M,
    ) -> Result<Option<FrameIndex>, MmuError>;
}

/// Second-chance replacement.
///
/// The hand sweeps the frames in order and keeps its position between calls. A frame whose
/// referenced bit is set has the bit cleared and is passed over once; the first frame found
/// with the bit clear is the victim.
#[derive(Debug, Default)]
pub struct Clock {
    /// The next frame to look at.
    hand: FrameIndex,
}

impl Clock {
    pub fn hand(&self) -> FrameIndex {
        self.hand
    }
}

impl PageReplacementPolicy for Clock {
    fn select_victim<M: Mmu + ?Sized>(
        &mut self,
        frames: &FrameTable,
        mmu: &mut M,
    ) -> Result<Option<FrameIndex>, MmuError> {
        let num_frames = frames.len();
        if frames.occupied_count() == 0 {
            return Ok(None);
        }

        // The first sweep clears every referenced bit it passes, so the second one must stop.
        for _ in 0..2 * num_frames {
            let frame = self.hand % num_frames;
            self.hand = (frame + 1) % num_frames;

            if !frames.is_occupied(frame) {
                continue;
            }

            let bits = mmu.access(frame)?;
            if !bits.referenced() {
                return Ok(Some(frame));
            }
            mmu.set_access(frame, bits.clear_referenced())?;
        }

        Ok(None)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mem::mmu::test::SimMmu;
    use crate::mem::mmu::AccessBits;
    use crate::mem::Occupant;

    fn full_table(frames: usize) -> FrameTable {
        let mut table = FrameTable::new(frames, SimMmu::PHYS_BASE, 64);
        for frame in 0..frames {
            table.occupy(frame, Occupant { pid: 1, page: frame });
        }
        table
    }

    #[test]
    fn unreferenced_frames_go_in_hand_order() {
        let table = full_table(3);
        let mut mmu = SimMmu::new(64, 8, 3);
        let mut clock = Clock::default();

        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(0)));
        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(1)));
        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(2)));
        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(0)));
    }

    #[test]
    fn referenced_frames_get_a_second_chance() {
        let table = full_table(4);
        let mut mmu = SimMmu::new(64, 8, 4);
        let mut clock = Clock::default();

        mmu.write(0, 0, 1);
        mmu.read(1, 0);

        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(2)));
        assert_eq!(clock.hand(), 3);

        // Only the referenced bit is cleared on the way past.
        let frame0 = mmu.access(0).unwrap();
        assert!(!frame0.referenced());
        assert!(frame0.dirty());
        assert_eq!(mmu.access(1).unwrap(), AccessBits::default());
    }

    #[test]
    fn all_referenced_takes_a_full_sweep() {
        let table = full_table(3);
        let mut mmu = SimMmu::new(64, 8, 3);
        let mut clock = Clock::default();
        for frame in 0..3 {
            mmu.read(frame, 0);
        }

        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(0)));
        assert_eq!(clock.hand(), 1);
        assert!((0..3).all(|f| !mmu.access(f).unwrap().referenced()));
    }

    #[test]
    fn hand_survives_between_calls() {
        let table = full_table(3);
        let mut mmu = SimMmu::new(64, 8, 3);
        let mut clock = Clock::default();

        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(0)));

        // Frame 0 is touched again after being picked, frame 1 is not. Starting from the
        // hand, frame 1 is found before the sweep ever returns to frame 0.
        mmu.read(0, 0);
        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(1)));
        assert!(mmu.access(0).unwrap().referenced());
    }

    #[test]
    fn empty_frames_are_skipped() {
        let mut table = full_table(3);
        table.vacate(0);
        table.vacate(1);
        let mut mmu = SimMmu::new(64, 8, 3);
        mmu.read(0, 0);

        let mut clock = Clock::default();
        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(2)));
        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(Some(2)));

        // The empty frame's bits were never looked at.
        assert!(mmu.access(0).unwrap().referenced());

        table.vacate(2);
        assert_eq!(clock.select_victim(&table, &mut mmu), Ok(None));
    }
}
