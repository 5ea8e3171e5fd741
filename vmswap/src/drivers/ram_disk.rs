use crate::block::block_core::{BlockOp, BlockSector, BLOCK_SECTOR_SIZE};
use crate::block::block_error::BlockError;
use alloc::{vec, vec::Vec};
use core::ops::Range;
use vmswap_shared::sizes::TRACK_SECTORS;

/// A block device held entirely in memory. Contents start zeroed and are lost on drop.
pub struct RamDisk {
    data: Vec<u8>,
    sectors: BlockSector,
}

impl RamDisk {
    pub fn new(sectors: BlockSector) -> Self {
        Self {
            data: vec![0; sectors as usize * BLOCK_SECTOR_SIZE],
            sectors,
        }
    }

    /// A disk of `tracks` tracks of `TRACK_SECTORS` sectors each.
    pub fn with_tracks(tracks: u32) -> Self {
        Self::new(tracks * TRACK_SECTORS)
    }

    pub fn sectors(&self) -> BlockSector {
        self.sectors
    }

    fn byte_range(&self, sector: BlockSector, len: usize) -> Result<Range<usize>, BlockError> {
        if sector >= self.sectors {
            return Err(BlockError::SectorOutOfBounds);
        }
        if len != BLOCK_SECTOR_SIZE {
            return Err(BlockError::BufferInvalid);
        }
        let start = sector as usize * BLOCK_SECTOR_SIZE;
        Ok(start..start + BLOCK_SECTOR_SIZE)
    }
}

impl BlockOp for RamDisk {
    fn read(&mut self, sector: BlockSector, buf: &mut [u8]) -> Result<(), BlockError> {
        let range = self.byte_range(sector, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, sector: BlockSector, buf: &[u8]) -> Result<(), BlockError> {
        let range = self.byte_range(sector, buf.len())?;
        self.data[range].copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tracks_are_sixteen_sectors() {
        assert_eq!(RamDisk::with_tracks(10).sectors(), 160);
        assert_eq!(RamDisk::new(3).sectors(), 3);
    }

    #[test]
    fn sectors_do_not_overlap() {
        let mut disk = RamDisk::new(4);
        disk.write(1, &[0x11; BLOCK_SECTOR_SIZE]).unwrap();
        disk.write(2, &[0x22; BLOCK_SECTOR_SIZE]).unwrap();

        let mut buf = [0u8; BLOCK_SECTOR_SIZE];
        disk.read(1, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0x11));
        disk.read(3, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn driver_checks_its_own_bounds() {
        let mut disk = RamDisk::new(2);
        let mut buf = [0u8; BLOCK_SECTOR_SIZE];
        assert_eq!(disk.read(2, &mut buf), Err(BlockError::SectorOutOfBounds));
        assert_eq!(disk.write(0, &buf[1..]), Err(BlockError::BufferInvalid));
    }
}
