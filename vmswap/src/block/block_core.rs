use crate::block::block_error::BlockError;
use alloc::{boxed::Box, string::String};
use core::fmt;
use vmswap_shared::println;
use vmswap_shared::sizes::SECTOR_SIZE;

/// Size of a block device sector in bytes.
///
/// All IDE disks use this sector size, as do most USB and SCSI disks.
pub const BLOCK_SECTOR_SIZE: usize = SECTOR_SIZE as usize;

/// Index of a block device sector.
///
/// Good enough for devices up to 2 TB.
pub type BlockSector = u32;

/// Types of blocks
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum BlockType {
    /// Swap
    Swap,
    /// Owned by another operating system, never written
    Foreign,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BlockType::Swap => write!(f, "Swap"),
            BlockType::Foreign => write!(f, "Foreign"),
        }
    }
}

/// Lower-level interface to block device drivers.
///
/// `buf` is always exactly `BLOCK_SECTOR_SIZE` bytes and `sector` is always within the
/// device; [`Block`] checks both before calling into the driver.
pub trait BlockOp: Send {
    /// Read a block sector
    fn read(&mut self, sector: BlockSector, buf: &mut [u8]) -> Result<(), BlockError>;
    /// Write a block sector
    fn write(&mut self, sector: BlockSector, buf: &[u8]) -> Result<(), BlockError>;
}

/// A block device
pub struct Block {
    /// The name of the block device
    block_name: String,

    /// The type of block
    block_type: BlockType,
    /// The block driver
    driver: Box<dyn BlockOp>,

    /// The size of the block device in sectors
    block_size: BlockSector,

    /// Number of sectors read
    read_count: u32,
    /// Number of sectors written
    write_count: u32,
}

impl Block {
    pub fn new(
        block_type: BlockType,
        block_name: &str,
        block_size: BlockSector,
        driver: Box<dyn BlockOp>,
    ) -> Self {
        println!(
            "Registered block device \"{}\" ({} type) with {} sectors",
            block_name, block_type, block_size,
        );

        Block {
            block_name: String::from(block_name),
            block_type,
            driver,
            block_size,
            read_count: 0,
            write_count: 0,
        }
    }

    /// Verifies that `buf` holds exactly `sectors` sectors.
    fn verify_buffer(buf: &[u8], sectors: BlockSector) -> Result<(), BlockError> {
        if buf.len() != sectors as usize * BLOCK_SECTOR_SIZE {
            return Err(BlockError::BufferInvalid);
        }
        Ok(())
    }

    /// Verifies that `count` sectors starting at `start` lie within the block device.
    fn check_range(&self, start: BlockSector, count: BlockSector) -> Result<(), BlockError> {
        match start.checked_add(count) {
            Some(end) if end <= self.block_size => Ok(()),
            _ => Err(BlockError::SectorOutOfBounds),
        }
    }

    /// Reads sector `sector` from the block device into `buf`, which must have room for
    /// `BLOCK_SECTOR_SIZE` bytes.
    pub fn read(&mut self, sector: BlockSector, buf: &mut [u8]) -> Result<(), BlockError> {
        self.read_sectors(sector, 1, buf)
    }

    /// Writes sector `sector` from `buf`, which must contain `BLOCK_SECTOR_SIZE` bytes. Returns
    /// after the block device has acknowledged receiving the data.
    pub fn write(&mut self, sector: BlockSector, buf: &[u8]) -> Result<(), BlockError> {
        self.write_sectors(sector, 1, buf)
    }

    /// Reads `count` consecutive sectors starting at `start` into `buf`, which must be
    /// exactly `count * BLOCK_SECTOR_SIZE` bytes long.
    pub fn read_sectors(
        &mut self,
        start: BlockSector,
        count: BlockSector,
        buf: &mut [u8],
    ) -> Result<(), BlockError> {
        self.check_range(start, count)?;
        Self::verify_buffer(buf, count)?;

        for (sector, chunk) in (start..).zip(buf.chunks_exact_mut(BLOCK_SECTOR_SIZE)) {
            self.driver.read(sector, chunk)?;
            self.read_count += 1;
        }
        Ok(())
    }

    /// Writes `count` consecutive sectors starting at `start` from `buf`, which must be
    /// exactly `count * BLOCK_SECTOR_SIZE` bytes long.
    pub fn write_sectors(
        &mut self,
        start: BlockSector,
        count: BlockSector,
        buf: &[u8],
    ) -> Result<(), BlockError> {
        if self.block_type == BlockType::Foreign {
            return Err(BlockError::ReadOnly);
        }
        self.check_range(start, count)?;
        Self::verify_buffer(buf, count)?;

        for (sector, chunk) in (start..).zip(buf.chunks_exact(BLOCK_SECTOR_SIZE)) {
            self.driver.write(sector, chunk)?;
            self.write_count += 1;
        }
        Ok(())
    }

    /// Sector size in bytes and device size in sectors.
    pub fn geometry(&self) -> (usize, BlockSector) {
        (BLOCK_SECTOR_SIZE, self.block_size)
    }

    // Block getters -----------------------------------------------------------

    pub fn get_name(&self) -> &str {
        &self.block_name
    }
    pub fn read_count(&self) -> u32 {
        self.read_count
    }
    pub fn write_count(&self) -> u32 {
        self.write_count
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\"{}\" ({}): {:04} sectors, {} reads, {} writes",
            self.block_name, self.block_type, self.block_size, self.read_count, self.write_count
        )
    }
}
