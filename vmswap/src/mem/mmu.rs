//! The memory management unit as seen by the swapper.

use crate::mem::FrameIndex;
use arbitrary_int::u2;
use bitbybit::bitfield;
use core::fmt;
use vmswap_shared::mem::PhysAddr;

/// Hardware-maintained usage bits of a frame.
///
/// The hardware encodes these as a two-bit integer: bit 0 is set when the frame is read or
/// written, bit 1 when it is written.
#[bitfield(u8, default = 0)]
pub struct AccessBits {
    #[bit(0, rw)]
    referenced: bool,
    #[bit(1, rw)]
    dirty: bool,
}

impl AccessBits {
    pub const fn from_encoded(value: u2) -> Self {
        Self::new_with_raw_value(value.value())
    }

    pub const fn encoded(self) -> u2 {
        u2::new(self.raw_value() & 0b11)
    }

    /// These bits with the referenced bit cleared. The dirty bit is kept.
    pub const fn clear_referenced(self) -> Self {
        self.with_referenced(false)
    }

    /// These bits with the dirty bit cleared. The referenced bit is kept.
    pub const fn clear_dirty(self) -> Self {
        self.with_dirty(false)
    }
}

impl PartialEq for AccessBits {
    fn eq(&self, other: &Self) -> bool {
        self.raw_value() == other.raw_value()
    }
}

impl Eq for AccessBits {}

impl fmt::Debug for AccessBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessBits")
            .field("referenced", &self.referenced())
            .field("dirty", &self.dirty())
            .finish()
    }
}

/// Layout of the paged region, queried once when swapping is initialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MmuConfig {
    /// Bytes per page and per frame
    pub page_size: usize,
    /// Pages in each process's address space
    pub num_pages: usize,
    /// Frames of physical memory
    pub num_frames: usize,
    /// Physical address of frame 0
    pub phys_base: PhysAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmuError {
    /// The MMU has not been set up
    Off,
    /// Frame number out of range
    InvalidFrame(FrameIndex),
    /// Physical range outside of memory
    InvalidAddress(PhysAddr),
}

impl fmt::Display for MmuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "MMU is not initialized"),
            Self::InvalidFrame(frame) => write!(f, "invalid frame {frame}"),
            Self::InvalidAddress(addr) => write!(f, "invalid physical address {addr:#x}"),
        }
    }
}

impl core::error::Error for MmuError {}

pub trait Mmu {
    fn config(&self) -> Result<MmuConfig, MmuError>;

    /// Current usage bits of `frame`.
    fn access(&self, frame: FrameIndex) -> Result<AccessBits, MmuError>;

    /// Overwrite the usage bits of `frame`.
    fn set_access(&mut self, frame: FrameIndex, bits: AccessBits) -> Result<(), MmuError>;

    /// The `len` bytes of physical memory starting at `base`.
    ///
    /// Swapping reads and writes whole frames through this; it must not change any frame's
    /// usage bits.
    fn phys_mut(&mut self, base: PhysAddr, len: usize) -> Result<&mut [u8], MmuError>;
}
