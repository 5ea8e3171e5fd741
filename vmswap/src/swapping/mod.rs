//! Moving pages between frames and the swap device.
//!
//! The page-fault handler calls [`Swapper::evict_frame`] when it needs a frame and none is
//! free, then [`Swapper::swap_in`] to fill the frame with the faulting page. When a process
//! exits it calls [`Swapper::free_all`] so its swap slots can be reused.

pub mod page_replacement;
pub mod swap_slot;


use crate::block::block_core::{Block, BlockSector};
use crate::block::block_error::BlockError;
use crate::mem::mmu::{Mmu, MmuError};
use crate::mem::{FrameEntry, FrameIndex, FrameTable, Occupant};
use crate::paging::{PageNumber, PageTableError, PageTables};
use crate::process::{is_valid_pid, Pid};
use core::fmt;
use page_replacement::{Clock, PageReplacementPolicy};
use spin::mutex::TicketMutex;
use swap_slot::{SlotIndex, SlotTable};
use vmswap_shared::mem::PhysAddr;
use vmswap_shared::println;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapError {
    /// `initialize` has not been called
    NotInitialized,
    /// `initialize` was already called
    AlreadyInitialized,
    /// The requested page or frame counts do not fit the MMU or the swap device
    InvalidConfig,
    /// Pid outside the process table
    InvalidPid(Pid),
    /// Page outside the address space
    InvalidPage(PageNumber),
    /// Frame outside the frame table
    InvalidFrame(FrameIndex),
    /// Every swap slot is taken
    OutOfSwap,
    /// No frame holds a page that could be evicted
    NoResidentFrames,
    /// The page is already recorded in this other frame
    AlreadyResident(FrameIndex),
    /// The swap device failed
    Block(BlockError),
    /// The MMU rejected a request
    Mmu(MmuError),
    /// The page table could not be updated
    PageTable(PageTableError),
}

impl SwapError {
    /// Whether the error came from a collaborator failing rather than from the request.
    ///
    /// After a fatal error the swap device or page tables may no longer agree with the
    /// swapper, so the host should stop paging instead of killing only the faulting process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Block(_) | Self::Mmu(_) | Self::PageTable(_))
    }
}

impl fmt::Display for SwapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "swap space not initialized"),
            Self::AlreadyInitialized => write!(f, "swap space already initialized"),
            Self::InvalidConfig => write!(f, "invalid swap configuration"),
            Self::InvalidPid(pid) => write!(f, "invalid pid {pid}"),
            Self::InvalidPage(page) => write!(f, "invalid page {page}"),
            Self::InvalidFrame(frame) => write!(f, "invalid frame {frame}"),
            Self::OutOfSwap => write!(f, "out of swap space"),
            Self::NoResidentFrames => write!(f, "no resident frame to evict"),
            Self::AlreadyResident(frame) => write!(f, "page already resident in frame {frame}"),
            Self::Block(err) => write!(f, "swap device: {err}"),
            Self::Mmu(err) => write!(f, "mmu: {err}"),
            Self::PageTable(err) => write!(f, "page table: {err}"),
        }
    }
}

impl core::error::Error for SwapError {}

impl From<BlockError> for SwapError {
    fn from(err: BlockError) -> Self {
        Self::Block(err)
    }
}

impl From<MmuError> for SwapError {
    fn from(err: MmuError) -> Self {
        Self::Mmu(err)
    }
}

impl From<PageTableError> for SwapError {
    fn from(err: PageTableError) -> Self {
        Self::PageTable(err)
    }
}

pub type Result<T> = core::result::Result<T, SwapError>;

/// Outcome of [`Swapper::swap_in`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapIn {
    /// The page was read back from its swap slot.
    Restored,
    /// The page has never been swapped out. The frame was left untouched and the caller has
    /// to initialize it.
    PageNotFound,
}

/// A swapper shared between fault handlers. One lock covers the slots, the frames and the
/// clock hand.
pub type SharedSwapper<M, P> = TicketMutex<Swapper<M, P>>;

struct SwapState {
    page_size: usize,
    num_pages: usize,
    frames: FrameTable,
    slots: SlotTable,
}

pub struct Swapper<M, P, R = Clock> {
    mmu: M,
    page_tables: P,
    device: Block,
    policy: R,
    /// `None` until `initialize`.
    state: Option<SwapState>,
}

impl<M: Mmu, P: PageTables> Swapper<M, P, Clock> {
    pub fn new(mmu: M, page_tables: P, device: Block) -> Self {
        Self::with_policy(mmu, page_tables, device, Clock::default())
    }
}

impl<M: Mmu, P: PageTables, R: PageReplacementPolicy> Swapper<M, P, R> {
    pub fn with_policy(mmu: M, page_tables: P, device: Block, policy: R) -> Self {
        Self {
            mmu,
            page_tables,
            device,
            policy,
            state: None,
        }
    }

    /// Set up the slot registry for the swap device and a frame table of `frames` frames, for
    /// processes of `pages` pages.
    ///
    /// Can only be called once.
    pub fn initialize(&mut self, pages: usize, frames: usize) -> Result<()> {
        if self.state.is_some() {
            return Err(SwapError::AlreadyInitialized);
        }

        let config = self.mmu.config()?;
        let (sector_size, device_sectors) = self.device.geometry();

        if pages == 0
            || pages > config.num_pages
            || frames == 0
            || frames > config.num_frames
            || config.page_size == 0
            || config.page_size % sector_size != 0
        {
            return Err(SwapError::InvalidConfig);
        }
        let sectors_per_page = BlockSector::try_from(config.page_size / sector_size)
            .map_err(|_| SwapError::InvalidConfig)?;
        let num_slots = (device_sectors / sectors_per_page) as usize;

        let state = SwapState {
            page_size: config.page_size,
            num_pages: pages,
            frames: FrameTable::new(frames, config.phys_base, config.page_size),
            slots: SlotTable::new(num_slots, sectors_per_page),
        };

        println!(
            "Swapping to \"{}\": {} slots of {} sectors, {} frames of {} bytes",
            self.device.get_name(),
            num_slots,
            sectors_per_page,
            frames,
            config.page_size,
        );

        self.state = Some(state);
        Ok(())
    }

    /// Choose a frame with the clock algorithm and write its page out to swap if needed.
    ///
    /// The page is written when it is dirty or has no slot yet; a clean page that already has
    /// a slot still has an up-to-date copy there. Afterwards the page is marked non-resident
    /// and the frame holds nothing until the next [`swap_in`](Self::swap_in) into it.
    ///
    /// Fails with [`SwapError::OutOfSwap`] if the page needs a slot and none is free. Nothing
    /// changes in that case and the frame still holds its page. The same holds when writing the
    /// page or updating the MMU or page tables fails: a slot claimed by this call is released.
    pub fn evict_frame(&mut self) -> Result<FrameIndex> {
        let state = self.state.as_mut().ok_or(SwapError::NotInitialized)?;

        let victim = self
            .policy
            .select_victim(&state.frames, &mut self.mmu)?
            .ok_or(SwapError::NoResidentFrames)?;
        let entry = state
            .frames
            .lookup(victim)
            .ok_or(SwapError::InvalidFrame(victim))?;
        let base = entry.base();
        let occupant = entry.occupant().ok_or(SwapError::InvalidFrame(victim))?;

        let bits = self.mmu.access(victim)?;

        let (slot, fresh) = match state.slots.find(occupant) {
            Some(slot) => (slot, false),
            None => {
                let Some(slot) = state.slots.find_free() else {
                    swap_debug!(
                        "evict: no slot for pid {} page {}",
                        occupant.pid,
                        occupant.page
                    );
                    return Err(SwapError::OutOfSwap);
                };
                state.slots.claim(slot, occupant);
                (slot, true)
            }
        };

        let stored = if bits.dirty() || fresh {
            write_page(
                &mut self.mmu,
                &mut self.device,
                &state.slots,
                slot,
                base,
                state.page_size,
            )
            .and_then(|()| {
                self.mmu
                    .set_access(victim, bits.clear_dirty())
                    .map_err(SwapError::from)
            })
        } else {
            Ok(())
        };
        let evicted = stored.and_then(|()| {
            self.page_tables
                .set_non_resident(occupant.pid, occupant.page)
                .map_err(SwapError::from)
        });
        if let Err(err) = evicted {
            if fresh {
                state.slots.release(slot);
            }
            return Err(err);
        }
        state.frames.vacate(victim);

        swap_debug!(
            "evict: frame {} pid {} page {} -> slot {} (dirty: {}, new slot: {})",
            victim,
            occupant.pid,
            occupant.page,
            slot,
            bits.dirty(),
            fresh
        );
        Ok(victim)
    }

    /// Record that `frame` now holds `page` of `pid`, and read the page back from swap if it
    /// was swapped out before.
    ///
    /// The frame table is updated even when the page is not found, so the frame becomes a
    /// candidate for eviction right away. A page can only be recorded in one frame at a time:
    /// if another frame still holds it, this fails with [`SwapError::AlreadyResident`] until
    /// that frame is evicted or released.
    pub fn swap_in(&mut self, pid: Pid, page: PageNumber, frame: FrameIndex) -> Result<SwapIn> {
        let state = self.state.as_mut().ok_or(SwapError::NotInitialized)?;

        if !is_valid_pid(pid) {
            return Err(SwapError::InvalidPid(pid));
        }
        if page >= state.num_pages {
            return Err(SwapError::InvalidPage(page));
        }
        let base = state
            .frames
            .lookup(frame)
            .ok_or(SwapError::InvalidFrame(frame))?
            .base();

        let occupant = Occupant { pid, page };
        if let Some(other) = state
            .frames
            .iter()
            .find(|e| e.index() != frame && e.occupant() == Some(occupant))
        {
            return Err(SwapError::AlreadyResident(other.index()));
        }
        state.frames.occupy(frame, occupant);

        let Some(slot) = state.slots.find(occupant) else {
            swap_debug!("swap in: pid {} page {} not in swap", pid, page);
            return Ok(SwapIn::PageNotFound);
        };

        read_page(
            &mut self.mmu,
            &mut self.device,
            &state.slots,
            slot,
            base,
            state.page_size,
        )?;

        swap_debug!(
            "swap in: pid {} page {} <- slot {} into frame {}",
            pid,
            page,
            slot,
            frame
        );
        Ok(SwapIn::Restored)
    }

    /// Release every swap slot held by `pid`. Returns how many were released.
    ///
    /// Frames are not touched; see [`release_frame`](Self::release_frame).
    pub fn free_all(&mut self, pid: Pid) -> Result<usize> {
        let state = self.state.as_mut().ok_or(SwapError::NotInitialized)?;
        if !is_valid_pid(pid) {
            return Err(SwapError::InvalidPid(pid));
        }

        let released = state.slots.release_pid(pid);
        swap_debug!("free all: pid {} released {} slots", pid, released);
        Ok(released)
    }

    /// Release the swap slot of a single page. Returns whether the page had one.
    pub fn free_page(&mut self, pid: Pid, page: PageNumber) -> Result<bool> {
        let state = self.state.as_mut().ok_or(SwapError::NotInitialized)?;
        if !is_valid_pid(pid) {
            return Err(SwapError::InvalidPid(pid));
        }

        Ok(match state.slots.find(Occupant { pid, page }) {
            Some(slot) => state.slots.release(slot).is_some(),
            None => false,
        })
    }

    /// Forget the page held by `frame`, e.g. after its process exited and the frame went back
    /// to the free pool. Returns the page it held.
    pub fn release_frame(&mut self, frame: FrameIndex) -> Result<Option<Occupant>> {
        let state = self.state.as_mut().ok_or(SwapError::NotInitialized)?;
        if frame >= state.frames.len() {
            return Err(SwapError::InvalidFrame(frame));
        }

        Ok(state.frames.vacate(frame))
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Number of slots on the swap device, once initialized.
    pub fn num_slots(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.slots.len())
    }

    /// Number of unused slots, once initialized.
    pub fn free_slots(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.slots.free_count())
    }

    /// The slot holding `page` of `pid`.
    pub fn slot_of(&self, pid: Pid, page: PageNumber) -> Option<SlotIndex> {
        self.state.as_ref()?.slots.find(Occupant { pid, page })
    }

    pub fn slots(&self) -> Option<&SlotTable> {
        self.state.as_ref().map(|s| &s.slots)
    }

    pub fn frame(&self, frame: FrameIndex) -> Option<&FrameEntry> {
        self.state.as_ref()?.frames.lookup(frame)
    }

    pub fn device(&self) -> &Block {
        &self.device
    }

    pub fn mmu(&self) -> &M {
        &self.mmu
    }

    pub fn mmu_mut(&mut self) -> &mut M {
        &mut self.mmu
    }

    pub fn page_tables(&self) -> &P {
        &self.page_tables
    }

    pub fn page_tables_mut(&mut self) -> &mut P {
        &mut self.page_tables
    }
}

/// Copy the frame at `base` to `slot`.
fn write_page<M: Mmu>(
    mmu: &mut M,
    device: &mut Block,
    slots: &SlotTable,
    slot: SlotIndex,
    base: PhysAddr,
    page_size: usize,
) -> Result<()> {
    let sector = slots
        .get(slot)
        .ok_or(BlockError::SectorOutOfBounds)?
        .sector();
    let memory = mmu.phys_mut(base, page_size)?;
    device.write_sectors(sector, slots.sectors_per_page(), memory)?;
    Ok(())
}

/// Copy `slot` into the frame at `base`.
fn read_page<M: Mmu>(
    mmu: &mut M,
    device: &mut Block,
    slots: &SlotTable,
    slot: SlotIndex,
    base: PhysAddr,
    page_size: usize,
) -> Result<()> {
    let sector = slots
        .get(slot)
        .ok_or(BlockError::SectorOutOfBounds)?
        .sector();
    let memory = mmu.phys_mut(base, page_size)?;
    device.read_sectors(sector, slots.sectors_per_page(), memory)?;
    Ok(())
}
