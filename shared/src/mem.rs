use crate::sizes::KB;

// Page size is 4KB. This is a property of x86 processors.
pub const PAGE_FRAME_SIZE: usize = 4 * KB;

/// A physical address.
pub type PhysAddr = usize;

/// Physical address of frame `frame` in a region of `page_size` frames starting at `base`.
#[inline]
pub const fn frame_address(base: PhysAddr, frame: usize, page_size: usize) -> PhysAddr {
    base + frame * page_size
}
