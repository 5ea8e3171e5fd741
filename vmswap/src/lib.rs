//! Swap management for a demand-paged virtual memory system.
//!
//! [`Swapper`] owns the swap device's slot registry and the frame table, picks eviction
//! victims with the clock algorithm, and moves pages between frames and the swap device.
//! The page-fault handler that drives it, the MMU and the page tables are supplied by the
//! host through the [`Mmu`] and [`PageTables`] traits.

#![cfg_attr(target_os = "none", no_std)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod block;
pub mod drivers;
pub mod mem;
pub mod paging;
pub mod process;
pub mod swapping;

pub use mem::mmu::{AccessBits, Mmu, MmuConfig, MmuError};
pub use paging::{PageTableError, PageTables};
pub use swapping::{SharedSwapper, SwapError, SwapIn, Swapper};
