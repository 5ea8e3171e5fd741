pub mod frame_table;
pub mod mmu;

pub use frame_table::{FrameEntry, FrameIndex, FrameTable, Occupant};
