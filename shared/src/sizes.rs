pub const KB: usize = 1024;

/// Bytes per disk sector.
pub const SECTOR_SIZE: u32 = 512;
/// Sectors per disk track.
pub const TRACK_SECTORS: u32 = 16;
