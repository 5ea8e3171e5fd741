//! The page-table side of swapping.
//!
//! Page tables belong to the virtual memory manager. Swapping only ever needs to tell it that
//! a page has left physical memory.

use crate::process::Pid;
use core::fmt;

/// Index of a page within a process's virtual address space.
pub type PageNumber = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTableError {
    /// The process has no page table
    NoPageTable(Pid),
    /// The page lies outside the process's page table
    InvalidPage(PageNumber),
}

impl fmt::Display for PageTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPageTable(pid) => write!(f, "process {pid} has no page table"),
            Self::InvalidPage(page) => write!(f, "page {page} is not in the page table"),
        }
    }
}

impl core::error::Error for PageTableError {}

pub trait PageTables {
    /// Clear the resident bit of `page` in the page table of `pid`, so the next access to it
    /// faults.
    fn set_non_resident(&mut self, pid: Pid, page: PageNumber) -> Result<(), PageTableError>;
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::mem::FrameIndex;
    use std::collections::BTreeMap;
    use std::vec::Vec;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Pte {
        pub incore: bool,
        pub frame: FrameIndex,
    }

    /// One flat page table per process.
    #[derive(Default)]
    pub struct SimPageTables {
        tables: BTreeMap<Pid, Vec<Pte>>,
        /// Every (pid, page) passed to `set_non_resident`, in order.
        pub evicted: Vec<(Pid, PageNumber)>,
    }

    impl SimPageTables {
        pub fn create(&mut self, pid: Pid, pages: usize) {
            self.tables.insert(pid, vec![Pte::default(); pages]);
        }

        pub fn destroy(&mut self, pid: Pid) {
            self.tables.remove(&pid);
        }

        pub fn pte(&self, pid: Pid, page: PageNumber) -> Option<Pte> {
            self.tables.get(&pid)?.get(page).copied()
        }

        pub fn map(&mut self, pid: Pid, page: PageNumber, frame: FrameIndex) {
            let table = self.tables.get_mut(&pid).expect("no page table");
            table[page] = Pte { incore: true, frame };
        }
    }

    impl PageTables for SimPageTables {
        fn set_non_resident(&mut self, pid: Pid, page: PageNumber) -> Result<(), PageTableError> {
            let table = self
                .tables
                .get_mut(&pid)
                .ok_or(PageTableError::NoPageTable(pid))?;
            let pte = table
                .get_mut(page)
                .ok_or(PageTableError::InvalidPage(page))?;
            pte.incore = false;
            self.evicted.push((pid, page));
            Ok(())
        }
    }
}
