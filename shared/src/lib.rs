#![cfg_attr(target_os = "none", no_std)]

extern crate alloc;

pub mod console;
pub mod macros;
pub mod mem;
pub mod sizes;
