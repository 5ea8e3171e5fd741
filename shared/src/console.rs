//! Console sink behind the `print!` family of macros.
//!
//! The host installs its console once during startup. Until then, hosted builds write to
//! standard error and bare-metal builds drop the output.

use alloc::boxed::Box;
use core::fmt;
use once_cell::race::OnceBox;

/// Which macro family produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    /// `print!` / `println!`
    Out,
    /// `eprint!` / `eprintln!`
    Err,
}

/// A destination for console output, e.g. a serial port or a video memory writer.
pub trait Console: Send + Sync {
    fn write_args(&self, stream: Stream, args: fmt::Arguments);
}

static CONSOLE: OnceBox<Box<dyn Console>> = OnceBox::new();

/// Install the console used by the printing macros.
///
/// Returns `false` if a console was already installed; the first one stays in place.
pub fn set_console(console: Box<dyn Console>) -> bool {
    CONSOLE.set(Box::new(console)).is_ok()
}

#[doc(hidden)]
pub fn _print(stream: Stream, args: fmt::Arguments) {
    match CONSOLE.get() {
        Some(console) => console.write_args(stream, args),
        None => fallback(stream, args),
    }
}

#[cfg(not(target_os = "none"))]
fn fallback(_stream: Stream, args: fmt::Arguments) {
    std::eprint!("{args}");
}

#[cfg(target_os = "none")]
fn fallback(_stream: Stream, _args: fmt::Arguments) {}
