/// Trace output for the swap paths, printed only with the `debug` feature.
macro_rules! swap_debug {
    ($($arg:tt)*) => {
        if cfg!(feature = "debug") {
            vmswap_shared::println!($($arg)*);
        }
    };
}
