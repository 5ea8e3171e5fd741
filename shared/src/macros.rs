#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::console::_print($crate::console::Stream::Out, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($arg:tt)*) => {
        $crate::console::_print(
            $crate::console::Stream::Out,
            format_args!("{}\n", format_args!($($arg)*)),
        )
    };
}

#[macro_export]
macro_rules! eprint {
    ($($arg:tt)*) => {
        $crate::console::_print($crate::console::Stream::Err, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! eprintln {
    () => {
        $crate::eprint!("\n")
    };
    ($($arg:tt)*) => {
        $crate::console::_print(
            $crate::console::Stream::Err,
            format_args!("{}\n", format_args!($($arg)*)),
        )
    };
}
