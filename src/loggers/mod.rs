// src/loggers/mod.rs

pub mod builder;
pub mod console;
pub mod core;
pub mod printer;

pub use builder::{Logger, LoggerBuilder};
pub use console::ConsolePrinter;
pub use self::core::{CallSite, Level, Metadata, MetadataKey, MetadataValue};
pub use printer::Printer;

/// Captures the file, enclosing function and line of the expansion site.
#[macro_export]
macro_rules! call_site {
    () => {{
        fn __logmo_here() {}
        fn __logmo_type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::loggers::core::CallSite::new(
            file!(),
            $crate::loggers::core::function_name(__logmo_type_name_of(__logmo_here)),
            line!(),
        )
    }};
}

#[macro_export]
macro_rules! log_base {
    // No kv pairs
    ($logger:expr, $level:expr, $msg:expr) => {
        $crate::log_base!($logger, $level, $msg, )
    };
    // With kv pairs (zero or more); caller keys override the defaults
    ($logger:expr, $level:expr, $msg:expr, $( $k:expr => $v:expr ),* $(,)? ) => {
        {
            #[allow(unused_mut)]
            let mut metadata = $crate::loggers::core::Metadata::new();
            $(
                metadata.insert($k, $v);
            )*
            $logger.log($level, $msg, metadata, $crate::call_site!());
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::core::Level::Debug, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::core::Level::Info, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! notice {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::core::Level::Notice, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::core::Level::Error, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! fault {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::core::Level::Fault, $msg $(, $k => $v )* )
    };
}
