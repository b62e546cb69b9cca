//! Logging abstraction
//!
//! Provides crate-local logging macros that work across targets:
//! - `defmt` feature: routes through defmt (embedded probes)
//! - `log` feature: routes through the `log` facade (host binaries)
//! - Neither: arguments are type-checked, nothing is emitted
//!
//! Format strings must stay within the subset both backends accept
//! (`{}` and `{:?}`).

#![allow(unused_macros)]

macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(feature = "log")]
        ::log::info!($($arg)*);

        #[cfg(not(any(feature = "defmt", feature = "log")))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);

        #[cfg(not(any(feature = "defmt", feature = "log")))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(feature = "log")]
        ::log::error!($($arg)*);

        #[cfg(not(any(feature = "defmt", feature = "log")))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);

        #[cfg(not(any(feature = "defmt", feature = "log")))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}
