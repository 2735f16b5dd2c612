//! Bindings which neither `windows` nor `libc` crates provide.
pub mod um;
#[cfg(all(windows, target_env = "msvc"))]
pub mod ucrt;
