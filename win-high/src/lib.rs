//! # Various Rusty wrappers for low-level winapi
pub mod assoc;
pub mod cmdline;
pub mod console;
pub mod error;
#[cfg(windows)]
pub mod hkey;
pub mod module;
pub mod prelude;
#[cfg(windows)]
pub mod reg;
pub mod text;
