#![allow(unused_imports)]
#![allow(ambiguous_glob_reexports)]

//! Everything you need to get started with WinAPI.
pub use std::ptr::{self, null, null_mut};

pub use widestring::{U16CString, U16String, U16CStr, U16Str, u16cstr, u16str};

#[cfg(windows)]
pub use windows_core::{PCSTR, PCWSTR, PWSTR};

#[cfg(windows)]
pub use windows::Win32::Foundation::*;
#[cfg(windows)]
pub use windows::Win32::System::Diagnostics::Debug::*;
#[cfg(windows)]
pub use windows::Win32::System::Registry::*;

pub use crate::error::*;
#[cfg(windows)]
pub use crate::hkey::*;
#[cfg(windows)]
pub use crate::reg::*;
