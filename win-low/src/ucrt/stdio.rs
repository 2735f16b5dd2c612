//! Missing API from UCRT `<stdio.h>`.
//!
//! On MSVC `stdin`, `stdout` and `stderr` are macros expanding to a call into the runtime,
//! so there are no statics to link against.

#![allow(bad_style)]

use libc::{c_uint, FILE};

unsafe extern "C" {
    pub fn __acrt_iob_func(ix: c_uint) -> *mut FILE;
}

pub const STDOUT_INDEX: c_uint = 1;
pub const STDERR_INDEX: c_uint = 2;

/// C runtime `stdout` stream.
#[inline]
pub unsafe fn stdout() -> *mut FILE {
    unsafe { __acrt_iob_func(STDOUT_INDEX) }
}

/// C runtime `stderr` stream.
#[inline]
pub unsafe fn stderr() -> *mut FILE {
    unsafe { __acrt_iob_func(STDERR_INDEX) }
}
