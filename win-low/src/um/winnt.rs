//! Missing API from `<winnt.h>`

#![allow(bad_style)]

pub type WORD = u16;
pub type LANGID = WORD;

pub const LANG_NEUTRAL: WORD = 0x00;
pub const SUBLANG_DEFAULT: WORD = 0x01;

#[inline]
pub fn MAKELANGID(p: WORD, s: WORD) -> LANGID {
    (s << 10) | p
}
