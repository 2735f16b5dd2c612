//! Strict UTF-16 to UTF-8 conversion.
//!
//! Invalid input never turns into U+FFFD replacement characters: the whole conversion fails
//! and collapses into an empty string instead.

use crate::prelude::*;

/// Convert NULL-terminated UTF-16 string into an owned UTF-8 string.
///
/// Returns empty string for `None`, for empty input, and whenever the input is not valid
/// UTF-16 (e.g. contains unpaired surrogates).
pub fn utf8_from_utf16(utf16_string: Option<&U16CStr>) -> String {
    match utf16_string {
        None => String::new(),
        Some(utf16_string) => convert(utf16_string),
    }
}

/// Same as `utf8_from_utf16`, but for raw pointers coming straight from the system.
///
/// # Safety
/// `p` must be NULL or point to a valid NULL-terminated UTF-16 string.
pub unsafe fn utf8_from_utf16_ptr(p: *const u16) -> String {
    if p.is_null() {
        return String::new();
    }
    // SAFETY: forwarded to the caller
    utf8_from_utf16(Some(unsafe { U16CStr::from_ptr_str(p) }))
}

#[cfg(windows)]
fn convert(utf16_string: &U16CStr) -> String {
    use windows::Win32::Globalization::*;

    // First pass counts the terminating NULL as well, so that the system sees exactly the same
    // input both times.
    let with_nul = utf16_string.as_slice_with_nul();
    let target_length = unsafe {
        WideCharToMultiByte(CP_UTF8, WC_ERR_INVALID_CHARS, with_nul, None, PCSTR::null(), None)
    } as i64 - 1; // remove the trailing null character
    if target_length <= 0 || target_length > isize::MAX as i64 {
        return String::new();
    }

    let mut utf8_string = vec![0u8; target_length as usize];
    let converted_length = unsafe {
        WideCharToMultiByte(
            CP_UTF8,
            WC_ERR_INVALID_CHARS,
            utf16_string.as_slice(),
            Some(&mut utf8_string[..]),
            PCSTR::null(),
            None,
        )
    };
    if converted_length <= 0 {
        return String::new();
    }
    utf8_string.truncate(converted_length as usize);

    // Strict mode guarantees well-formed output; should the system still hand us garbage,
    // fail closed the same way.
    String::from_utf8(utf8_string).unwrap_or_default()
}

#[cfg(not(windows))]
fn convert(utf16_string: &U16CStr) -> String {
    char::decode_utf16(utf16_string.as_slice().iter().copied())
        .collect::<Result<String, _>>()
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_null_input() {
        assert_eq!(utf8_from_utf16(None), "");
        assert_eq!(unsafe { utf8_from_utf16_ptr(null()) }, "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(utf8_from_utf16(Some(u16cstr!(""))), "");
    }

    #[test]
    fn test_ascii_round_trip() {
        let input = "C:\\Projects\\lights.daliproj --verbose";
        let wide = U16CString::from_str(input).unwrap();
        let converted = utf8_from_utf16(Some(&wide));
        assert_eq!(converted, input);
        assert_eq!(U16CString::from_str(&converted).unwrap(), wide);
    }

    #[test]
    fn test_non_ascii() {
        let wide = U16CString::from_str("Проект 照明 🌈").unwrap();
        let converted = utf8_from_utf16(Some(&wide));
        assert_eq!(converted, "Проект 照明 🌈");
        assert_eq!(converted.len(), "Проект 照明 🌈".len());
    }

    #[test]
    fn test_unpaired_surrogate_is_rejected() {
        // 'a', lone high surrogate, 'b'
        let wide = U16CString::from_vec(vec![0x0061, 0xD800, 0x0062]).unwrap();
        assert_eq!(utf8_from_utf16(Some(&wide)), "");

        // lone low surrogate at the very end
        let wide = U16CString::from_vec(vec![0x0061, 0xDC00]).unwrap();
        assert_eq!(utf8_from_utf16(Some(&wide)), "");
    }

    #[test]
    fn test_raw_pointer() {
        let wide = U16CString::from_str("arg one").unwrap();
        assert_eq!(unsafe { utf8_from_utf16_ptr(wide.as_ptr()) }, "arg one");
    }
}
