use std::mem::size_of;

use crate::hkey::wide_name;
use crate::prelude::*;

/// Write a `REG_SZ` value. Empty `value_name` stands for the key's default (unnamed) value.
pub fn set_value_sz(hkey: HKEY, value_name: &str, data: &U16CStr) -> WinResult<()> {
    // prepare value name with trailing NULL char; NULL pointer addresses the default value
    let wsz_value_name = wide_name(value_name)?;
    let pcwstr_value_name = if value_name.is_empty() {
        PCWSTR::null()
    } else {
        PCWSTR(wsz_value_name.as_ptr())
    };

    // From MSDN:
    // If the data is of type REG_SZ, REG_EXPAND_SZ, or REG_MULTI_SZ, cbData must include the size
    // of the terminating null character or characters.
    let with_nul = data.as_slice_with_nul();
    let bytes = unsafe {
        std::slice::from_raw_parts(with_nul.as_ptr() as *const u8, with_nul.len() * size_of::<u16>())
    };

    let error_code = unsafe {
        RegSetValueExW(
            hkey,
            pcwstr_value_name,
            None,
            REG_SZ,
            Some(bytes),
        )
    };

    if error_code != ERROR_SUCCESS {
        return Err(WinError::new_with_message(error_code.0)
            .with_comment(format!("RegSetValueExW with value: {:?}", value_name)));
    }
    Ok(())
}

/// Read a `REG_SZ` value. Empty `value_name` stands for the key's default (unnamed) value.
///
/// The size is queried first; anything could happen between two calls to RegQueryValueExW,
/// so `ERROR_MORE_DATA` restarts the query with the newly reported size.
pub fn query_value_sz(hkey: HKEY, value_name: &str) -> WinResult<U16CString> {
    // Registry values are limited to available memory, but strings larger than that are not
    // something a shell association would ever contain.
    const MAX_BUFFER_SIZE: u32 = 1024 * 1024;

    let wsz_value_name = wide_name(value_name)?;
    let pcwstr_value_name = if value_name.is_empty() {
        PCWSTR::null()
    } else {
        PCWSTR(wsz_value_name.as_ptr())
    };

    let mut value_type = REG_NONE;
    let mut buffer_size: u32 = 0;
    // pass NULL data to figure out needed buffer size
    let mut error_code = unsafe {
        RegQueryValueExW(hkey, pcwstr_value_name, None, None, None, Some(&mut buffer_size as *mut _))
    };
    let mut buffer: Vec<u16> = Vec::new();

    while error_code == ERROR_SUCCESS || error_code == ERROR_MORE_DATA {
        if buffer_size > MAX_BUFFER_SIZE {
            return Err(WinError::new(ERROR_MORE_DATA.0).with_comment(format!(
                "RegQueryValueExW reached buffer limit: {} bytes",
                buffer_size
            )));
        }
        // round up to whole UTF-16 units
        buffer.resize((buffer_size as usize).div_ceil(size_of::<u16>()), 0);
        let mut buffer_size_out = (buffer.len() * size_of::<u16>()) as u32;

        error_code = unsafe {
            RegQueryValueExW(
                hkey,
                pcwstr_value_name,
                None,
                Some(&mut value_type as *mut _),
                Some(buffer.as_mut_ptr() as *mut u8),
                Some(&mut buffer_size_out as *mut _),
            )
        };
        if error_code == ERROR_MORE_DATA {
            buffer_size = buffer_size_out;
            continue;
        }
        if error_code == ERROR_SUCCESS {
            buffer.truncate(buffer_size_out as usize / size_of::<u16>());
            break;
        }
    }

    if error_code != ERROR_SUCCESS {
        return Err(WinError::new_with_message(error_code.0)
            .with_comment(format!("RegQueryValueExW with value: {:?}", value_name)));
    }

    if value_type != REG_SZ && value_type != REG_EXPAND_SZ {
        return Err(WinError::new(ERROR_INVALID_DATA.0).with_comment(format!(
            "Unexpected data type in registry. Expected REG_SZ, got: {:#10x}",
            value_type.0
        )));
    }

    // stored strings are not guaranteed to be NULL terminated
    Ok(U16CString::from_vec_truncate(buffer))
}
