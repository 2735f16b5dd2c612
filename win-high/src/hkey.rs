#![allow(non_camel_case_types, non_snake_case)]

use crate::prelude::*;

/// Registry names may not contain NULL characters.
pub(crate) fn wide_name(name: &str) -> WinResult<U16CString> {
    U16CString::from_str(name).map_err(|_| {
        WinError::new(ERROR_INVALID_PARAMETER.0).with_comment(format!("NULL character in name: {:?}", name))
    })
}

/// Create a key (or open an existing one) under `hKey` with the given access rights.
pub fn RegCreateKeyEx_Safe(
    hKey: HKEY,
    sub_key: &str,
    samDesired: REG_SAM_FLAGS,
) -> WinResult<HKey_Safe> {
    let wsz_sub_key = wide_name(sub_key)?;
    let mut phkResult = HKEY::default();

    let error_code = unsafe {
        RegCreateKeyExW(
            hKey,
            PCWSTR(wsz_sub_key.as_ptr()),
            None,
            PCWSTR::null(),
            REG_OPTION_NON_VOLATILE,
            samDesired,
            None,
            &mut phkResult as *mut HKEY,
            None,
        )
    };

    if error_code != ERROR_SUCCESS {
        return Err(WinError::new_with_message(error_code.0)
            .with_comment(format!("RegCreateKeyExW with sub key: {}", sub_key)));
    }

    assert!(!phkResult.is_invalid());
    Ok(HKey_Safe::owned(phkResult))
}

pub fn RegOpenKeyEx_Safe(
    hKey: HKEY,
    sub_key: &str,
    samDesired: REG_SAM_FLAGS,
) -> WinResult<HKey_Safe> {
    let wsz_sub_key = wide_name(sub_key)?;
    let mut phkResult = HKEY::default();

    let error_code = unsafe {
        RegOpenKeyExW(
            hKey,
            PCWSTR(wsz_sub_key.as_ptr()),
            None,
            samDesired,
            &mut phkResult as *mut HKEY,
        )
    };

    if error_code != ERROR_SUCCESS {
        return Err(WinError::new_with_message(error_code.0)
            .with_comment(format!("RegOpenKeyExW with sub key: {}", sub_key)));
    }

    assert!(!phkResult.is_invalid());
    Ok(HKey_Safe::owned(phkResult))
}

pub fn RegCloseKey_Safe(
    hKey: HKEY,
) -> WinResult<()> {
    let error_code = unsafe { RegCloseKey(hKey) };

    if error_code != ERROR_SUCCESS {
        return Err(WinError::new_with_message(error_code.0));
    }
    Ok(())
}

/// Memory-safe auto-closing wrapper for HKEY. To access underlying raw HKEY value from `HKey_Safe`
/// value, use deref operator: `*hkey`; and for `&HKey_Safe` use double deref: `**hkey_ref`.
///
/// Predefined root keys such as `HKEY_CURRENT_USER` are never wrapped, only handles returned by
/// `RegCreateKeyExW` and friends.
#[derive(Debug)]
pub struct HKey_Safe(HKEY);

impl HKey_Safe {
    pub fn owned(hkey: HKEY) -> Self {
        HKey_Safe(hkey)
    }
}

impl std::ops::Deref for HKey_Safe {
    type Target = HKEY;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for HKey_Safe {
    fn drop(&mut self) {
        if let Err(e) = RegCloseKey_Safe(self.0) {
            log::error!("RegCloseKey Error: {}", e);
        }
    }
}
