use crate::prelude::*;

/// Long paths may exceed MAX_PATH, but never this.
const MAX_PATH_LENGTH: usize = 32 * 1024;

/// Full path of the executable file of the current process.
///
/// `GetModuleFileNameW` silently truncates the path when the buffer is too small, so the buffer
/// grows until the path fits.
#[cfg(windows)]
pub fn module_file_name() -> WinResult<U16CString> {
    use windows::Win32::System::LibraryLoader::GetModuleFileNameW;

    let mut buffer = vec![0u16; MAX_PATH as usize];
    loop {
        let len = unsafe { GetModuleFileNameW(None, &mut buffer) } as usize;
        if len == 0 {
            return Err(WinError::get_with_message().with_comment("GetModuleFileNameW"));
        }
        if len < buffer.len() {
            buffer.truncate(len);
            return U16CString::from_vec(buffer).map_err(|_| {
                WinError::new(ERROR_INVALID_DATA.0).with_comment("GetModuleFileNameW returned NULL in path")
            });
        }
        if buffer.len() >= MAX_PATH_LENGTH {
            return Err(WinError::new(ERROR_INSUFFICIENT_BUFFER.0).with_comment(format!(
                "GetModuleFileNameW reached buffer limit: {} characters",
                buffer.len()
            )));
        }
        let new_len = (buffer.len() * 2).min(MAX_PATH_LENGTH);
        buffer.resize(new_len, 0);
    }
}

/// Full path of the executable file of the current process.
#[cfg(not(windows))]
pub fn module_file_name() -> WinResult<U16CString> {
    // ERROR_FILE_NOT_FOUND
    const NOT_FOUND: ErrorCode = 2;

    let path = std::env::current_exe()
        .map_err(|e| WinError::new(NOT_FOUND).with_comment(format!("current_exe: {}", e)))?;
    let path = path
        .to_str()
        .ok_or_else(|| WinError::new(NOT_FOUND).with_comment("current_exe is not valid Unicode"))?;
    if path.chars().count() >= MAX_PATH_LENGTH {
        return Err(WinError::new(NOT_FOUND).with_comment("current_exe is too long"));
    }
    U16CString::from_str(path).map_err(|_| WinError::new(NOT_FOUND).with_comment("NULL in current_exe"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_module_file_name_is_absolute() {
        let path = module_file_name().unwrap().to_string_lossy();
        assert!(std::path::Path::new(&path).is_absolute(), "{}", path);
        let current_exe = std::env::current_exe().unwrap();
        assert_eq!(
            std::path::Path::new(&path).file_name(),
            current_exe.file_name(),
        );
    }
}
