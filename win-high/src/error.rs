use std::error::Error;
use std::fmt;

#[cfg(windows)]
use crate::prelude::*;
#[cfg(windows)]
use win_low::um::winnt::*;

/// Raw Win32 error code, as returned by `GetLastError()` or by the registry functions.
pub type ErrorCode = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinError {
    error_code: ErrorCode,
    comment: Option<String>,
    message: Option<String>,
    source: Option<Box<WinError>>,
}

impl WinError {
    fn _new(error_code: ErrorCode, comment: Option<String>, message: Option<String>, source: Option<Box<WinError>>) -> Self {
        WinError {
            error_code,
            comment,
            message,
            source,
        }
    }

    pub fn new(error_code: ErrorCode) -> Self {
        Self::_new(error_code, None, None, None)
    }

    pub fn new_with_message(error_code: ErrorCode) -> Self {
        Self::new(error_code).with_message()
    }

    /// Call `GetLastError()` but do not attempt to get formatted message from system.
    #[cfg(windows)]
    pub fn get() -> Self {
        Self::new(Self::get_last_error())
    }

    /// Call `GetLastError()` & `FormatMessage(...)` at once.
    #[cfg(windows)]
    pub fn get_with_message() -> Self {
        Self::get().with_message()
    }

    pub fn with_comment<S: Into<String>>(&self, comment: S) -> Self {
        let mut clone = self.clone();
        clone.comment = Some(comment.into());
        clone
    }

    /// If formatted message is not initialized, get one via `FormatMessage(...)` and return new error instance.
    /// Off Windows there is no message table, and the error is returned as is.
    pub fn with_message(&self) -> Self {
        match self.message.as_ref() {
            Some(_) => self.clone(),
            None => self.clone_with_message()
        }
    }

    pub fn with_source(&self, source: Self) -> Self {
        let mut clone = self.clone();
        clone.source = Some(Box::new(source));
        clone
    }

    /// Error code getter.
    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    /// Call `FormatMessage(...)` for given error code.
    /// If `FormatMessage(...)` fails, create new error for its status code wrapping original one as a source.
    #[cfg(windows)]
    fn clone_with_message(&self) -> Self {
        match Self::format_message_from_error_code(self.error_code) {
            Ok(message) => {
                let mut clone = self.clone();
                clone.message = Some(message);
                clone
            }
            Err(format_error) => {
                let message = Self::get_format_message_error(self.error_code);
                Self::_new(format_error, None, Some(message), Some(Box::new(self.clone())))
            }
        }
    }

    #[cfg(not(windows))]
    fn clone_with_message(&self) -> Self {
        self.clone()
    }

    #[cfg(windows)]
    #[inline(always)]
    fn get_last_error() -> ErrorCode {
        unsafe { GetLastError() }.0
    }

    #[cfg(windows)]
    fn format_message_from_error_code(error_code: ErrorCode) -> Result<String, ErrorCode> {
        unsafe {
            let mut buffer: PWSTR = PWSTR::null();
            // If the function succeeds, the return value is the number of TCHARs stored in the output buffer, excluding the terminating null character.
            let len = FormatMessageW(
                FORMAT_MESSAGE_IGNORE_INSERTS
                    | FORMAT_MESSAGE_FROM_SYSTEM
                    | FORMAT_MESSAGE_ALLOCATE_BUFFER, // dwFlags
                None, // lpSource
                error_code, // dwMessageId
                MAKELANGID(LANG_NEUTRAL, SUBLANG_DEFAULT) as _, // dwLanguageId
                // with ALLOCATE_BUFFER the system writes a pointer to its own buffer here
                PWSTR(&mut buffer.0 as *mut *mut u16 as *mut u16), // lpBuffer
                0, // nSize
                None, // va_args
            );

            // If the function fails, the return value is zero. To get extended error information, call GetLastError.
            if len == 0 {
                return Err(Self::get_last_error());
            }

            let message_u16 = U16Str::from_ptr(buffer.0, len as usize);
            // system messages end with CRLF
            let message_string = message_u16.to_string_lossy().trim_end().to_string();

            LocalFree(Some(HLOCAL(buffer.as_ptr() as *mut _)));

            Ok(message_string)
        }
    }

    #[cfg(windows)]
    fn get_format_message_error(original_error_code: ErrorCode) -> String {
        format!("FormatMessageW failed while formatting error 0x{:08X}", original_error_code)
    }

    const UNKNOWN_ERROR: &'static str = "UNKNOWN ERROR CODE";
}

#[cfg(windows)]
impl From<WIN32_ERROR> for WinError {
    fn from(error_code: WIN32_ERROR) -> Self {
        WinError::new(error_code.0)
    }
}

#[cfg(windows)]
impl From<windows_core::Error> for WinError {
    /// Unwraps `HRESULT_FROM_WIN32` codes back into plain Win32 error codes.
    fn from(error: windows_core::Error) -> Self {
        const FACILITY_WIN32_MASK: u32 = 0x8007_0000;

        let hresult = error.code().0 as u32;
        let error_code = if hresult & 0xFFFF_0000 == FACILITY_WIN32_MASK {
            hresult & 0xFFFF
        } else {
            hresult
        };
        let message = error.message();
        let message = if message.is_empty() { None } else { Some(message) };
        WinError::_new(error_code, None, message, None)
    }
}

impl fmt::Display for WinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(comment) = self.comment.as_ref() {
            write!(f, "{}; ", comment)?;
        }
        let message = match self.message.as_ref() {
            Some(msg) => msg.as_str(),
            None => Self::UNKNOWN_ERROR,
        };
        write!(f, "Error Code 0x{:08X}: {}", self.error_code, message)?;

        if let Some(source) = self.source.as_ref() {
            write!(f, "; Caused by: {}", source)?;
        }
        Ok(())
    }
}

impl Error for WinError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn Error + 'static))
    }
}

/// Rust + Windows extension for error handling
pub type WinResult<T> = Result<T, WinError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_without_message() {
        let error = WinError::new(5);
        assert_eq!(error.to_string(), "Error Code 0x00000005: UNKNOWN ERROR CODE");
    }

    #[test]
    fn test_display_with_comment_and_source() {
        let error = WinError::new(2)
            .with_comment("RegCreateKeyExW Software\\Classes\\.daliproj")
            .with_source(WinError::new(5));
        assert_eq!(
            error.to_string(),
            "RegCreateKeyExW Software\\Classes\\.daliproj; \
            Error Code 0x00000002: UNKNOWN ERROR CODE; \
            Caused by: Error Code 0x00000005: UNKNOWN ERROR CODE"
        );
        assert_eq!(error.error_code(), 2);
        assert!(error.source().is_some());
    }

    #[cfg(windows)]
    #[test]
    fn test_system_message() {
        // ERROR_ACCESS_DENIED
        let error = WinError::new_with_message(5);
        assert!(!error.to_string().contains(WinError::UNKNOWN_ERROR));
        assert!(!error.to_string().ends_with('\n'));
    }
}
