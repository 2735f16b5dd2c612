//! Console for GUI subsystem processes.
//!
//! A process linked for the Windows subsystem starts without a console, so anything written to
//! stdout or stderr goes nowhere. The functions here give it one. They never fail loudly: the
//! worst outcome is that output stays invisible.

use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(windows)]
use crate::prelude::*;

/// Set once this process got a console through us.
static ATTACHED: AtomicBool = AtomicBool::new(false);

/// Outcome of an attempt to get a console.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConsoleAttach {
    /// Console was attached by this call, standard streams now write into it.
    Attached,
    /// Process already had a console, nothing was changed.
    AlreadyAttached,
    /// System refused to give a console, or there is no such thing on this platform.
    Unavailable,
}

impl ConsoleAttach {
    /// Whether standard streams are connected to a console after the attempt.
    pub fn is_attached(&self) -> bool {
        !matches!(self, ConsoleAttach::Unavailable)
    }
}

/// Check if we're attached to a Windows console, either by our own call or inherited.
#[cfg(windows)]
pub fn has_console() -> bool {
    use windows::Win32::System::Console::GetConsoleWindow;

    ATTACHED.load(Ordering::Acquire) || !unsafe { GetConsoleWindow() }.is_invalid()
}

#[cfg(not(windows))]
pub fn has_console() -> bool {
    ATTACHED.load(Ordering::Acquire)
}

/// Whether a user-mode debugger is attached to this process.
#[cfg(windows)]
pub fn debugger_present() -> bool {
    unsafe { IsDebuggerPresent() }.as_bool()
}

#[cfg(not(windows))]
pub fn debugger_present() -> bool {
    false
}

/// Allocate a new console window and redirect standard output and error into it.
///
/// `on_resync` is invoked after the redirection, so that whatever caches stream handles (e.g. the
/// UI toolkit's I/O layer) may pick up the new ones. It is not invoked when nothing changed.
///
/// Calling it again once a console is attached is a no-op.
#[cfg(windows)]
pub fn attach_new_console(on_resync: impl FnOnce()) -> ConsoleAttach {
    use windows::Win32::System::Console::AllocConsole;

    if has_console() {
        return ConsoleAttach::AlreadyAttached;
    }
    if let Err(e) = unsafe { AllocConsole() } {
        log::debug!("AllocConsole failed: {}", WinError::from(e));
        return ConsoleAttach::Unavailable;
    }
    ATTACHED.store(true, Ordering::Release);

    if let Err(e) = redirect_std_handles() {
        log::warn!("Could not redirect standard streams to the console: {}", e);
    }
    #[cfg(target_env = "msvc")]
    crt::reopen_std_streams();

    on_resync();
    ConsoleAttach::Attached
}

#[cfg(not(windows))]
pub fn attach_new_console(_on_resync: impl FnOnce()) -> ConsoleAttach {
    ConsoleAttach::Unavailable
}

/// Attach to the console of the parent process (e.g. the terminal the application was launched
/// from). Standard handles are set up by the system, nothing to redirect.
#[cfg(windows)]
pub fn attach_parent_console() -> ConsoleAttach {
    use windows::Win32::System::Console::{AttachConsole, ATTACH_PARENT_PROCESS};

    if has_console() {
        return ConsoleAttach::AlreadyAttached;
    }
    match unsafe { AttachConsole(ATTACH_PARENT_PROCESS) } {
        Ok(()) => {
            ATTACHED.store(true, Ordering::Release);
            #[cfg(target_env = "msvc")]
            crt::reopen_std_streams();
            ConsoleAttach::Attached
        }
        Err(_) => ConsoleAttach::Unavailable,
    }
}

#[cfg(not(windows))]
pub fn attach_parent_console() -> ConsoleAttach {
    ConsoleAttach::Unavailable
}

/// Point both `STD_OUTPUT_HANDLE` and `STD_ERROR_HANDLE` at one and the same console output
/// handle. Rust's `std::io::stdout()`/`stderr()` resolve standard handles on every write, so
/// they follow immediately.
#[cfg(windows)]
fn redirect_std_handles() -> WinResult<()> {
    use std::os::windows::io::IntoRawHandle;
    use windows::Win32::System::Console::{SetStdHandle, STD_ERROR_HANDLE, STD_OUTPUT_HANDLE};

    let conout = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("CONOUT$")
        .map_err(|e| {
            let code = e.raw_os_error().unwrap_or_default() as ErrorCode;
            WinError::new_with_message(code).with_comment("CreateFileW CONOUT$")
        })?;
    // Ownership goes to the process standard handles, it lives until the process exits.
    let handle = HANDLE(conout.into_raw_handle());

    unsafe {
        SetStdHandle(STD_OUTPUT_HANDLE, handle)
            .map_err(|e| WinError::from(e).with_comment("SetStdHandle STD_OUTPUT_HANDLE"))?;
        SetStdHandle(STD_ERROR_HANDLE, handle)
            .map_err(|e| WinError::from(e).with_comment("SetStdHandle STD_ERROR_HANDLE"))?;
    }
    Ok(())
}

/// C runtime keeps its own `stdout`/`stderr` streams on top of file descriptors 1 and 2, which
/// do not notice the new console on their own.
#[cfg(all(windows, target_env = "msvc"))]
mod crt {
    use libc::{c_char, dup2, fileno, freopen};
    use win_low::ucrt::stdio;

    const CONOUT: &[u8] = b"CONOUT$\0";
    const MODE_WRITE: &[u8] = b"w\0";

    pub(super) fn reopen_std_streams() {
        unsafe {
            let stdout = stdio::stdout();
            if reopen(stdout) {
                // fall back to sharing the descriptor
                dup2(fileno(stdout), 1);
            }
            let stderr = stdio::stderr();
            if reopen(stderr) {
                dup2(fileno(stdout), 2);
            }
        }
    }

    /// `true` on failure.
    unsafe fn reopen(stream: *mut libc::FILE) -> bool {
        let reopened = unsafe {
            freopen(
                CONOUT.as_ptr() as *const c_char,
                MODE_WRITE.as_ptr() as *const c_char,
                stream,
            )
        };
        reopened.is_null()
    }
}
