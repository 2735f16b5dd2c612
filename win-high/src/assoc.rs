//! Per-user file type association.
//!
//! Writes the following tree under `HKEY_CURRENT_USER\Software\Classes`:
//!
//! ```text
//! <ProgId>                        (default) = <display name>
//! <ProgId>\DefaultIcon            (default) = <exe path>
//! <ProgId>\shell\open\command     (default) = "<exe path>" "%1"
//! <extension>                     (default) = <ProgId>
//! ```
//!
//! Registration is best-effort: every failed step is logged and skipped, and the rest still runs.

use log::{info, warn};

#[cfg(windows)]
use crate::module::module_file_name;
use crate::prelude::*;

/// Path of the per-user classes root, relative to `HKEY_CURRENT_USER`.
pub const CLASSES_ROOT: &str = r"Software\Classes";
pub const DEFAULT_ICON: &str = "DefaultIcon";
pub const SHELL_OPEN_COMMAND: &str = r"shell\open\command";

/// File extension bound to an application through its program identifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileAssociation {
    /// Program identifier, e.g. `Vendor.Document`.
    pub prog_id: String,
    /// Extension with the leading dot, e.g. `.doc`.
    pub extension: String,
    /// Human readable name of the file type.
    pub display_name: String,
}

impl FileAssociation {
    pub fn new<S: Into<String>>(prog_id: S, extension: S, display_name: S) -> Self {
        FileAssociation {
            prog_id: prog_id.into(),
            extension: extension.into(),
            display_name: display_name.into(),
        }
    }

    /// Command line for the shell: executable followed by the activated file as one argument.
    /// Shell substitutes `%1` at launch time.
    pub fn open_command(exe_path: &U16CStr) -> U16CString {
        let mut command = U16String::from_str("\"");
        command.push(exe_path.as_ustr());
        command.push_str("\" \"%1\"");
        // neither half contains NULL
        U16CString::from_ustr_truncate(command)
    }
}

/// Registry hive where associations live. Keys are released when dropped.
pub trait ClassesRoot {
    type Key;

    /// Create or open `sub_key` under `parent`, or under the classes root itself for `None`.
    fn create_key(&mut self, parent: Option<&Self::Key>, sub_key: &str) -> WinResult<Self::Key>;

    /// Set the default (unnamed) string value of the key.
    fn set_default_value(&mut self, key: &Self::Key, value: &U16CStr) -> WinResult<()>;

    /// Tell the shell that associations changed, so it refreshes icons without logoff.
    fn notify_associations_changed(&mut self);
}

/// Summary of one best-effort registration. There is nothing to handle; useful for logging and
/// tests.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Registration {
    aborted: bool,
    failed_steps: usize,
}

impl Registration {
    /// Registration that gave up before writing anything.
    pub fn aborted() -> Self {
        Registration {
            aborted: true,
            failed_steps: 0,
        }
    }

    /// Nothing was written because the executable path is unknown.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn failed_steps(&self) -> usize {
        self.failed_steps
    }

    /// Every key and value was written.
    pub fn is_complete(&self) -> bool {
        !self.aborted && self.failed_steps == 0
    }

    fn record<T>(&mut self, step: &str, result: WinResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(why) => {
                warn!("File association step '{}' failed: {}", step, why);
                self.failed_steps += 1;
                None
            }
        }
    }
}

/// Create (or open) `sub_key` and set its default value. The key is closed before returning.
fn set_default_at<C: ClassesRoot>(
    classes: &mut C,
    parent: Option<&C::Key>,
    sub_key: &str,
    value: &U16CStr,
) -> WinResult<()> {
    let key = classes.create_key(parent, sub_key)?;
    classes.set_default_value(&key, value)
}

/// Register `assoc` in `classes`, pointing at `exe_path`.
///
/// Without the executable path nothing is written at all, and the shell is not notified.
pub fn register_file_association_with<C: ClassesRoot>(
    assoc: &FileAssociation,
    classes: &mut C,
    exe_path: WinResult<U16CString>,
) -> Registration {
    let exe_path = match exe_path {
        Ok(exe_path) => exe_path,
        Err(why) => {
            warn!("Not registering {} files, executable path is unknown: {}", assoc.extension, why);
            return Registration::aborted();
        }
    };
    let display_name = U16CString::from_str_truncate(&assoc.display_name);
    let prog_id = U16CString::from_str_truncate(&assoc.prog_id);
    let mut registration = Registration::default();

    let prog_key = classes.create_key(None, &assoc.prog_id);
    if let Some(prog_key) = registration.record(&assoc.prog_id, prog_key) {
        let result = classes.set_default_value(&prog_key, &display_name);
        registration.record(&assoc.prog_id, result);

        let result = set_default_at(classes, Some(&prog_key), DEFAULT_ICON, &exe_path);
        registration.record(DEFAULT_ICON, result);

        let command = FileAssociation::open_command(&exe_path);
        let result = set_default_at(classes, Some(&prog_key), SHELL_OPEN_COMMAND, &command);
        registration.record(SHELL_OPEN_COMMAND, result);
    }

    let result = set_default_at(classes, None, &assoc.extension, &prog_id);
    registration.record(&assoc.extension, result);

    classes.notify_associations_changed();

    if registration.is_complete() {
        info!("Registered {} files as {}", assoc.extension, assoc.prog_id);
    }
    registration
}

/// Register `assoc` for the current user, pointing at the running executable.
pub fn register_file_association(assoc: &FileAssociation) -> Registration {
    #[cfg(windows)]
    {
        register_file_association_with(assoc, &mut CurrentUserClasses, module_file_name())
    }
    #[cfg(not(windows))]
    {
        info!("File association of {} files is not supported on this platform", assoc.extension);
        Registration::aborted()
    }
}

/// `HKEY_CURRENT_USER\Software\Classes`, which needs no elevation.
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct CurrentUserClasses;

#[cfg(windows)]
impl CurrentUserClasses {
    /// Read back the default value of `sub_key` under the classes root.
    pub fn default_value(&self, sub_key: &str) -> WinResult<String> {
        let key = RegOpenKeyEx_Safe(
            HKEY_CURRENT_USER,
            &format!(r"{}\{}", CLASSES_ROOT, sub_key),
            KEY_READ,
        )?;
        let value = query_value_sz(*key, "")?;
        Ok(crate::text::utf8_from_utf16(Some(&value)))
    }
}

#[cfg(windows)]
impl ClassesRoot for CurrentUserClasses {
    type Key = HKey_Safe;

    fn create_key(&mut self, parent: Option<&HKey_Safe>, sub_key: &str) -> WinResult<HKey_Safe> {
        match parent {
            Some(parent) => RegCreateKeyEx_Safe(**parent, sub_key, KEY_WRITE),
            None => RegCreateKeyEx_Safe(
                HKEY_CURRENT_USER,
                &format!(r"{}\{}", CLASSES_ROOT, sub_key),
                KEY_WRITE,
            ),
        }
    }

    fn set_default_value(&mut self, key: &HKey_Safe, value: &U16CStr) -> WinResult<()> {
        set_value_sz(**key, "", value)
    }

    fn notify_associations_changed(&mut self) {
        use windows::Win32::UI::Shell::{SHChangeNotify, SHCNE_ASSOCCHANGED, SHCNF_IDLIST};

        unsafe { SHChangeNotify(SHCNE_ASSOCCHANGED, SHCNF_IDLIST, None, None) };
    }
}
