//! Process command line, decoded into UTF-8 arguments.

use crate::prelude::*;
#[cfg(not(windows))]
use crate::text::utf8_from_utf16;
#[cfg(windows)]
use crate::text::utf8_from_utf16_ptr;

const NUL: u16 = 0;
const SPACE: u16 = b' ' as u16;
const TAB: u16 = b'\t' as u16;
const QUOTE: u16 = b'"' as u16;
const BACKSLASH: u16 = b'\\' as u16;

/// Arguments of the current process, without the program path.
///
/// Never fails: if the system can not split the command line, the list is empty.
#[cfg(windows)]
pub fn command_line_arguments() -> Vec<String> {
    use windows::Win32::System::Environment::GetCommandLineW;

    let cmd = unsafe { GetCommandLineW() };
    if cmd.is_null() {
        return vec![];
    }
    // SAFETY: command line lives as long as the process, and is NULL terminated
    let cmd = unsafe { U16CStr::from_ptr_str(cmd.0) };
    arguments_from_command_line(cmd)
}

/// Arguments of the current process, without the program path.
///
/// There is no raw UTF-16 command line outside of Windows. Arguments which are not valid
/// Unicode are replaced by empty strings, the same way strict UTF-16 conversion fails.
#[cfg(not(windows))]
pub fn command_line_arguments() -> Vec<String> {
    std::env::args_os()
        .skip(1)
        .map(|arg| arg.into_string().unwrap_or_default())
        .collect()
}

/// Split raw command line with `CommandLineToArgvW` and convert every argument after the
/// program path into UTF-8.
#[cfg(windows)]
pub fn arguments_from_command_line(cmd: &U16CStr) -> Vec<String> {
    match LocalArgv::parse(cmd) {
        None => vec![],
        Some(argv) => argv
            .as_slice()
            .iter()
            .skip(1)
            // SAFETY: every entry points into the same block, NULL terminated
            .map(|arg| unsafe { utf8_from_utf16_ptr(arg.0) })
            .collect(),
    }
}

/// Split raw command line by the same rules as `CommandLineToArgvW` and convert every argument
/// after the program path into UTF-8.
#[cfg(not(windows))]
pub fn arguments_from_command_line(cmd: &U16CStr) -> Vec<String> {
    split_command_line(cmd.as_slice())
        .iter()
        .skip(1)
        .map(|arg| utf8_from_utf16(Some(&U16CString::from_ustr_truncate(arg))))
        .collect()
}

/// Argument vector allocated by `CommandLineToArgvW`, released with `LocalFree` on drop.
#[cfg(windows)]
struct LocalArgv {
    argv: *mut PWSTR,
    argc: usize,
}

#[cfg(windows)]
impl LocalArgv {
    fn parse(cmd: &U16CStr) -> Option<Self> {
        use windows::Win32::UI::Shell::CommandLineToArgvW;

        let mut argc: i32 = 0;
        let argv = unsafe { CommandLineToArgvW(PCWSTR(cmd.as_ptr()), &mut argc) };
        if argv.is_null() {
            log::warn!("CommandLineToArgvW failed: {}", WinError::get_with_message());
            return None;
        }
        Some(LocalArgv {
            argv,
            argc: argc.max(0) as usize,
        })
    }

    fn as_slice(&self) -> &[PWSTR] {
        // SAFETY: argv holds exactly argc pointers until freed
        unsafe { std::slice::from_raw_parts(self.argv, self.argc) }
    }
}

#[cfg(windows)]
impl Drop for LocalArgv {
    fn drop(&mut self) {
        // Returns NULL on success, the very same handle on failure. Nothing to recover anyway.
        let _ = unsafe { LocalFree(Some(HLOCAL(self.argv as *mut _))) };
    }
}

/// Split UTF-16 command line into arguments. The first one is always the program path,
/// unless the command line is empty.
///
/// Rules follow `CommandLineToArgvW`:
/// - program path ends at the closing quote if it starts with one, otherwise at the first
///   whitespace; backslashes in it are taken literally;
/// - other arguments are separated by spaces and tabs outside of quotes;
/// - `2n` backslashes followed by a quote produce `n` backslashes and toggle quoting;
/// - `2n + 1` backslashes followed by a quote produce `n` backslashes and a literal quote;
/// - a quote right after the closing quote of a quoted part is literal, and quoting stays off,
///   so `"a""b c"` gives `a"b` and `c`;
/// - backslashes not followed by a quote are literal.
///
/// Input stops at the first NULL, if any.
pub fn split_command_line(cmd: &[u16]) -> Vec<U16String> {
    let mut args = Vec::new();
    let mut code_units = cmd.iter().copied().take_while(|&w| w != NUL).peekable();

    let mut program = Vec::new();
    match code_units.peek() {
        None => return args,
        Some(&QUOTE) => {
            code_units.next();
            for w in code_units.by_ref() {
                if w == QUOTE {
                    break;
                }
                program.push(w);
            }
        }
        Some(_) => {
            while let Some(w) = code_units.next_if(|&w| w != SPACE && w != TAB) {
                program.push(w);
            }
        }
    }
    args.push(U16String::from_vec(program));
    while code_units.next_if(|&w| w == SPACE || w == TAB).is_some() {}

    let mut cur: Vec<u16> = Vec::new();
    // 0 outside of quotes, 1 inside; goes up to 3 while a run of quotes is being consumed
    let mut quote_count = 0;
    // quoted empty string "" is still an argument
    let mut started = false;
    let mut backslash_count = 0;
    while let Some(w) = code_units.next() {
        match w {
            SPACE | TAB if quote_count == 0 => {
                if started {
                    args.push(U16String::from_vec(std::mem::take(&mut cur)));
                }
                started = false;
                backslash_count = 0;
            }
            BACKSLASH => {
                started = true;
                backslash_count += 1;
                cur.push(w);
            }
            QUOTE => {
                started = true;
                if backslash_count % 2 == 0 {
                    cur.truncate(cur.len() - backslash_count / 2);
                    quote_count += 1;
                } else {
                    cur.truncate(cur.len() - (backslash_count + 1) / 2);
                    cur.push(QUOTE);
                }
                backslash_count = 0;
                // the quote right after a closing one is literal, and quoting stays off
                while code_units.next_if_eq(&QUOTE).is_some() {
                    quote_count += 1;
                    if quote_count == 3 {
                        cur.push(QUOTE);
                        quote_count = 0;
                    }
                }
                if quote_count == 2 {
                    quote_count = 0;
                }
            }
            _ => {
                started = true;
                backslash_count = 0;
                cur.push(w);
            }
        }
    }
    if started {
        args.push(U16String::from_vec(cur));
    }
    args
}

#[cfg(test)]
mod test {
    use super::*;

    fn split(cmd: &str) -> Vec<String> {
        let wide = U16String::from_str(cmd);
        split_command_line(wide.as_slice())
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect()
    }

    fn decode(cmd: &str) -> Vec<String> {
        arguments_from_command_line(&U16CString::from_str(cmd).unwrap())
    }

    #[test]
    fn test_quoted_argument_is_one_element() {
        assert_eq!(decode(r#"app.exe "arg one" arg2"#), vec!["arg one", "arg2"]);
    }

    #[test]
    fn test_program_only() {
        assert_eq!(decode("app.exe"), Vec::<String>::new());
        assert_eq!(decode("app.exe   \t "), Vec::<String>::new());
    }

    #[test]
    fn test_shell_open_command() {
        // what the shell runs for "<exe>" "%1"
        let cmd = r#""C:\Program Files\Dalimaster\dalimaster.exe" "C:\Users\me\My Projects\hall.daliproj""#;
        assert_eq!(decode(cmd), vec![r"C:\Users\me\My Projects\hall.daliproj"]);
    }

    #[test]
    fn test_non_ascii_arguments() {
        assert_eq!(decode("app.exe Проект \"照明 🌈\""), vec!["Проект", "照明 🌈"]);
    }

    #[test]
    fn test_empty_command_line() {
        assert!(split_command_line(&[]).is_empty());
        assert!(split_command_line(&[NUL]).is_empty());
    }

    #[test]
    fn test_program_path_keeps_backslashes() {
        assert_eq!(split(r#""C:\dir\"app.exe a"#), vec![r"C:\dir\", "app.exe", "a"]);
        assert_eq!(split(r"C:\dir\app.exe a"), vec![r"C:\dir\app.exe", "a"]);
    }

    #[test]
    fn test_backslashes_before_quote() {
        // 2n + 1 backslashes: n backslashes and a literal quote
        assert_eq!(split(r#"app a\"b"#), vec!["app", r#"a"b"#]);
        assert_eq!(split(r#"app a\\\"b"#), vec!["app", r#"a\"b"#]);
        // 2n backslashes: n backslashes and quote toggles
        assert_eq!(split(r#"app "a\\" b"#), vec!["app", r"a\", "b"]);
        // not followed by quote: literal
        assert_eq!(split(r"app a\\b c\d"), vec!["app", r"a\\b", r"c\d"]);
    }

    #[test]
    fn test_quotes() {
        assert_eq!(split(r#"app "" x"#), vec!["app", "", "x"]);
        assert_eq!(split(r#"app "a""b""#), vec!["app", r#"a"b"#]);
        // doubled quote inside quotes is literal and closes the quoted part
        assert_eq!(split(r#"app "a""b c""#), vec!["app", r#"a"b"#, "c"]);
        assert_eq!(split(r#"app """" x"#), vec!["app", r#"" x"#]);
        // outside of quotes a doubled quote opens and closes at once
        assert_eq!(split(r#"app a""b c"#), vec!["app", "ab", "c"]);
        // escaped quote does not close anything, the one after it opens quoting
        assert_eq!(split(r#"app a\""b c"#), vec!["app", r#"a"b c"#]);
        assert_eq!(split(r#"app a"b c"d"#), vec!["app", "ab cd"]);
        // unterminated quote runs to the end
        assert_eq!(split(r#"app "a b"#), vec!["app", "a b"]);
    }

    #[test]
    fn test_whitespace_separators() {
        assert_eq!(split("app\ta  \t b"), vec!["app", "a", "b"]);
    }

    #[test]
    fn test_stops_at_nul() {
        let mut wide = U16String::from_str("app a").into_vec();
        wide.push(NUL);
        wide.extend(U16String::from_str(" b").into_vec());
        let args: Vec<String> = split_command_line(&wide)
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect();
        assert_eq!(args, vec!["app", "a"]);
    }

    /// Our splitter must agree with the system one.
    #[cfg(windows)]
    #[test]
    fn test_matches_command_line_to_argv() {
        let cases = [
            r#"app.exe "arg one" arg2"#,
            r#""C:\Program Files\app.exe" "C:\x y\z.daliproj""#,
            r#"app a\"b a\\\"b "a\\" c\d"#,
            r#"app "" x a"b c"d"#,
            r#"app "a""b c""#,
            r#"app """" x"#,
            r#"app "a""b""#,
            "app\ta  \t b",
        ];
        for case in cases {
            let wide = U16CString::from_str(case).unwrap();
            let ours: Vec<String> = split_command_line(wide.as_slice())
                .iter()
                .skip(1)
                .map(|arg| arg.to_string_lossy())
                .collect();
            assert_eq!(ours, arguments_from_command_line(&wide), "command line: {}", case);
        }
    }

    #[test]
    fn test_current_process_arguments_do_not_panic() {
        let _ = command_line_arguments();
    }
}
