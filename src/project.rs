//! Project file handed over by the shell on double-click.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::association::EXTENSION;

pub const IMPORT_CHANNEL: &str = "org.tonycloud.dalimaster/import";
pub const IMPORT_METHOD: &str = "importProjectJson";

/// Project contents on their way to the UI.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImportRequest {
    pub channel: &'static str,
    pub method: &'static str,
    pub path: PathBuf,
    /// Project file is JSON; it is passed through as text.
    pub json: String,
}

/// Whether the file extension is `daliproj`, in any case.
pub fn is_project_file(path: &Path) -> bool {
    let extension = EXTENSION.trim_start_matches('.');
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// First of the given files which is a project file.
pub fn find_project_file<S: AsRef<str>>(files: &[S]) -> Option<PathBuf> {
    files
        .iter()
        .map(|file| Path::new(file.as_ref()))
        .find(|path| is_project_file(path))
        .map(Path::to_path_buf)
}

/// Read project file as UTF-8 text.
pub fn load_import_request(path: &Path) -> io::Result<ImportRequest> {
    let bytes = fs::read(path)?;
    let json = String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(ImportRequest {
        channel: IMPORT_CHANNEL,
        method: IMPORT_METHOD,
        path: path.to_path_buf(),
        json,
    })
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_is_project_file() {
        assert!(is_project_file(Path::new("hall.daliproj")));
        assert!(is_project_file(Path::new("HALL.DaliProj")));
        assert!(!is_project_file(Path::new("hall.daliproj.bak")));
        assert!(!is_project_file(Path::new("daliproj")));
        assert!(!is_project_file(Path::new("")));
    }

    #[test]
    fn test_find_project_file() {
        assert_eq!(
            find_project_file(&["--x", "notes.txt", "b.DALIPROJ", "c.daliproj"]),
            Some(PathBuf::from("b.DALIPROJ"))
        );
        assert_eq!(find_project_file::<&str>(&[]), None);
        assert_eq!(find_project_file(&["notes.txt"]), None);
    }

    #[test]
    fn test_load_import_request() {
        let mut file = tempfile::Builder::new().suffix(".daliproj").tempfile().unwrap();
        file.write_all(r#"{"name":"Зал","devices":[]}"#.as_bytes()).unwrap();

        let request = load_import_request(file.path()).unwrap();
        assert_eq!(request.channel, "org.tonycloud.dalimaster/import");
        assert_eq!(request.method, "importProjectJson");
        assert_eq!(request.path, file.path());
        assert_eq!(request.json, r#"{"name":"Зал","devices":[]}"#);
    }

    #[test]
    fn test_load_rejects_invalid_utf8() {
        let mut file = tempfile::Builder::new().suffix(".daliproj").tempfile().unwrap();
        file.write_all(&[b'{', 0xFF, 0xFE, b'}']).unwrap();

        let error = load_import_request(file.path()).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let error = load_import_request(&dir.path().join("gone.daliproj")).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
