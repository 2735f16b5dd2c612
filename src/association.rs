use log::{debug, warn};
use win_high::assoc::{FileAssociation, Registration};
use win_high::error::WinResult;

pub const PROG_ID: &str = "Dalimaster.daliproj";
pub const EXTENSION: &str = ".daliproj";
pub const DISPLAY_NAME: &str = "DALI Project";

/// `.daliproj` files open with the running executable.
pub fn dalimaster_association() -> FileAssociation {
    FileAssociation::new(PROG_ID, EXTENSION, DISPLAY_NAME)
}

/// Read back the default value of `.daliproj` with `read_back`, and warn unless it names
/// `PROG_ID`. After an aborted registration nothing was written, so nothing is read and `None` is
/// returned.
pub fn verify_association<F>(registration: &Registration, read_back: F) -> Option<bool>
where
    F: FnOnce(&str) -> WinResult<String>,
{
    if registration.is_aborted() {
        return None;
    }
    let verified = match read_back(EXTENSION) {
        Ok(prog_id) if prog_id == PROG_ID => {
            debug!("{} is associated with {}", EXTENSION, prog_id);
            true
        }
        Ok(prog_id) => {
            warn!("{} is associated with {:?} instead of {}", EXTENSION, prog_id, PROG_ID);
            false
        }
        Err(why) => {
            warn!("Could not read back {} association: {}", EXTENSION, why);
            false
        }
    };
    Some(verified)
}

#[cfg(test)]
mod test {
    use win_high::error::WinError;

    use super::*;

    #[test]
    fn test_prog_id_names_extension() {
        let assoc = dalimaster_association();
        assert!(assoc.extension.starts_with('.'));
        assert!(assoc.prog_id.ends_with(&assoc.extension));
    }

    #[test]
    fn test_aborted_registration_is_not_read_back() {
        let mut read = false;
        let verified = verify_association(&Registration::aborted(), |_| {
            read = true;
            Ok(String::new())
        });
        assert_eq!(verified, None);
        assert!(!read);
    }

    #[test]
    fn test_read_back() {
        let done = Registration::default();
        assert_eq!(verify_association(&done, |ext| {
            assert_eq!(ext, ".daliproj");
            Ok(PROG_ID.to_string())
        }), Some(true));
        assert_eq!(verify_association(&done, |_| Ok("Other.App".to_string())), Some(false));
        assert_eq!(verify_association(&done, |_| Err(WinError::new(2))), Some(false));
    }
}
