//! Relative paths inside a backend root.
//!
//! Every path handed to a backend names a file under the comics (or media)
//! root. [`validate`] turns whatever a caller passes into that form, or
//! refuses it.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Normalize a path relative to a backend root.
///
/// `.` segments, repeated and trailing separators and a leading `/` are
/// dropped; `..` is resolved lexically. Paths that would climb out of the
/// root, that are empty once normalized, or that carry a Windows drive prefix
/// or a NUL byte are [`InvalidPath`](ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use longbox_storage::validate_path;
/// use std::path::Path;
///
/// assert_eq!(
///     validate_path("Charlton/./Unsorted/../Captain Atom 078.cbz").unwrap(),
///     Path::new("Charlton/Captain Atom 078.cbz")
/// );
/// assert!(validate_path("Charlton/../../Captain Atom 078.cbz").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || exn::Exn::from(ErrorKind::InvalidPath(original.to_path_buf()));
    let mut kept: Vec<&std::ffi::OsStr> = Vec::new();
    for component in original.components() {
        match component {
            Component::Prefix(_) => return Err(invalid()),
            Component::RootDir | Component::CurDir => continue,
            Component::ParentDir => {
                kept.pop().ok_or_else(invalid)?;
            },
            // Unix lets NUL through `components()`; the OS would cut the name short.
            Component::Normal(name) if name.as_encoded_bytes().contains(&0) => return Err(invalid()),
            Component::Normal(name) => kept.push(name),
        }
    }
    if kept.is_empty() {
        return Err(invalid());
    }
    Ok(kept.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Captain Atom 078.cbz", "Captain Atom 078.cbz")]
    #[case("Charlton/Captain Atom 078.cbz", "Charlton/Captain Atom 078.cbz")]
    #[case("/Charlton/Captain Atom 078.cbz", "Charlton/Captain Atom 078.cbz")]
    #[case("Charlton//Captain Atom 078.cbz", "Charlton/Captain Atom 078.cbz")]
    #[case("./Charlton/./Captain Atom 078.cbz", "Charlton/Captain Atom 078.cbz")]
    #[case("Charlton/Captain Atom/", "Charlton/Captain Atom")]
    #[case("Charlton/Unsorted/..", "Charlton")]
    #[case("covers/DC Comics/Batman 713.png", "covers/DC Comics/Batman 713.png")]
    fn test_normalized(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("/")]
    #[case("././/")]
    #[case("..")]
    #[case("../comics/Batman 713.cbz")]
    #[case("DC/../../Batman 713.cbz")]
    #[case("Batman\0713.cbz")]
    fn test_rejected(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(path) if path == Path::new(input)));
    }

    #[cfg(windows)]
    #[test]
    fn test_windows_separators_and_drives() {
        assert_eq!(validate("DC\\Batman 713.cbz").unwrap(), Path::new("DC/Batman 713.cbz"));
        assert!(validate("C:\\comics\\Batman 713.cbz").is_err());
    }
}
