//! Module identifier resolution.
//!
//! Maps a module identifier to an absolute file path, restricted to the
//! extensions that have a registered compiler.
//!
//! ## Identifier forms
//!
//! - Relative: `lib/util`, `./nav` — joined onto the base directory
//! - Absolute: `/srv/assets/app`
//! - With extension: `app.js` — accepted as-is when `js` is registered
//!
//! An identifier without a registered extension is probed by appending each
//! registered extension in sorted order (`nav` → `nav.css`, `nav.js`, ...),
//! so resolution is deterministic even though compilers are registered in a
//! hash map.

use crate::error::{PackError, PackResult};
use std::path::{Path, PathBuf};

/// Resolve `id` against `basedir` under the registered `extensions`.
///
/// Returns the canonicalized path of the first matching candidate, or a
/// resolution error listing every candidate that was tried.
pub fn resolve(id: &str, basedir: &Path, extensions: &[String]) -> PackResult<PathBuf> {
    let joined = if Path::new(id).is_absolute() {
        PathBuf::from(id)
    } else {
        basedir.join(id)
    };

    let mut tried = Vec::new();

    // Exact match when the identifier already names a registered extension.
    if let Some(ext) = joined.extension().and_then(|e| e.to_str()) {
        if extensions.iter().any(|e| e == ext) {
            if joined.is_file() {
                return Ok(canonical(joined));
            }
            tried.push(joined.clone());
        }
    }

    for ext in extensions {
        let candidate = append_extension(&joined, ext);
        if candidate.is_file() {
            return Ok(canonical(candidate));
        }
        tried.push(candidate);
    }

    Err(PackError::Resolution {
        id: id.to_string(),
        basedir: basedir.to_path_buf(),
        tried,
    })
}

/// `foo` + `js` → `foo.js`; `jquery.min` + `js` → `jquery.min.js`.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

/// Canonicalize for stable cache identity, falling back to the candidate
/// itself when canonicalization fails (e.g. a parent symlink vanished
/// between the existence check and here).
fn canonical(path: PathBuf) -> PathBuf {
    dunce::canonicalize(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_resolve_appends_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "x;").unwrap();

        let resolved = resolve("app", dir.path(), &exts(&["js"])).unwrap();
        assert_eq!(resolved.file_name().unwrap(), "app.js");
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_resolve_exact_with_registered_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "x;").unwrap();

        let resolved = resolve("app.js", dir.path(), &exts(&["js"])).unwrap();
        assert_eq!(resolved.file_name().unwrap(), "app.js");
    }

    #[test]
    fn test_resolve_unregistered_extension_is_probed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("jquery.min.js"), "x;").unwrap();

        // "min" is not a registered extension, so the exact branch is
        // skipped and probing appends ".js".
        let resolved = resolve("jquery.min", dir.path(), &exts(&["js"])).unwrap();
        assert_eq!(resolved.file_name().unwrap(), "jquery.min.js");
    }

    #[test]
    fn test_resolve_missing_lists_tried_candidates() {
        let dir = tempdir().unwrap();

        let err = resolve("nope", dir.path(), &exts(&["css", "js"])).unwrap_err();
        match err {
            PackError::Resolution { id, tried, .. } => {
                assert_eq!(id, "nope");
                let names: Vec<_> = tried
                    .iter()
                    .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
                    .collect();
                assert_eq!(names, vec!["nope.css", "nope.js"]);
            }
            other => panic!("expected resolution error, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_nested_relative_id() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/util.js"), "u;").unwrap();

        let resolved = resolve("lib/util", dir.path(), &exts(&["js"])).unwrap();
        assert!(resolved.ends_with("lib/util.js"));
    }

    #[test]
    fn test_resolve_absolute_id() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("abs.js"), "a;").unwrap();
        let id = dir.path().join("abs").display().to_string();

        let resolved = resolve(&id, Path::new("/unrelated"), &exts(&["js"])).unwrap();
        assert_eq!(resolved.file_name().unwrap(), "abs.js");
    }
}
