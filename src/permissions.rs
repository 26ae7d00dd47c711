use crate::error::EditError;
use serde::Serializer;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Resolves `requested` against the book `root` and guarantees the result is
/// inside it.
///
/// This function is the single source of truth for file system boundaries.
/// `..` segments are folded lexically, then the longest existing prefix is
/// canonicalized so that symlinks pointing outside the book are caught too.
/// The target itself (and any missing parent directories) may not exist yet.
///
/// # Returns
/// * `Ok(path)` with an absolute path that is a descendant of `root`.
/// * `Err(EditError::PathEscapesRoot)` if the resolved path leaves `root`.
/// * `Err(EditError::Io)` if `root` itself cannot be resolved.
pub fn resolve_within_root(root: &Path, requested: &str) -> Result<PathBuf, EditError> {
    let base = root
        .canonicalize()
        .map_err(|source| EditError::io(root, source))?;

    let joined = normalize_lexically(&base.join(requested));
    let resolved =
        canonicalize_existing_prefix(&joined).map_err(|source| EditError::io(&joined, source))?;

    if !resolved.starts_with(&base) {
        return Err(EditError::PathEscapesRoot {
            path: requested.to_string(),
            root: base,
        });
    }

    Ok(resolved)
}

/// Returns `path` relative to the canonical `root`, for display and provenance.
pub fn relative_to_root(root: &Path, path: &Path) -> Option<PathBuf> {
    let base = root.canonicalize().ok()?;
    path.strip_prefix(&base).ok().map(Path::to_path_buf)
}

/// Serializes a path as a string, replacing bytes that are not valid UTF-8.
pub(crate) fn serialize_lossy<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn canonicalize_existing_prefix(path: &Path) -> std::io::Result<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut missing: Vec<OsString> = Vec::new();

    while !existing.exists() {
        let Some(name) = existing.file_name() else {
            break;
        };
        missing.push(name.to_os_string());
        existing.pop();
    }

    let mut resolved = existing.canonicalize()?;
    for name in missing.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::Builder;

    // Helper to set up a book directory next to a directory it must not reach.
    fn setup_test_dirs() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let tmp_dir = Builder::new().prefix("perm-test-").tempdir().unwrap();
        let book_dir = tmp_dir.path().join("book");
        let outside_dir = tmp_dir.path().join("outside");

        fs::create_dir_all(book_dir.join("chapters")).unwrap();
        fs::create_dir_all(&outside_dir).unwrap();

        fs::write(book_dir.join("chapters/chapter-1.md"), "content").unwrap();
        fs::write(outside_dir.join("secret.txt"), "secret").unwrap();

        (tmp_dir, book_dir, outside_dir)
    }

    #[test]
    fn test_existing_file_in_book() {
        let (_tmp_dir, book, _outside) = setup_test_dirs();
        let resolved = resolve_within_root(&book, "chapters/chapter-1.md").unwrap();
        assert_eq!(
            resolved,
            book.canonicalize().unwrap().join("chapters/chapter-1.md")
        );
    }

    #[test]
    fn test_new_file_in_missing_nested_dirs() {
        let (_tmp_dir, book, _outside) = setup_test_dirs();
        let resolved = resolve_within_root(&book, "notes/deeply/nested/idea.md").unwrap();
        assert!(resolved.starts_with(book.canonicalize().unwrap()));
        assert!(resolved.ends_with("notes/deeply/nested/idea.md"));
    }

    #[test]
    fn test_parent_segments_that_stay_inside_are_allowed() {
        let (_tmp_dir, book, _outside) = setup_test_dirs();
        let resolved = resolve_within_root(&book, "chapters/../outline.md").unwrap();
        assert_eq!(resolved, book.canonicalize().unwrap().join("outline.md"));
    }

    #[test]
    fn test_parent_traversal_escapes_root() {
        let (_tmp_dir, book, _outside) = setup_test_dirs();
        let result = resolve_within_root(&book, "../../etc/passwd");
        assert!(matches!(result, Err(EditError::PathEscapesRoot { .. })));

        let result = resolve_within_root(&book, "../outside/secret.txt");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("outside of the book directory"));
    }

    #[test]
    fn test_absolute_paths_are_checked_too() {
        let (_tmp_dir, book, outside) = setup_test_dirs();
        let secret = outside.join("secret.txt");
        let result = resolve_within_root(&book, secret.to_str().unwrap());
        assert!(matches!(result, Err(EditError::PathEscapesRoot { .. })));

        let inside = book.join("chapters/chapter-1.md");
        assert!(resolve_within_root(&book, inside.to_str().unwrap()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_book_is_rejected() {
        let (_tmp_dir, book, outside) = setup_test_dirs();
        std::os::unix::fs::symlink(&outside, book.join("shortcut")).unwrap();

        let result = resolve_within_root(&book, "shortcut/secret.txt");
        assert!(matches!(result, Err(EditError::PathEscapesRoot { .. })));
    }

    #[test]
    fn test_missing_root_is_an_io_error() {
        let (tmp_dir, _book, _outside) = setup_test_dirs();
        let result = resolve_within_root(&tmp_dir.path().join("no-such-book"), "a.md");
        assert!(matches!(result, Err(EditError::Io { .. })));
    }

    #[test]
    fn test_relative_to_root() {
        let (_tmp_dir, book, _outside) = setup_test_dirs();
        let resolved = resolve_within_root(&book, "chapters/chapter-1.md").unwrap();
        assert_eq!(
            relative_to_root(&book, &resolved),
            Some(PathBuf::from("chapters/chapter-1.md"))
        );
    }
}
