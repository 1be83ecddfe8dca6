use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("relative path is empty")]
    Empty,
    #[error("relative path {0:?} contains unsupported component")]
    UnsupportedComponent(String),
}

/// Appends `name` to a `/`-joined relative path.
pub fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Rejects remote names that would not map to exactly one local path entry.
pub fn check_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        return Err(PathError::Empty);
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(PathError::UnsupportedComponent(name.to_string()));
    }
    Ok(())
}

pub fn local_target_for(output_root: &Path, relative_path: &str) -> Result<PathBuf, PathError> {
    if relative_path.is_empty() {
        return Err(PathError::Empty);
    }

    // Remote names are joined with '/'; every piece must be a plain name so
    // distinct relative paths never land on the same local file.
    let mut out = output_root.to_path_buf();
    for segment in relative_path.split('/') {
        check_name(segment)
            .map_err(|_| PathError::UnsupportedComponent(relative_path.to_string()))?;
        match Path::new(segment).components().next() {
            Some(Component::Normal(part)) => out.push(part),
            _ => return Err(PathError::UnsupportedComponent(relative_path.to_string())),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_relative_path_under_output_root() {
        let root = PathBuf::from("/downloads");
        let mapped = local_target_for(&root, "docs/a.pdf").unwrap();
        assert_eq!(mapped, PathBuf::from("/downloads/docs/a.pdf"));
    }

    #[test]
    fn rejects_parent_dir() {
        let root = PathBuf::from("/downloads");
        assert!(matches!(
            local_target_for(&root, "docs/../../secret"),
            Err(PathError::UnsupportedComponent(_))
        ));
    }

    #[test]
    fn rejects_paths_without_a_name() {
        let root = PathBuf::from("/downloads");
        assert!(matches!(local_target_for(&root, ""), Err(PathError::Empty)));
        assert!(matches!(
            local_target_for(&root, "/"),
            Err(PathError::UnsupportedComponent(_))
        ));
    }

    #[test]
    fn rejects_components_that_would_collapse() {
        let root = PathBuf::from("/downloads");
        for rel in ["./dup.txt", "docs//a.pdf", "docs/.", "/etc/passwd", "a\\b"] {
            assert!(
                matches!(
                    local_target_for(&root, rel),
                    Err(PathError::UnsupportedComponent(_))
                ),
                "{rel} should be rejected"
            );
        }
    }

    #[test]
    fn names_must_be_single_entries() {
        assert!(check_name("a.pdf").is_ok());
        assert!(check_name("..hidden").is_ok());
        assert!(matches!(check_name(""), Err(PathError::Empty)));
        assert!(check_name(".").is_err());
        assert!(check_name("a/b").is_err());
    }

    #[test]
    fn join_relative_skips_empty_parent() {
        assert_eq!(join_relative("", "a"), "a");
        assert_eq!(join_relative("b/d", "e"), "b/d/e");
    }
}
