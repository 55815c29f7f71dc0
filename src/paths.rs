//! Lexical path helpers shared by extraction, emission and the generator.
//!
//! None of these touch the filesystem, so results depend only on the input
//! strings.

use std::path::{Component, Path, PathBuf};

/// Extensions stripped from import specifiers, longest first.
const STRIPPED_EXTENSIONS: &[&str] = &[
    ".d.ts", ".d.mts", ".d.cts", ".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs",
];

/// Resolve `.` and `..` components without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make `path` absolute against `base` and normalize it.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Relative path from directory `from` to `to`. Both must be absolute and
/// normalized.
pub fn relative(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &to[common..] {
        out.push(component.as_os_str());
    }
    out
}

/// Render a relative path as a module specifier: `/` separators, a `./`
/// prefix when it does not climb, and no source extension.
pub fn to_specifier(relative: &Path) -> String {
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/");

    let stripped = strip_extension(&joined);
    if stripped.starts_with("../") || stripped == ".." {
        stripped.to_string()
    } else {
        format!("./{}", stripped)
    }
}

fn strip_extension(path: &str) -> &str {
    STRIPPED_EXTENSIONS
        .iter()
        .find_map(|ext| path.strip_suffix(ext))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("/app/src/services/../models/./user")),
            PathBuf::from("/app/src/models/user")
        );
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_relative() {
        assert_eq!(
            relative(Path::new("/app/src/main"), Path::new("/app/src/services/user.ts")),
            PathBuf::from("../services/user.ts")
        );
        assert_eq!(
            relative(Path::new("/app/src"), Path::new("/app/src/user.ts")),
            PathBuf::from("user.ts")
        );
    }

    #[test]
    fn test_to_specifier() {
        assert_eq!(to_specifier(Path::new("../services/user.ts")), "../services/user");
        assert_eq!(to_specifier(Path::new("user.tsx")), "./user");
        assert_eq!(to_specifier(Path::new("types/api.d.ts")), "./types/api");
        assert_eq!(to_specifier(Path::new("models")), "./models");
    }
}
