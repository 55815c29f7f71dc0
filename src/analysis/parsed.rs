//! Parsing TypeScript sources into tree-sitter trees.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use tree_sitter::{Language, Node, Parser};

pub(crate) static TYPESCRIPT: Lazy<Language> = Lazy::new(|| tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into());
pub(crate) static TSX: Lazy<Language> = Lazy::new(|| tree_sitter_typescript::LANGUAGE_TSX.into());

/// File extensions the parser accepts (without dot).
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Holds a parsed tree-sitter tree and associated metadata.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The original source code (kept for node text extraction).
    pub source: Vec<u8>,
    /// Absolute path of the file.
    pub path: PathBuf,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Display form of the path for diagnostics.
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// Whether tree-sitter had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// 1-indexed line of the first syntax error, in source order.
    pub fn first_error_line(&self) -> Option<usize> {
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if node.is_error() || node.is_missing() {
                return Some(node.start_position().row + 1);
            }
            if node.has_error() {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.children(&mut cursor).collect();
                stack.extend(children.into_iter().rev());
            }
        }
        None
    }
}

/// Pick the grammar for a path, `None` for unsupported extensions.
pub fn language_for(path: &Path) -> Option<&'static Language> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tsx") => Some(&*TSX),
        Some("ts") | Some("mts") | Some("cts") => Some(&*TYPESCRIPT),
        _ => None,
    }
}

/// Whether a path looks like a parseable implementation file.
///
/// Declaration files (`.d.ts`) carry no implementations and are skipped.
pub fn is_source_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
        return false;
    }
    language_for(path).is_some()
}

/// Parse a source file into a tree-sitter tree.
///
/// Returns an error if the grammar cannot be loaded or tree-sitter gives up.
/// Recoverable syntax errors still produce a tree; see [`ParsedFile::has_errors`].
pub fn parse(path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
    let language = language_for(path)
        .ok_or_else(|| anyhow::anyhow!("unsupported file type: {}", path.display()))?;

    let mut parser = Parser::new();
    parser.set_language(language)?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("failed to parse TypeScript source: {}", path.display()))?;

    Ok(ParsedFile {
        tree,
        source: source.to_vec(),
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typescript() {
        let parsed = parse(Path::new("/app/a.ts"), b"export const x: number = 1;").unwrap();
        assert!(!parsed.has_errors());
        assert_eq!(parsed.root().kind(), "program");
    }

    #[test]
    fn test_parse_tsx() {
        let parsed = parse(
            Path::new("/app/view.tsx"),
            b"export const View = () => <div>hi</div>;",
        )
        .unwrap();
        assert!(!parsed.has_errors());
    }

    #[test]
    fn test_syntax_errors_flagged() {
        let parsed = parse(Path::new("/app/a.ts"), b"export const a = 1;\nexport function (").unwrap();
        assert!(parsed.has_errors());
        assert_eq!(parsed.first_error_line(), Some(2));

        let clean = parse(Path::new("/app/b.ts"), b"export const a = 1;").unwrap();
        assert_eq!(clean.first_error_line(), None);
    }

    #[test]
    fn test_source_file_filter() {
        assert!(is_source_file(Path::new("src/a.ts")));
        assert!(is_source_file(Path::new("src/a.tsx")));
        assert!(!is_source_file(Path::new("src/a.d.ts")));
        assert!(!is_source_file(Path::new("src/a.js")));
        assert!(parse(Path::new("a.rs"), b"fn main() {}").is_err());
    }
}
