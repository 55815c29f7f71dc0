//! Generation runner that orchestrates a full run.
//!
//! read -> parse -> extract (parallel, per file) -> registry merge ->
//! validate -> render -> write. Files are rendered into memory first, so a
//! fatal error leaves every existing output untouched.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::analysis::{self, ExposedMethod, Extractor};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use crate::emit::{self, Rendered};
use crate::error::{Error, Result};
use crate::paths;
use crate::registry::MethodRegistry;

/// What to do with rendered outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write outputs whose contents changed.
    Write,
    /// Only compare outputs with what would be written.
    Check,
}

/// State of one output file after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStatus {
    Written,
    Unchanged,
    /// Missing or out of date (check mode).
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputReport {
    pub name: &'static str,
    pub path: PathBuf,
    pub status: OutputStatus,
}

/// Result of a successful run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub files: usize,
    pub methods: usize,
    pub namespaces: Vec<String>,
    pub outputs: Vec<OutputReport>,
}

impl Summary {
    pub fn is_stale(&self) -> bool {
        self.outputs.iter().any(|o| o.status == OutputStatus::Stale)
    }
}

/// Records and diagnostics of one analyzed file.
struct FileOutcome {
    methods: Vec<ExposedMethod>,
    diagnostics: Vec<Diagnostic>,
}

/// Runs generation for one configuration.
pub struct Generator {
    config: Config,
    extractor: Extractor,
}

impl Generator {
    /// Create a generator. The configuration must already be validated.
    pub fn new(config: Config) -> Self {
        let extractor = Extractor::new(config.default_namespace.clone()).annotation(config.annotation.clone());
        Self { config, extractor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Find source files under the project root.
    ///
    /// Hidden directories and `node_modules` are not entered; declaration
    /// files and the generated outputs themselves are skipped.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let base = self.config.base_dir();
        let include = self.config.include_set()?;
        let exclude = self.config.exclude_set()?;
        let outputs = self.config.resolved_outputs();

        let mut files = Vec::new();
        for entry in WalkDir::new(&base)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && name != "node_modules"
            })
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = paths::normalize(entry.path());
            if !analysis::is_source_file(&path) || outputs.contains(&path) {
                continue;
            }

            let relative = path.strip_prefix(&base).unwrap_or(&path);
            if include.is_match(relative) && !exclude.is_match(relative) {
                files.push(path);
            }
        }

        files.sort();
        tracing::debug!(root = %base.display(), count = files.len(), "discovered source files");
        Ok(files)
    }

    /// Extract every file and merge the records into a validated registry.
    ///
    /// Diagnostics reach `sink` in input path order regardless of how the
    /// files were scheduled.
    pub fn analyze(&self, files: &[PathBuf], sink: &mut dyn DiagnosticSink) -> Result<MethodRegistry> {
        let files: BTreeSet<&PathBuf> = files.iter().collect();
        let files: Vec<&PathBuf> = files.into_iter().collect();
        tracing::info!(count = files.len(), "analyzing source files");

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|path| self.analyze_file(path))
            .collect();

        let mut registry = MethodRegistry::new();
        for outcome in outcomes {
            for diagnostic in outcome.diagnostics {
                sink.push(diagnostic);
            }
            for method in outcome.methods {
                registry.insert(method)?;
            }
        }
        registry.validate()?;

        tracing::info!(
            methods = registry.len(),
            namespaces = registry.all_namespaces().count(),
            "built method registry"
        );
        Ok(registry)
    }

    fn analyze_file(&self, path: &Path) -> FileOutcome {
        let mut outcome = FileOutcome {
            methods: Vec::new(),
            diagnostics: Vec::new(),
        };
        let display = path.display().to_string();

        let source = match fs::read(path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "cannot read source file");
                outcome.diagnostics.push(Diagnostic::new(
                    DiagnosticCode::UnreadableFile,
                    display,
                    0,
                    format!("cannot read file: {}", e),
                ));
                return outcome;
            }
        };

        let parsed = match analysis::parse(path, &source) {
            Ok(parsed) => parsed,
            Err(e) => {
                outcome.diagnostics.push(Diagnostic::new(
                    DiagnosticCode::ParseError,
                    display,
                    0,
                    e.to_string(),
                ));
                return outcome;
            }
        };

        if let Some(line) = parsed.first_error_line() {
            outcome.diagnostics.push(Diagnostic::new(
                DiagnosticCode::ParseError,
                display,
                line,
                "syntax error; file skipped",
            ));
            return outcome;
        }

        outcome.methods = self.extractor.extract(&parsed, &mut outcome.diagnostics);
        outcome
    }

    /// Analyze and render without touching the filesystem outputs.
    pub fn render(&self, files: &[PathBuf], sink: &mut dyn DiagnosticSink) -> Result<(MethodRegistry, Rendered)> {
        let registry = self.analyze(files, sink)?;
        let rendered = emit::render_all(&registry, &self.config.resolved_outputs(), &self.config.runtime)?;
        Ok((registry, rendered))
    }

    /// Full run over `files`.
    pub fn run(&self, files: &[PathBuf], mode: Mode, sink: &mut dyn DiagnosticSink) -> Result<Summary> {
        let (registry, rendered) = self.render(files, sink)?;
        let outputs = self.config.resolved_outputs();

        let mut reports = Vec::new();
        for ((name, _), (path, contents)) in outputs.iter().zip(rendered.files(&outputs)) {
            let status = match mode {
                Mode::Write => write_output(path, contents)?,
                Mode::Check => check_output(path, contents),
            };
            tracing::info!(output = name, path = %path.display(), ?status, "output");
            reports.push(OutputReport {
                name,
                path: path.to_path_buf(),
                status,
            });
        }

        Ok(Summary {
            files: files.len(),
            methods: registry.len(),
            namespaces: registry.all_namespaces().map(str::to_string).collect(),
            outputs: reports,
        })
    }
}

fn check_output(path: &Path, contents: &str) -> OutputStatus {
    match fs::read_to_string(path) {
        Ok(existing) if existing == contents => OutputStatus::Unchanged,
        _ => OutputStatus::Stale,
    }
}

/// Atomically replace `path` with `contents` unless it already matches.
fn write_output(path: &Path, contents: &str) -> Result<OutputStatus> {
    if check_output(path, contents) == OutputStatus::Unchanged {
        return Ok(OutputStatus::Unchanged);
    }

    let write_error = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(write_error)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
    tmp.write_all(contents.as_bytes()).map_err(write_error)?;
    tmp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(OutputStatus::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_write_output_skips_unchanged() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/gen.ts");

        assert_eq!(write_output(&path, "a\n").unwrap(), OutputStatus::Written);
        assert_eq!(write_output(&path, "a\n").unwrap(), OutputStatus::Unchanged);
        assert_eq!(write_output(&path, "b\n").unwrap(), OutputStatus::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "b\n");
        assert_eq!(check_output(&path, "c\n"), OutputStatus::Stale);
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/a.ts", "");
        write(root, "src/nested/b.tsx", "");
        write(root, "src/types.d.ts", "");
        write(root, "src/a.test.ts", "");
        write(root, "src/node_modules/x/index.ts", "");
        write(root, "src/.cache/c.ts", "");
        write(root, "src/main/bridge.generated.ts", "");
        write(root, "lib/outside.ts", "");

        let yaml = "exclude: ['**/*.test.ts']\n";
        let config = Config::from_yaml(yaml, root).unwrap();
        let files = Generator::new(config).discover().unwrap();

        let base = paths::normalize(root);
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(&base).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(relative, vec!["src/a.ts", "src/nested/b.tsx"]);
    }

    #[test]
    fn test_unreadable_and_broken_files_are_isolated() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let good = write(
            root,
            "src/good.ts",
            "/** @expose systemAPI */\nexport async function ping(): Promise<string> { return 'pong'; }\n",
        );
        let broken = write(root, "src/broken.ts", "/** @expose */\nexport function (\n");
        let missing = root.join("src/missing.ts");

        let generator = Generator::new(Config::with_root(root));
        let mut diagnostics = Vec::new();
        let registry = generator
            .analyze(&[missing, good, broken], &mut diagnostics)
            .unwrap();

        assert_eq!(registry.len(), 1);
        let codes: Vec<_> = diagnostics.iter().map(|d| d.code).collect();
        // Sorted by path: broken.ts, missing.ts.
        assert_eq!(codes, vec![DiagnosticCode::ParseError, DiagnosticCode::UnreadableFile]);
    }
}
