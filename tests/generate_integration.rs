//! Integration tests for the full generation pipeline.
//!
//! These tests copy the fixture project under `testdata/app` into a
//! temporary directory and run the generator against it.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use bridgegen::{
    Config, DiagnosticCode, DiagnosticReport, Error, Generator, Mode, OutputStatus, Severity,
};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Copy the fixture project into a fresh temporary directory.
fn setup() -> TempDir {
    let temp = TempDir::new().expect("should create temp dir");
    let fixture = testdata_path().join("app");

    for entry in WalkDir::new(&fixture) {
        let entry = entry.expect("should walk fixture");
        let target = temp.path().join(entry.path().strip_prefix(&fixture).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }

    temp
}

fn generator(root: &Path) -> Generator {
    let config = Config::load(&root.join("bridgegen.yaml")).expect("should load config");
    Generator::new(config)
}

fn expected(name: &str) -> String {
    fs::read_to_string(testdata_path().join("expected").join(name)).expect("should read expected output")
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).expect("should read generated output")
}

const BACKEND: &str = "src/main/bridge.generated.ts";
const BRIDGE: &str = "src/preload/bridge.generated.ts";
const TYPES: &str = "src/renderer/bridge.generated.d.ts";

#[test]
fn test_end_to_end_outputs() {
    let temp = setup();
    let root = temp.path();
    let generator = generator(root);

    let files = generator.discover().unwrap();
    assert_eq!(files.len(), 5, "test files and non-sources are skipped: {:?}", files);

    let mut diagnostics = DiagnosticReport::new();
    let summary = generator.run(&files, Mode::Write, &mut diagnostics).unwrap();

    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    assert_eq!(summary.methods, 5);
    assert_eq!(summary.namespaces, vec!["api", "logAPI", "systemAPI", "userAPI"]);
    assert!(summary
        .outputs
        .iter()
        .all(|o| o.status == OutputStatus::Written));

    assert_eq!(read(root, BACKEND), expected("backend.ts"));
    assert_eq!(read(root, BRIDGE), expected("bridge.ts"));
    assert_eq!(read(root, TYPES), expected("types.d.ts"));
}

#[test]
fn test_generated_files_are_not_rescanned() {
    let temp = setup();
    let root = temp.path();
    let generator = generator(root);

    let files = generator.discover().unwrap();
    generator
        .run(&files, Mode::Write, &mut DiagnosticReport::new())
        .unwrap();

    assert_eq!(generator.discover().unwrap(), files);
}

#[test]
fn test_rerun_is_deterministic() {
    let temp = setup();
    let root = temp.path();
    let generator = generator(root);

    let mut files = generator.discover().unwrap();
    let mut diagnostics = DiagnosticReport::new();
    let (_, first) = generator.render(&files, &mut diagnostics).unwrap();

    files.reverse();
    let (_, second) = generator.render(&files, &mut diagnostics).unwrap();
    assert_eq!(first, second);

    generator.run(&files, Mode::Write, &mut diagnostics).unwrap();
    let summary = generator.run(&files, Mode::Write, &mut diagnostics).unwrap();
    assert!(summary
        .outputs
        .iter()
        .all(|o| o.status == OutputStatus::Unchanged));
}

#[test]
fn test_check_mode() {
    let temp = setup();
    let root = temp.path();
    let generator = generator(root);
    let files = generator.discover().unwrap();

    // Nothing generated yet.
    let summary = generator
        .run(&files, Mode::Check, &mut DiagnosticReport::new())
        .unwrap();
    assert!(summary.is_stale());
    assert!(!root.join(BACKEND).exists(), "check mode must not write");

    generator
        .run(&files, Mode::Write, &mut DiagnosticReport::new())
        .unwrap();
    let summary = generator
        .run(&files, Mode::Check, &mut DiagnosticReport::new())
        .unwrap();
    assert!(!summary.is_stale());

    // A new exposed function changes all three outputs.
    fs::write(
        root.join("src/extra.ts"),
        "/** @expose systemAPI */\nexport async function reboot(): Promise<void> {}\n",
    )
    .unwrap();
    let files = generator.discover().unwrap();
    let summary = generator
        .run(&files, Mode::Check, &mut DiagnosticReport::new())
        .unwrap();
    assert!(summary
        .outputs
        .iter()
        .all(|o| o.status == OutputStatus::Stale));
}

#[test]
fn test_duplicate_method_writes_nothing() {
    let temp = setup();
    let root = temp.path();
    fs::write(
        root.join("src/legacy.ts"),
        "/** @expose systemAPI */\nexport async function getSystemInfo(): Promise<string> { return ''; }\n",
    )
    .unwrap();

    let generator = generator(root);
    let files = generator.discover().unwrap();
    let err = generator
        .run(&files, Mode::Write, &mut DiagnosticReport::new())
        .unwrap_err();

    match err {
        Error::DuplicateMethod {
            namespace,
            method,
            first,
            second,
        } => {
            assert_eq!(namespace, "systemAPI");
            assert_eq!(method, "getSystemInfo");
            assert!(first.contains("legacy.ts"), "{}", first);
            assert!(second.contains("system.ts"), "{}", second);
        }
        other => panic!("unexpected error: {}", other),
    }

    assert!(!root.join(BACKEND).exists());
    assert!(!root.join(BRIDGE).exists());
    assert!(!root.join(TYPES).exists());
}

#[test]
fn test_invalid_namespace_is_one_warning() {
    let temp = setup();
    let root = temp.path();
    fs::write(
        root.join("src/bad.ts"),
        "/** @expose My_API */\nexport async function getUser(id: number): Promise<number> { return id; }\n",
    )
    .unwrap();

    let generator = generator(root);
    let files = generator.discover().unwrap();
    let mut diagnostics = DiagnosticReport::new();
    let summary = generator.run(&files, Mode::Write, &mut diagnostics).unwrap();

    assert_eq!(summary.methods, 5);
    assert_eq!(diagnostics.len(), 1);
    let d = &diagnostics.diagnostics[0];
    assert_eq!(d.code, DiagnosticCode::InvalidNamespace);
    assert_eq!(d.severity, Severity::Warning);
    assert!(d.file.ends_with("bad.ts"));
    assert_eq!(d.line, 2);
    assert!(!read(root, BACKEND).contains("My_API"));
}

#[test]
fn test_broken_file_does_not_stop_the_batch() {
    let temp = setup();
    let root = temp.path();
    fs::write(root.join("src/broken.ts"), "export class {\n  @expose('x')\n").unwrap();

    let generator = generator(root);
    let files = generator.discover().unwrap();
    let mut diagnostics = DiagnosticReport::new();
    let summary = generator.run(&files, Mode::Write, &mut diagnostics).unwrap();

    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.diagnostics[0].code, DiagnosticCode::ParseError);
    assert_eq!(summary.methods, 5);
    assert_eq!(read(root, BACKEND), expected("backend.ts"));
}

#[test]
fn test_streaming_round_trip() {
    let temp = setup();
    let root = temp.path();
    let generator = generator(root);

    // Only the streaming source.
    let files = vec![root.join("src/logs.ts")];
    generator
        .run(&files, Mode::Write, &mut DiagnosticReport::new())
        .unwrap();

    let backend = read(root, BACKEND);
    assert!(backend.contains("import { registerStream } from '@bridgegen/runtime/backend';"));
    assert!(backend.contains("registerStream('logAPI:tail', tail);"));

    let bridge = read(root, BRIDGE);
    assert!(bridge.contains("import { expose, iterate } from '@bridgegen/runtime/bridge';"));
    assert!(bridge.contains("iterate('logAPI:tail', path, ...filters)"));

    let types = read(root, TYPES);
    assert!(types.contains(
        "tail(path: string, ...filters: string[]): AsyncGenerator<string, void, unknown>;"
    ));
}

#[test]
fn test_custom_runtime_and_annotation() {
    let temp = setup();
    let root = temp.path();
    fs::write(
        root.join("bridgegen.yaml"),
        "annotation: ipc\nruntime:\n  backend: '@acme/ipc-main'\n  bridge: '@acme/ipc-preload'\n",
    )
    .unwrap();
    fs::write(
        root.join("src/shell.ts"),
        "/** @ipc shellAPI */\nexport function openExternal(url: string): boolean { return true; }\n",
    )
    .unwrap();

    let generator = generator(root);
    let files = generator.discover().unwrap();
    let summary = generator
        .run(&files, Mode::Write, &mut DiagnosticReport::new())
        .unwrap();

    // `@expose` is no longer recognized.
    assert_eq!(summary.namespaces, vec!["shellAPI"]);
    assert!(read(root, BACKEND).contains("from '@acme/ipc-main';"));
    assert!(read(root, BRIDGE).contains("from '@acme/ipc-preload';"));
    assert!(read(root, TYPES).contains("openExternal(url: string): Promise<boolean>;"));
}

#[test]
fn test_same_function_name_in_two_namespaces() {
    let temp = setup();
    let root = temp.path();
    fs::write(
        root.join("src/comments.ts"),
        "/** @expose commentAPI */\nexport async function list(): Promise<string[]> { return []; }\n",
    )
    .unwrap();
    fs::write(
        root.join("src/posts.ts"),
        "/** @expose postAPI */\nexport async function list(): Promise<string[]> { return []; }\n",
    )
    .unwrap();

    let generator = generator(root);
    let files = generator.discover().unwrap();
    let summary = generator
        .run(&files, Mode::Write, &mut DiagnosticReport::new())
        .unwrap();
    assert_eq!(summary.methods, 7);

    // The first namespace keeps the plain name.
    let backend = read(root, BACKEND);
    assert!(backend.contains("import { list } from '../comments';"), "{}", backend);
    assert!(backend.contains("import { list as postAPI_list } from '../posts';"), "{}", backend);
    assert!(backend.contains("register('commentAPI:list', list);"));
    assert!(backend.contains("register('postAPI:list', postAPI_list);"));

    let bridge = read(root, BRIDGE);
    assert!(bridge.contains("list: () => invoke('commentAPI:list'),"));
    assert!(bridge.contains("list: () => invoke('postAPI:list'),"));
}
