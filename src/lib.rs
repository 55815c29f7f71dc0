//! bridgegen - typed call bridge generator.
//!
//! bridgegen reads TypeScript sources, finds declarations annotated with
//! `@expose` (class methods, functions and function-valued bindings) and
//! generates three files that wire a backend process to sandboxed
//! front-end processes:
//!
//! - a backend module registering every exposed method with the runtime
//! - a bridge module forwarding calls from the front end
//! - a type declaration module describing the call surface
//!
//! # Architecture
//!
//! The codebase uses tree-sitter for AST-based analysis:
//!
//! - `analysis`: parsing, annotation reading and declaration extraction
//! - `registry`: exposed methods grouped and ordered by namespace
//! - `emit`: rendering of the three generated files
//! - `generate`: the end-to-end run (discovery, parallel extraction, writes)
//! - `config`: YAML configuration schema
//! - `diagnostics` / `report`: per-declaration problems and their output

pub mod analysis;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod generate;
pub mod paths;
pub mod registry;
pub mod report;

pub use analysis::{ExposedMethod, Extractor, Parameter, ParsedFile, ReturnShape};
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticReport, DiagnosticSink, Severity};
pub use emit::{render_all, Rendered};
pub use error::{Error, Result};
pub use generate::{Generator, Mode, OutputStatus, Summary};
pub use registry::{MethodRegistry, NamespaceGroup};
