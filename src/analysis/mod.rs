//! AST-backed declaration analysis.
//!
//! This module turns TypeScript sources into canonical [`ExposedMethod`]
//! records using tree-sitter. Per file it collects:
//! - exposed class methods, functions and function-valued bindings
//! - their parameters and classified return shapes
//! - the structural types their signatures reference, traced to a module
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌────────────────┐
//! │ Source Files    │────▶│ parse        │────▶│ ParsedFile     │
//! └─────────────────┘     └──────────────┘     └────────────────┘
//!                                                      │
//!                         ┌──────────────┐             ▼
//!                         │ FileScope    │────▶┌────────────────┐
//!                         │ (imports,    │     │ Extractor      │──▶ Vec<ExposedMethod>
//!                         │  types)      │     │ (annotation,   │──▶ Diagnostics
//!                         └──────────────┘     │  shape)        │
//!                                              └────────────────┘
//! ```

pub mod annotation;
mod extract;
mod facts;
pub mod parsed;
mod scope;
pub mod shape;

pub use annotation::{is_camel_case, is_identifier, Annotation};
pub use extract::{Extractor, DEFAULT_ANNOTATION};
pub use facts::{
    ExportKind, ExposedMethod, ImportedName, ModuleRef, Parameter, ReturnShape, TypeRef,
};
pub use parsed::{is_source_file, parse, ParsedFile};
pub use scope::{FileScope, ImportBinding, TypeOrigin};
