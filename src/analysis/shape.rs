//! Return-shape classification.
//!
//! Classification is syntactic: the outer generic identifier is compared by
//! text. Type aliases of the wrappers are not followed, so
//! `type Later<T> = Promise<T>` classifies as a plain value.

use tree_sitter::Node;

use super::{ParsedFile, ReturnShape};

/// Outer identifier of an asynchronous single value.
pub const ASYNC_VALUE_WRAPPER: &str = "Promise";

/// Outer identifiers of an asynchronous stream.
pub const ASYNC_STREAM_WRAPPERS: &[&str] = &["AsyncGenerator", "AsyncIterable", "AsyncIterableIterator"];

/// Element type assumed when nothing is declared.
pub const UNKNOWN_TYPE: &str = "any";

/// Classify a type node (the child of a `type_annotation`).
pub fn classify(parsed: &ParsedFile, ty: Node) -> ReturnShape {
    if ty.kind() == "generic_type" {
        if let Some(name) = ty.child_by_field_name("name") {
            let ident = parsed.node_text(name);
            let first_arg = ty
                .child_by_field_name("type_arguments")
                .and_then(|args| {
                    let mut cursor = args.walk();
                    let first = args
                        .named_children(&mut cursor)
                        .find(|n| n.kind() != "comment");
                    first
                })
                .map(|n| parsed.node_text(n).to_string())
                .unwrap_or_else(|| UNKNOWN_TYPE.to_string());

            if ident == ASYNC_VALUE_WRAPPER {
                return ReturnShape::AsyncValue(first_arg);
            }
            if ASYNC_STREAM_WRAPPERS.contains(&ident) {
                return ReturnShape::AsyncStream(first_arg);
            }
        }
    }

    ReturnShape::Value(parsed.node_text(ty).to_string())
}

/// Shape of a declaration without a return type annotation.
pub fn unannotated(is_async: bool, is_generator: bool) -> ReturnShape {
    if is_async && is_generator {
        ReturnShape::AsyncStream(UNKNOWN_TYPE.to_string())
    } else {
        ReturnShape::AsyncValue(UNKNOWN_TYPE.to_string())
    }
}

/// Check a declared shape against the declaration's own modifiers.
///
/// `async` declarations must declare a `Promise` and async generators must
/// declare a stream. A contradiction is reported as the reason string.
pub fn check(shape: &ReturnShape, is_async: bool, is_generator: bool) -> Result<(), String> {
    match (is_async, is_generator, shape) {
        (true, true, ReturnShape::AsyncStream(_)) => Ok(()),
        (true, true, _) => Err(format!(
            "async generator must declare {}<T>",
            ASYNC_STREAM_WRAPPERS[0]
        )),
        (true, false, ReturnShape::AsyncStream(_)) => Err(format!(
            "async declaration resolves to a {}; streams must be declared with `async function*`",
            ASYNC_VALUE_WRAPPER
        )),
        (true, false, ReturnShape::Value(text)) => Err(format!(
            "async declaration returns `{}`, expected {}<T> or {}<T>",
            text, ASYNC_VALUE_WRAPPER, ASYNC_STREAM_WRAPPERS[0]
        )),
        (false, true, _) => Err("synchronous generators cannot be exposed".to_string()),
        _ => Ok(()),
    }
}
