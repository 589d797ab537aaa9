/// Rust source emission backend: renders abstract type declarations and
/// the fixed validation-support set as compilable source text.
mod decl;
mod support;
mod writer;

pub use decl::{emit_declaration, file_name, ident_for};
pub use support::{emit_support, support_file_name};
pub use writer::{escape_str, CodeWriter};
