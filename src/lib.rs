//! Schema-driven code generator. Resolves a JSON-Schema-dialect document
//! into a deduplicated graph of typed declarations with derived validation
//! rules, synthesizes default-populated JSON instances, merges JSON trees
//! structurally, and renders declarations as Rust source.
pub mod ast;
pub mod defaults;
pub mod emit_rs;
pub mod merge;
pub mod resolver;
pub mod schema;
pub mod validation;
