/// Default-instance synthesis: builds a JSON instance from a schema
/// containing only the fields whose subtree carries a default somewhere.
/// Cycle safety comes from the per-traversal ref memo, never a depth limit.
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::schema::{ref_target, Definition, Definitions, Schema, TypeTag};

/// True when the subtree rooted at `definition` contains a usable default.
/// The memo is keyed by `$ref` string; the first visit inserts `false` as a
/// resolving marker, so a cyclic self-reference resolves false for that
/// cycle unless an outer branch proves it truthy.
pub fn has_defaults(
    definition: &Definition,
    definitions: &Definitions,
    ref_memo: &mut HashMap<String, bool>,
) -> bool {
    match definition {
        Definition::Schema(schema) => schema_has_defaults(schema, definitions, ref_memo),
        Definition::Shorthand(_) => false,
    }
}

fn schema_has_defaults(
    schema: &Schema,
    definitions: &Definitions,
    ref_memo: &mut HashMap<String, bool>,
) -> bool {
    let own = match schema.primary_type() {
        Some(TypeTag::Object) => schema
            .properties
            .as_ref()
            .map_or(false, |props| {
                props.iter().any(|(_, d)| has_defaults(d, definitions, ref_memo))
            }),
        Some(TypeTag::Array) => schema.items.as_ref().map_or(false, |items| {
            items
                .schemas
                .iter()
                .any(|s| schema_has_defaults(s, definitions, ref_memo))
        }),
        _ => false,
    };

    let via_ref = match &schema.reference {
        Some(reference) => {
            if let Some(&known) = ref_memo.get(reference) {
                known
            } else {
                ref_memo.insert(reference.clone(), false);
                let resolved = definitions
                    .get(ref_target(reference))
                    .map_or(false, |d| has_defaults(d, definitions, ref_memo));
                ref_memo.insert(reference.clone(), resolved);
                resolved
            }
        }
        None => false,
    };

    let via_all_of = schema.all_of.as_deref().map_or(false, |members| {
        members
            .iter()
            .any(|s| schema_has_defaults(s, definitions, ref_memo))
    });

    own || via_ref || via_all_of || schema.default.is_some()
}

/// Default-populated instance for a document, resolved against its own
/// definitions map.
pub fn synthesize_document(schema: &Schema) -> Value {
    let empty = Definitions::default();
    synthesize(schema, schema.definitions.as_ref().unwrap_or(&empty))
}

/// Recursively synthesize the default-populated instance of one schema.
/// `$ref` delegates to its target; a two-member `allOf` delegates to the
/// second member (the inheritance shorthand). An object includes a property
/// only when its subtree has a default; scalar defaults are coerced to
/// text. Deterministic for a fixed schema.
pub fn synthesize(schema: &Schema, definitions: &Definitions) -> Value {
    if let Some(reference) = &schema.reference {
        return match definitions.get(ref_target(reference)).and_then(|d| d.as_schema()) {
            Some(target) => synthesize(target, definitions),
            None => Value::Object(Map::new()),
        };
    }
    if let Some(members) = &schema.all_of {
        if members.len() == 2 {
            return synthesize(&members[1], definitions);
        }
    }

    let mut node = Map::new();
    if let Some(properties) = &schema.properties {
        for (name, definition) in properties.iter() {
            let mut ref_memo = HashMap::new();
            if !has_defaults(definition, definitions, &mut ref_memo) {
                continue;
            }
            let Some(prop) = definition.as_schema() else {
                continue;
            };
            let value = match prop.primary_type() {
                Some(TypeTag::Object) => synthesize(prop, definitions),
                Some(TypeTag::Array) => Value::Array(
                    prop.items
                        .as_ref()
                        .map(|items| {
                            items
                                .schemas
                                .iter()
                                .map(|s| synthesize(s, definitions))
                                .collect()
                        })
                        .unwrap_or_default(),
                ),
                // Ref-valued properties are not recursed here; delegation
                // happens only when synthesize is entered on the ref
                // itself, which keeps cyclic graphs terminating.
                _ => default_text(prop),
            };
            node.insert(name.clone(), value);
        }
    }
    Value::Object(node)
}

/// Text coercion of a `default`. An absent default stringifies the same
/// way as an explicit `null`; this arm is only reachable for properties
/// whose subtree was proven truthy through a ref.
fn default_text(schema: &Schema) -> Value {
    match &schema.default {
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(other) => Value::String(other.to_string()),
        None => Value::String(Value::Null.to_string()),
    }
}
