/// Structural merge of two JSON trees, independent of any schema.
/// Operates on acyclic values only.
use serde_json::{Map, Value};

/// Merge `right` into `left`. Arrays merge element-wise by index and the
/// left length wins: right's excess trailing elements are dropped.
/// Everything else is treated as an object (a scalar contributes no
/// fields): fields unique to either side pass through, shared fields merge
/// recursively.
pub fn merge(left: &Value, right: &Value) -> Value {
    if let Value::Array(items) = left {
        let right_items: &[Value] = right.as_array().map(Vec::as_slice).unwrap_or(&[]);
        return Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, l)| match right_items.get(i) {
                    Some(r) => merge(l, r),
                    None => l.clone(),
                })
                .collect(),
        );
    }

    let left_fields = left.as_object();
    let right_fields = right.as_object();
    // Two scalars have no fields to union; the left value wins outright,
    // which keeps merge(l, l) == l at every leaf.
    if left_fields.is_none() && right_fields.is_none() {
        return left.clone();
    }
    let mut out = Map::new();
    if let Some(fields) = left_fields {
        for (name, value) in fields {
            match right_fields.and_then(|r| r.get(name)) {
                Some(other) => out.insert(name.clone(), merge(value, other)),
                None => out.insert(name.clone(), value.clone()),
            };
        }
    }
    if let Some(fields) = right_fields {
        for (name, value) in fields {
            if !out.contains_key(name) {
                out.insert(name.clone(), value.clone());
            }
        }
    }
    Value::Object(out)
}
