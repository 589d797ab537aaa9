/// Renders one resolved declaration as a serde-ready Rust struct with a
/// `validate()` method generated from its rule set.
use crate::ast::{DefaultLiteral, FieldDecl, ResolvedType, TypeDeclaration};
use crate::validation::{Constraint, ValidationRule};

use super::writer::{escape_str, CodeWriter};

/// One generated source file per type, named after the declaration.
pub fn file_name(decl: &TypeDeclaration) -> String {
    format!("{}.rs", ident_for(&decl.name))
}

pub fn emit_declaration(package: &str, decl: &TypeDeclaration) -> String {
    let mut w = CodeWriter::new();
    w.line(&format!(
        "//! Generated type `{}` for package `{package}`; do not edit.",
        decl.name
    ));
    w.line("//! Generated code depends on serde (derive), serde_json, regex, chrono and rust_decimal.");
    w.blank();
    w.line("use serde::{Deserialize, Serialize};");
    if decl.catch_all.is_some() {
        w.line("use std::collections::HashMap;");
    }
    for named in named_field_types(decl) {
        w.line(&format!("use super::{}::{named};", ident_for(&named)));
    }
    w.line(&format!("use super::validation::{{{}}};", support_imports(decl)));
    w.blank();

    if let Some(base) = &decl.supertype {
        w.line(&format!(
            "/// Extends `{base}`; base fields are carried inline as overrides."
        ));
    }
    w.line("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]");
    w.open(&format!("pub struct {}", decl.name));
    for field in &decl.fields {
        let ident = ident_for(&field.name);
        if ident != field.name {
            w.line(&format!("#[serde(rename = \"{}\")]", escape_str(&field.name)));
        }
        w.line(&format!("pub {ident}: {},", rust_type(&field.ty)));
    }
    if let Some(catch_all) = &decl.catch_all {
        w.line("#[serde(flatten)]");
        w.line(&format!(
            "pub additional_properties: HashMap<String, {}>,",
            catch_all_type(&catch_all.value_type)
        ));
    }
    w.close();

    if all_fields_optional(decl) && (!decl.fields.is_empty() || decl.catch_all.is_some()) {
        w.blank();
        emit_default_impl(&mut w, decl);
    }

    w.blank();
    w.open(&format!("impl {}", decl.name));
    for (key, value) in &decl.metadata {
        w.line(&format!(
            "pub const {}: &'static str = \"{}\";",
            const_ident(key),
            escape_str(value)
        ));
    }
    emit_validate(&mut w, decl);
    w.close();
    w.finish()
}

fn emit_default_impl(w: &mut CodeWriter, decl: &TypeDeclaration) {
    w.open(&format!("impl Default for {}", decl.name));
    w.open("fn default() -> Self");
    w.open("Self");
    for field in &decl.fields {
        w.line(&format!(
            "{}: {},",
            ident_for(&field.name),
            default_expr(field)
        ));
    }
    if decl.catch_all.is_some() {
        w.line("additional_properties: HashMap::new(),");
    }
    w.close();
    w.close();
    w.close();
}

fn default_expr(field: &FieldDecl) -> String {
    match &field.default {
        Some(DefaultLiteral::Text(s)) => format!("Some(\"{}\".to_string())", escape_str(s)),
        Some(DefaultLiteral::Decimal(n)) => format!("Some(\"{n}\".parse().unwrap_or_default())"),
        Some(DefaultLiteral::Integer(i)) => format!("Some({i})"),
        Some(DefaultLiteral::Boolean(b)) => format!("Some({b})"),
        Some(DefaultLiteral::Absent) | None => "None".to_string(),
    }
}

fn emit_validate(w: &mut CodeWriter, decl: &TypeDeclaration) {
    w.open("pub fn validate(&self, name: &str) -> Validation");
    if decl.rules.is_empty() {
        w.line("let _ = name;");
        w.line("Validation::Valid");
    } else {
        w.line("let mut errors: Vec<ValidationError> = Vec::new();");
        for rule in &decl.rules {
            emit_rule(w, decl, rule);
        }
        w.line("Validation::from_errors(name, errors)");
    }
    w.close();
}

fn emit_rule(w: &mut CodeWriter, decl: &TypeDeclaration, rule: &ValidationRule) {
    let ident = ident_for(&rule.field);
    if rule.required {
        // Sequential rules on the same field shadow the binding.
        w.line(&format!("let value = &self.{ident};"));
        emit_constraint(w, decl, rule);
    } else {
        w.open(&format!("if let Some(value) = &self.{ident}"));
        emit_constraint(w, decl, rule);
        w.close();
    }
}

fn emit_constraint(w: &mut CodeWriter, decl: &TypeDeclaration, rule: &ValidationRule) {
    let field = escape_str(&rule.field);
    let integer_field = decl
        .field(&rule.field)
        .map_or(false, |f| f.ty.unwrapped() == &ResolvedType::Integer);
    let bound = |n: &serde_json::Number| {
        if integer_field {
            format!("{n}")
        } else {
            format!("\"{n}\".parse().unwrap_or_default()")
        }
    };
    let push_number = |w: &mut CodeWriter, message_fn: &str, n: &serde_json::Number| {
        w.line(&format!(
            "errors.push(ValidationError::new(\"{field}\", ValidationReason::NumberLimit, ValidationError::{message_fn}(\"{n}\")));"
        ));
    };
    match &rule.constraint {
        Constraint::MaxLength(max) => {
            w.open(&format!("if value.chars().count() > {max}"));
            w.line(&format!(
                "errors.push(ValidationError::new(\"{field}\", ValidationReason::StringLength, ValidationError::message_for_string_max({max})));"
            ));
            w.close();
        }
        Constraint::MinLength(min) => {
            w.open(&format!("if value.chars().count() < {min}"));
            w.line(&format!(
                "errors.push(ValidationError::new(\"{field}\", ValidationReason::StringLength, ValidationError::message_for_string_min({min})));"
            ));
            w.close();
        }
        Constraint::Pattern(pattern) => {
            let escaped = escape_str(pattern);
            w.open(&format!("if !matches_pattern(value, \"{escaped}\")"));
            w.line(&format!(
                "errors.push(ValidationError::new(\"{field}\", ValidationReason::StringPattern, ValidationError::message_for_string_pattern(\"{escaped}\")));"
            ));
            w.close();
        }
        Constraint::Minimum(n) => {
            w.open(&format!("if *value <= {}", bound(n)));
            push_number(w, "message_for_minimum", n);
            w.close();
        }
        Constraint::Maximum(n) => {
            w.open(&format!("if *value >= {}", bound(n)));
            push_number(w, "message_for_maximum", n);
            w.close();
        }
        Constraint::ExclusiveMinimum(n) => {
            w.open(&format!("if *value < {}", bound(n)));
            push_number(w, "message_for_exclusive_minimum", n);
            w.close();
        }
        Constraint::ExclusiveMaximum(n) => {
            w.open(&format!("if *value > {}", bound(n)));
            push_number(w, "message_for_exclusive_maximum", n);
            w.close();
        }
        Constraint::Nested(_) => {
            w.line(&format!(
                "errors.extend(value.validate(\"{field}\").as_children_of(\"{field}\"));"
            ));
        }
    }
}

fn support_imports(decl: &TypeDeclaration) -> String {
    let mut names = vec!["Validation"];
    if !decl.rules.is_empty() {
        names.push("ValidationError");
        if decl
            .rules
            .iter()
            .any(|r| !matches!(r.constraint, Constraint::Nested(_)))
        {
            names.push("ValidationReason");
        }
    }
    if decl
        .rules
        .iter()
        .any(|r| matches!(r.constraint, Constraint::Pattern(_)))
    {
        names.push("matches_pattern");
    }
    names.join(", ")
}

fn named_field_types(decl: &TypeDeclaration) -> Vec<String> {
    let mut names = Vec::new();
    let mut push = |ty: &ResolvedType| {
        if let ResolvedType::Named(name) = base_type(ty) {
            if name != &decl.name && !names.contains(name) {
                names.push(name.clone());
            }
        }
    };
    for field in &decl.fields {
        push(&field.ty);
    }
    if let Some(catch_all) = &decl.catch_all {
        push(&catch_all.value_type);
    }
    names
}

fn base_type(ty: &ResolvedType) -> &ResolvedType {
    match ty {
        ResolvedType::Optional(inner) | ResolvedType::Sequence(inner) => base_type(inner),
        other => other,
    }
}

fn all_fields_optional(decl: &TypeDeclaration) -> bool {
    decl.fields.iter().all(|f| !f.required)
}

fn rust_type(ty: &ResolvedType) -> String {
    type_text(ty, true)
}

fn catch_all_type(ty: &ResolvedType) -> String {
    type_text(ty, false)
}

/// `boxed` is false inside `Vec` and map values, which already give a
/// recursive reference its heap indirection; everywhere else a named
/// reference is boxed so cyclic schemas produce finite-size structs.
fn type_text(ty: &ResolvedType, boxed: bool) -> String {
    match ty {
        ResolvedType::Text => "String".to_string(),
        ResolvedType::Date => "chrono::NaiveDate".to_string(),
        ResolvedType::DateTime => "chrono::NaiveDateTime".to_string(),
        ResolvedType::Decimal => "rust_decimal::Decimal".to_string(),
        ResolvedType::Integer => "i64".to_string(),
        ResolvedType::Boolean => "bool".to_string(),
        ResolvedType::Named(name) if boxed => format!("Box<{name}>"),
        ResolvedType::Named(name) => name.clone(),
        ResolvedType::Sequence(inner) => format!("Vec<{}>", type_text(inner, false)),
        ResolvedType::Optional(inner) => format!("Option<{}>", type_text(inner, boxed)),
        ResolvedType::Untyped => "serde_json::Value".to_string(),
    }
}

/// Identifier-safe snake_case form of a schema name. Unsafe characters
/// collapse to underscores and Rust keywords get a raw prefix.
pub fn ident_for(name: &str) -> String {
    let mut out = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
            prev_lower = false;
        }
    }
    let out = out.trim_end_matches('_').to_string();
    if out.is_empty() {
        "field".to_string()
    } else if out.starts_with(|c: char| c.is_ascii_digit()) {
        format!("f{out}")
    } else if matches!(
        out.as_str(),
        "type" | "ref" | "use" | "struct" | "enum" | "fn" | "impl" | "mod" | "match" | "move"
    ) {
        format!("r#{out}")
    } else {
        out
    }
}

fn const_ident(name: &str) -> String {
    ident_for(name).trim_start_matches("r#").to_uppercase()
}
