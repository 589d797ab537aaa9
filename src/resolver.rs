/// Type-graph resolution: walks a document's properties and definitions,
/// resolves `$ref` and allOf extension, and accumulates deduplicated
/// declarations in a pool owned by exactly one pass.
use tracing::debug;

use crate::ast::{
    CatchAll, DefaultLiteral, FieldDecl, FormatAnnotation, ResolvedType, TypeDeclaration, TypePool,
};
use crate::schema::{ref_target, AdditionalProperties, Definition, Definitions, Schema, TypeTag};
use crate::validation::{self, NotAnObjectSchema};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Structural(#[from] NotAnObjectSchema),
    #[error("property '{0}' is a bare string shorthand, expected a schema")]
    ShorthandProperty(String),
    #[error("root schema has properties but no parent type name was given")]
    MissingRootName,
    #[error("allOf extension '{0}' has no second member with properties")]
    MissingExtensionProperties(String),
}

/// Resolves one document into a pool of type declarations. The pool
/// belongs to this resolver; concurrent passes use independent resolvers.
#[derive(Debug, Default)]
pub struct Resolver {
    pool: TypePool,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    /// Start from an existing pool, e.g. with bases resolved up front.
    pub fn with_pool(pool: TypePool) -> Self {
        Resolver { pool }
    }

    pub fn pool(&self) -> &TypePool {
        &self.pool
    }

    pub fn into_pool(self) -> TypePool {
        self.pool
    }

    /// Resolve a whole document: the root object type (named `parent`)
    /// when the root carries properties, then every definition. Returns
    /// declarations in emission order.
    pub fn resolve_document(
        &mut self,
        schema: &Schema,
        parent: Option<&str>,
    ) -> Result<Vec<TypeDeclaration>, ResolveError> {
        let root = if schema.properties.is_some() {
            let name = parent.ok_or(ResolveError::MissingRootName)?;
            self.resolve_type(name, schema)?
        } else {
            None
        };
        if let Some(definitions) = &schema.definitions {
            self.resolve_definitions(definitions)?;
        }
        let mut declarations: Vec<TypeDeclaration> = root.into_iter().collect();
        declarations.extend(self.pool.iter().cloned());
        debug!(count = declarations.len(), "document resolved");
        Ok(declarations)
    }

    /// Definitions pass: object-typed or allOf entries become pooled
    /// declarations; string shorthand entries are skipped.
    pub fn resolve_definitions(
        &mut self,
        definitions: &Definitions,
    ) -> Result<Vec<TypeDeclaration>, ResolveError> {
        let mut resolved = Vec::new();
        for (name, definition) in definitions.iter() {
            let Definition::Schema(schema) = definition else {
                continue;
            };
            if schema.primary_type() == Some(TypeTag::Object) || schema.all_of.is_some() {
                if let Some(decl) = self.resolve_type(name, schema)? {
                    self.pool.insert(decl.clone());
                    resolved.push(decl);
                }
            }
        }
        Ok(resolved)
    }

    /// Resolve one named schema into a declaration, with shared-pool side
    /// effects for nested object and array item types. Returns `None` for
    /// shapes that produce no declaration (bare primitives, arrays, refs)
    /// and for allOf extensions whose base is not yet pooled.
    pub fn resolve_type(
        &mut self,
        name: &str,
        schema: &Schema,
    ) -> Result<Option<TypeDeclaration>, ResolveError> {
        if schema.properties.is_some() || schema.additional_properties.included {
            return Ok(Some(self.object_type(name, schema)?));
        }
        if let Some(all_of) = &schema.all_of {
            if all_of.first().map_or(false, |s| s.reference.is_some()) {
                return self.extension_type(name, all_of);
            }
        }
        Ok(None)
    }

    fn object_type(&mut self, name: &str, schema: &Schema) -> Result<TypeDeclaration, ResolveError> {
        let empty = Definitions::default();
        let properties = schema.properties.as_ref().unwrap_or(&empty);
        let mut fields = Vec::with_capacity(properties.0.len());
        for (prop_name, definition) in properties.iter() {
            fields.push(self.field_decl(name, prop_name, definition, schema.is_required(prop_name))?);
        }
        Ok(TypeDeclaration {
            name: name.to_string(),
            fields,
            supertype: None,
            catch_all: self.catch_all_for(name, &schema.additional_properties)?,
            metadata: metadata_from(schema),
            rules: validation::rules_for_object(schema)?,
            extensible: false,
        })
    }

    /// allOf with a bare `$ref` first member models single inheritance:
    /// the referenced declaration is reopened as an extensible base and a
    /// subtype combining its fields (as overrides) with the second
    /// member's own properties is returned. The subtype is not
    /// auto-registered; callers decide retention. A base missing from the
    /// pool is a forward reference and resolves soft to `None`.
    fn extension_type(
        &mut self,
        name: &str,
        all_of: &[Schema],
    ) -> Result<Option<TypeDeclaration>, ResolveError> {
        let reference = all_of[0].reference.as_deref().unwrap_or_default();
        let base_name = ref_target(reference);
        let Some(base) = self.pool.get(base_name).cloned() else {
            debug!(base = base_name, subtype = name, "allOf base not yet resolved, skipping");
            return Ok(None);
        };
        self.pool.replace(base.opened());

        let own = all_of
            .get(1)
            .filter(|s| s.properties.is_some())
            .ok_or_else(|| ResolveError::MissingExtensionProperties(name.to_string()))?;
        let empty = Definitions::default();
        let properties = own.properties.as_ref().unwrap_or(&empty);
        let mut fields = Vec::new();
        for (prop_name, definition) in properties.iter() {
            fields.push(self.field_decl(name, prop_name, definition, own.is_required(prop_name))?);
        }
        fields.extend(base.fields.iter().cloned().map(|f| FieldDecl {
            inherited: true,
            ..f
        }));
        Ok(Some(TypeDeclaration {
            name: name.to_string(),
            fields,
            supertype: Some(base_name.to_string()),
            catch_all: self.catch_all_for(name, &own.additional_properties)?,
            metadata: metadata_from(own),
            rules: validation::rules_for_object(own)?,
            extensible: false,
        }))
    }

    fn field_decl(
        &mut self,
        owner: &str,
        prop: &str,
        definition: &Definition,
        required: bool,
    ) -> Result<FieldDecl, ResolveError> {
        let ty = self.resolve_field_type(owner, prop, definition, required)?;
        let schema = definition.as_schema();
        Ok(FieldDecl {
            name: prop.to_string(),
            ty,
            required,
            default: schema.and_then(|s| default_literal(s, required)),
            format: schema.and_then(format_annotation),
            inherited: false,
        })
    }

    /// Resolve the type of one property. Nested object types register in
    /// the pool as a side effect; everything unrecognized falls back to
    /// the untyped placeholder, never a hard failure.
    pub fn resolve_field_type(
        &mut self,
        owner: &str,
        prop: &str,
        definition: &Definition,
        required: bool,
    ) -> Result<ResolvedType, ResolveError> {
        let Definition::Schema(schema) = definition else {
            return Err(ResolveError::ShorthandProperty(prop.to_string()));
        };
        let resolved = self.schema_field_type(owner, prop, schema)?;
        Ok(if required {
            resolved
        } else {
            ResolvedType::Optional(Box::new(resolved))
        })
    }

    fn schema_field_type(
        &mut self,
        owner: &str,
        prop: &str,
        schema: &Schema,
    ) -> Result<ResolvedType, ResolveError> {
        if let Some(reference) = &schema.reference {
            return Ok(ResolvedType::Named(ref_target(reference).to_string()));
        }
        let Some(tag) = schema.primary_type() else {
            return Ok(ResolvedType::Untyped);
        };
        Ok(match tag {
            TypeTag::String => match schema.format.as_deref() {
                Some("date") => ResolvedType::Date,
                Some("date-time") => ResolvedType::DateTime,
                _ => ResolvedType::Text,
            },
            TypeTag::Number => ResolvedType::Decimal,
            TypeTag::Integer => ResolvedType::Integer,
            TypeTag::Boolean => ResolvedType::Boolean,
            TypeTag::Object => {
                if schema.properties.is_some() {
                    let nested_name = capitalize(prop);
                    if self.pool.get(&nested_name).is_none() {
                        if let Some(decl) = self.resolve_type(&nested_name, schema)? {
                            self.pool.insert(decl);
                        }
                    }
                    ResolvedType::Named(nested_name)
                } else {
                    ResolvedType::Untyped
                }
            }
            TypeTag::Array => {
                let item_schema = schema
                    .items
                    .as_ref()
                    .and_then(|items| items.first().cloned())
                    .unwrap_or_default();
                let item_name = format!("{prop}Item");
                let inner = self.schema_field_type(owner, &item_name, &item_schema)?;
                ResolvedType::Sequence(Box::new(inner))
            }
        })
    }

    fn catch_all_for(
        &mut self,
        owner: &str,
        additional: &AdditionalProperties,
    ) -> Result<Option<CatchAll>, ResolveError> {
        if !additional.included {
            return Ok(None);
        }
        let value_type = match &additional.value_type {
            Some(schema) => self.schema_field_type(owner, owner, schema)?,
            None => ResolvedType::Untyped,
        };
        Ok(Some(CatchAll { value_type }))
    }
}

fn metadata_from(schema: &Schema) -> Vec<(String, String)> {
    schema
        .metadata
        .as_ref()
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

fn format_annotation(schema: &Schema) -> Option<FormatAnnotation> {
    match schema.format.as_deref() {
        Some("date") => Some(FormatAnnotation::Date),
        Some("date-time") => Some(FormatAnnotation::DateTime),
        _ => None,
    }
}

/// Typed constructor default for string/number/integer/boolean properties;
/// every other defaulted or optional field gets the explicit absent
/// sentinel. Required fields without a default carry no literal.
fn default_literal(schema: &Schema, required: bool) -> Option<DefaultLiteral> {
    let typed = schema.default.as_ref().and_then(|default| {
        match (schema.primary_type(), default) {
            (Some(TypeTag::String), serde_json::Value::String(s)) => {
                Some(DefaultLiteral::Text(s.clone()))
            }
            (Some(TypeTag::Number), serde_json::Value::Number(n)) => {
                Some(DefaultLiteral::Decimal(n.clone()))
            }
            (Some(TypeTag::Integer), serde_json::Value::Number(n)) => {
                n.as_i64().map(DefaultLiteral::Integer)
            }
            (Some(TypeTag::Boolean), serde_json::Value::Bool(b)) => {
                Some(DefaultLiteral::Boolean(*b))
            }
            _ => None,
        }
    });
    match typed {
        Some(literal) => Some(literal),
        None if !required => Some(DefaultLiteral::Absent),
        None => None,
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn schema(v: Value) -> Schema {
        serde_json::from_value(v).unwrap()
    }

    fn boxed(v: Value) -> Definition {
        Definition::Schema(Box::new(schema(v)))
    }

    #[test]
    fn test_object_with_one_optional_field() {
        let mut resolver = Resolver::new();
        let decl = resolver
            .resolve_type("A", &schema(json!({"properties": {"B": {"type": "string"}}})))
            .unwrap()
            .unwrap();
        assert_eq!(decl.name, "A");
        assert_eq!(decl.fields.len(), 1);
        let field = &decl.fields[0];
        assert_eq!(field.name, "B");
        assert!(!field.required);
        assert_eq!(
            field.ty,
            ResolvedType::Optional(Box::new(ResolvedType::Text))
        );
        assert_eq!(field.default, Some(DefaultLiteral::Absent));
        // additionalProperties defaults to included: catch-all present.
        assert_eq!(
            decl.catch_all,
            Some(CatchAll {
                value_type: ResolvedType::Untyped
            })
        );
        assert!(resolver.pool().is_empty());
    }

    #[test]
    fn test_additional_properties_false_drops_catch_all() {
        let mut resolver = Resolver::new();
        let decl = resolver
            .resolve_type(
                "A",
                &schema(json!({
                    "additionalProperties": false,
                    "properties": {"B": {"type": "string"}}
                })),
            )
            .unwrap()
            .unwrap();
        assert_eq!(decl.catch_all, None);
    }

    #[test]
    fn test_typed_catch_all_value() {
        let mut resolver = Resolver::new();
        let decl = resolver
            .resolve_type(
                "A",
                &schema(json!({
                    "additionalProperties": {"type": "string"},
                    "properties": {"B": {"type": "string"}}
                })),
            )
            .unwrap()
            .unwrap();
        assert_eq!(
            decl.catch_all,
            Some(CatchAll {
                value_type: ResolvedType::Text
            })
        );
    }

    #[test]
    fn test_simple_field_types() {
        let mut resolver = Resolver::new();
        let cases = [
            (json!({"type": "string"}), ResolvedType::Text),
            (json!({"type": "string", "format": "date"}), ResolvedType::Date),
            (
                json!({"type": "string", "format": "date-time"}),
                ResolvedType::DateTime,
            ),
            (json!({"type": "number"}), ResolvedType::Decimal),
            (json!({"type": "integer"}), ResolvedType::Integer),
            (json!({"type": "boolean"}), ResolvedType::Boolean),
            (json!({}), ResolvedType::Untyped),
        ];
        for (value, expected) in cases {
            let required = resolver
                .resolve_field_type("parent", "p", &boxed(value.clone()), true)
                .unwrap();
            assert_eq!(required, expected);
            let optional = resolver
                .resolve_field_type("parent", "p", &boxed(value), false)
                .unwrap();
            assert_eq!(optional, ResolvedType::Optional(Box::new(expected.clone())));
        }
        assert!(resolver.pool().is_empty());
    }

    #[test]
    fn test_ref_field_uses_last_path_segment() {
        let mut resolver = Resolver::new();
        let ty = resolver
            .resolve_field_type("parent", "p", &boxed(json!({"$ref": "#/definitions/Item"})), true)
            .unwrap();
        assert_eq!(ty, ResolvedType::Named("Item".into()));
        assert!(resolver.pool().is_empty());
    }

    #[test]
    fn test_array_of_strings_adds_no_pool_entries() {
        let mut resolver = Resolver::new();
        let ty = resolver
            .resolve_field_type(
                "parent",
                "p",
                &boxed(json!({"type": "array", "items": {"type": "string"}})),
                true,
            )
            .unwrap();
        assert_eq!(ty, ResolvedType::Sequence(Box::new(ResolvedType::Text)));
        assert!(resolver.pool().is_empty());
    }

    #[test]
    fn test_array_of_objects_registers_item_type() {
        let mut resolver = Resolver::new();
        let ty = resolver
            .resolve_field_type(
                "Other",
                "Other",
                &boxed(json!({
                    "type": "array",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {"a": {"type": "string"}}
                    }
                })),
                true,
            )
            .unwrap();
        assert_eq!(
            ty,
            ResolvedType::Sequence(Box::new(ResolvedType::Named("OtherItem".into())))
        );
        assert_eq!(resolver.pool().len(), 1);
        let item = resolver.pool().get("OtherItem").unwrap();
        assert_eq!(item.fields.len(), 1);
        assert_eq!(item.fields[0].name, "a");
        assert_eq!(
            item.fields[0].ty,
            ResolvedType::Optional(Box::new(ResolvedType::Text))
        );
    }

    #[test]
    fn test_nested_object_field_registers_two_entries() {
        let mut resolver = Resolver::new();
        let ty = resolver
            .resolve_field_type(
                "T",
                "T",
                &boxed(json!({
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "a": {
                            "type": "object",
                            "additionalProperties": false,
                            "properties": {"b": {"type": "string"}}
                        }
                    }
                })),
                true,
            )
            .unwrap();
        assert_eq!(ty, ResolvedType::Named("T".into()));
        let names: Vec<&str> = resolver.pool().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["A", "T"]);
        let t = resolver.pool().get("T").unwrap();
        assert_eq!(
            t.fields[0].ty,
            ResolvedType::Optional(Box::new(ResolvedType::Named("A".into())))
        );
    }

    #[test]
    fn test_shorthand_property_is_structural_error() {
        let mut resolver = Resolver::new();
        let result = resolver.resolve_field_type(
            "T",
            "p",
            &Definition::Shorthand("alias".into()),
            true,
        );
        assert!(matches!(result, Err(ResolveError::ShorthandProperty(_))));
    }

    #[test]
    fn test_bare_primitive_yields_no_declaration() {
        let mut resolver = Resolver::new();
        let decl = resolver
            .resolve_type(
                "A",
                &schema(json!({"type": "string", "additionalProperties": false})),
            )
            .unwrap();
        assert!(decl.is_none());
    }

    #[test]
    fn test_typed_default_literals() {
        let mut resolver = Resolver::new();
        let decl = resolver
            .resolve_type(
                "A",
                &schema(json!({
                    "additionalProperties": false,
                    "properties": {
                        "s": {"type": "string", "default": "x"},
                        "n": {"type": "number", "default": 1.5},
                        "i": {"type": "integer", "default": 7},
                        "b": {"type": "boolean", "default": true},
                        "u": {"type": "array"}
                    }
                })),
            )
            .unwrap()
            .unwrap();
        assert_eq!(decl.field("s").unwrap().default, Some(DefaultLiteral::Text("x".into())));
        assert!(matches!(
            decl.field("n").unwrap().default,
            Some(DefaultLiteral::Decimal(_))
        ));
        assert_eq!(decl.field("i").unwrap().default, Some(DefaultLiteral::Integer(7)));
        assert_eq!(decl.field("b").unwrap().default, Some(DefaultLiteral::Boolean(true)));
        // Non-scalar defaulted/optional fields get the absent sentinel.
        assert_eq!(decl.field("u").unwrap().default, Some(DefaultLiteral::Absent));
    }

    #[test]
    fn test_metadata_copied_as_string_pairs() {
        let mut resolver = Resolver::new();
        let decl = resolver
            .resolve_type(
                "A",
                &schema(json!({
                    "additionalProperties": false,
                    "properties": {"b": {"type": "string"}},
                    "metadata": {"origin": "inventory", "owner": "core"}
                })),
            )
            .unwrap()
            .unwrap();
        assert_eq!(
            decl.metadata,
            vec![
                ("origin".to_string(), "inventory".to_string()),
                ("owner".to_string(), "core".to_string())
            ]
        );
    }

    #[test]
    fn test_all_of_extension_with_resolved_base() {
        let base_schema = schema(json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {"name": {"type": "string"}}
        }));
        let extension = schema(json!({
            "additionalProperties": false,
            "allOf": [
                {"$ref": "#/definitions/NameInfo", "additionalProperties": false},
                {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {"other": {"type": "string"}}
                }
            ]
        }));
        let mut resolver = Resolver::new();
        let base = resolver.resolve_type("NameInfo", &base_schema).unwrap().unwrap();
        resolver = Resolver::with_pool({
            let mut pool = TypePool::new();
            pool.insert(base);
            pool
        });
        let subtype = resolver
            .resolve_type("ObjectInfo", &extension)
            .unwrap()
            .unwrap();
        assert_eq!(subtype.name, "ObjectInfo");
        assert_eq!(subtype.supertype.as_deref(), Some("NameInfo"));
        // Own property first, then the base field marked as an override.
        assert_eq!(subtype.fields.len(), 2);
        assert_eq!(subtype.fields[0].name, "other");
        assert!(!subtype.fields[0].inherited);
        assert_eq!(subtype.fields[1].name, "name");
        assert!(subtype.fields[1].inherited);
        // The base was reopened in the pool; the subtype is not registered.
        assert!(resolver.pool().get("NameInfo").unwrap().extensible);
        assert!(resolver.pool().get("ObjectInfo").is_none());
    }

    #[test]
    fn test_all_of_forward_reference_is_soft() {
        let extension = schema(json!({
            "additionalProperties": false,
            "allOf": [
                {"$ref": "#/definitions/Missing", "additionalProperties": false},
                {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {"other": {"type": "string"}}
                }
            ]
        }));
        let mut resolver = Resolver::new();
        let result = resolver.resolve_type("Sub", &extension).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_resolve_document_definitions_and_root() {
        let document = schema(json!({
            "properties": {"id": {"type": "string"}},
            "definitions": {
                "alias": "shorthand entries are skipped",
                "Item": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {"sku": {"type": "string"}}
                },
                "Loose": {"type": "string", "additionalProperties": false}
            }
        }));
        let mut resolver = Resolver::new();
        let declarations = resolver.resolve_document(&document, Some("Root")).unwrap();
        let names: Vec<&str> = declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Root", "Item"]);
    }

    #[test]
    fn test_resolve_document_requires_root_name() {
        let document = schema(json!({"properties": {"id": {"type": "string"}}}));
        let mut resolver = Resolver::new();
        assert!(matches!(
            resolver.resolve_document(&document, None),
            Err(ResolveError::MissingRootName)
        ));
    }

    #[test]
    fn test_cross_branch_name_collision_reuses_first() {
        let mut resolver = Resolver::new();
        let nested = |field: &str| {
            boxed(json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {field: {"type": "string"}}
            }))
        };
        resolver
            .resolve_field_type("T", "shared", &nested("first"), true)
            .unwrap();
        resolver
            .resolve_field_type("U", "shared", &nested("second"), true)
            .unwrap();
        assert_eq!(resolver.pool().len(), 1);
        let shared = resolver.pool().get("Shared").unwrap();
        assert_eq!(shared.fields[0].name, "first");
    }
}
