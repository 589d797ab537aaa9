/// Schema document model: the recognized JSON-Schema-dialect grammar.
/// A parsed document is immutable; ambiguous fields (`type`, `items`,
/// `additionalProperties`, definition shorthand) are normalized at
/// deserialization time. Unknown fields are ignored.
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// The closed set of primitive type tags. Anything else in a `type`
/// keyword is dropped during normalization and the schema falls back to
/// the untyped placeholder at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl TypeTag {
    pub fn parse(s: &str) -> Option<TypeTag> {
        match s {
            "string" => Some(TypeTag::String),
            "number" => Some(TypeTag::Number),
            "integer" => Some(TypeTag::Integer),
            "boolean" => Some(TypeTag::Boolean),
            "object" => Some(TypeTag::Object),
            "array" => Some(TypeTag::Array),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Integer => "integer",
            TypeTag::Boolean => "boolean",
            TypeTag::Object => "object",
            TypeTag::Array => "array",
        }
    }
}

/// The `type` keyword: a single tag or an ordered list. The first entry
/// is authoritative; the rest are retained but not otherwise interpreted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeList(pub Vec<TypeTag>);

impl TypeList {
    pub fn primary(&self) -> Option<TypeTag> {
        self.0.first().copied()
    }
}

impl<'de> Deserialize<'de> for TypeList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }
        let tags = match Raw::deserialize(deserializer)? {
            Raw::One(s) => TypeTag::parse(&s).into_iter().collect(),
            Raw::Many(list) => list.iter().filter_map(|s| TypeTag::parse(s)).collect(),
        };
        Ok(TypeList(tags))
    }
}

/// The `items` keyword: a single schema or an ordered list (tuple typing),
/// normalized to a list. Empty means an unconstrained element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Items {
    pub schemas: Vec<Schema>,
}

impl Items {
    pub fn first(&self) -> Option<&Schema> {
        self.schemas.first()
    }
}

impl<'de> Deserialize<'de> for Items {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Many(Vec<Schema>),
            One(Box<Schema>),
        }
        let schemas = match Raw::deserialize(deserializer)? {
            Raw::Many(list) => list,
            Raw::One(schema) => vec![*schema],
        };
        Ok(Items { schemas })
    }
}

/// The `additionalProperties` keyword: a boolean, or a schema constraining
/// the value type. Absent means included with an unconstrained value type.
#[derive(Debug, Clone, PartialEq)]
pub struct AdditionalProperties {
    pub included: bool,
    pub value_type: Option<Box<Schema>>,
}

impl AdditionalProperties {
    pub fn excluded() -> Self {
        AdditionalProperties {
            included: false,
            value_type: None,
        }
    }
}

impl Default for AdditionalProperties {
    fn default() -> Self {
        AdditionalProperties {
            included: true,
            value_type: None,
        }
    }
}

impl<'de> Deserialize<'de> for AdditionalProperties {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Typed(Box<Schema>),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(included) => AdditionalProperties {
                included,
                value_type: None,
            },
            Raw::Typed(schema) => AdditionalProperties {
                included: true,
                value_type: Some(schema),
            },
        })
    }
}

/// A definitions/properties entry: a full schema or a bare string shorthand.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Definition {
    Shorthand(String),
    Schema(Box<Schema>),
}

impl Definition {
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Definition::Schema(schema) => Some(schema),
            Definition::Shorthand(_) => None,
        }
    }
}

/// Named schema map. Insertion order is preserved; names may be
/// identifier-unsafe and are escaped at emission time.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Definitions(pub IndexMap<String, Definition>);

impl Definitions {
    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Definition)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One schema node. All fields optional; a well-formed tree is assumed
/// (malformed text is the parser's problem, surfaced as `ParseError`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Schema {
    #[serde(rename = "$id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub types: Option<TypeList>,
    pub items: Option<Items>,
    pub format: Option<String>,
    #[serde(rename = "enum")]
    pub enumeration: Option<Vec<String>>,
    #[serde(rename = "maxLength")]
    pub max_length: Option<u64>,
    #[serde(rename = "minLength")]
    pub min_length: Option<u64>,
    pub pattern: Option<String>,
    pub required: Option<Vec<String>>,
    #[serde(rename = "additionalItems")]
    pub additional_items: Option<bool>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: AdditionalProperties,
    #[serde(rename = "uniqueItems")]
    pub unique_items: Option<bool>,
    #[serde(rename = "multipleOf")]
    pub multiple_of: Option<Number>,
    pub maximum: Option<Number>,
    #[serde(rename = "exclusiveMaximum")]
    pub exclusive_maximum: Option<Number>,
    pub minimum: Option<Number>,
    #[serde(rename = "exclusiveMinimum")]
    pub exclusive_minimum: Option<Number>,
    pub definitions: Option<Definitions>,
    pub properties: Option<Definitions>,
    #[serde(rename = "allOf")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(rename = "anyOf")]
    pub any_of: Option<Vec<Schema>>,
    pub metadata: Option<IndexMap<String, String>>,
}

impl Schema {
    /// The authoritative type tag: first entry of the `type` list.
    pub fn primary_type(&self) -> Option<TypeTag> {
        self.types.as_ref().and_then(|t| t.primary())
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required
            .as_deref()
            .map_or(false, |r| r.iter().any(|n| n == name))
    }
}

/// Last path segment of a `$ref`, e.g. `#/definitions/Item` -> `Item`.
pub fn ref_target(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Input text format accepted by [`parse_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    pub fn parse(s: &str) -> Option<SourceFormat> {
        match s {
            "json" => Some(SourceFormat::Json),
            "yaml" | "yml" => Some(SourceFormat::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON schema document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML schema document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parse one schema document from JSON or YAML text.
pub fn parse_document(text: &str, format: SourceFormat) -> Result<Schema, ParseError> {
    match format {
        SourceFormat::Json => Ok(serde_json::from_str(text)?),
        SourceFormat::Yaml => Ok(serde_yaml::from_str(text)?),
    }
}
