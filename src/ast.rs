/// Resolved type-graph declarations: immutable, emission-ready records
/// built during one resolution pass and discarded after emission. The only
/// post-construction change is marking a declaration extensible once it is
/// discovered to be an allOf base.
use serde_json::Number;

use crate::validation::ValidationRule;

/// The resolved type of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Text,
    Date,
    DateTime,
    /// Arbitrary-precision decimal in the target language; JSON `number`
    /// never maps to a binary float so bound comparisons stay exact.
    Decimal,
    Integer,
    Boolean,
    /// Reference to a declared type by name.
    Named(String),
    Sequence(Box<ResolvedType>),
    Optional(Box<ResolvedType>),
    /// The single untyped fallback for schemas with no recognized shape.
    Untyped,
}

impl ResolvedType {
    /// The type with any optional wrapper stripped.
    pub fn unwrapped(&self) -> &ResolvedType {
        match self {
            ResolvedType::Optional(inner) => inner,
            other => other,
        }
    }
}

/// Emission-time annotation derived from a string field's `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatAnnotation {
    Date,
    DateTime,
}

/// Constructor default for a field. `Absent` is the explicit
/// nothing-provided sentinel used for optional fields without a typed
/// default; required fields without a default carry no literal at all.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultLiteral {
    Absent,
    Text(String),
    Decimal(Number),
    Integer(i64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: ResolvedType,
    pub required: bool,
    pub default: Option<DefaultLiteral>,
    pub format: Option<FormatAnnotation>,
    /// True when the field is carried down from an extensible base and
    /// overrides its declaration there.
    pub inherited: bool,
}

/// Synthesized field capturing undeclared additional string-keyed
/// properties.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchAll {
    pub value_type: ResolvedType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub supertype: Option<String>,
    pub catch_all: Option<CatchAll>,
    /// Schema metadata entries copied through as string literals.
    pub metadata: Vec<(String, String)>,
    pub rules: Vec<ValidationRule>,
    /// Set once the declaration is discovered to be an allOf base; an
    /// extensible declaration accepts field overrides from subtypes.
    pub extensible: bool,
}

impl TypeDeclaration {
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A copy of this declaration marked extensible.
    pub fn opened(&self) -> TypeDeclaration {
        TypeDeclaration {
            extensible: true,
            ..self.clone()
        }
    }
}

/// Deduplicated set of declarations accumulated in one resolution pass.
/// Insertion-ordered; a name maps to at most one declaration.
#[derive(Debug, Clone, Default)]
pub struct TypePool {
    decls: Vec<TypeDeclaration>,
}

impl TypePool {
    pub fn new() -> Self {
        TypePool::default()
    }

    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.decls.iter().find(|d| d.name == name)
    }

    /// Insert unless the name is already taken; reinsertion reuses the
    /// existing entry. Returns true when the declaration was added.
    pub fn insert(&mut self, decl: TypeDeclaration) -> bool {
        if self.get(&decl.name).is_some() {
            return false;
        }
        self.decls.push(decl);
        true
    }

    /// Swap a declaration in place, preserving its position; appends when
    /// the name is not yet pooled.
    pub fn replace(&mut self, decl: TypeDeclaration) {
        match self.decls.iter_mut().find(|d| d.name == decl.name) {
            Some(slot) => *slot = decl,
            None => self.decls.push(decl),
        }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.decls.iter()
    }

    pub fn into_declarations(self) -> Vec<TypeDeclaration> {
        self.decls
    }
}
