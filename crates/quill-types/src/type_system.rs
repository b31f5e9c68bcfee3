//! The Quill structural type system
//!
//! Types are structural, not nominal: two record types with the same ordered
//! field shapes are the same type regardless of how they were declared.
//! Aggregate types may carry expansion info marking them as references into
//! an external or self-referential data source; restricted-type checks use
//! that marker to stop instead of unrolling forever.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The structural type of a formula value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FormulaType {
    /// Boolean values
    Boolean,
    /// Floating-point numbers
    Number,
    /// Fixed-point decimal numbers
    Decimal,
    /// Text values
    Text,
    /// Date/time values with time zone information
    DateTime,
    /// Date/time values without time zone information
    DateTimeNoTimeZone,
    /// The blank (null) type
    Blank,
    /// A polymorphic placeholder that accepts any type
    Polymorphic,
    /// The invalid/error type; never accepted and never accepting
    Invalid,
    /// Record with ordered named fields
    #[serde(rename = "Record")]
    Record(RecordShape),
    /// Table over a record element shape
    #[serde(rename = "Table")]
    Table(RecordShape),
}

/// Ordered fields of a record or table element, plus optional expansion info
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordShape {
    /// Fields in declaration order, unique by name
    fields: Vec<NamedField>,
    /// Set when this shape is a reference into an external data source
    expansion: Option<ExpansionInfo>,
}

/// One named field of a record shape
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedField {
    /// Field name, unique within its shape
    pub name: String,
    /// Field type
    pub ty: FormulaType,
}

impl NamedField {
    /// Create a named field
    pub fn new(name: impl Into<String>, ty: FormulaType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Marks an aggregate type as a reference into an external data source
///
/// Such types may expand to other data-source types or reference themselves;
/// recursive type walks must not descend into them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpansionInfo {
    /// Logical name of the referenced entity
    pub entity: String,
}

impl ExpansionInfo {
    /// Create expansion info for an entity
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
        }
    }
}

impl RecordShape {
    /// Create a shape from fields; on duplicate names the first wins
    pub fn new(fields: impl IntoIterator<Item = NamedField>) -> Self {
        let mut unique: Vec<NamedField> = Vec::new();
        for field in fields {
            if !unique.iter().any(|f| f.name == field.name) {
                unique.push(field);
            }
        }
        Self {
            fields: unique,
            expansion: None,
        }
    }

    /// Attach expansion info
    pub fn with_expansion(mut self, info: ExpansionInfo) -> Self {
        self.expansion = Some(info);
        self
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[NamedField] {
        &self.fields
    }

    /// Look up a field type by name
    pub fn field(&self, name: &str) -> Option<&FormulaType> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.ty)
    }

    /// Expansion info, if this shape references an external source
    pub fn expansion(&self) -> Option<&ExpansionInfo> {
        self.expansion.as_ref()
    }
}

impl FormulaType {
    /// Create a record type from fields
    pub fn record(fields: impl IntoIterator<Item = NamedField>) -> Self {
        Self::Record(RecordShape::new(fields))
    }

    /// Create a table type from element fields
    pub fn table(fields: impl IntoIterator<Item = NamedField>) -> Self {
        Self::Table(RecordShape::new(fields))
    }

    /// Look up a built-in primitive type by name
    pub fn from_primitive_name(name: &str) -> Option<Self> {
        match name {
            "Boolean" => Some(Self::Boolean),
            "Number" => Some(Self::Number),
            "Decimal" => Some(Self::Decimal),
            "Text" => Some(Self::Text),
            "DateTime" => Some(Self::DateTime),
            "DateTimeNoTimeZone" => Some(Self::DateTimeNoTimeZone),
            _ => None,
        }
    }

    /// Check if this is a primitive (non-aggregate, non-special) type
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Boolean
                | Self::Number
                | Self::Decimal
                | Self::Text
                | Self::DateTime
                | Self::DateTimeNoTimeZone
        )
    }

    /// Check if this is a record or table type
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, Self::Record(_) | Self::Table(_))
    }

    /// Check if this is the invalid type
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// The aggregate shape, if this is a record or table
    pub const fn shape(&self) -> Option<&RecordShape> {
        match self {
            Self::Record(shape) | Self::Table(shape) => Some(shape),
            _ => None,
        }
    }

    /// Check whether this aggregate references an external data source
    pub fn has_expansion_info(&self) -> bool {
        self.shape().is_some_and(|s| s.expansion().is_some())
    }

    /// Convert a record type to the table type over the same shape
    pub fn to_table(&self) -> Option<Self> {
        match self {
            Self::Record(shape) => Some(Self::Table(shape.clone())),
            Self::Table(_) => Some(self.clone()),
            _ => None,
        }
    }

    /// Short kind name used in diagnostics
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Number => "Number",
            Self::Decimal => "Decimal",
            Self::Text => "Text",
            Self::DateTime => "DateTime",
            Self::DateTimeNoTimeZone => "DateTimeNoTimeZone",
            Self::Blank => "Blank",
            Self::Polymorphic => "Polymorphic",
            Self::Invalid => "Invalid",
            Self::Record(_) => "Record",
            Self::Table(_) => "Table",
        }
    }

    /// Structural "accepts" relation used for exact return-type checks
    ///
    /// A type accepts itself, `Polymorphic` accepts everything, every
    /// non-invalid type accepts `Blank`, and aggregates accept field-wise
    /// over identical field name sets.
    pub fn accepts(&self, other: &FormulaType) -> bool {
        if self.is_invalid() || other.is_invalid() {
            return false;
        }

        if matches!(self, Self::Polymorphic) || matches!(other, Self::Blank) {
            return true;
        }

        match (self, other) {
            (Self::Record(a), Self::Record(b)) | (Self::Table(a), Self::Table(b)) => {
                shapes_relate(a, b, FormulaType::accepts)
            }
            _ => self == other,
        }
    }

    /// Check whether this type coerces to `target` under current rules
    ///
    /// Coercions beyond `accepts`: `Number` and `Decimal` convert to each
    /// other, numerics and booleans render to `Text`, and aggregates coerce
    /// field-wise over identical field name sets.
    pub fn coerces_to(&self, target: &FormulaType) -> bool {
        if target.accepts(self) {
            return true;
        }

        match (self, target) {
            (Self::Number, Self::Decimal) | (Self::Decimal, Self::Number) => true,
            (Self::Number | Self::Decimal | Self::Boolean, Self::Text) => true,
            (Self::Record(a), Self::Record(b)) | (Self::Table(a), Self::Table(b)) => {
                shapes_relate(a, b, FormulaType::coerces_to)
            }
            _ => false,
        }
    }
}

/// Field-wise relation over two shapes with identical field name sets
fn shapes_relate(a: &RecordShape, b: &RecordShape, rel: impl Fn(&FormulaType, &FormulaType) -> bool) -> bool {
    if a.fields().len() != b.fields().len() {
        return false;
    }
    a.fields().iter().all(|field| match b.field(&field.name) {
        Some(other) => rel(&field.ty, other),
        None => false,
    })
}

impl fmt::Display for FormulaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(shape) => {
                write!(f, "{{ ")?;
                for (i, field) in shape.fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                write!(f, " }}")
            }
            Self::Table(shape) => {
                write!(f, "[{}]", Self::Record(shape.clone()))
            }
            other => write!(f, "{}", other.kind_str()),
        }
    }
}

impl Default for FormulaType {
    fn default() -> Self {
        Self::Blank
    }
}
