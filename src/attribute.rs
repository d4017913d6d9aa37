//! Declarative column attributes attached to a model type.
//!
//! A model lists its attributes from [`Model::attributes`](crate::Model::attributes):
//! ```rust
//! use sql_mapper::AttributeInfo;
//!
//! let attrs = vec![
//!     AttributeInfo::primary_key("id"),
//!     AttributeInfo::auto_increment("id"),
//!     AttributeInfo::indexed("name"),
//!     AttributeInfo::table_name("people"),
//! ];
//! # let _ = attrs;
//! ```

/// Capability an attribute grants to the field (or table) it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Make the field the primary key of the table
    PrimaryKey,
    /// Let the engine generate values for an integer primary key
    AutoIncrement,
    /// Create an index over the field
    Indexed,
    /// Override the table name; the attribute's `name` is the literal table name
    TableName,
}

/// An [`Attribute`] targeting a field by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeInfo {
    pub name: String,
    pub attribute: Attribute,
}

impl AttributeInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            name: name.into(),
            attribute,
        }
    }

    #[must_use]
    pub fn primary_key(field: impl Into<String>) -> Self {
        Self::new(field, Attribute::PrimaryKey)
    }

    #[must_use]
    pub fn auto_increment(field: impl Into<String>) -> Self {
        Self::new(field, Attribute::AutoIncrement)
    }

    #[must_use]
    pub fn indexed(field: impl Into<String>) -> Self {
        Self::new(field, Attribute::Indexed)
    }

    #[must_use]
    pub fn table_name(table: impl Into<String>) -> Self {
        Self::new(table, Attribute::TableName)
    }

    /// Fold every attribute naming `field` into explicit flags.
    ///
    /// `TableName` attributes never contribute, even if their literal happens
    /// to equal a field name.
    #[must_use]
    pub fn capabilities(field: &str, attributes: &[AttributeInfo]) -> Capabilities {
        attributes
            .iter()
            .filter(|a| a.attribute != Attribute::TableName && a.name == field)
            .fold(Capabilities::default(), |mut caps, a| {
                match a.attribute {
                    Attribute::PrimaryKey => caps.is_primary_key = true,
                    Attribute::AutoIncrement => caps.is_auto_increment = true,
                    Attribute::Indexed => caps.is_indexed = true,
                    Attribute::TableName => {}
                }
                caps
            })
    }

    /// Literal name of the first `TableName` attribute, if any.
    #[must_use]
    pub fn table_name_override(attributes: &[AttributeInfo]) -> Option<&str> {
        attributes
            .iter()
            .find(|a| a.attribute == Attribute::TableName)
            .map(|a| a.name.as_str())
    }
}

/// Per-field attribute flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub is_indexed: bool,
}
