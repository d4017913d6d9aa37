use std::fmt;
use std::sync::Arc;

use crate::attribute::AttributeInfo;
use crate::conversion::ColumnValue;
use crate::error::SqlMapperError;
use crate::types::{SqlValue, ValueKind};

type Getter<M> = Arc<dyn Fn(&M) -> SqlValue + Send + Sync>;
type Setter<M> = Arc<dyn Fn(&mut M, SqlValue) -> Result<(), SqlMapperError> + Send + Sync>;

/// A record type persisted as one table row.
///
/// The field table returned by [`Model::fields`] replaces runtime
/// introspection: it lists every persisted field in declaration order with a
/// typed accessor and mutator. [`model_fields!`](crate::model_fields) builds it
/// from the field names alone:
/// ```rust
/// use sql_mapper::prelude::*;
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct User {
///     id: i64,
///     name: String,
///     age: i32,
/// }
///
/// impl Model for User {
///     fn attributes() -> Vec<AttributeInfo> {
///         vec![
///             AttributeInfo::primary_key("id"),
///             AttributeInfo::auto_increment("id"),
///         ]
///     }
///
///     fn fields() -> Vec<Field<Self>> {
///         sql_mapper::model_fields!(User { id, name, age })
///     }
/// }
///
/// let mapping = TableMapping::<User>::derive();
/// assert_eq!(mapping.table_name(), "User");
/// ```
pub trait Model: Default + Send + Sync + 'static {
    /// Default table name. The last path segment of the Rust type name.
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    fn attributes() -> Vec<AttributeInfo> {
        Vec::new()
    }

    fn fields() -> Vec<Field<Self>>;
}

/// One entry of a model's field table.
pub struct Field<M> {
    name: &'static str,
    kind: ValueKind,
    nullable: bool,
    get: Getter<M>,
    set: Setter<M>,
}

impl<M: 'static> Field<M> {
    /// Register a field from a reader and a writer.
    ///
    /// The field's [`ColumnValue`] impl supplies its kind and nullability.
    #[must_use]
    pub fn new<T>(name: &'static str, get: fn(&M) -> T, set: fn(&mut M, T)) -> Self
    where
        T: ColumnValue + 'static,
    {
        Self {
            name,
            kind: T::KIND,
            nullable: T::NULLABLE,
            get: Arc::new(move |model: &M| get(model).to_sql_value()),
            set: Arc::new(move |model: &mut M, value: SqlValue| {
                let value = T::from_sql_value(value).map_err(|e| match e {
                    SqlMapperError::DecodeError(msg) => {
                        SqlMapperError::DecodeError(format!("field `{name}`: {msg}"))
                    }
                    other => other,
                })?;
                set(model, value);
                Ok(())
            }),
        }
    }
}

impl<M> Field<M> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Read the field's current value from `model`.
    pub fn get(&self, model: &M) -> SqlValue {
        (self.get)(model)
    }

    /// Write a decoded value into `model`.
    ///
    /// # Errors
    /// Returns `SqlMapperError::DecodeError` if `value` does not fit the field's type.
    pub fn set(&self, model: &mut M, value: SqlValue) -> Result<(), SqlMapperError> {
        (self.set)(model, value)
    }
}

impl<M> Clone for Field<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            kind: self.kind,
            nullable: self.nullable,
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<M> fmt::Debug for Field<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

/// Build a model's field table from its field names, in the order given.
///
/// Each field is read by cloning and written by assignment, so every listed
/// field must be `Clone` and implement [`ColumnValue`](crate::ColumnValue).
#[macro_export]
macro_rules! model_fields {
    ($model:ty { $($field:ident),+ $(,)? }) => {
        vec![$(
            $crate::Field::new(
                stringify!($field),
                |m: &$model| ::core::clone::Clone::clone(&m.$field),
                |m: &mut $model, v| m.$field = v,
            )
        ),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Sample {
        flag: bool,
        label: Option<String>,
    }

    impl Model for Sample {
        fn fields() -> Vec<Field<Self>> {
            crate::model_fields!(Sample { flag, label })
        }
    }

    #[test]
    fn type_name_is_last_segment() {
        assert_eq!(Sample::type_name(), "Sample");
    }

    #[test]
    fn field_table_reads_and_writes() {
        let fields = Sample::fields();
        assert_eq!(fields[0].kind(), ValueKind::Bool);
        assert!(!fields[0].is_nullable());
        assert!(fields[1].is_nullable());

        let mut s = Sample::default();
        fields[0].set(&mut s, SqlValue::Integer(1)).unwrap();
        fields[1].set(&mut s, SqlValue::Text("x".into())).unwrap();
        assert!(s.flag);
        assert_eq!(fields[1].get(&s), SqlValue::Text("x".into()));

        let err = fields[0].set(&mut s, SqlValue::Text("y".into())).unwrap_err();
        assert!(err.to_string().contains("field `flag`"));
    }
}
