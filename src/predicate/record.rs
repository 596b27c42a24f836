//! Field access on filtered objects.

use crate::expression::Literal;

/// A type whose instances can be filtered by field name.
///
/// Implementations list the field names they expose so that filters
/// referencing unknown fields are rejected when they are compiled, not when
/// they are run.
///
/// ```
/// use filterql::{Literal, Record};
///
/// struct Employee {
///     name: String,
///     age: i32,
/// }
///
/// impl Record for Employee {
///     fn field_names() -> &'static [&'static str] {
///         &["name", "age"]
///     }
///
///     fn field(&self, name: &str) -> Option<Literal> {
///         match name {
///             "name" => Some(Literal::String(self.name.clone())),
///             "age" => Some(Literal::Integer(self.age)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Record {
    /// Names accepted by `field`
    fn field_names() -> &'static [&'static str]
    where
        Self: Sized;

    /// Value of the named field; `None` for unknown names
    fn field(&self, name: &str) -> Option<Literal>;

    /// Value produced by a named accessor, used for function subjects such as
    /// `full_name() = 'Ada Lovelace'`. Falls back to a field of the same name.
    fn accessor(&self, name: &str, _argument: Option<&Literal>) -> Option<Literal> {
        self.field(name)
    }

    /// Short type name used in error messages
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Whether `name` is one of the declared fields
    fn has_field(name: &str) -> bool
    where
        Self: Sized,
    {
        Self::field_names().contains(&name)
    }
}
