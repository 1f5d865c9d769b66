//! Backend-agnostic values exchanged between entities and form controls.
//!
//! The [`Value`] enum carries entity property values, control defaults,
//! submitted form values, and primary keys.

use std::fmt;

/// A backend-agnostic representation of a property or control value.
///
/// # Examples
///
/// ```
/// use ormforms_db::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v, Value::String("hello".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL / no value.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// A date without time.
    Date(chrono::NaiveDate),
    /// A date and time without timezone.
    DateTime(chrono::NaiveDateTime),
    /// A UUID value.
    Uuid(uuid::Uuid),
    /// A JSON value.
    Json(serde_json::Value),
    /// A list of values (multiselect submissions, key batches).
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Json(j) => write!(f, "{j}"),
            Self::List(vals) => {
                write!(f, "[")?;
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

impl Value {
    /// Returns `true` if this value is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for the "none" sentinel: `Null`, the empty string, or
    /// the empty list. `0` and `false` are real values.
    pub fn is_none(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Returns `true` for the scalar variants a control can hold directly.
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::Null | Self::List(_) | Self::Json(_))
    }

    /// Compares two values as record keys.
    ///
    /// Keys submitted by a form arrive as strings while keys held by
    /// entities are usually integers, so `Int(5)` matches `String("5")`.
    pub fn key_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::String(b)) | (Self::String(b), Self::Int(a)) => {
                b.trim().parse::<i64>().is_ok_and(|b| b == *a)
            }
            (Self::Uuid(a), Self::String(b)) | (Self::String(b), Self::Uuid(a)) => {
                uuid::Uuid::parse_str(b).is_ok_and(|b| b == *a)
            }
            _ => self == other,
        }
    }

    /// Attempts to extract a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a list of values.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Returns `true` if `keys` contains a value matching `key` under [`Value::key_eq`].
pub fn contains_key(keys: &[Value], key: &Value) -> bool {
    keys.iter().any(|k| k.key_eq(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(Some(42_i64)), Value::Int(42));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_display_list() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(list.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn test_is_none_sentinel() {
        assert!(Value::Null.is_none());
        assert!(Value::String(String::new()).is_none());
        assert!(Value::List(vec![]).is_none());
        assert!(!Value::Int(0).is_none());
        assert!(!Value::Bool(false).is_none());
        assert!(!Value::String("0".into()).is_none());
    }

    #[test]
    fn test_is_scalar() {
        assert!(Value::Int(1).is_scalar());
        assert!(Value::String("a".into()).is_scalar());
        assert!(!Value::Null.is_scalar());
        assert!(!Value::List(vec![]).is_scalar());
    }

    #[test]
    fn test_key_eq_coerces_numeric_strings() {
        assert!(Value::Int(5).key_eq(&Value::String("5".into())));
        assert!(Value::String(" 7".into()).key_eq(&Value::Int(7)));
        assert!(!Value::Int(5).key_eq(&Value::String("five".into())));
        assert!(!Value::Int(5).key_eq(&Value::Int(6)));
    }

    #[test]
    fn test_key_eq_uuid() {
        let u = uuid::Uuid::new_v4();
        assert!(Value::Uuid(u).key_eq(&Value::String(u.to_string())));
    }

    #[test]
    fn test_contains_key() {
        let keys = vec![Value::Int(1), Value::Int(2)];
        assert!(contains_key(&keys, &Value::String("2".into())));
        assert!(!contains_key(&keys, &Value::Int(3)));
    }

    #[test]
    fn test_as_list() {
        let v = Value::List(vec![Value::Int(1)]);
        assert_eq!(v.as_list(), Some(&[Value::Int(1)][..]));
        assert_eq!(Value::Int(1).as_list(), None);
    }
}
