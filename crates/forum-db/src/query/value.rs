//! Dynamic values exchanged with the driver

use std::hash::{Hash, Hasher};

use serde::Serialize;

/// A single column value or bound parameter
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view, parsing text and truncating floats the way the
    /// storage layer's loose typing requires
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Bool(v) => Some(i64::from(*v)),
            Self::Float(v) => Some(*v as i64),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }

    /// Borrowed text view; only text values qualify
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Owned text rendering of any non-null value
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(v) => Some(v.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

// Floats compare by bit pattern so values can key a map.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Text(s) => s.hash(state),
        }
    }
}

/// A filter or assignment argument: one value or a sequence of values
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Scalar(Value),
    List(Vec<Value>),
}

impl Param {
    /// Flatten into the positional parameters it binds
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Scalar(v) => vec![v],
            Self::List(vs) => vs,
        }
    }
}

macro_rules! scalar_conversions {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }

            impl From<$ty> for Param {
                fn from(v: $ty) -> Self {
                    Param::Scalar(Value::from(v))
                }
            }

            impl From<Vec<$ty>> for Param {
                fn from(vs: Vec<$ty>) -> Self {
                    Param::List(vs.into_iter().map(Value::from).collect())
                }
            }
        )*
    };
}

scalar_conversions! {
    bool => |v| Value::Bool(v),
    i32 => |v| Value::Int(i64::from(v)),
    i64 => |v| Value::Int(v),
    u32 => |v| Value::Int(i64::from(v)),
    u64 => |v| Value::Int(v as i64),
    f64 => |v| Value::Float(v),
    String => |v| Value::Text(v),
    &str => |v| Value::Text(v.to_string()),
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Scalar(v)
    }
}

impl From<Vec<Value>> for Param {
    fn from(vs: Vec<Value>) -> Self {
        Param::List(vs)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_as_i64_is_lenient() {
        assert_eq!(Value::Int(4).as_i64(), Some(4));
        assert_eq!(Value::Text(" 12 ".into()).as_i64(), Some(12));
        assert_eq!(Value::Bool(true).as_i64(), Some(1));
        assert_eq!(Value::Text("x".into()).as_i64(), None);
        assert_eq!(Value::Null.as_i64(), None);
    }

    #[test]
    fn test_param_conversions() {
        assert_eq!(Param::from(5_i64), Param::Scalar(Value::Int(5)));
        assert_eq!(
            Param::from(vec!["a", "b"]),
            Param::List(vec![Value::Text("a".into()), Value::Text("b".into())])
        );
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_values_hash_consistently() {
        let mut set = HashSet::new();
        set.insert(Value::Int(1));
        set.insert(Value::Int(1));
        set.insert(Value::Float(1.0));
        set.insert(Value::Text("1".into()));
        assert_eq!(set.len(), 3);
    }
}
