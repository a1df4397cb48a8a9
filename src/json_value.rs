use std::fmt;
use std::ops::{Index, IndexMut};

use indexmap::IndexMap;
use json_lex::Number;
use rustc_hash::FxBuildHasher;

const NULL: () = ();

/// The map type backing [`Value::Object`]. Iteration follows the order in which keys were
/// first inserted; inserting an existing key replaces its value in place.
pub type Map = IndexMap<String, Value, FxBuildHasher>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

pub trait InnerAsRef {
    fn json_value_as(v: &Value) -> Option<&Self>;
}

macro_rules! impl_inner_ref {
    ($to:ty, $pat:pat => $val:expr) => {
        impl InnerAsRef for $to {
            fn json_value_as(v: &Value) -> Option<&$to> {
                match v {
                    $pat => Some($val),
                    _ => None,
                }
            }
        }
    };
}

impl_inner_ref!(Number, Value::Number(n) => n);
impl_inner_ref!(bool, Value::Bool(b) => b);
impl_inner_ref!(String, Value::String(s) => s);
impl_inner_ref!((), Value::Null => &NULL);
impl_inner_ref!(Vec<Value>, Value::Array(a) => a);
impl_inner_ref!(Map, Value::Object(m) => m);

pub trait InnerAsRefMut {
    fn json_value_as_mut(v: &mut Value) -> Option<&mut Self>;
}

macro_rules! impl_inner_ref_mut {
    ($to:ty, $pat:pat => $val:expr) => {
        impl InnerAsRefMut for $to {
            fn json_value_as_mut(v: &mut Value) -> Option<&mut $to> {
                match v {
                    $pat => Some($val),
                    _ => None,
                }
            }
        }
    };
}

impl_inner_ref_mut!(Number, Value::Number(n) => n);
impl_inner_ref_mut!(bool, Value::Bool(b) => b);
impl_inner_ref_mut!(String, Value::String(s) => s);
impl_inner_ref_mut!(Vec<Value>, Value::Array(a) => a);
impl_inner_ref_mut!(Map, Value::Object(m) => m);

macro_rules! is_xxx {
    ($name:ident, $variant:pat) => {
        pub fn $name(&self) -> bool {
            matches!(self, $variant)
        }
    };
}

impl Value {
    /// Borrows the payload as `T`, if this value is of the matching kind.
    ///
    /// ```
    /// use json_descent::{from_string, Number};
    ///
    /// let v = from_string(r#"{"age": 42}"#).unwrap();
    /// assert_eq!(v["age"].get::<Number>(), Some(&Number::Integer(42)));
    /// assert_eq!(v["age"].get::<String>(), None);
    /// ```
    pub fn get<T: InnerAsRef>(&self) -> Option<&T> {
        T::json_value_as(self)
    }

    pub fn get_mut<T: InnerAsRefMut>(&mut self) -> Option<&mut T> {
        T::json_value_as_mut(self)
    }

    is_xxx!(is_bool, Value::Bool(_));
    is_xxx!(is_number, Value::Number(_));
    is_xxx!(is_string, Value::String(_));
    is_xxx!(is_null, Value::Null);
    is_xxx!(is_array, Value::Array(_));
    is_xxx!(is_object, Value::Object(_));

    /// A short name for the kind of this value, for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl<'a> Index<&'a str> for Value {
    type Output = Value;

    fn index(&self, key: &'a str) -> &Self::Output {
        let obj = match self {
            Value::Object(o) => o,
            _ => panic!(
                "Attempted to access to an object with key '{}' but actually it was {:?}",
                key, self
            ),
        };

        match obj.get(key) {
            Some(json) => json,
            None => panic!("Key '{}' was not found in {:?}", key, self),
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &'_ Self::Output {
        let array = match self {
            Value::Array(a) => a,
            _ => panic!(
                "Attempted to access to an array with index {} but actually the value was {:?}",
                index, self,
            ),
        };
        &array[index]
    }
}

/// Assigning through a missing key inserts it at the end of the object.
impl<'a> IndexMut<&'a str> for Value {
    fn index_mut(&mut self, key: &'a str) -> &mut Self::Output {
        let obj = match self {
            Value::Object(o) => o,
            _ => panic!(
                "Attempted to access to an object with key '{}' but actually it was {:?}",
                key, self
            ),
        };

        obj.entry(key.to_string()).or_insert(Value::Null)
    }
}

impl IndexMut<usize> for Value {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let array = match self {
            Value::Array(a) => a,
            _ => panic!(
                "Attempted to access to an array with index {} but actually the value was {:?}",
                index, self,
            ),
        };

        &mut array[index]
    }
}

#[derive(Debug)]
pub struct UnexpectedValue {
    value: Value,
    expected: &'static str,
}

impl UnexpectedValue {
    /// Gives back the value that failed to convert.
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl fmt::Display for UnexpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unexpected JSON value: {:?}. Expected {} value",
            self.value, self.expected
        )
    }
}

impl std::error::Error for UnexpectedValue {}

macro_rules! impl_try_from {
    ($ty:ty, $pat:pat => $val:expr) => {
        impl TryFrom<Value> for $ty {
            type Error = UnexpectedValue;

            fn try_from(value: Value) -> Result<$ty, UnexpectedValue> {
                match value {
                    $pat => Ok($val),
                    v => Err(UnexpectedValue {
                        value: v,
                        expected: stringify!($ty),
                    }),
                }
            }
        }
    };
}

impl_try_from!(Number, Value::Number(n) => n);
impl_try_from!(i64, Value::Number(Number::Integer(i)) => i);
impl_try_from!(f64, Value::Number(n) => n.as_f64());
impl_try_from!(bool, Value::Bool(b) => b);
impl_try_from!(String, Value::String(s) => s);
impl_try_from!((), Value::Null => ());
impl_try_from!(Vec<Value>, Value::Array(a) => a);
impl_try_from!(Map, Value::Object(o) => o);

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Number(Number::Integer(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Number(Number::Float(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Value {
        Value::Array(a)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Value {
        Value::Object(m)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::Null
    }
}

/// Converts into `serde_json`'s representation, for display and for comparing against
/// `serde_json`. Non-finite floats become `null`, as `serde_json` cannot represent them.
impl From<Value> for serde_json::Value {
    fn from(value: Value) -> serde_json::Value {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(Number::Integer(i)) => serde_json::Value::Number(i.into()),
            Value::Number(Number::Float(f)) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(a) => serde_json::Value::Array(a.into_iter().map(Into::into).collect()),
            Value::Object(o) => {
                serde_json::Value::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
