use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

type Shared<T> = Arc<RwLock<T>>;

/// A dynamically typed state value.
///
/// Scalars are plain values. Lists and maps are shared handles: cloning a
/// container `Value` clones the handle, so a mutation made through one clone
/// is visible through every other. Stores never copy state, which means the
/// value a subscriber receives is the same container later returned by
/// [`Store::get`](crate::Store::get).
///
/// # Examples
///
/// ```
/// use statebox::Value;
///
/// let state = Value::empty_map();
/// let alias = state.clone();
/// alias.insert("ready", true);
///
/// assert_eq!(state.get("ready").as_bool(), Some(true));
/// assert!(Value::same(&state, &alias));
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// The unset state. Every store starts here.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    List(Shared<Vec<Value>>),
    /// Key/value pairs in insertion order.
    Map(Shared<Vec<(String, Value)>>),
}

impl Value {
    /// Create a list value from its items.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::List(Arc::new(RwLock::new(
            items.into_iter().map(Into::into).collect(),
        )))
    }

    /// Create a map value from key/value pairs. Later duplicates replace
    /// earlier ones in place.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = Value::empty_map();
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }

    /// A new list with no items.
    pub fn empty_list() -> Self {
        Value::List(Arc::new(RwLock::new(Vec::new())))
    }

    /// A new map with no entries.
    pub fn empty_map() -> Self {
        Value::Map(Arc::new(RwLock::new(Vec::new())))
    }

    /// Identity comparison.
    ///
    /// Scalars compare by value, containers by handle. Two lists with equal
    /// contents are `==` but not `same` unless they share storage.
    pub fn same(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::String(x), Value::String(y)) => x == y,
            (Value::List(x), Value::List(y)) => Arc::ptr_eq(x, y),
            (Value::Map(x), Value::Map(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Number of entries of a list or map, `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.read().len()),
            Value::Map(entries) => Some(entries.read().len()),
            _ => None,
        }
    }

    /// Look up a map entry. Missing keys and non-maps yield `Undefined`.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Map(entries) => entries
                .read()
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Look up a list item. Out of range indices and non-lists yield `Undefined`.
    pub fn at(&self, index: usize) -> Value {
        match self {
            Value::List(items) => items.read().get(index).cloned().unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Keys of a map in insertion order.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Value::Map(entries) => entries.read().iter().map(|(k, _)| k.clone()).collect(),
            _ => Vec::new(),
        }
    }

    /// Set a map entry in place. Returns `false` if this is not a map.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let Value::Map(entries) = self else {
            return false;
        };
        let key = key.into();
        let value = value.into();
        let mut entries = entries.write();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => entries.push((key, value)),
        }
        true
    }

    /// Append to a list in place. Returns `false` if this is not a list.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        match self {
            Value::List(items) => {
                items.write().push(value.into());
                true
            }
            _ => false,
        }
    }

    /// Replace a list item in place, padding with `Undefined` when `index` is
    /// past the end. Returns `false` if this is not a list or `index` cannot
    /// be reached.
    pub fn set_at(&self, index: usize, value: impl Into<Value>) -> bool {
        let Value::List(items) = self else {
            return false;
        };
        let Some(len) = index.checked_add(1) else {
            return false;
        };
        let mut items = items.write();
        if index >= items.len() {
            items.resize(len, Value::Undefined);
        }
        items[index] = value.into();
        true
    }

    /// Convert to JSON. `Undefined` and non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::List(items) => {
                serde_json::Value::Array(items.read().iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .read()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Structural equality. Containers compare by contents.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if Value::same(self, other) {
            return true;
        }
        match (self, other) {
            (Value::List(a), Value::List(b)) => *a.read() == *b.read(),
            (Value::Map(a), Value::Map(b)) => {
                let (a, b) = (a.read(), b.read());
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(k, v)| k == key && v == value)
                    })
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s.into()),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(entries) => Value::map(entries),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(i32, i64, u32, u64, usize, f32, f64);
