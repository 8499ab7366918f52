use crate::store::Store;
use crate::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use super::compose::SetState;

/// A leaf function that produces state later through its [`SetState`].
pub type SetupFn = Arc<dyn Fn(SetState) + Send + Sync>;

/// A post-processing step applied to the assembled state.
pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A definition the caller keeps a handle to. See
/// [`Composer::shared`](crate::Composer::shared).
pub type SharedDefinition = Arc<Mutex<Definition>>;

/// What a composed store is built from.
///
/// Leaves are static values, stores and setup functions. Lists and maps nest
/// any of these and keep their shape in the composed state.
#[derive(Clone)]
pub enum Definition {
    /// Copied into its slot as is.
    Value(Value),
    /// Contributes its live state and its actions.
    Store(Store),
    /// Called once at compose time with a [`SetState`] for its slot.
    Setup(SetupFn),
    List(Vec<Definition>),
    Map(Vec<(String, Definition)>),
}

/// One step of a path from the root of a definition to a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment {
    Index(usize),
    Key(String),
}

impl Definition {
    /// Wrap a setup function as a leaf.
    pub fn setup<F>(f: F) -> Self
    where
        F: Fn(SetState) + Send + Sync + 'static,
    {
        Definition::Setup(Arc::new(f))
    }

    /// Build a list from anything convertible into definitions.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Definition>,
    {
        Definition::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map. A repeated key replaces the earlier entry in place.
    pub fn map<K, D, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<Definition>,
    {
        let mut map: Vec<(String, Definition)> = Vec::new();
        for (key, def) in entries {
            let key = key.into();
            let def = def.into();
            match map.iter_mut().find(|(k, _)| *k == key) {
                Some((_, slot)) => *slot = def,
                None => map.push((key, def)),
            }
        }
        Definition::Map(map)
    }

    /// Wrap in a handle for [`Composer::shared`](crate::Composer::shared).
    pub fn shared(self) -> SharedDefinition {
        Arc::new(Mutex::new(self))
    }

    /// The static value, if this is a value leaf.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Definition::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_setup(&self) -> bool {
        matches!(self, Definition::Setup(_))
    }

    /// Entry `index` of a list definition.
    pub fn item(&self, index: usize) -> Option<&Definition> {
        match self {
            Definition::List(items) => items.get(index),
            _ => None,
        }
    }

    /// Entry `key` of a map definition.
    pub fn entry(&self, key: &str) -> Option<&Definition> {
        match self {
            Definition::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, d)| d),
            _ => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, path: &[Segment]) -> Option<&mut Definition> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        let child = match (self, first) {
            (Definition::List(items), Segment::Index(index)) => items.get_mut(*index)?,
            (Definition::Map(entries), Segment::Key(key)) => entries
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, d)| d)?,
            _ => return None,
        };
        child.slot_mut(rest)
    }
}

impl From<Value> for Definition {
    fn from(value: Value) -> Self {
        Definition::Value(value)
    }
}

impl From<serde_json::Value> for Definition {
    fn from(json: serde_json::Value) -> Self {
        Definition::Value(json.into())
    }
}

impl From<Store> for Definition {
    fn from(store: Store) -> Self {
        Definition::Store(store)
    }
}

impl From<&Store> for Definition {
    fn from(store: &Store) -> Self {
        Definition::Store(store.clone())
    }
}

impl From<Vec<Definition>> for Definition {
    fn from(items: Vec<Definition>) -> Self {
        Definition::List(items)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definition::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Definition::Store(store) => f.debug_tuple("Store").field(&store.name()).finish(),
            Definition::Setup(_) => f.write_str("Setup"),
            Definition::List(items) => f.debug_list().entries(items).finish(),
            Definition::Map(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
        }
    }
}
