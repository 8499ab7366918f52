use crate::error::Result;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

use super::store::StoreCore;

/// The function behind an action: current state plus call arguments in,
/// next state out.
pub type ActionFn = Arc<dyn Fn(Value, &[Value]) -> Value + Send + Sync>;

/// An ordered set of named action functions used to build a store.
///
/// Adding a name that already exists replaces the earlier function in place.
///
/// # Examples
///
/// ```
/// use statebox::{ActionSet, Value};
///
/// let base = ActionSet::new()
///     .action("reset", |_, _| Value::from(0))
///     .action("inc", |state, _| Value::from(state.as_f64().unwrap_or(0.0) + 1.0));
///
/// // Own actions shadow inherited ones of the same name.
/// let derived = ActionSet::new()
///     .action("inc", |state, _| Value::from(state.as_f64().unwrap_or(0.0) + 2.0))
///     .inherit(&base);
///
/// assert_eq!(derived.names().collect::<Vec<_>>(), vec!["inc", "reset"]);
/// ```
#[derive(Clone, Default)]
pub struct ActionSet {
    entries: Vec<(String, ActionFn)>,
}

impl ActionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action.
    pub fn action<F>(mut self, name: impl Into<String>, run: F) -> Self
    where
        F: Fn(Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(run));
        self
    }

    /// Copy in every action of `base` this set does not already define.
    ///
    /// `base` is only read; the resulting set shares the function pointers
    /// but nothing is written back to it.
    pub fn inherit(mut self, base: &ActionSet) -> Self {
        for (name, run) in &base.entries {
            if !self.contains(name) {
                self.entries.push((name.clone(), Arc::clone(run)));
            }
        }
        self
    }

    /// Whether an action called `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Action names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no actions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: String, run: ActionFn) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = run,
            None => self.entries.push((name, run)),
        }
    }

    pub(crate) fn into_entries(self) -> Vec<(String, ActionFn)> {
        self.entries
    }
}

impl fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Types that can hand out their actions to a store.
///
/// Implement this for your own types to make them usable with
/// [`create_store`](crate::create_store). Implementations typically capture
/// configuration from `self` into the closures and may build on another
/// type's actions with [`ActionSet::inherit`].
pub trait IntoActions {
    fn into_actions(self) -> ActionSet;
}

impl IntoActions for ActionSet {
    fn into_actions(self) -> ActionSet {
        self
    }
}

impl IntoActions for &ActionSet {
    fn into_actions(self) -> ActionSet {
        self.clone()
    }
}

impl IntoActions for Vec<(String, ActionFn)> {
    fn into_actions(self) -> ActionSet {
        let mut set = ActionSet::new();
        for (name, run) in self {
            set.insert(name, run);
        }
        set
    }
}

impl<const N: usize> IntoActions for [(String, ActionFn); N] {
    fn into_actions(self) -> ActionSet {
        Vec::from(self).into_actions()
    }
}

/// An action bound to the store it was created for.
///
/// Handles are created once when the store is built and are compared by
/// identity, so the action a composed store exposes is `==` to the one on the
/// store it came from.
#[derive(Clone)]
pub struct Action {
    inner: Arc<BoundAction>,
}

struct BoundAction {
    name: String,
    store: Arc<StoreCore>,
    run: ActionFn,
}

impl Action {
    pub(crate) fn bind(store: &Arc<StoreCore>, name: String, run: ActionFn) -> Self {
        Self {
            inner: Arc::new(BoundAction {
                name,
                store: Arc::clone(store),
                run,
            }),
        }
    }

    /// Name the action is exposed under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Run the action on its owning store and return the new state.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        self.inner
            .store
            .run_action(&self.inner.name, &self.inner.run, args)
    }

    /// Identity of the owning store.
    pub fn store_id(&self) -> usize {
        self.inner.store.id()
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Action {}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.inner.name)
            .field("store", &self.inner.store.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(n: i32) -> impl Fn(Value, &[Value]) -> Value + Send + Sync + 'static {
        move |_: Value, _: &[Value]| Value::from(n)
    }

    #[test]
    fn later_definition_replaces_in_place() {
        let set = ActionSet::new()
            .action("a", constant(1))
            .action("b", constant(2))
            .action("a", constant(3));

        assert_eq!(set.names().collect::<Vec<_>>(), vec!["a", "b"]);
        let entries = set.into_entries();
        assert_eq!((entries[0].1)(Value::Undefined, &[]).as_f64(), Some(3.0));
    }

    #[test]
    fn inherit_keeps_own_entries() {
        let base = ActionSet::new()
            .action("shared", constant(1))
            .action("base_only", constant(2));
        let own = ActionSet::new().action("shared", constant(10)).inherit(&base);

        assert_eq!(own.len(), 2);
        assert!(own.contains("base_only"));
        assert_eq!(base.len(), 2);

        let entries = own.into_entries();
        assert_eq!((entries[0].1)(Value::Undefined, &[]).as_f64(), Some(10.0));
    }

    #[test]
    fn array_of_pairs_converts() {
        let one: ActionFn = Arc::new(constant(1));
        let two: ActionFn = Arc::new(constant(2));
        let set = [("one".to_string(), one), ("two".to_string(), two)].into_actions();

        assert_eq!(set.names().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn vec_of_pairs_converts() {
        let run: ActionFn = Arc::new(constant(7));
        let set = vec![("seven".to_string(), run)].into_actions();
        assert!(set.contains("seven"));
        assert!(!set.is_empty());
    }
}
