use crate::compose::Composition;
use crate::error::{Result, StoreError};
use crate::value::Value;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::action::{Action, ActionFn, IntoActions};
use super::config::StoreConfig;
use super::subscription::{Subscriber, Unsubscribe};

static NEXT_STORE_ID: AtomicUsize = AtomicUsize::new(0);

/// State, subscribers and the reentrancy flag of one store.
///
/// Locks are only held to copy a handle in or out; no user code runs while
/// one is taken.
pub(crate) struct StoreCore {
    id: usize,
    name: String,
    state: RwLock<Value>,
    subscribers: Mutex<Vec<Arc<Subscriber>>>,
    next_subscriber: AtomicUsize,
    in_action: AtomicBool,
}

impl StoreCore {
    fn new(name: String) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::SeqCst),
            name,
            state: RwLock::new(Value::Undefined),
            subscribers: Mutex::new(Vec::new()),
            next_subscriber: AtomicUsize::new(0),
            in_action: AtomicBool::new(false),
        })
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn get(&self) -> Value {
        self.state.read().clone()
    }

    /// Run an action: compute the next state from the current one, store it
    /// and notify. The store stays "in action" until every subscriber has
    /// returned.
    pub(crate) fn run_action(&self, action: &str, run: &ActionFn, args: &[Value]) -> Result<Value> {
        let _guard = ActionGuard::acquire(self, action)?;
        trace!(store = %self.name, action, "dispatching action");

        let next = run(self.get(), args);
        *self.state.write() = next.clone();
        self.notify(&next);
        Ok(next)
    }

    /// Replace the state outside of any action and notify.
    pub(crate) fn replace(&self, next: Value) {
        *self.state.write() = next.clone();
        self.notify(&next);
    }

    fn notify(&self, state: &Value) {
        // Snapshot so callbacks may subscribe or unsubscribe freely.
        let subscribers = self.subscribers.lock().clone();
        trace!(store = %self.name, count = subscribers.len(), "notifying subscribers");
        for subscriber in subscribers {
            subscriber.notify(state);
        }
    }

    fn subscribe(self: &Arc<Self>, callback: Box<dyn Fn(&Value) + Send + Sync>) -> Unsubscribe {
        let id = self.next_subscriber.fetch_add(1, Ordering::SeqCst);
        let subscriber = Arc::new(Subscriber::new(id, callback));
        self.subscribers.lock().push(Arc::clone(&subscriber));
        Unsubscribe::new(self, &subscriber)
    }

    pub(crate) fn remove_subscriber(&self, id: usize) {
        self.subscribers.lock().retain(|s| s.id != id);
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Holds a store's in-action flag for the duration of a dispatch.
struct ActionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ActionGuard<'a> {
    fn acquire(core: &'a StoreCore, action: &str) -> Result<Self> {
        if core
            .in_action
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(store = %core.name, action, "rejected reentrant action");
            return Err(StoreError::ReentrantAction {
                store: core.name.clone(),
                action: action.to_string(),
            });
        }
        Ok(Self {
            flag: &core.in_action,
        })
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A state container driven by named actions.
///
/// A store starts out `Undefined`. Every action receives the current state and
/// its arguments and returns the next state, after which all subscribers are
/// called with it in subscription order. Dispatching an action while another
/// one on the same store is still running (or still notifying) fails with
/// [`StoreError::ReentrantAction`].
///
/// `Store` is a cheap handle; clones refer to the same store.
///
/// # Examples
///
/// ```
/// use statebox::{create_store, ActionSet, Value};
///
/// let counter = create_store(
///     ActionSet::new().action("add", |state, args| {
///         let by = args.first().and_then(Value::as_f64).unwrap_or(1.0);
///         Value::from(state.as_f64().unwrap_or(0.0) + by)
///     }),
/// );
///
/// assert!(counter.get().is_undefined());
/// counter.dispatch("add", &[Value::from(5)]).unwrap();
/// assert_eq!(counter.get().as_f64(), Some(5.0));
/// ```
#[derive(Clone)]
pub struct Store {
    core: Arc<StoreCore>,
    actions: Arc<Vec<Action>>,
    upstream: Option<Arc<Composition>>,
}

impl Store {
    /// Create a store from a set of actions.
    pub fn new(actions: impl IntoActions) -> Self {
        Self::with_config(actions, StoreConfig::default())
    }

    /// Create a store from a set of actions with explicit options.
    pub fn with_config(actions: impl IntoActions, config: StoreConfig) -> Self {
        let core = StoreCore::new(config.name_or("store"));
        let actions: Vec<Action> = actions
            .into_actions()
            .into_entries()
            .into_iter()
            .map(|(name, run)| Action::bind(&core, name, run))
            .collect();
        debug!(store = %core.name, id = core.id, actions = actions.len(), "created store");

        Self {
            core,
            actions: Arc::new(actions),
            upstream: None,
        }
    }

    /// A store without own actions that re-exposes `surface`. Its state is
    /// driven by the composition attached afterwards.
    pub(crate) fn composed(config: &StoreConfig, surface: Vec<Action>) -> Self {
        let core = StoreCore::new(config.name_or("composed"));
        Self {
            core,
            actions: Arc::new(surface),
            upstream: None,
        }
    }

    pub(crate) fn attach(&mut self, composition: Arc<Composition>) {
        self.upstream = Some(composition);
    }

    pub(crate) fn core(&self) -> &Arc<StoreCore> {
        &self.core
    }

    pub(crate) fn surface(&self) -> &[Action] {
        &self.actions
    }

    /// The current state. Containers are returned by handle, not copied.
    pub fn get(&self) -> Value {
        self.core.get()
    }

    /// Register `callback` to be called with the new state on every future
    /// change. It is not called with the current state.
    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.core.subscribe(Box::new(callback))
    }

    /// Same operation as [`subscribe`](Store::subscribe).
    pub fn get_state<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(callback)
    }

    /// Dispatch the action called `name` and return the new state.
    pub fn dispatch(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.action(name) {
            Some(action) => action.call(args),
            None => Err(StoreError::UnknownAction {
                store: self.core.name.clone(),
                action: name.to_string(),
            }),
        }
    }

    /// The handle of the action called `name`.
    ///
    /// For a composed store this is the very handle of the store the action
    /// was found on.
    pub fn action(&self, name: &str) -> Option<Action> {
        self.actions.iter().find(|a| a.name() == name).cloned()
    }

    /// Whether an action called `name` is exposed.
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a.name() == name)
    }

    /// Names of all exposed actions, in definition order.
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(Action::name).collect()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.core.subscriber_count()
    }

    /// Whether this store was built by [`compose`](crate::compose).
    pub fn is_composed(&self) -> bool {
        self.upstream.is_some()
    }

    /// Unique id of this store.
    pub fn id(&self) -> usize {
        self.core.id
    }

    /// Label used in logs and errors.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Whether two handles refer to the same store.
    pub fn ptr_eq(a: &Store, b: &Store) -> bool {
        Arc::ptr_eq(&a.core, &b.core)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.core.name)
            .field("id", &self.core.id)
            .field("state", &self.get())
            .field("actions", &self.action_names())
            .finish()
    }
}

/// Create a store from a set of actions.
///
/// # Example
///
/// ```ignore
/// let store = create_store(ActionSet::new().action("set", |_, args| args[0].clone()));
/// store.dispatch("set", &[Value::from(1)])?;
/// ```
pub fn create_store(actions: impl IntoActions) -> Store {
    Store::new(actions)
}

/// Create a store from a set of actions with explicit options.
pub fn create_store_with(actions: impl IntoActions, config: StoreConfig) -> Store {
    Store::with_config(actions, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ActionSet;
    use std::sync::OnceLock;

    fn init_store() -> Store {
        create_store(
            ActionSet::new()
                .action("init", |_, args| args.first().cloned().unwrap_or_default())
                .action("ping", |state, _| state),
        )
    }

    #[test]
    fn starts_undefined() {
        let store = init_store();
        assert!(store.get().is_undefined());
    }

    #[test]
    fn action_result_becomes_state() {
        let store = init_store();
        let returned = store.dispatch("init", &[Value::from(123)]).unwrap();

        assert_eq!(returned.as_f64(), Some(123.0));
        assert_eq!(store.get().as_f64(), Some(123.0));
    }

    #[test]
    fn returning_the_same_state_keeps_identity() {
        let store = init_store();
        store.dispatch("init", &[Value::empty_map()]).unwrap();

        let before = store.get();
        store.dispatch("ping", &[]).unwrap();
        assert!(Value::same(&before, &store.get()));
    }

    #[test]
    fn subscribers_run_in_order_with_new_state() {
        let store = init_store();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = log.clone();
            store.subscribe(move |state| {
                log.lock().push(format!("{tag}:{:?}", state));
            });
        }

        store.dispatch("init", &[Value::from(1)]).unwrap();
        assert_eq!(*log.lock(), vec!["first:1", "second:1"]);
    }

    #[test]
    fn subscribe_does_not_call_back_immediately() {
        let store = init_store();
        store.dispatch("init", &[Value::from(1)]).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let store = init_store();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_a = calls.clone();
        let a = store.subscribe(move |_| {
            calls_a.fetch_add(1, Ordering::SeqCst);
        });
        let calls_b = calls.clone();
        let b = store.subscribe(move |_| {
            calls_b.fetch_add(10, Ordering::SeqCst);
        });

        a.unsubscribe();
        a.unsubscribe();
        assert!(!a.is_active());
        assert!(b.is_active());
        assert_eq!(store.subscriber_count(), 1);

        store.dispatch("ping", &[]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn get_state_registers_on_the_same_list() {
        let store = init_store();
        let first = store.get_state(|_| {});
        store.subscribe(|_| {});

        assert_eq!(store.subscriber_count(), 2);
        first.unsubscribe();
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn subscriber_removed_mid_notification_is_skipped() {
        let store = init_store();
        let later: Arc<OnceLock<Unsubscribe>> = Arc::new(OnceLock::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let later_clone = later.clone();
        store.subscribe(move |_| {
            if let Some(handle) = later_clone.get() {
                handle.unsubscribe();
            }
        });
        let calls_clone = calls.clone();
        let handle = store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        later.set(handle).ok();

        store.dispatch("ping", &[]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn subscriber_added_mid_notification_waits_for_next_change() {
        let store = init_store();
        let added = Arc::new(AtomicBool::new(false));
        let late_calls = Arc::new(AtomicUsize::new(0));

        let inner = store.clone();
        let added_clone = added.clone();
        let late_clone = late_calls.clone();
        store.subscribe(move |_| {
            if !added_clone.swap(true, Ordering::SeqCst) {
                let late = late_clone.clone();
                inner.subscribe(move |_| {
                    late.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        store.dispatch("init", &[Value::from(1)]).unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.subscriber_count(), 2);

        store.dispatch("init", &[Value::from(2)]).unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_action_is_rejected() {
        let cell: Arc<OnceLock<Store>> = Arc::new(OnceLock::new());
        let nested: Arc<Mutex<Option<Result<Value>>>> = Arc::new(Mutex::new(None));

        let cell_clone = cell.clone();
        let nested_clone = nested.clone();
        let store = create_store(
            ActionSet::new()
                .action("outer", move |_, _| {
                    if let Some(store) = cell_clone.get() {
                        *nested_clone.lock() = Some(store.dispatch("inner", &[]));
                    }
                    Value::from("outer")
                })
                .action("inner", |_, _| Value::from("inner")),
        );
        cell.set(store.clone()).ok();

        store.dispatch("outer", &[]).unwrap();

        let nested = nested.lock().take().unwrap();
        assert!(nested.unwrap_err().is_reentrant());
        assert_eq!(store.get().as_str(), Some("outer"));
    }

    #[test]
    fn panicking_action_releases_the_flag() {
        let store = create_store(
            ActionSet::new()
                .action("boom", |_, _| panic!("boom"))
                .action("ok", |_, _| Value::from(true)),
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = store.dispatch("boom", &[]);
        }));
        assert!(result.is_err());
        assert!(store.dispatch("ok", &[]).is_ok());
    }

    #[test]
    fn unknown_action_errors() {
        let store = init_store();
        let err = store.dispatch("missing", &[]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownAction { .. }));
    }

    #[test]
    fn config_names_the_store() {
        let store = create_store_with(ActionSet::new(), StoreConfig::named("session"));
        assert_eq!(store.name(), "session");
        assert!(!store.is_composed());
        assert!(store.action_names().is_empty());
    }
}
