use crate::store::{Action, Store, StoreConfig, StoreCore, Unsubscribe};
use crate::value::Value;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

use super::definition::{Definition, Segment, SetupFn, SharedDefinition, TransformFn};

/// The resolved shape of a definition.
enum Node {
    Fixed(Value),
    Store(Store),
    Slot(Arc<RwLock<Value>>),
    List(Vec<Node>),
    Map(Vec<(String, Node)>),
}

impl Node {
    fn assemble(&self) -> Value {
        match self {
            Node::Fixed(value) => value.clone(),
            Node::Store(store) => store.get(),
            Node::Slot(slot) => slot.read().clone(),
            Node::List(items) => Value::list(items.iter().map(Node::assemble)),
            Node::Map(entries) => {
                Value::map(entries.iter().map(|(key, node)| (key.clone(), node.assemble())))
            }
        }
    }
}

/// A setup leaf waiting to be called once the composed store exists.
struct PendingSetup {
    setup: SetupFn,
    slot: Arc<RwLock<Value>>,
    path: Vec<Segment>,
}

/// Everything collected in one pass over a definition.
#[derive(Default)]
struct Walk {
    setups: Vec<PendingSetup>,
    children: Vec<Store>,
    surface: Vec<Action>,
}

impl Walk {
    fn visit(&mut self, def: &Definition, path: &mut Vec<Segment>) -> Node {
        match def {
            Definition::Value(value) => Node::Fixed(value.clone()),
            Definition::Store(store) => {
                self.adopt(store);
                Node::Store(store.clone())
            }
            Definition::Setup(setup) => {
                let slot = Arc::new(RwLock::new(Value::Undefined));
                self.setups.push(PendingSetup {
                    setup: Arc::clone(setup),
                    slot: Arc::clone(&slot),
                    path: path.clone(),
                });
                Node::Slot(slot)
            }
            Definition::List(items) => {
                let mut nodes = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push(Segment::Index(index));
                    nodes.push(self.visit(item, path));
                    path.pop();
                }
                Node::List(nodes)
            }
            Definition::Map(entries) => {
                let mut nodes = Vec::with_capacity(entries.len());
                for (key, item) in entries {
                    path.push(Segment::Key(key.clone()));
                    nodes.push((key.clone(), self.visit(item, path)));
                    path.pop();
                }
                Node::Map(nodes)
            }
        }
    }

    /// Take over a store's actions and remember it for subscription.
    ///
    /// An action name seen before is replaced in place by the later store's
    /// action, in traversal order.
    fn adopt(&mut self, store: &Store) {
        for action in store.surface() {
            match self.surface.iter_mut().find(|a| a.name() == action.name()) {
                Some(existing) => *existing = action.clone(),
                None => self.surface.push(action.clone()),
            }
        }
        if !self.children.iter().any(|child| Store::ptr_eq(child, store)) {
            self.children.push(store.clone());
        }
    }
}

/// Keeps a composed store in sync with its inputs.
///
/// Owned by the composed store. Child stores and setters only hold weak
/// references to it, so dropping the composed store disconnects everything.
pub(crate) struct Composition {
    target: Arc<StoreCore>,
    root: Node,
    transforms: Vec<TransformFn>,
    definition: Option<SharedDefinition>,
    links: Mutex<Vec<Unsubscribe>>,
}

impl Composition {
    fn resolve(&self) -> Value {
        self.transforms
            .iter()
            .fold(self.root.assemble(), |state, transform| transform(state))
    }

    fn refresh(&self) {
        trace!(store = %self.target.name(), "recomputing composed state");
        self.target.replace(self.resolve());
    }

    fn write_back(&self, path: &[Segment], value: &Value) {
        if path.is_empty() {
            return;
        }
        if let Some(definition) = &self.definition {
            if let Some(slot) = definition.lock().slot_mut(path) {
                *slot = Definition::Value(value.clone());
            }
        }
    }
}

impl Drop for Composition {
    fn drop(&mut self) {
        for link in self.links.get_mut().drain(..) {
            link.unsubscribe();
        }
    }
}

/// Setter handed to a setup leaf.
///
/// Each call stores the value in the leaf's slot, recomputes the composed
/// state and notifies the composed store's subscribers. Once the composed
/// store is gone, calls are no-ops and [`current`](SetState::current) keeps
/// the last value set before that.
#[derive(Clone)]
pub struct SetState {
    slot: Arc<RwLock<Value>>,
    composition: Weak<Composition>,
    path: Arc<[Segment]>,
}

impl SetState {
    /// Set this leaf's value and republish the composed state.
    pub fn set(&self, value: impl Into<Value>) {
        let Some(composition) = self.composition.upgrade() else {
            return;
        };
        let value = value.into();
        *self.slot.write() = value.clone();
        composition.write_back(&self.path, &value);
        composition.refresh();
    }

    /// The value last passed to [`set`](SetState::set), `Undefined` before.
    pub fn current(&self) -> Value {
        self.slot.read().clone()
    }
}

impl fmt::Debug for SetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("current", &self.current())
            .field("path", &self.path)
            .finish()
    }
}

enum Source {
    Owned(Definition),
    Shared(SharedDefinition),
}

/// Builder for composed stores.
///
/// # Examples
///
/// ```
/// use statebox::{create_store, ActionSet, Composer, Definition, Value};
///
/// let counter = create_store(ActionSet::new().action("set", |_, args| args[0].clone()));
/// let doubled = Composer::new(&counter)
///     .transform(|state| Value::from(state.as_f64().unwrap_or(0.0) * 2.0))
///     .build();
///
/// doubled.dispatch("set", &[Value::from(21)]).unwrap();
/// assert_eq!(doubled.get().as_f64(), Some(42.0));
/// ```
pub struct Composer {
    source: Source,
    transforms: Vec<TransformFn>,
    config: StoreConfig,
}

impl Composer {
    /// Start composing from an owned definition.
    pub fn new(definition: impl Into<Definition>) -> Self {
        Self {
            source: Source::Owned(definition.into()),
            transforms: Vec::new(),
            config: StoreConfig::default(),
        }
    }

    /// Compose from a definition the caller keeps a handle to.
    ///
    /// Whenever a setup leaf inside a list or map sets a value, that leaf is
    /// replaced in `definition` by [`Definition::Value`] holding the value.
    /// Paths are recorded at build time; restructuring the definition
    /// afterwards may make later write-backs miss.
    pub fn shared(definition: &SharedDefinition) -> Self {
        Self {
            source: Source::Shared(Arc::clone(definition)),
            transforms: Vec::new(),
            config: StoreConfig::default(),
        }
    }

    /// Append a transform. Transforms run in the order they were added.
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transforms.push(Arc::new(transform));
        self
    }

    /// Set the options of the composed store.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Walk the definition once and wire up the composed store.
    pub fn build(self) -> Store {
        let mut walk = Walk::default();
        let mut path = Vec::new();
        let (root, definition) = match self.source {
            Source::Owned(def) => (walk.visit(&def, &mut path), None),
            Source::Shared(shared) => {
                let root = walk.visit(&shared.lock(), &mut path);
                (root, Some(shared))
            }
        };
        let Walk {
            setups,
            children,
            surface,
        } = walk;

        let mut store = Store::composed(&self.config, surface);
        debug!(
            store = %store.name(),
            children = children.len(),
            setups = setups.len(),
            transforms = self.transforms.len(),
            "composed store"
        );

        let composition = Arc::new(Composition {
            target: Arc::clone(store.core()),
            root,
            transforms: self.transforms,
            definition,
            links: Mutex::new(Vec::new()),
        });
        store.attach(Arc::clone(&composition));

        for child in &children {
            let weak = Arc::downgrade(&composition);
            let link = child.subscribe(move |_| {
                if let Some(composition) = weak.upgrade() {
                    composition.refresh();
                }
            });
            composition.links.lock().push(link);
        }

        for pending in setups {
            (pending.setup)(SetState {
                slot: pending.slot,
                composition: Arc::downgrade(&composition),
                path: pending.path.into(),
            });
        }

        composition.refresh();
        store
    }
}

/// Compose a store from a definition, without transforms.
///
/// # Example
///
/// ```ignore
/// let pair = compose(Definition::list([&store_a, &store_b]));
/// store_a.dispatch("init", &[Value::from(123)])?;
/// assert_eq!(pair.get().at(0).as_f64(), Some(123.0));
/// ```
pub fn compose(definition: impl Into<Definition>) -> Store {
    Composer::new(definition).build()
}
