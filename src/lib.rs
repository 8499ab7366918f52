//! # Statebox
//!
//! Minimal, unopinionated state stores for Rust.
//!
//! Statebox provides two pieces that build on each other:
//!
//! ## Store
//!
//! A container for one state value driven by named actions:
//! - `create_store(actions)` - Build a store from an [`ActionSet`]
//! - `store.dispatch(name, args)` - Compute and publish the next state
//! - `store.subscribe(f)` - Get told about every change, with an
//!   [`Unsubscribe`] handle to stop
//!
//! Dispatching an action from inside another action (or from a subscriber it
//! triggered) on the same store is rejected with
//! [`StoreError::ReentrantAction`].
//!
//! ## Compose
//!
//! Aggregate stores built from nested lists and maps of stores, static values
//! and setup functions:
//! - `compose(definition)` - Mirror the definition's shape as live state
//! - `Composer` - The same, plus transforms and write-back
//! - Actions of every nested store stay reachable from the composed store

pub mod compose;
pub mod error;
pub mod store;
pub mod value;

// Re-export main types for convenience
pub use compose::{compose, Composer, Definition, SetState, SharedDefinition};
pub use error::{Result, StoreError};
pub use store::{
    create_store, create_store_with, Action, ActionFn, ActionSet, IntoActions, Store, StoreConfig,
    Unsubscribe,
};
pub use value::Value;
