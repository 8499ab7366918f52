//! The single-store engine.
//!
//! A [`Store`] owns one state value, a fixed set of [`Action`]s that compute
//! the next state, and an ordered list of subscribers that are told about
//! every change.

mod action;
mod config;
mod store;
mod subscription;

pub use action::{Action, ActionFn, ActionSet, IntoActions};
pub use config::StoreConfig;
pub use store::{create_store, create_store_with, Store};
pub(crate) use store::StoreCore;
pub use subscription::Unsubscribe;
