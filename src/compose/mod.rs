//! Building stores out of other stores.
//!
//! [`compose`] walks a [`Definition`] once and produces a store whose state is
//! assembled from static values, setup leaves and the live state of every
//! store it found. The composed store re-exposes the actions of those stores
//! by handle and recomputes its state whenever one of them changes.

mod compose;
mod definition;

pub use compose::{compose, Composer, SetState};
pub(crate) use compose::Composition;
pub use definition::{Definition, SetupFn, SharedDefinition, TransformFn};
