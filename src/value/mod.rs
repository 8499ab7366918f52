//! Dynamically typed state values.
//!
//! Store state is a [`Value`]. Lists and maps are shared handles so that a
//! store hands out the very container it holds instead of a copy.

mod value;

pub use value::Value;
