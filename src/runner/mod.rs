//! Duty execution engine
//!
//! This module handles running duties: their context and options, the
//! commands they launch, and the collections they are registered in.

pub mod collection;
pub mod context;
pub mod duty;
pub mod interpolate;
pub mod launcher;
pub mod options;
pub mod script;
pub mod when;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use collection::*;
pub use context::*;
pub use duty::*;
pub use interpolate::*;
pub use launcher::*;
pub use options::*;
pub use script::*;
pub use when::*;
