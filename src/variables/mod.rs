//! Variable store, `{{name}}` resolution and persistence

mod persistence;
mod store;

pub use persistence::{JsonFilePersistence, MemoryPersistence, VariablePersistence};
pub use store::{Scope, VariableStore};
