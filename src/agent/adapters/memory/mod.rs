//! In-memory adapters for agent backends and the object store.

mod backends;
mod object_store;

pub use backends::{
    ScriptedFieldExtractor, ScriptedGenerativeModel, ScriptedRetriever, ScriptedWebSearch,
    deck_with_slides,
};
pub use object_store::InMemoryObjectStore;
pub(crate) use object_store::free_key;
