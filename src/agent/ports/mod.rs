//! Port contracts for agent handlers and the backends they compose.

pub mod backends;
pub mod handler;
pub mod object_store;

#[cfg(test)]
pub use backends::MockWebSearch;
pub use backends::{
    BackendError, BackendResult, ExtractionRequest, FieldExtractor, GenerativeModel, Passage,
    RetrievalQuery, Retriever, SearchHit, WebSearch,
};
pub use handler::{AgentError, AgentHandler, AgentResult};
pub use object_store::{
    ObjectEntry, ObjectStore, ObjectStoreResult, PutObject, StorageError,
};
