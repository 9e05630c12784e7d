//! Domain types for agent handlers and their results.

mod capabilities;
mod context;
mod escalation;
mod object_key;
mod outline;
mod result;

pub use capabilities::{AgentCapabilities, ToolName};
pub use context::InvocationContext;
pub use escalation::{Escalation, RetrievalScope};
pub use object_key::{ObjectKey, sanitize_file_name};
pub use outline::{DeckOutline, SectionOutline, SlideOutline};
pub use result::{
    CandidateResult, Citation, ResultPayload, SlideManifest, TemplateClass, ToolFailure,
};
