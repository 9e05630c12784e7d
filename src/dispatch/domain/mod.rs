//! Domain types for the dispatch state machine.

mod error;
mod invocation;
mod response;
mod state;

pub use error::{DispatchDomainError, PipelineError};
pub use invocation::{AgentInvocation, InvocationStatus};
pub use response::{DispatchOutcome, DispatchResponse, DispatchStatus, InboundRequest};
pub use state::{PipelineState, Transition};
