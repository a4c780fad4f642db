pub mod diagnostics;
pub mod gateway;

pub use crate::domain::model::{ExternalInvocation, InvocationOutput};
pub use crate::domain::ports::ScriptRunner;
pub use crate::utils::error::Result;
pub use diagnostics::Diagnostics;
pub use gateway::TransformGateway;
