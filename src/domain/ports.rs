use crate::domain::model::{ExternalInvocation, InvocationOutput};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Runs one external process to completion.
///
/// Implementations must map a missing program to
/// [`ConfluenceError::InterpreterNotFound`](crate::utils::error::ConfluenceError::InterpreterNotFound)
/// and an expired deadline to
/// [`ConfluenceError::Timeout`](crate::utils::error::ConfluenceError::Timeout), and must
/// not leave the process running in either case. A non-zero exit is not an error here.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, invocation: &ExternalInvocation) -> Result<InvocationOutput>;
}
