use crate::error::RequestError;
use crate::wire::{BatchReadRequest, BatchReadResponse, CommandRequest, CommandResponse};

/// The external service that owns the links to the devices
///
/// Each method is exactly one round trip. Implementations must bound the call with a
/// timeout; nothing above this trait can cancel a stuck request.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// submit a whole batch of read items in a single request
    async fn batch_read(
        &self,
        request: &BatchReadRequest,
    ) -> Result<BatchReadResponse, RequestError>;

    /// submit a single-item read or write command
    async fn execute(&self, request: &CommandRequest) -> Result<CommandResponse, RequestError>;
}
