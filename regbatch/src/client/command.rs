use std::sync::Arc;

use crate::client::gateway::Gateway;
use crate::codec::{self, DataType, Value};
use crate::error::{DecodeError, RequestError};
use crate::wire::{CommandKind, CommandParams, CommandRequest, CommandResponse};

/// Single-item reads and writes through the gateway's command endpoint
///
/// Unlike [`BatchReadEngine`](crate::client::BatchReadEngine), every failure is returned
/// as an error since there is only ever one item.
#[derive(Clone)]
pub struct CommandClient {
    gateway: Arc<dyn Gateway>,
}

impl std::fmt::Debug for CommandClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandClient").finish_non_exhaustive()
    }
}

impl CommandClient {
    /// create a client that sends its commands to `gateway`
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// read one value of type `data_type` at `addr` on `channel`
    pub async fn read(
        &self,
        channel: u32,
        addr: u32,
        data_type: DataType,
    ) -> Result<Value, RequestError> {
        let request = CommandRequest {
            channel,
            command: CommandKind::Read,
            params: CommandParams {
                addr,
                type_tag: data_type.tag().to_string(),
                value: None,
            },
        };

        let response = self.send(&request).await?;
        let data = response.data.ok_or(DecodeError::MissingValue)?;
        let value = codec::decode_payload(&data, data_type)?;

        tracing::debug!(
            "read {} @ {}:{} = {}",
            data_type,
            channel,
            addr,
            value
        );
        Ok(value)
    }

    /// write `value` as `data_type` at `addr` on `channel`
    ///
    /// The value is checked against the type before anything is sent.
    pub async fn write(
        &self,
        channel: u32,
        addr: u32,
        value: Value,
        data_type: DataType,
    ) -> Result<(), RequestError> {
        let encoded = codec::encode(value, data_type)?;
        let request = CommandRequest {
            channel,
            command: CommandKind::Write,
            params: CommandParams {
                addr,
                type_tag: data_type.tag().to_string(),
                value: Some(encoded),
            },
        };

        self.send(&request).await?;
        tracing::debug!(
            "wrote {} @ {}:{} = {}",
            data_type,
            channel,
            addr,
            value
        );
        Ok(())
    }

    async fn send(&self, request: &CommandRequest) -> Result<CommandResponse, RequestError> {
        let response = self.gateway.execute(request).await?;
        if response.code != 0 {
            tracing::warn!(
                "{:?} on channel {} rejected with code {}: {}",
                request.command,
                request.channel,
                response.code,
                response.msg
            );
            return Err(RequestError::Rejected {
                code: response.code,
                message: response.msg,
            });
        }
        Ok(response)
    }
}
