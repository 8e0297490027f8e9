use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::client::gateway::Gateway;
use crate::error::RequestError;
use crate::wire::*;

enum Behavior {
    Answer(Vec<RawItemResult>),
    Fail(RequestError),
    Reject(i32, String),
}

/// start and end of a single call, on the tokio clock
#[derive(Copy, Clone, Debug)]
pub(crate) struct Call {
    pub(crate) start: Instant,
    pub(crate) end: Instant,
}

#[derive(Default)]
struct Log {
    batch_requests: Vec<BatchReadRequest>,
    command_requests: Vec<CommandRequest>,
    calls: Vec<Call>,
}

/// scripted gateway that records every request it receives
pub(crate) struct MockGateway {
    behavior: Behavior,
    commands: Mutex<VecDeque<Result<CommandResponse, RequestError>>>,
    delay: Duration,
    log: Mutex<Log>,
}

impl MockGateway {
    fn create(behavior: Behavior) -> Self {
        Self {
            behavior,
            commands: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            log: Mutex::new(Log::default()),
        }
    }

    pub(crate) fn answering(data: Vec<RawItemResult>) -> Arc<Self> {
        Arc::new(Self::create(Behavior::Answer(data)))
    }

    pub(crate) fn failing(err: RequestError) -> Arc<Self> {
        Arc::new(Self::create(Behavior::Fail(err)))
    }

    pub(crate) fn failing_after(err: RequestError, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::create(Behavior::Fail(err))
        })
    }

    pub(crate) fn rejecting(state: i32, message: &str) -> Arc<Self> {
        Arc::new(Self::create(Behavior::Reject(state, message.to_string())))
    }

    pub(crate) fn commands(
        responses: impl IntoIterator<Item = Result<CommandResponse, RequestError>>,
    ) -> Arc<Self> {
        let gateway = Self::create(Behavior::Answer(Vec::new()));
        gateway
            .commands
            .lock()
            .unwrap()
            .extend(responses);
        Arc::new(gateway)
    }

    pub(crate) fn batch_calls(&self) -> usize {
        self.log.lock().unwrap().batch_requests.len()
    }

    pub(crate) fn batch_requests(&self) -> Vec<BatchReadRequest> {
        self.log.lock().unwrap().batch_requests.clone()
    }

    pub(crate) fn command_requests(&self) -> Vec<CommandRequest> {
        self.log.lock().unwrap().command_requests.clone()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().calls.clone()
    }
}

#[async_trait::async_trait]
impl Gateway for MockGateway {
    async fn batch_read(
        &self,
        request: &BatchReadRequest,
    ) -> Result<BatchReadResponse, RequestError> {
        let start = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        {
            let mut log = self.log.lock().unwrap();
            log.batch_requests.push(request.clone());
            log.calls.push(Call {
                start,
                end: Instant::now(),
            });
        }

        match &self.behavior {
            Behavior::Answer(data) => Ok(BatchReadResponse {
                state: 0,
                message: "ok".to_string(),
                data: Some(data.clone()),
            }),
            Behavior::Fail(err) => Err(err.clone()),
            Behavior::Reject(state, message) => Ok(BatchReadResponse {
                state: *state,
                message: message.clone(),
                data: None,
            }),
        }
    }

    async fn execute(&self, request: &CommandRequest) -> Result<CommandResponse, RequestError> {
        self.log
            .lock()
            .unwrap()
            .command_requests
            .push(request.clone());

        self.commands
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RequestError::Timeout))
    }
}
