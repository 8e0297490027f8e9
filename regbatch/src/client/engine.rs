use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::client::gateway::Gateway;
use crate::codec;
use crate::decode::AppDecodeLevel;
use crate::error::{InvalidRequest, ItemError, RequestError};
use crate::types::{status, BatchReadResult, ItemResult, ReadItem};
use crate::wire::{BatchReadRequest, RawItemResult};

/// Reads a batch of typed items through a [`Gateway`] in a single round trip
///
/// The engine holds no per-call state. Clones share the same gateway.
#[derive(Clone)]
pub struct BatchReadEngine {
    gateway: Arc<dyn Gateway>,
    decode: AppDecodeLevel,
}

impl std::fmt::Debug for BatchReadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchReadEngine")
            .field("decode", &self.decode)
            .finish_non_exhaustive()
    }
}

impl BatchReadEngine {
    /// create an engine that sends its batches to `gateway`
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            decode: AppDecodeLevel::Nothing,
        }
    }

    /// change how batches are logged
    pub fn with_decode_level(mut self, decode: AppDecodeLevel) -> Self {
        self.decode = decode;
        self
    }

    /// Read every item in a single request to the gateway
    ///
    /// Never fails: transport problems produce a negative `state` with no data, and
    /// per-item problems are folded into the individual [`ItemResult`]s.
    pub async fn read(&self, items: &[ReadItem]) -> BatchReadResult {
        if items.is_empty() {
            return BatchReadResult {
                state: status::SUCCESS,
                message: "no items requested".to_string(),
                data: Vec::new(),
            };
        }

        if let Err(err) = check_unique_names(items) {
            tracing::warn!("batch not sent: {}", err);
            return BatchReadResult::failure(status::INVALID_REQUEST, err.to_string());
        }

        self.log_request(items);

        let request = BatchReadRequest::new(items);
        let response = match self.gateway.batch_read(&request).await {
            Ok(response) => response,
            Err(err) => return transport_failure(err),
        };

        if response.state != status::SUCCESS {
            tracing::warn!(
                "gateway rejected batch (state {}): {}",
                response.state,
                response.message
            );
            return BatchReadResult::failure(
                status::GATEWAY_REJECTED,
                format!(
                    "gateway rejected batch (state {}): {}",
                    response.state, response.message
                ),
            );
        }

        let data = correlate(items, response.data.unwrap_or_default());
        let succeeded = data.iter().filter(|x| x.is_success()).count();
        let result = BatchReadResult {
            state: status::SUCCESS,
            message: format!(
                "batch read complete: {} succeeded, {} failed",
                succeeded,
                data.len() - succeeded
            ),
            data,
        };

        self.log_result(&result);
        result
    }

    fn log_request(&self, items: &[ReadItem]) {
        for item in items {
            if item.name.is_empty() {
                tracing::warn!("forwarding item without a name: {}", item);
            }
            if item.type_tag.trim().is_empty() {
                tracing::warn!("forwarding item without a type: {}", item.name);
            }
        }

        if self.decode.enabled() {
            tracing::info!("BATCH TX - {} item(s)", items.len());
        }
        if self.decode.item_headers() {
            for item in items {
                tracing::info!("{}", item);
            }
        }
    }

    fn log_result(&self, result: &BatchReadResult) {
        if self.decode.enabled() {
            tracing::info!("BATCH RX - {}", result.message);
        }
        if self.decode.item_values() {
            for item in &result.data {
                tracing::info!("{}", item);
            }
        } else if self.decode.item_headers() {
            for item in &result.data {
                let status = if item.is_success() { "ok" } else { "failed" };
                tracing::info!("{} - {}", item.name, status);
            }
        }
    }
}

fn check_unique_names(items: &[ReadItem]) -> Result<(), InvalidRequest> {
    let mut names = HashSet::with_capacity(items.len());
    for item in items {
        if !names.insert(item.name.as_str()) {
            return Err(InvalidRequest::DuplicateName(item.name.clone()));
        }
    }
    Ok(())
}

fn transport_failure(err: RequestError) -> BatchReadResult {
    tracing::warn!("batch read failed: {}", err);
    BatchReadResult::failure(
        status::TRANSPORT_FAILURE,
        format!("batch read failed: {err}"),
    )
}

// emit one result per requested item, in request order, matched by name
fn correlate(items: &[ReadItem], raw: Vec<RawItemResult>) -> Vec<ItemResult> {
    let mut by_name: HashMap<String, RawItemResult> = HashMap::with_capacity(raw.len());
    for result in raw {
        if by_name.contains_key(&result.name) {
            tracing::warn!("gateway repeated item '{}', keeping the first", result.name);
            continue;
        }
        by_name.insert(result.name.clone(), result);
    }

    let data = items
        .iter()
        .map(|item| match by_name.remove(&item.name) {
            Some(raw) => decode_item(item, raw),
            None => {
                tracing::warn!("gateway returned no result for item '{}'", item.name);
                ItemResult::failure(item.name.clone(), ItemError::NoResult)
            }
        })
        .collect();

    for name in by_name.keys() {
        tracing::warn!("ignoring result for unrequested item '{}'", name);
    }

    data
}

fn decode_item(item: &ReadItem, raw: RawItemResult) -> ItemResult {
    if !raw.success {
        let message = raw.error.unwrap_or_else(|| "unknown error".to_string());
        return ItemResult::failure(item.name.clone(), ItemError::Gateway(message));
    }

    let decoded = item.data_type().and_then(|data_type| {
        let value = raw.value.unwrap_or(serde_json::Value::Null);
        codec::decode_payload(&value, data_type)
    });

    match decoded {
        Ok(value) => ItemResult::success(
            item.name.clone(),
            codec::scale(value, item.scale),
            item.unit.clone(),
        ),
        Err(err) => {
            tracing::warn!("unable to decode item '{}': {}", item.name, err);
            ItemResult::failure(item.name.clone(), ItemError::Decode(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockGateway;
    use crate::codec::{DataType, Value};
    use crate::error::DecodeError;
    use serde_json::json;

    fn raw_ok(name: &str, value: serde_json::Value) -> RawItemResult {
        RawItemResult {
            name: name.to_string(),
            success: true,
            value: Some(value),
            error: None,
        }
    }

    fn raw_err(name: &str, error: &str) -> RawItemResult {
        RawItemResult {
            name: name.to_string(),
            success: false,
            value: None,
            error: Some(error.to_string()),
        }
    }

    fn assert_close(actual: Option<Value>, expected: f64) {
        let actual = actual.and_then(|x| x.as_f64()).unwrap();
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[tokio::test]
    async fn decodes_and_scales_mixed_types() {
        let gateway = MockGateway::answering(vec![
            raw_ok("temperature", json!(256)),
            raw_ok("pressure", json!(101325.5)),
            raw_ok("flow", json!(1234567)),
        ]);
        let engine = BatchReadEngine::new(gateway.clone());

        let items = [
            ReadItem::new("temperature", 3, 100, DataType::Int16)
                .with_scale(0.1)
                .with_unit("C"),
            ReadItem::new("pressure", 3, 200, DataType::Float32).with_scale(1.0),
            ReadItem::new("flow", 3, 300, DataType::UInt32).with_scale(0.001),
        ];

        let result = engine.read(&items).await;

        assert_eq!(result.state, status::SUCCESS);
        assert_eq!(result.data.len(), 3);
        assert_close(result.get("temperature").unwrap().value(), 25.6);
        assert_close(result.get("pressure").unwrap().value(), 101325.5);
        assert_close(result.get("flow").unwrap().value(), 1234.567);
        assert_eq!(
            result.get("temperature").unwrap().outcome.as_ref().unwrap().unit.as_deref(),
            Some("C")
        );
        assert_eq!(gateway.batch_calls(), 1);
    }

    #[tokio::test]
    async fn sends_every_item_in_one_request() {
        let gateway = MockGateway::answering(vec![
            raw_ok("a", json!(1)),
            raw_ok("b", json!(2)),
            raw_ok("c", json!(3)),
        ]);
        let engine = BatchReadEngine::new(gateway.clone());

        let items = [
            ReadItem::new("a", 3, 100, DataType::Int16),
            ReadItem::new("b", 4, 100, DataType::Int16),
            ReadItem::new("c", 5, 100, DataType::Int16),
        ];
        engine.read(&items).await;

        let requests = gateway.batch_requests();
        assert_eq!(requests.len(), 1);
        let channels: Vec<u32> = requests[0].items.iter().map(|x| x.channel_id).collect();
        assert_eq!(channels, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn counts_partial_failures() {
        let gateway = MockGateway::answering(vec![
            raw_ok("ok1", json!(1)),
            raw_err("bad channel", "channel 999 not found"),
            raw_ok("ok2", json!(true)),
            raw_err("bad addr", "illegal data address"),
            raw_ok("ok3", json!(2.5)),
        ]);
        let engine = BatchReadEngine::new(gateway);

        let items = [
            ReadItem::new("ok1", 3, 100, DataType::Int16),
            ReadItem::new("bad channel", 999, 100, DataType::Int16),
            ReadItem::new("ok2", 3, 0, DataType::Bool),
            ReadItem::new("bad addr", 3, 99999, DataType::Int16),
            ReadItem::new("ok3", 3, 200, DataType::Float64),
        ];

        let result = engine.read(&items).await;

        assert_eq!(result.state, status::SUCCESS);
        assert_eq!(result.data.len(), 5);
        assert_eq!(result.success_count(), 3);
        assert_eq!(result.failure_count(), 2);
        // gateway messages pass through unmodified
        assert_eq!(
            result.get("bad channel").unwrap().error(),
            Some(&ItemError::Gateway("channel 999 not found".to_string()))
        );
        assert_eq!(result.get("ok2").unwrap().value(), Some(Value::Bool(true)));
    }

    #[tokio::test]
    async fn unsupported_type_only_fails_its_own_item() {
        let gateway = MockGateway::answering(vec![
            raw_ok("good", json!(10)),
            raw_ok("odd", json!(10)),
        ]);
        let engine = BatchReadEngine::new(gateway.clone());

        let items = [
            ReadItem::new("good", 3, 100, DataType::UInt16),
            ReadItem::untyped("odd", 3, 200, "invalid_type"),
        ];

        let result = engine.read(&items).await;

        assert_eq!(result.state, status::SUCCESS);
        assert_eq!(result.get("good").unwrap().value(), Some(Value::Float(10.0)));
        assert_eq!(
            result.get("odd").unwrap().error(),
            Some(&ItemError::Decode(DecodeError::UnsupportedType(
                "invalid_type".to_string()
            )))
        );
        // the unknown tag was still forwarded
        assert_eq!(gateway.batch_requests()[0].items[1].type_tag, "invalid_type");
    }

    #[tokio::test]
    async fn payload_that_does_not_fit_is_a_decode_error() {
        let gateway = MockGateway::answering(vec![
            raw_ok("too big", json!(70000)),
            raw_ok("fine", json!(7)),
        ]);
        let engine = BatchReadEngine::new(gateway);

        let items = [
            ReadItem::new("too big", 1, 1, DataType::Int16),
            ReadItem::new("fine", 1, 2, DataType::Int16),
        ];
        let result = engine.read(&items).await;

        assert!(matches!(
            result.get("too big").unwrap().error(),
            Some(ItemError::Decode(DecodeError::OutOfRange { .. }))
        ));
        assert!(result.get("fine").unwrap().is_success());
    }

    #[tokio::test]
    async fn transport_failure_returns_negative_state_without_data() {
        let gateway = MockGateway::failing(RequestError::Timeout);
        let engine = BatchReadEngine::new(gateway);

        let result = engine
            .read(&[ReadItem::new("a", 1, 1, DataType::UInt16)])
            .await;

        assert_eq!(result.state, status::TRANSPORT_FAILURE);
        assert!(result.data.is_empty());
        assert!(result.message.contains("timeout"));
    }

    #[tokio::test]
    async fn gateway_rejection_is_a_request_level_failure() {
        let gateway = MockGateway::rejecting(30006, "internal error");
        let engine = BatchReadEngine::new(gateway);

        let result = engine
            .read(&[ReadItem::new("a", 1, 1, DataType::UInt16)])
            .await;

        assert_eq!(result.state, status::GATEWAY_REJECTED);
        assert!(result.data.is_empty());
        assert!(result.message.contains("30006"));
    }

    #[tokio::test]
    async fn empty_batch_is_not_sent() {
        let gateway = MockGateway::answering(Vec::new());
        let engine = BatchReadEngine::new(gateway.clone());

        let result = engine.read(&[]).await;

        assert_eq!(result.state, status::SUCCESS);
        assert!(result.data.is_empty());
        assert_eq!(gateway.batch_calls(), 0);
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected_before_sending() {
        let gateway = MockGateway::answering(Vec::new());
        let engine = BatchReadEngine::new(gateway.clone());

        let items = [
            ReadItem::new("same", 1, 1, DataType::UInt16),
            ReadItem::new("same", 1, 2, DataType::UInt16),
        ];
        let result = engine.read(&items).await;

        assert_eq!(result.state, status::INVALID_REQUEST);
        assert!(result.data.is_empty());
        assert!(result.message.contains("same"));
        assert_eq!(gateway.batch_calls(), 0);
    }

    #[tokio::test]
    async fn correlates_by_name_not_position() {
        let gateway = MockGateway::answering(vec![
            raw_ok("second", json!(2)),
            raw_ok("stranger", json!(99)),
            raw_ok("first", json!(1)),
        ]);
        let engine = BatchReadEngine::new(gateway);

        let items = [
            ReadItem::new("first", 1, 1, DataType::UInt16),
            ReadItem::new("second", 1, 2, DataType::UInt16),
            ReadItem::new("missing", 1, 3, DataType::UInt16),
        ];
        let result = engine.read(&items).await;

        let names: Vec<&str> = result.data.iter().map(|x| x.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "missing"]);
        assert_eq!(result.data[0].value(), Some(Value::Float(1.0)));
        assert_eq!(result.data[1].value(), Some(Value::Float(2.0)));
        assert_eq!(result.data[2].error(), Some(&ItemError::NoResult));
    }

    #[tokio::test]
    async fn decodes_register_payloads() {
        let gateway = MockGateway::answering(vec![raw_ok(
            "energy",
            json!({"status": "success", "value": 0, "registers": [0xD687, 0x0012]}),
        )]);
        let engine = BatchReadEngine::new(gateway);

        let items = [ReadItem::new("energy", 1, 10, DataType::UInt32Le).with_scale(0.001)];
        let result = engine.read(&items).await;

        assert_close(result.get("energy").unwrap().value(), 1234.567);
    }
}
