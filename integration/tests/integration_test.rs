//! End to end tests of the HTTP gateway client against a scripted gateway

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use regbatch::client::*;
use regbatch::codec::{DataType, Value};
use regbatch::config::GatewayConfig;
use regbatch::error::{ItemError, RequestError};
use regbatch::types::{status, ReadItem};

fn gateway(server: &MockServer) -> Arc<dyn Gateway> {
    let mut config = GatewayConfig::new(server.uri());
    config.timeout_ms = 500;
    config.command_timeout_ms = 500;
    Arc::new(HttpGateway::new(config).unwrap())
}

fn items() -> Vec<ReadItem> {
    vec![
        ReadItem::new("temperature", 3, 100, DataType::Int16).with_scale(0.1),
        ReadItem::new("pressure", 3, 200, DataType::Float32).with_unit("Pa"),
        ReadItem::new("flow", 4, 300, DataType::Float64),
    ]
}

#[tokio::test]
async fn batch_read_sends_one_request_and_decodes_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/batchRead"))
        .and(body_json(json!({
            "items": [
                {"name": "temperature", "channel_id": 3, "addr": 100, "type": "int16"},
                {"name": "pressure", "channel_id": 3, "addr": 200, "type": "float32"},
                {"name": "flow", "channel_id": 4, "addr": 300, "type": "float64"},
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": 0,
            "message": "ok",
            "data": [
                {"name": "flow", "success": true, "value": 1234.567},
                {"name": "temperature", "success": true, "value": 256},
                {"name": "pressure", "success": true, "value": 101325.5},
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = BatchReadEngine::new(gateway(&server));
    let result = engine.read(&items()).await;

    assert_eq!(result.state, status::SUCCESS);
    let names: Vec<&str> = result.data.iter().map(|x| x.name.as_str()).collect();
    assert_eq!(names, ["temperature", "pressure", "flow"]);

    match result.get("temperature").and_then(|x| x.value()) {
        Some(Value::Float(x)) => assert!((x - 25.6).abs() < 1e-9),
        other => panic!("unexpected temperature: {other:?}"),
    }
    assert_eq!(
        result.get("pressure").and_then(|x| x.value()),
        Some(Value::Float(101325.5))
    );
    assert_eq!(
        result.get("flow").and_then(|x| x.value()),
        Some(Value::Float(1234.567))
    );
}

#[tokio::test]
async fn batch_read_reports_per_item_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/batchRead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": 0,
            "message": "partial",
            "data": [
                {"name": "temperature", "success": false, "error": "device timeout"},
                {"name": "pressure", "success": true, "value": 1.5},
            ]
        })))
        .mount(&server)
        .await;

    let engine = BatchReadEngine::new(gateway(&server));
    let result = engine.read(&items()).await;

    assert_eq!(result.state, status::SUCCESS);
    assert_eq!(result.success_count(), 1);
    assert_eq!(result.failure_count(), 2);
    assert_eq!(
        result.get("temperature").and_then(|x| x.error()),
        Some(&ItemError::Gateway("device timeout".to_string()))
    );
    assert_eq!(
        result.get("flow").and_then(|x| x.error()),
        Some(&ItemError::NoResult)
    );
}

#[tokio::test]
async fn http_error_status_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/batchRead"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = BatchReadEngine::new(gateway(&server)).read(&items()).await;
    assert_eq!(result.state, status::TRANSPORT_FAILURE);
    assert!(result.data.is_empty());
    assert!(result.message.contains("500"));
}

#[tokio::test]
async fn undecodable_body_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/batchRead"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let result = BatchReadEngine::new(gateway(&server)).read(&items()).await;
    assert_eq!(result.state, status::TRANSPORT_FAILURE);
    assert!(result.data.is_empty());
}

#[tokio::test]
async fn slow_gateway_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/batchRead"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"state": 0, "message": "ok", "data": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let result = BatchReadEngine::new(gateway(&server)).read(&items()).await;
    assert_eq!(result.state, status::TRANSPORT_FAILURE);
    assert!(result.message.contains("timeout"));
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_failure() {
    let mut config = GatewayConfig::new("http://127.0.0.1:1");
    config.timeout_ms = 500;
    let engine = BatchReadEngine::new(Arc::new(HttpGateway::new(config).unwrap()));

    let result = engine.read(&items()).await;
    assert_eq!(result.state, status::TRANSPORT_FAILURE);
    assert!(result.data.is_empty());
}

#[tokio::test]
async fn gateway_refusal_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/batchRead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": 30006,
            "message": "channel offline",
            "data": null
        })))
        .mount(&server)
        .await;

    let result = BatchReadEngine::new(gateway(&server)).read(&items()).await;
    assert_eq!(result.state, status::GATEWAY_REJECTED);
    assert!(result.message.contains("30006"));
    assert!(result.message.contains("channel offline"));
}

#[tokio::test]
async fn single_item_commands_use_the_execute_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/execute"))
        .and(body_json(json!({
            "channel": 3,
            "command": "read",
            "params": {"addr": 200, "type": "float32"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "success",
            "data": {"value": 42.5, "type": "float32", "from_cache": false}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/device/execute"))
        .and(body_json(json!({
            "channel": 3,
            "command": "write",
            "params": {"addr": 10, "type": "uint16", "value": 1500}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "success"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CommandClient::new(gateway(&server));
    assert_eq!(
        client.read(3, 200, DataType::Float32).await,
        Ok(Value::Float(42.5))
    );
    assert_eq!(
        client
            .write(3, 10, Value::Integer(1500), DataType::UInt16)
            .await,
        Ok(())
    );
}

#[tokio::test]
async fn rejected_command_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 40001,
            "msg": "read only register"
        })))
        .mount(&server)
        .await;

    let client = CommandClient::new(gateway(&server));
    assert_eq!(
        client
            .write(1, 1, Value::Integer(1), DataType::UInt16)
            .await,
        Err(RequestError::Rejected {
            code: 40001,
            message: "read only register".to_string()
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn monitor_polls_until_stopped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/batchRead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": 0,
            "message": "ok",
            "data": [{"name": "pump", "success": true, "value": true}]
        })))
        .mount(&server)
        .await;

    let items = vec![ReadItem::new("pump", 1, 0, DataType::Bool)];
    let engine = BatchReadEngine::new(gateway(&server));
    let mut handle = RealtimeMonitor::new(engine, items, Duration::from_millis(50)).spawn(4);

    let mut snapshots = Vec::new();
    while let Some(snapshot) = handle.next().await {
        snapshots.push(snapshot);
        if snapshots.len() == 3 {
            handle.stop();
        }
    }

    assert!(snapshots.len() >= 3);
    for (i, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.cycle, i as u64 + 1);
        assert_eq!(
            snapshot.result.get("pump").and_then(|x| x.value()),
            Some(Value::Bool(true))
        );
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), snapshots.len());

    let monitor = handle.join().await.unwrap();
    assert_eq!(monitor.state(), MonitorState::Stopped);
}
