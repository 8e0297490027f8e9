//! Batch read, single write and periodic polling through an HTTP gateway

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use regbatch::client::*;
use regbatch::codec::{DataType, Value};
use regbatch::config::GatewayConfig;
use regbatch::decode::{AppDecodeLevel, HttpDecodeLevel};
use regbatch::types::ReadItem;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    // Create the gateway
    let gateway: Arc<dyn Gateway> = Arc::new(
        HttpGateway::new(GatewayConfig::default())?.with_decode_level(HttpDecodeLevel::Status),
    );

    // Read a batch spanning two channels
    let items = vec![
        ReadItem::new("temperature", 3, 100, DataType::Int16)
            .with_scale(0.1)
            .with_unit("C"),
        ReadItem::new("pressure", 3, 200, DataType::Float32).with_unit("Pa"),
        ReadItem::new("energy", 4, 300, DataType::UInt32Le).with_unit("Wh"),
        ReadItem::new("pump", 4, 0, DataType::Bool),
    ];

    let engine = BatchReadEngine::new(gateway.clone()).with_decode_level(AppDecodeLevel::Summary);
    let result = engine.read(&items).await;
    for item in &result.data {
        println!("{item}");
    }

    // Switch the pump off
    let commands = CommandClient::new(gateway);
    commands.write(4, 0, Value::Bool(false), DataType::Bool).await?;

    // Poll the same batch every second for five cycles
    let mut handle = RealtimeMonitor::new(engine, items, Duration::from_secs(1)).spawn(1);
    while let Some(snapshot) = handle.next().await {
        println!("cycle {}: {}", snapshot.cycle, snapshot.result.message);
        if snapshot.cycle == 5 {
            handle.stop();
        }
    }
    handle.join().await;

    Ok(())
}
