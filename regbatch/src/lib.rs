//! Typed batch reads against a device gateway using [Tokio](https://docs.rs/tokio)
//! and Rust's `async/await` syntax.
//!
//! Devices sit behind a gateway that owns the Modbus (or other fieldbus) links and
//! exposes them over HTTP with JSON bodies. This crate turns a list of named, typed
//! items into a single batch request, decodes each returned value under its declared
//! type, and correlates the results back to the items by name.
//!
//! # Features
//!
//! * One request per batch regardless of how many channels the items span
//! * Per-item success or failure, a bad item never fails the whole batch
//! * Register level codecs for 16/32/64-bit integers and IEEE 754 floats in
//!   either word order
//! * Periodic polling with cooperative cancellation
//! * Single-item read and write commands
//! * Modbus ASCII LRC computation and frame validation
//!
//! # Supported types
//!
//! `bool`, `uint16`, `int16`, `uint32`, `int32`, `uint32le`, `int32le`,
//! `float32`, `float32le`, `float64`
//!
//! # Example
//!
//! Read three values once
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use regbatch::client::{BatchReadEngine, HttpGateway};
//! use regbatch::codec::DataType;
//! use regbatch::config::GatewayConfig;
//! use regbatch::types::ReadItem;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = HttpGateway::new(GatewayConfig::new("http://127.0.0.1:8080"))?;
//!     let engine = BatchReadEngine::new(Arc::new(gateway));
//!
//!     let items = [
//!         ReadItem::new("temperature", 3, 100, DataType::Int16).with_scale(0.1),
//!         ReadItem::new("pressure", 3, 200, DataType::Float32).with_unit("Pa"),
//!         ReadItem::new("flow", 4, 300, DataType::Float64),
//!     ];
//!
//!     let result = engine.read(&items).await;
//!     println!("{}", result.message);
//!     for item in &result.data {
//!         println!("{}", item);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
/// gateway configuration
pub mod config;
/// controls how requests and responses are logged
pub mod decode;
/// error types associated with making requests
pub mod error;
pub mod lrc;
/// read items and the results of batch reads
pub mod types;
pub mod wire;
