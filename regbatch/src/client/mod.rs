//! Client API used to read and write device values through a gateway
//!
//! [`BatchReadEngine`] reads many typed items in one round trip, [`RealtimeMonitor`]
//! repeats such a read at a fixed interval, and [`CommandClient`] handles single-item
//! reads and writes. All of them talk to a [`Gateway`], normally an [`HttpGateway`].

pub use crate::client::command::*;
pub use crate::client::engine::*;
pub use crate::client::gateway::*;
pub use crate::client::http::*;
pub use crate::client::monitor::*;

mod command;
mod engine;
mod gateway;
mod http;
#[cfg(test)]
mod mock;
mod monitor;
