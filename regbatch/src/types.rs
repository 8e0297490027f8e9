use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::codec::{DataType, Value};
use crate::error::{DecodeError, ItemError};

/// Status codes carried by [`BatchReadResult::state`]
pub mod status {
    /// the request was fully processed, individual items may still have failed
    pub const SUCCESS: i32 = 0;
    /// the gateway could not be reached or did not produce a decodable answer
    pub const TRANSPORT_FAILURE: i32 = -1;
    /// the request was rejected locally and never sent
    pub const INVALID_REQUEST: i32 = -2;
    /// the gateway answered but refused to process the batch
    pub const GATEWAY_REJECTED: i32 = -3;
}

fn default_scale() -> f64 {
    1.0
}

fn is_default_scale(scale: &f64) -> bool {
    *scale == 1.0
}

/// A named value to read in a batch
///
/// The name is the correlation key for the result and must be unique within a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadItem {
    /// name of the item, unique within a batch
    pub name: String,
    /// logical communication channel on the gateway
    pub channel_id: u32,
    /// register or coil address
    pub addr: u32,
    /// type tag exactly as sent to the gateway
    #[serde(rename = "type")]
    pub type_tag: String,
    /// multiplier applied to the decoded value
    #[serde(default = "default_scale", skip_serializing_if = "is_default_scale")]
    pub scale: f64,
    /// display unit, echoed back with the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// extra protocol specific parameters forwarded to the gateway as-is
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ReadItem {
    /// create an item with a type known at compile time
    pub fn new(name: impl Into<String>, channel_id: u32, addr: u32, data_type: DataType) -> Self {
        Self::untyped(name, channel_id, addr, data_type.tag())
    }

    /// create an item whose type tag comes from an untyped source (config file, user input)
    ///
    /// Unknown tags are forwarded and surface as a per-item failure.
    pub fn untyped(
        name: impl Into<String>,
        channel_id: u32,
        addr: u32,
        type_tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            channel_id,
            addr,
            type_tag: type_tag.into(),
            scale: default_scale(),
            unit: None,
            params: serde_json::Map::new(),
        }
    }

    /// set the engineering-unit multiplier
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// set the display unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// add a pass-through parameter
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// parse the type tag
    pub fn data_type(&self) -> Result<DataType, DecodeError> {
        self.type_tag.parse()
    }
}

impl std::fmt::Display for ReadItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (channel: {} addr: {} type: {})",
            self.name, self.channel_id, self.addr, self.type_tag
        )
    }
}

/// A successfully decoded and scaled value
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    /// value after scaling
    pub value: Value,
    /// unit echoed from the request
    pub unit: Option<String>,
}

/// Outcome of a single item in a batch
#[derive(Clone, Debug, PartialEq)]
pub struct ItemResult {
    /// name of the requested item
    pub name: String,
    /// reading or the reason the item failed
    pub outcome: Result<Reading, ItemError>,
}

impl ItemResult {
    pub(crate) fn success(name: String, value: Value, unit: Option<String>) -> Self {
        Self {
            name,
            outcome: Ok(Reading { value, unit }),
        }
    }

    pub(crate) fn failure(name: String, err: ItemError) -> Self {
        Self {
            name,
            outcome: Err(err),
        }
    }

    /// true if the item produced a value
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// value of the item, if it succeeded
    pub fn value(&self) -> Option<Value> {
        self.outcome.as_ref().ok().map(|x| x.value)
    }

    /// error of the item, if it failed
    pub fn error(&self) -> Option<&ItemError> {
        self.outcome.as_ref().err()
    }
}

impl std::fmt::Display for ItemResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            Ok(Reading {
                value,
                unit: Some(unit),
            }) => write!(f, "{} = {} {}", self.name, value, unit),
            Ok(Reading { value, unit: None }) => write!(f, "{} = {}", self.name, value),
            Err(err) => write!(f, "{} - error: {}", self.name, err),
        }
    }
}

/// Result of a batch read
///
/// A successful transport call always yields exactly one entry per requested item, in
/// request order. Callers should still correlate by name using [`BatchReadResult::get`].
#[derive(Clone, Debug, PartialEq)]
pub struct BatchReadResult {
    /// see [`status`]; zero when the batch was processed, negative otherwise
    pub state: i32,
    /// human readable summary
    pub message: String,
    /// per-item results, empty if `state` is negative
    pub data: Vec<ItemResult>,
}

impl BatchReadResult {
    pub(crate) fn failure(state: i32, message: String) -> Self {
        Self {
            state,
            message,
            data: Vec::new(),
        }
    }

    /// true if the batch was processed by the gateway
    pub fn is_success(&self) -> bool {
        self.state == status::SUCCESS
    }

    /// find the result for an item by name
    pub fn get(&self, name: &str) -> Option<&ItemResult> {
        self.data.iter().find(|x| x.name == name)
    }

    /// map from name to value containing only the successful items
    pub fn values(&self) -> HashMap<&str, Value> {
        self.data
            .iter()
            .filter_map(|x| x.value().map(|v| (x.name.as_str(), v)))
            .collect()
    }

    /// number of items that produced a value
    pub fn success_count(&self) -> usize {
        self.data.iter().filter(|x| x.is_success()).count()
    }

    /// number of items that failed
    pub fn failure_count(&self) -> usize {
        self.data.len() - self.success_count()
    }
}
