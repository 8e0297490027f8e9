//! JSON bodies exchanged with the gateway

use serde::{Deserialize, Serialize};

use crate::types::ReadItem;

/// body of a batch read request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchReadRequest {
    /// every item of the batch, in caller order
    pub items: Vec<WireReadItem>,
}

/// a single item as sent to the gateway
///
/// `scale` and `unit` are interpreted locally and never forwarded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireReadItem {
    /// correlation key
    pub name: String,
    /// logical channel on the gateway
    pub channel_id: u32,
    /// register or coil address
    pub addr: u32,
    /// type tag
    #[serde(rename = "type")]
    pub type_tag: String,
    /// pass-through parameters
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl From<&ReadItem> for WireReadItem {
    fn from(item: &ReadItem) -> Self {
        Self {
            name: item.name.clone(),
            channel_id: item.channel_id,
            addr: item.addr,
            type_tag: item.type_tag.clone(),
            params: item.params.clone(),
        }
    }
}

impl BatchReadRequest {
    /// build the request body for a list of items
    pub fn new(items: &[ReadItem]) -> Self {
        Self {
            items: items.iter().map(WireReadItem::from).collect(),
        }
    }
}

/// body of a batch read response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchReadResponse {
    /// zero if the batch was processed
    pub state: i32,
    /// summary from the gateway
    #[serde(default)]
    pub message: String,
    /// per-item results, absent when the batch was refused
    #[serde(default)]
    pub data: Option<Vec<RawItemResult>>,
}

/// per-item result as reported by the gateway
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawItemResult {
    /// echo of the requested name
    pub name: String,
    /// whether the gateway could read the item
    pub success: bool,
    /// value in the gateway's JSON-native form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// command understood by the execute endpoint
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// read a single value
    Read,
    /// write a single value
    Write,
}

/// parameters of a single-item command
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandParams {
    /// register or coil address
    pub addr: u32,
    /// type tag
    #[serde(rename = "type")]
    pub type_tag: String,
    /// value to write, absent for reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// body of a single-item command request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// channel the command is addressed to
    pub channel: u32,
    /// read or write
    pub command: CommandKind,
    /// command parameters
    pub params: CommandParams,
}

/// body of a single-item command response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// zero on success
    pub code: i32,
    /// message from the gateway
    #[serde(default)]
    pub msg: String,
    /// result payload, typically `{"value": ...}`
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}
