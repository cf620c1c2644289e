//! JSON serialization for wire messages.

use hublink_core::AppResult;

use super::envelope::WireMessage;

/// Serialize a message into a text frame.
pub fn encode(msg: &WireMessage) -> AppResult<String> {
    Ok(serde_json::to_string(msg)?)
}

/// Deserialize a text frame into a message.
pub fn decode(text: &str) -> AppResult<WireMessage> {
    Ok(serde_json::from_str(text)?)
}
