use serde::{Deserialize, Serialize};

use crate::config::WheelConfig;

/// Current protocol version.  Bump this when the wire format changes in a
/// breaking way.  The session checks this on connect and can refuse to talk
/// to an incompatible engine.
pub const PROTOCOL_VERSION: u32 = 1;

/// Requests sent from the session to the engine.  Every request is answered
/// by exactly one [`Reply`] carrying the same sequence number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "req")]
pub enum Request {
    /// Names of the selectable item lists.
    ListCatalog,
    /// Begin spinning on the given list.
    StartRoll { list: String },
    /// Ask the wheel to wind down.  Acceptance is acknowledged by the
    /// reply; physical completion arrives later as [`Push::RollStopped`].
    StopRoll,
    /// A random background media reference for the given list.
    RandomBackground { list: String },
    GetConfig,
    SetConfig { config: WheelConfig },
    /// Available audio output devices as (id, display name) pairs.
    AudioDevices,
}

/// The engine's answer to one [`Request`], matched by `seq`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    pub seq: u64,
    pub body: ReplyBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "reply")]
pub enum ReplyBody {
    Lists { names: Vec<String> },
    /// Plain success for requests with no payload (start, stop, set-config).
    Ack,
    /// `None` when the list has no associated media.  The string pair is
    /// (content locator, MIME type).
    Background { media: Option<(String, String)> },
    Config { config: WheelConfig },
    Devices { devices: Vec<(String, String)> },
    /// Request failure with a human-readable message.
    Err { message: String },
}

/// Unsolicited notifications from the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "push")]
pub enum Push {
    /// Wholesale replacement of the visible slot contents.
    SlotList { items: Vec<String> },
    /// The wheel has physically come to rest.
    RollStopped,
}

/// Wrapper for socket communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frame {
    Request { seq: u64, request: Request },
    Reply(Reply),
    Push(Push),
}

impl Frame {
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        let len = json.len() as u32;
        let mut result = Vec::with_capacity(4 + json.len());
        result.extend_from_slice(&len.to_be_bytes());
        result.extend_from_slice(&json);
        Ok(result)
    }

    pub fn decode(data: &[u8]) -> anyhow::Result<(Self, usize)> {
        if data.len() < 4 {
            anyhow::bail!("Insufficient data for length header");
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if data.len() < 4 + len {
            anyhow::bail!("Insufficient data for frame");
        }
        let frame: Self = serde_json::from_slice(&data[4..4 + len])?;
        Ok((frame, 4 + len))
    }
}
