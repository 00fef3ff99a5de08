//! Gateway envelope
//!
//! Every frame on the wire is a four-field JSON envelope `{op, d, s, t}`.
//! Incoming frames may additionally be zlib-compressed; they are sniffed
//! and inflated before parsing.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::ZlibDecoder;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::OpCode;

/// Errors produced while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// A compressed frame could not be inflated.
    #[error("failed to inflate compressed frame: {0}")]
    Inflate(#[from] std::io::Error),

    /// The frame was not a valid JSON envelope.
    #[error("failed to parse payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The `op` field held a value outside the enumerated set.
    #[error("unhandled op code {0}")]
    UnhandledOp(u8),
}

/// The wire-level envelope in which all gateway traffic travels.
///
/// `s` and `t` are only meaningful on dispatch frames; outbound frames
/// always serialize them as `0` and `""` respectively.
#[derive(Debug, Serialize)]
pub struct Payload {
    /// Operation code.
    pub op: OpCode,
    /// Opaque payload bytes, kept unparsed.
    pub d: Option<Box<RawValue>>,
    /// Sequence number, present on dispatch frames.
    pub s: u64,
    /// Event name, present on dispatch frames.
    pub t: String,
}

/// Raw form used during deserialization, before the op code is validated.
#[derive(Deserialize)]
struct WirePayload {
    op: u8,
    #[serde(default)]
    d: Option<Box<RawValue>>,
    #[serde(default)]
    s: u64,
    #[serde(default)]
    t: String,
}

impl Payload {
    /// Wrap pre-marshalled data in an envelope for the given op.
    pub fn new<T>(op: OpCode, data: &T) -> Result<Self, PayloadError>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self {
            op,
            d: Some(serde_json::value::to_raw_value(data)?),
            s: 0,
            t: String::new(),
        })
    }

    /// Build a heartbeat envelope carrying the last-seen sequence number.
    pub fn heartbeat(sequence: u64) -> Result<Self, PayloadError> {
        Self::new(OpCode::Heartbeat, &sequence)
    }

    /// Parse an (already inflated) JSON frame into an envelope.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, PayloadError> {
        let wire: WirePayload = serde_json::from_slice(bytes)?;
        let op = OpCode::from_u8(wire.op).ok_or(PayloadError::UnhandledOp(wire.op))?;

        Ok(Self {
            op,
            d: wire.d,
            s: wire.s,
            t: wire.t,
        })
    }

    /// Serialize the envelope to its compact wire form.
    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The raw JSON text of the `d` field, or `"null"` when absent.
    #[must_use]
    pub fn data(&self) -> &str {
        self.d.as_deref().map_or("null", RawValue::get)
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.t.is_empty() {
            write!(f, "Payload(op={})", self.op)
        } else {
            write!(f, "Payload(op={}, t={}, s={})", self.op, self.t, self.s)
        }
    }
}

/// Inflate a frame if it carries zlib-compressed data.
///
/// JSON frames start with `{` or `[`; anything else is treated as a zlib
/// stream, which is how the gateway marks compressed dispatches.
pub fn decompress(input: &[u8]) -> Result<Cow<'_, [u8]>, PayloadError> {
    if !is_compressed(input) {
        return Ok(Cow::Borrowed(input));
    }

    let mut inflated = Vec::new();
    ZlibDecoder::new(input).read_to_end(&mut inflated)?;
    Ok(Cow::Owned(inflated))
}

fn is_compressed(input: &[u8]) -> bool {
    match input.first() {
        Some(first) => *first != b'{' && *first != b'[',
        None => false,
    }
}
