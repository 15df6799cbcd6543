//! Plugin-message frames: a channel name plus an opaque payload.
//!
//! The relay link between proxy and backend may carry more than skin
//! traffic, so every payload is tagged with a namespaced channel
//! (`skinforge:skins`) and the receiver routes on it. Layout, all integers
//! big-endian:
//!
//! ```text
//! ┌──────────┬──────────────┬──────────┬─────────────┐
//! │ u16 clen │ channel utf8 │ u32 plen │ payload     │
//! └──────────┴──────────────┴──────────┴─────────────┘
//! ```
//!
//! `MAX_PAYLOAD_SIZE` caps the declared payload length so a corrupt prefix
//! can't make the receiver allocate unbounded memory.

use crate::ProtocolError;

/// Largest accepted payload (1 MiB, the vanilla clientbound custom-payload cap).
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Longest accepted channel name.
const MAX_CHANNEL_LEN: usize = 256;

/// One framed message on the relay link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMessage {
    /// `namespace:name`, e.g. [`SKINS_CHANNEL`](crate::SKINS_CHANNEL).
    pub channel: String,
    pub data: Vec<u8>,
}

impl PluginMessage {
    /// Creates a frame.
    pub fn new(channel: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            channel: channel.into(),
            data,
        }
    }

    /// Serializes the frame.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidFrame`] if the channel name is malformed or
    /// the payload exceeds [`MAX_PAYLOAD_SIZE`].
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        validate_channel(&self.channel)?;
        if self.data.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::InvalidFrame(format!(
                "payload too large: {} bytes (max {MAX_PAYLOAD_SIZE})",
                self.data.len()
            )));
        }

        let channel = self.channel.as_bytes();
        let mut out = Vec::with_capacity(2 + channel.len() + 4 + self.data.len());
        // Both casts are bounded by the checks above.
        out.extend_from_slice(&(channel.len() as u16).to_be_bytes());
        out.extend_from_slice(channel);
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.data);
        Ok(out)
    }

    /// Parses a frame.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidFrame`] on truncation, trailing bytes, an
    /// oversized length prefix, or a malformed channel name.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut cursor = bytes;

        let channel_len = u16::from_be_bytes(take::<2>(&mut cursor)?) as usize;
        if channel_len > MAX_CHANNEL_LEN {
            return Err(ProtocolError::InvalidFrame(format!(
                "channel name too long: {channel_len} bytes"
            )));
        }
        let channel = take_slice(&mut cursor, channel_len)?;
        let channel = std::str::from_utf8(channel)
            .map_err(|_| ProtocolError::InvalidFrame("channel name is not utf-8".into()))?
            .to_owned();
        validate_channel(&channel)?;

        let data_len = u32::from_be_bytes(take::<4>(&mut cursor)?) as usize;
        if data_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::InvalidFrame(format!(
                "payload too large: {data_len} bytes (max {MAX_PAYLOAD_SIZE})"
            )));
        }
        let data = take_slice(&mut cursor, data_len)?.to_vec();

        if !cursor.is_empty() {
            return Err(ProtocolError::InvalidFrame(format!(
                "{} trailing bytes",
                cursor.len()
            )));
        }

        Ok(Self { channel, data })
    }
}

/// Channel names must be `namespace:name`, lowercase, with both parts non-empty.
fn validate_channel(channel: &str) -> Result<(), ProtocolError> {
    let valid = channel.len() <= MAX_CHANNEL_LEN
        && matches!(channel.split_once(':'), Some((ns, name)) if !ns.is_empty() && !name.is_empty())
        && channel.bytes().all(|b| {
            b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b':' | b'_' | b'-' | b'.' | b'/')
        });
    if valid {
        Ok(())
    } else {
        Err(ProtocolError::InvalidFrame(format!(
            "invalid channel name '{channel}'"
        )))
    }
}

fn take<const N: usize>(cursor: &mut &[u8]) -> Result<[u8; N], ProtocolError> {
    let slice = take_slice(cursor, N)?;
    let mut buf = [0u8; N];
    buf.copy_from_slice(slice);
    Ok(buf)
}

fn take_slice<'a>(cursor: &mut &'a [u8], len: usize) -> Result<&'a [u8], ProtocolError> {
    if cursor.len() < len {
        return Err(ProtocolError::InvalidFrame(format!(
            "truncated frame: needed {len} bytes, {} remaining",
            cursor.len()
        )));
    }
    let (head, tail) = cursor.split_at(len);
    *cursor = tail;
    Ok(head)
}
